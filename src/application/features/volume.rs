//! Volume-based indicators.

use super::series::*;
use super::{Indicator, Ohlcv};
use ta::indicators::{MoneyFlowIndex, OnBalanceVolume};

const CMF_WINDOW: usize = 20;
const FI_WINDOW: usize = 13;
const EM_WINDOW: usize = 14;
const VWAP_WINDOW: usize = 14;
const MFI_WINDOW: usize = 14;
const NVI_START: f64 = 1000.0;

/// Close location value: where the close sits inside the bar's range, -1..1.
fn close_location(input: &Ohlcv) -> Vec<f64> {
    input
        .high
        .iter()
        .zip(&input.low)
        .zip(&input.close)
        .map(|((h, l), c)| {
            let range = h - l;
            if range == 0.0 {
                0.0
            } else {
                ((c - l) - (h - c)) / range
            }
        })
        .collect()
}

pub(super) fn compute(input: &Ohlcv) -> Vec<Indicator> {
    let n = input.len();
    let clv = close_location(input);
    let money_flow_volume = zip_with(&clv, &input.volume, |a, b| a * b);

    // Accumulation / distribution
    let adi = cumsum(&money_flow_volume);

    let obv = stream_bars(OnBalanceVolume::new(), &input.items, 1);

    let cmf = safe_div(
        &rolling_sum(&money_flow_volume, CMF_WINDOW),
        &rolling_sum(&input.volume, CMF_WINDOW),
    );

    let force = zip_with(&diff(&input.close, 1), &input.volume, |d, v| d * v);
    let fi = ema(&force, FI_WINDOW);

    // Ease of movement, scaled as volumes are large
    let mid_move = zip_with(&diff(&input.high, 1), &diff(&input.low, 1), |a, b| a + b);
    let box_ratio: Vec<f64> = (0..n)
        .map(|i| {
            let v = input.volume[i];
            if v == 0.0 {
                f64::NAN
            } else {
                mid_move[i] * (input.high[i] - input.low[i]) / (2.0 * v) * 100_000_000.0
            }
        })
        .collect();
    let sma_em = rolling_mean(&box_ratio, EM_WINDOW);

    let vpt = cumsum(&zip_with(
        &pct_change(&input.close, 1),
        &input.volume,
        |r, v| r * v,
    ));

    let typical = input.typical_price();
    let vwap = safe_div(
        &rolling_sum(&zip_with(&typical, &input.volume, |p, v| p * v), VWAP_WINDOW),
        &rolling_sum(&input.volume, VWAP_WINDOW),
    );

    let mfi = MoneyFlowIndex::new(MFI_WINDOW)
        .map(|ind| stream_bars(ind, &input.items, MFI_WINDOW))
        .unwrap_or_else(|_| nan_vec(n));

    // Negative volume index moves only on days volume falls
    let returns = pct_change(&input.close, 1);
    let mut nvi = Vec::with_capacity(n);
    let mut level = NVI_START;
    for i in 0..n {
        if i > 0 && input.volume[i] < input.volume[i - 1] && returns[i].is_finite() {
            level *= 1.0 + returns[i];
        }
        nvi.push(level);
    }

    vec![
        Indicator::new("volume_adi", adi),
        Indicator::new("volume_obv", obv),
        Indicator::new("volume_cmf", cmf),
        Indicator::new("volume_fi", fi),
        Indicator::new("volume_em", box_ratio),
        Indicator::new("volume_sma_em", sma_em),
        Indicator::new("volume_vpt", vpt),
        Indicator::new("volume_vwap", vwap),
        Indicator::with_neutral("volume_mfi", mfi, 50.0),
        Indicator::with_neutral("volume_nvi", nvi, NVI_START),
    ]
}
