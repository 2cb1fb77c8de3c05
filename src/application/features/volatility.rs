//! Volatility indicators: Bollinger, Keltner and Donchian channels, ATR,
//! ulcer index.

use super::series::*;
use super::{Indicator, Ohlcv};
use ta::Next;
use ta::indicators::{AverageTrueRange, BollingerBands};

const BB_WINDOW: usize = 20;
const BB_DEV: f64 = 2.0;
const KC_WINDOW: usize = 20;
const DC_WINDOW: usize = 20;
const ATR_WINDOW: usize = 14;
const UI_WINDOW: usize = 14;

/// Width as a percentage of the middle band, and position of the close
/// within the band.
fn band_shape(upper: &[f64], lower: &[f64], middle: &[f64], close: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let width = safe_div(&zip_with(upper, lower, |u, l| (u - l) * 100.0), middle);
    let position = safe_div(
        &zip_with(close, lower, |c, l| c - l),
        &zip_with(upper, lower, |u, l| u - l),
    );
    (width, position)
}

pub(super) fn compute(input: &Ohlcv) -> Vec<Indicator> {
    let n = input.len();
    let close = &input.close;

    let (mut bbm, mut bbh, mut bbl) = (nan_vec(n), nan_vec(n), nan_vec(n));
    if let Ok(mut bb) = BollingerBands::new(BB_WINDOW, BB_DEV) {
        let mut seen = 0usize;
        for (i, c) in close.iter().enumerate() {
            if !c.is_finite() {
                continue;
            }
            let out = bb.next(*c);
            seen += 1;
            if seen >= BB_WINDOW {
                bbm[i] = out.average;
                bbh[i] = out.upper;
                bbl[i] = out.lower;
            }
        }
    }
    let (bbw, bbp) = band_shape(&bbh, &bbl, &bbm, close);
    let bbhi = indicator(close, &bbh, |c, h| c > h);
    let bbli = indicator(close, &bbl, |c, l| c < l);

    // Keltner channel over the typical price
    let typical = input.typical_price();
    let kcc = rolling_mean(&typical, KC_WINDOW);
    let kch = rolling_mean(
        &(0..n)
            .map(|i| (4.0 * input.high[i] - 2.0 * input.low[i] + close[i]) / 3.0)
            .collect::<Vec<_>>(),
        KC_WINDOW,
    );
    let kcl = rolling_mean(
        &(0..n)
            .map(|i| (-2.0 * input.high[i] + 4.0 * input.low[i] + close[i]) / 3.0)
            .collect::<Vec<_>>(),
        KC_WINDOW,
    );
    let (kcw, kcp) = band_shape(&kch, &kcl, &kcc, close);
    let kchi = indicator(close, &kch, |c, h| c > h);
    let kcli = indicator(close, &kcl, |c, l| c < l);

    let dch = rolling_max(&input.high, DC_WINDOW);
    let dcl = rolling_min(&input.low, DC_WINDOW);
    let dcm = zip_with(&dch, &dcl, |h, l| (h + l) / 2.0);
    let (dcw, dcp) = band_shape(&dch, &dcl, &dcm, close);

    let atr = AverageTrueRange::new(ATR_WINDOW)
        .map(|ind| stream_bars(ind, &input.items, ATR_WINDOW))
        .unwrap_or_else(|_| nan_vec(n));

    // Ulcer index: RMS of percentage drawdown from the rolling close high
    let rolling_high = rolling_max(close, UI_WINDOW);
    let drawdown = zip_with(close, &rolling_high, |c, h| (c - h) / h * 100.0);
    let ui = rolling_rms(&drawdown, UI_WINDOW);

    vec![
        Indicator::new("volatility_bbm", bbm),
        Indicator::new("volatility_bbh", bbh),
        Indicator::new("volatility_bbl", bbl),
        Indicator::new("volatility_bbw", bbw),
        Indicator::new("volatility_bbp", bbp),
        Indicator::new("volatility_bbhi", bbhi),
        Indicator::new("volatility_bbli", bbli),
        Indicator::new("volatility_kcc", kcc),
        Indicator::new("volatility_kch", kch),
        Indicator::new("volatility_kcl", kcl),
        Indicator::new("volatility_kcw", kcw),
        Indicator::new("volatility_kcp", kcp),
        Indicator::new("volatility_kchi", kchi),
        Indicator::new("volatility_kcli", kcli),
        Indicator::new("volatility_dcl", dcl),
        Indicator::new("volatility_dch", dch),
        Indicator::new("volatility_dcm", dcm),
        Indicator::new("volatility_dcw", dcw),
        Indicator::new("volatility_dcp", dcp),
        Indicator::new("volatility_atr", atr),
        Indicator::new("volatility_ui", ui),
    ]
}
