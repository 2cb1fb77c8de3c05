//! Momentum oscillators.

use super::series::*;
use super::{Indicator, Ohlcv};
use ta::indicators::{FastStochastic, RateOfChange, RelativeStrengthIndex};

const RSI_WINDOW: usize = 14;
const STOCH_RSI_WINDOW: usize = 14;
const STOCH_RSI_SMOOTH: usize = 3;
const TSI_SLOW: usize = 25;
const TSI_FAST: usize = 13;
const UO_WINDOWS: [usize; 3] = [7, 14, 28];
const UO_WEIGHTS: [f64; 3] = [4.0, 2.0, 1.0];
const STOCH_WINDOW: usize = 14;
const STOCH_SMOOTH: usize = 3;
const WR_WINDOW: usize = 14;
const AO_FAST: usize = 5;
const AO_SLOW: usize = 34;
const ROC_WINDOW: usize = 12;
const PPO_FAST: usize = 12;
const PPO_SLOW: usize = 26;
const PPO_SIGNAL: usize = 9;
const KAMA_WINDOW: usize = 10;
const KAMA_FAST: f64 = 2.0;
const KAMA_SLOW: f64 = 30.0;

/// Percentage price oscillator over any series: (line, signal, histogram).
fn percentage_oscillator(x: &[f64]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let fast = ema(x, PPO_FAST);
    let slow = ema(x, PPO_SLOW);
    let line = safe_div(&zip_with(&fast, &slow, |f, s| (f - s) * 100.0), &slow);
    let signal = ema(&line, PPO_SIGNAL);
    let hist = zip_with(&line, &signal, |l, s| l - s);
    (line, signal, hist)
}

/// Kaufman adaptive moving average, seeded with the close at the first bar
/// where the efficiency ratio is defined.
fn kama(close: &[f64]) -> Vec<f64> {
    let n = close.len();
    let change = map(&diff(close, KAMA_WINDOW), f64::abs);
    let volatility = rolling_sum(&map(&diff(close, 1), f64::abs), KAMA_WINDOW);
    let efficiency = safe_div(&change, &volatility);

    let fast_sc = 2.0 / (KAMA_FAST + 1.0);
    let slow_sc = 2.0 / (KAMA_SLOW + 1.0);

    let mut out = nan_vec(n);
    let mut state: Option<f64> = None;
    for i in 0..n {
        let er = efficiency[i];
        if !er.is_finite() {
            if state.is_none() && change[i] == 0.0 && volatility[i] == 0.0 {
                // Flat window: no movement to adapt to
                state = Some(close[i]);
                out[i] = close[i];
            } else if let Some(prev) = state {
                out[i] = prev;
            }
            continue;
        }
        let sc = (er * (fast_sc - slow_sc) + slow_sc).powi(2);
        let next = match state {
            Some(prev) => prev + sc * (close[i] - prev),
            None => close[i],
        };
        state = Some(next);
        out[i] = next;
    }
    out
}

pub(super) fn compute(input: &Ohlcv) -> Vec<Indicator> {
    let n = input.len();
    let close = &input.close;
    let high = &input.high;
    let low = &input.low;

    let rsi = RelativeStrengthIndex::new(RSI_WINDOW)
        .map(|ind| stream(ind, close, RSI_WINDOW))
        .unwrap_or_else(|_| nan_vec(n));

    let rsi_min = rolling_min(&rsi, STOCH_RSI_WINDOW);
    let rsi_max = rolling_max(&rsi, STOCH_RSI_WINDOW);
    let stoch_rsi = safe_div(
        &zip_with(&rsi, &rsi_min, |r, lo| r - lo),
        &zip_with(&rsi_max, &rsi_min, |hi, lo| hi - lo),
    );
    let stoch_rsi_k = rolling_mean(&stoch_rsi, STOCH_RSI_SMOOTH);
    let stoch_rsi_d = rolling_mean(&stoch_rsi_k, STOCH_RSI_SMOOTH);

    let price_change = diff(close, 1);
    let smoothed = ema(&ema(&price_change, TSI_SLOW), TSI_FAST);
    let smoothed_abs = ema(&ema(&map(&price_change, f64::abs), TSI_SLOW), TSI_FAST);
    let tsi = safe_div(&map(&smoothed, |v| v * 100.0), &smoothed_abs);

    // Ultimate oscillator
    let prev_close = shift(close, 1);
    let buying_pressure: Vec<f64> = (0..n).map(|i| close[i] - low[i].min(prev_close[i])).collect();
    let true_range: Vec<f64> = (0..n)
        .map(|i| high[i].max(prev_close[i]) - low[i].min(prev_close[i]))
        .collect();
    let mut uo = vec![0.0; n];
    for (window, weight) in UO_WINDOWS.iter().zip(UO_WEIGHTS) {
        let avg = safe_div(
            &rolling_sum(&buying_pressure, *window),
            &rolling_sum(&true_range, *window),
        );
        for (acc, a) in uo.iter_mut().zip(avg) {
            *acc += weight * a;
        }
    }
    let weight_sum: f64 = UO_WEIGHTS.iter().sum();
    let uo = map(&uo, |v| 100.0 * v / weight_sum);

    let stoch = FastStochastic::new(STOCH_WINDOW)
        .map(|ind| stream_bars(ind, &input.items, STOCH_WINDOW))
        .unwrap_or_else(|_| nan_vec(n));
    let stoch_signal = rolling_mean(&stoch, STOCH_SMOOTH);

    let highest = rolling_max(high, WR_WINDOW);
    let lowest = rolling_min(low, WR_WINDOW);
    let wr = safe_div(
        &(0..n).map(|i| (highest[i] - close[i]) * -100.0).collect::<Vec<_>>(),
        &zip_with(&highest, &lowest, |h, l| h - l),
    );

    let median = zip_with(high, low, |h, l| (h + l) / 2.0);
    let ao = zip_with(
        &rolling_mean(&median, AO_FAST),
        &rolling_mean(&median, AO_SLOW),
        |f, s| f - s,
    );

    let roc = RateOfChange::new(ROC_WINDOW)
        .map(|ind| stream(ind, close, ROC_WINDOW + 1))
        .unwrap_or_else(|_| nan_vec(n));

    let (ppo, ppo_signal, ppo_hist) = percentage_oscillator(close);
    let (pvo, pvo_signal, pvo_hist) = percentage_oscillator(&input.volume);

    vec![
        Indicator::with_neutral("momentum_rsi", rsi, 50.0),
        Indicator::new("momentum_stoch_rsi", stoch_rsi),
        Indicator::new("momentum_stoch_rsi_k", stoch_rsi_k),
        Indicator::new("momentum_stoch_rsi_d", stoch_rsi_d),
        Indicator::new("momentum_tsi", tsi),
        Indicator::with_neutral("momentum_uo", uo, 50.0),
        Indicator::with_neutral("momentum_stoch", stoch, 50.0),
        Indicator::with_neutral("momentum_stoch_signal", stoch_signal, 50.0),
        Indicator::with_neutral("momentum_wr", wr, -50.0),
        Indicator::new("momentum_ao", ao),
        Indicator::new("momentum_roc", roc),
        Indicator::new("momentum_ppo", ppo),
        Indicator::new("momentum_ppo_signal", ppo_signal),
        Indicator::new("momentum_ppo_hist", ppo_hist),
        Indicator::new("momentum_pvo", pvo),
        Indicator::new("momentum_pvo_signal", pvo_signal),
        Indicator::new("momentum_pvo_hist", pvo_hist),
        Indicator::new("momentum_kama", kama(close)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kama_tracks_trending_close() {
        let close: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let out = kama(&close);

        assert!(out[KAMA_WINDOW - 1].is_nan());
        assert_eq!(out[KAMA_WINDOW], close[KAMA_WINDOW]);
        // Perfectly efficient trend: fast smoothing constant
        let expected = out[KAMA_WINDOW] + (2.0f64 / 3.0).powi(2) * (close[KAMA_WINDOW + 1] - out[KAMA_WINDOW]);
        assert!((out[KAMA_WINDOW + 1] - expected).abs() < 1e-9);
    }

    #[test]
    fn test_percentage_oscillator_flat_series_is_zero() {
        let flat = vec![10.0; 40];
        let (line, signal, hist) = percentage_oscillator(&flat);
        assert_eq!(line[39], 0.0);
        assert_eq!(signal[39], 0.0);
        assert_eq!(hist[39], 0.0);
    }
}
