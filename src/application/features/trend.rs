//! Trend indicators.

use super::series::*;
use super::{Indicator, Ohlcv};
use ta::Next;
use ta::indicators::{
    ExponentialMovingAverage, MovingAverageConvergenceDivergence, SimpleMovingAverage,
};

const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;
const VORTEX_WINDOW: usize = 14;
const TRIX_WINDOW: usize = 15;
const MASS_FAST: usize = 9;
const MASS_SLOW: usize = 25;
const DPO_WINDOW: usize = 20;
const KST_ROC: [usize; 4] = [10, 15, 20, 30];
const KST_SMA: [usize; 4] = [10, 10, 10, 15];
const KST_SIGNAL: usize = 9;
const ICHIMOKU_CONV: usize = 9;
const ICHIMOKU_BASE: usize = 26;
const ICHIMOKU_SPAN_B: usize = 52;
const ADX_WINDOW: usize = 14;
const CCI_WINDOW: usize = 20;
const CCI_CONSTANT: f64 = 0.015;
const AROON_WINDOW: usize = 25;

/// ADX with Wilder smoothing: the first `period` true ranges and directional
/// moves are summed, then smoothed recursively.
struct ManualAdx {
    period: usize,
    prev: Option<(f64, f64, f64)>,
    count: usize,
    tr_sum: f64,
    plus_dm_sum: f64,
    minus_dm_sum: f64,
    adx_smooth: f64,
}

/// One ADX step: (adx, +DI, -DI), gaps until the first window completes.
type AdxStep = (f64, f64, f64);

impl ManualAdx {
    fn new(period: usize) -> Self {
        Self {
            period,
            prev: None,
            count: 0,
            tr_sum: 0.0,
            plus_dm_sum: 0.0,
            minus_dm_sum: 0.0,
            adx_smooth: 0.0,
        }
    }

    fn next(&mut self, high: f64, low: f64, close: f64) -> AdxStep {
        let Some((prev_high, prev_low, prev_close)) = self.prev.replace((high, low, close)) else {
            return (f64::NAN, f64::NAN, f64::NAN);
        };

        let tr = (high - low)
            .max((high - prev_close).abs())
            .max((low - prev_close).abs());
        let up_move = high - prev_high;
        let down_move = prev_low - low;
        let plus_dm = if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        };
        let minus_dm = if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        };

        self.count += 1;
        let n = self.period as f64;
        if self.count <= self.period {
            self.tr_sum += tr;
            self.plus_dm_sum += plus_dm;
            self.minus_dm_sum += minus_dm;
        } else {
            self.tr_sum = self.tr_sum - (self.tr_sum / n) + tr;
            self.plus_dm_sum = self.plus_dm_sum - (self.plus_dm_sum / n) + plus_dm;
            self.minus_dm_sum = self.minus_dm_sum - (self.minus_dm_sum / n) + minus_dm;
        }

        if self.count < self.period || self.tr_sum <= 0.0 {
            return (f64::NAN, f64::NAN, f64::NAN);
        }

        let plus_di = 100.0 * self.plus_dm_sum / self.tr_sum;
        let minus_di = 100.0 * self.minus_dm_sum / self.tr_sum;
        let sum_di = plus_di + minus_di;
        let dx = if sum_di > 0.0 {
            100.0 * (plus_di - minus_di).abs() / sum_di
        } else {
            0.0
        };

        self.adx_smooth = if self.count == self.period {
            dx
        } else {
            (self.adx_smooth * (n - 1.0) + dx) / n
        };

        (self.adx_smooth, plus_di, minus_di)
    }
}

pub(super) fn compute(input: &Ohlcv) -> Vec<Indicator> {
    let n = input.len();
    let close = &input.close;
    let high = &input.high;
    let low = &input.low;

    let (mut macd, mut macd_signal, mut macd_diff) = (nan_vec(n), nan_vec(n), nan_vec(n));
    if let Ok(mut ind) = MovingAverageConvergenceDivergence::new(MACD_FAST, MACD_SLOW, MACD_SIGNAL) {
        let mut seen = 0usize;
        for (i, c) in close.iter().enumerate() {
            if !c.is_finite() {
                continue;
            }
            let out = ind.next(*c);
            seen += 1;
            if seen >= MACD_SLOW {
                macd[i] = out.macd;
            }
            if seen >= MACD_SLOW + MACD_SIGNAL - 1 {
                macd_signal[i] = out.signal;
                macd_diff[i] = out.histogram;
            }
        }
    }

    let sma_fast = SimpleMovingAverage::new(MACD_FAST)
        .map(|ind| stream(ind, close, MACD_FAST))
        .unwrap_or_else(|_| nan_vec(n));
    let sma_slow = SimpleMovingAverage::new(MACD_SLOW)
        .map(|ind| stream(ind, close, MACD_SLOW))
        .unwrap_or_else(|_| nan_vec(n));
    let ema_fast = ExponentialMovingAverage::new(MACD_FAST)
        .map(|ind| stream(ind, close, MACD_FAST))
        .unwrap_or_else(|_| nan_vec(n));
    let ema_slow = ExponentialMovingAverage::new(MACD_SLOW)
        .map(|ind| stream(ind, close, MACD_SLOW))
        .unwrap_or_else(|_| nan_vec(n));

    // Vortex
    let prev_close = shift(close, 1);
    let true_range: Vec<f64> = (0..n)
        .map(|i| high[i].max(prev_close[i]) - low[i].min(prev_close[i]))
        .collect();
    let tr_sum = rolling_sum(&true_range, VORTEX_WINDOW);
    let vm_plus = zip_with(high, &shift(low, 1), |h, l| (h - l).abs());
    let vm_minus = zip_with(low, &shift(high, 1), |l, h| (l - h).abs());
    let vortex_pos = safe_div(&rolling_sum(&vm_plus, VORTEX_WINDOW), &tr_sum);
    let vortex_neg = safe_div(&rolling_sum(&vm_minus, VORTEX_WINDOW), &tr_sum);
    let vortex_diff = zip_with(&vortex_pos, &vortex_neg, |p, m| p - m);

    let triple = ema(&ema(&ema(close, TRIX_WINDOW), TRIX_WINDOW), TRIX_WINDOW);
    let trix = map(&pct_change(&triple, 1), |v| v * 100.0);

    let amplitude = zip_with(high, low, |h, l| h - l);
    let amp_ema = ema(&amplitude, MASS_FAST);
    let amp_ema2 = ema(&amp_ema, MASS_FAST);
    let mass_index = rolling_sum(&safe_div(&amp_ema, &amp_ema2), MASS_SLOW);

    let dpo = zip_with(
        &shift(close, DPO_WINDOW / 2 + 1),
        &rolling_mean(close, DPO_WINDOW),
        |lagged, mean| lagged - mean,
    );

    let mut kst = vec![0.0; n];
    for (weight, (roc, win)) in KST_ROC.iter().zip(KST_SMA).enumerate() {
        let smoothed = rolling_mean(&pct_change(close, *roc), win);
        for (acc, v) in kst.iter_mut().zip(smoothed) {
            *acc += (weight as f64 + 1.0) * v;
        }
    }
    let kst = map(&kst, |v| v * 100.0);
    let kst_sig = rolling_mean(&kst, KST_SIGNAL);
    let kst_diff = zip_with(&kst, &kst_sig, |k, s| k - s);

    let midpoint = |w: usize| {
        zip_with(&rolling_max(high, w), &rolling_min(low, w), |h, l| {
            (h + l) / 2.0
        })
    };
    let ichimoku_conv = midpoint(ICHIMOKU_CONV);
    let ichimoku_base = midpoint(ICHIMOKU_BASE);
    let ichimoku_a = zip_with(&ichimoku_conv, &ichimoku_base, |c, b| (c + b) / 2.0);
    let ichimoku_b = midpoint(ICHIMOKU_SPAN_B);

    let mut adx_ind = ManualAdx::new(ADX_WINDOW);
    let (mut adx, mut adx_pos, mut adx_neg) = (nan_vec(n), nan_vec(n), nan_vec(n));
    for i in 0..n {
        if !(high[i].is_finite() && low[i].is_finite() && close[i].is_finite()) {
            continue;
        }
        (adx[i], adx_pos[i], adx_neg[i]) = adx_ind.next(high[i], low[i], close[i]);
    }

    let typical = input.typical_price();
    let cci = safe_div(
        &zip_with(&typical, &rolling_mean(&typical, CCI_WINDOW), |t, m| t - m),
        &map(&rolling_mad(&typical, CCI_WINDOW), |d| CCI_CONSTANT * d),
    );

    let aroon_window = AROON_WINDOW + 1;
    let aroon_up = map(&bars_since_max(high, aroon_window), |since| {
        100.0 * (AROON_WINDOW as f64 - since) / AROON_WINDOW as f64
    });
    let aroon_down = map(&bars_since_min(low, aroon_window), |since| {
        100.0 * (AROON_WINDOW as f64 - since) / AROON_WINDOW as f64
    });
    let aroon_ind = zip_with(&aroon_up, &aroon_down, |u, d| u - d);

    vec![
        Indicator::new("trend_macd", macd),
        Indicator::new("trend_macd_signal", macd_signal),
        Indicator::new("trend_macd_diff", macd_diff),
        Indicator::new("trend_sma_fast", sma_fast),
        Indicator::new("trend_sma_slow", sma_slow),
        Indicator::new("trend_ema_fast", ema_fast),
        Indicator::new("trend_ema_slow", ema_slow),
        Indicator::new("trend_vortex_ind_pos", vortex_pos),
        Indicator::new("trend_vortex_ind_neg", vortex_neg),
        Indicator::new("trend_vortex_ind_diff", vortex_diff),
        Indicator::new("trend_trix", trix),
        Indicator::new("trend_mass_index", mass_index),
        Indicator::new("trend_dpo", dpo),
        Indicator::new("trend_kst", kst),
        Indicator::new("trend_kst_sig", kst_sig),
        Indicator::new("trend_kst_diff", kst_diff),
        Indicator::new("trend_ichimoku_conv", ichimoku_conv),
        Indicator::new("trend_ichimoku_base", ichimoku_base),
        Indicator::new("trend_ichimoku_a", ichimoku_a),
        Indicator::new("trend_ichimoku_b", ichimoku_b),
        Indicator::new("trend_adx", adx),
        Indicator::new("trend_adx_pos", adx_pos),
        Indicator::new("trend_adx_neg", adx_neg),
        Indicator::new("trend_cci", cci),
        Indicator::new("trend_aroon_up", aroon_up),
        Indicator::new("trend_aroon_down", aroon_down),
        Indicator::new("trend_aroon_ind", aroon_ind),
    ]
}
