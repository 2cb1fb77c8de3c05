//! Column-wise helpers over `f64` series.
//!
//! Gaps are `NaN`. Rolling windows require every value in the window to be
//! present; a window touching a gap yields a gap.

use statrs::statistics::Statistics;
use ta::DataItem;
use ta::Next;
use ta::indicators::ExponentialMovingAverage;

pub fn nan_vec(n: usize) -> Vec<f64> {
    vec![f64::NAN; n]
}

/// Feeds the present values of `x` through a `ta` indicator. Gaps are not
/// fed and stay gaps; outputs before the `period`-th present value are gaps.
pub fn stream<I: Next<f64, Output = f64>>(mut ind: I, x: &[f64], period: usize) -> Vec<f64> {
    let mut seen = 0usize;
    x.iter()
        .map(|v| {
            if !v.is_finite() {
                return f64::NAN;
            }
            let out = ind.next(*v);
            seen += 1;
            if seen >= period.max(1) { out } else { f64::NAN }
        })
        .collect()
}

/// Same as [`stream`] for indicators that need a whole bar. Unusable bars
/// are skipped.
pub fn stream_bars<I>(mut ind: I, items: &[Option<DataItem>], period: usize) -> Vec<f64>
where
    I: for<'a> Next<&'a DataItem, Output = f64>,
{
    let mut seen = 0usize;
    items
        .iter()
        .map(|item| match item {
            Some(item) => {
                let out = ind.next(item);
                seen += 1;
                if seen >= period.max(1) { out } else { f64::NAN }
            }
            None => f64::NAN,
        })
        .collect()
}

fn rolling<F>(x: &[f64], n: usize, f: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut out = nan_vec(x.len());
    if n == 0 || x.len() < n {
        return out;
    }
    for i in (n - 1)..x.len() {
        let window = &x[i + 1 - n..=i];
        if window.iter().all(|v| v.is_finite()) {
            out[i] = f(window);
        }
    }
    out
}

pub fn rolling_mean(x: &[f64], n: usize) -> Vec<f64> {
    rolling(x, n, |w| w.iter().sum::<f64>() / w.len() as f64)
}

pub fn rolling_sum(x: &[f64], n: usize) -> Vec<f64> {
    rolling(x, n, |w| w.iter().sum())
}

pub fn rolling_max(x: &[f64], n: usize) -> Vec<f64> {
    rolling(x, n, |w| w.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

pub fn rolling_min(x: &[f64], n: usize) -> Vec<f64> {
    rolling(x, n, |w| w.iter().copied().fold(f64::INFINITY, f64::min))
}

/// Root mean square over the window.
pub fn rolling_rms(x: &[f64], n: usize) -> Vec<f64> {
    rolling(x, n, |w| w.quadratic_mean())
}

/// Mean absolute deviation around the window mean.
pub fn rolling_mad(x: &[f64], n: usize) -> Vec<f64> {
    rolling(x, n, |w| {
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        w.iter().map(|v| (v - mean).abs()).sum::<f64>() / w.len() as f64
    })
}

/// Bars elapsed since the window maximum (0 = current bar).
pub fn bars_since_max(x: &[f64], n: usize) -> Vec<f64> {
    rolling(x, n, |w| {
        let mut best = 0;
        for (i, v) in w.iter().enumerate() {
            if *v >= w[best] {
                best = i;
            }
        }
        (w.len() - 1 - best) as f64
    })
}

/// Bars elapsed since the window minimum (0 = current bar).
pub fn bars_since_min(x: &[f64], n: usize) -> Vec<f64> {
    rolling(x, n, |w| {
        let mut best = 0;
        for (i, v) in w.iter().enumerate() {
            if *v <= w[best] {
                best = i;
            }
        }
        (w.len() - 1 - best) as f64
    })
}

/// EMA with span `n` (`alpha = 2 / (n + 1)`), seeded with the first present
/// value.
pub fn ema(x: &[f64], n: usize) -> Vec<f64> {
    match ExponentialMovingAverage::new(n) {
        Ok(ind) => stream(ind, x, n),
        Err(_) => nan_vec(x.len()),
    }
}

/// Value `k` bars earlier; the first `k` positions are gaps.
pub fn shift(x: &[f64], k: usize) -> Vec<f64> {
    let mut out = nan_vec(x.len());
    for i in k..x.len() {
        out[i] = x[i - k];
    }
    out
}

pub fn diff(x: &[f64], k: usize) -> Vec<f64> {
    let prev = shift(x, k);
    zip_with(x, &prev, |a, b| a - b)
}

/// Fractional change over `k` bars.
pub fn pct_change(x: &[f64], k: usize) -> Vec<f64> {
    let prev = shift(x, k);
    zip_with(x, &prev, |a, b| (a - b) / b)
}

pub fn zip_with<F>(a: &[f64], b: &[f64], f: F) -> Vec<f64>
where
    F: Fn(f64, f64) -> f64,
{
    a.iter().zip(b).map(|(x, y)| f(*x, *y)).collect()
}

pub fn map<F>(a: &[f64], f: F) -> Vec<f64>
where
    F: Fn(f64) -> f64,
{
    a.iter().map(|x| f(*x)).collect()
}

/// Running sum that treats gaps as zero.
pub fn cumsum(x: &[f64]) -> Vec<f64> {
    let mut acc = 0.0;
    x.iter()
        .map(|v| {
            if v.is_finite() {
                acc += v;
            }
            acc
        })
        .collect()
}

/// `a / b`, a gap wherever `b` is zero.
pub fn safe_div(a: &[f64], b: &[f64]) -> Vec<f64> {
    zip_with(a, b, |x, y| if y == 0.0 { f64::NAN } else { x / y })
}

/// 1.0 where `pred(a, b)` holds, else 0.0; a gap when either side is a gap.
pub fn indicator<F>(a: &[f64], b: &[f64], pred: F) -> Vec<f64>
where
    F: Fn(f64, f64) -> bool,
{
    zip_with(a, b, |x, y| {
        if x.is_finite() && y.is_finite() {
            if pred(x, y) { 1.0 } else { 0.0 }
        } else {
            f64::NAN
        }
    })
}

/// Forward-fills gaps, then replaces leading gaps with `neutral`.
/// Infinities count as gaps.
pub fn fill_gaps(values: &mut [f64], neutral: f64) {
    let mut last: Option<f64> = None;
    for v in values.iter_mut() {
        if v.is_finite() {
            last = Some(*v);
        } else {
            *v = last.unwrap_or(neutral);
        }
    }
}
