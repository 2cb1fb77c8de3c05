//! Return-based columns. Computed for completeness of the battery and
//! dropped before the table reaches a model.

use super::series::*;
use super::{Indicator, Ohlcv};

pub(super) fn compute(input: &Ohlcv) -> Vec<Indicator> {
    let close = &input.close;

    let daily_return = map(&pct_change(close, 1), |r| r * 100.0);
    let daily_log_return = map(
        &zip_with(close, &shift(close, 1), |c, p| (c / p).ln()),
        |r| r * 100.0,
    );
    let cumulative_return = match close.first() {
        Some(first) if *first != 0.0 => map(close, |c| (c / first - 1.0) * 100.0),
        _ => nan_vec(close.len()),
    };

    vec![
        Indicator::new("others_dr", daily_return),
        Indicator::new("others_dlr", daily_log_return),
        Indicator::new("others_cr", cumulative_return),
    ]
}
