// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
//   macd      = EMA(close, fast) - EMA(close, slow)
//   signal    = EMA(macd, signal)
//   histogram = macd - signal
//
// All EMAs use the recursive, first-value-seeded form (see `ema.rs`), so every
// line is defined from the first bar onward for clean input.
// =============================================================================

use serde::Serialize;

use super::ema::calculate_ema;
use super::{finite, to_series, Series};

#[derive(Debug, Clone, Serialize)]
pub struct MacdSeries {
    pub macd: Series,
    pub signal: Series,
    pub histogram: Series,
}

/// Compute the MACD line, its signal line and the histogram.
///
/// A zero span anywhere makes the dependent lines undefined; it never panics.
pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let closes = to_series(closes);
    let ema_fast = calculate_ema(&closes, fast);
    let ema_slow = calculate_ema(&closes, slow);

    let macd: Series = ema_fast
        .iter()
        .zip(ema_slow.iter())
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => finite(f - s),
            _ => None,
        })
        .collect();

    let signal_line = calculate_ema(&macd, signal);

    let histogram = macd
        .iter()
        .zip(signal_line.iter())
        .map(|(m, s)| match (m, s) {
            (Some(m), Some(s)) => finite(m - s),
            _ => None,
        })
        .collect();

    MacdSeries {
        macd,
        signal: signal_line,
        histogram,
    }
}
