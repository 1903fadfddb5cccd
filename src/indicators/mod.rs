// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators drawn by the
// dashboard.  Every function returns a full-length `Series` aligned with its
// input: an index that cannot be computed (warm-up window, degenerate
// parameter, non-finite input) is `None` and is plotted as a gap.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;

pub use bollinger::bollinger_bands;
pub use macd::calculate_macd;
pub use rsi::calculate_rsi;

/// A derived series. `None` marks an undefined point.
pub type Series = Vec<Option<f64>>;

/// Lift raw closes into a `Series`, treating non-finite values as undefined.
pub fn to_series(values: &[f64]) -> Series {
    values.iter().map(|&v| finite(v)).collect()
}

/// `Some(v)` when `v` is finite, `None` otherwise.
#[inline]
pub(crate) fn finite(v: f64) -> Option<f64> {
    if v.is_finite() {
        Some(v)
    } else {
        None
    }
}
