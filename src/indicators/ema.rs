// =============================================================================
// Exponential Moving Average (EMA) — recursive form
// =============================================================================
//
// The recursion is seeded directly from the first defined value, with no
// SMA warm-up and no bias correction:
//
//   y_0 = x_0
//   y_t = y_{t-1} + alpha * (x_t - y_{t-1})
//
// For a span-parameterised EMA, alpha = 2 / (span + 1).  RSI uses the same
// recursion with alpha = 1 / period (Wilder's smoothing).
//
// Leading undefined inputs produce undefined outputs until the first defined
// value arrives.  An undefined input after that yields an undefined output at
// that index; the running average is carried across it unchanged.
// =============================================================================

use super::Series;

/// Run the recursive EMA over `values` with smoothing factor `alpha`.
///
/// An `alpha` outside `(0, 1]` (including NaN) is degenerate and yields an
/// all-undefined series of the same length.
pub fn ewm_recursive(values: &[Option<f64>], alpha: f64) -> Series {
    if !(alpha > 0.0 && alpha <= 1.0) {
        return vec![None; values.len()];
    }

    let mut prev: Option<f64> = None;
    values
        .iter()
        .map(|v| {
            let x = v.filter(|x| x.is_finite())?;
            let y = match prev {
                None => x,
                Some(p) => p + alpha * (x - p),
            };
            prev = Some(y);
            Some(y)
        })
        .collect()
}

/// EMA with a `span` look-back: alpha = 2 / (span + 1).
///
/// `span == 0` yields an all-undefined series.
pub fn calculate_ema(values: &[Option<f64>], span: usize) -> Series {
    if span == 0 {
        return vec![None; values.len()];
    }
    ewm_recursive(values, 2.0 / (span as f64 + 1.0))
}
