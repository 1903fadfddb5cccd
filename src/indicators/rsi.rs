// =============================================================================
// Relative Strength Index (RSI) — Wilder's Smoothing
// =============================================================================
//
// Step 1 — Price changes: delta_t = close_t - close_{t-1} (undefined at t = 0).
// Step 2 — Split into gains max(delta, 0) and losses max(-delta, 0).
// Step 3 — Smooth both with the recursive EMA, alpha = 1 / period, seeded from
//          the first defined delta.
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// A zero average loss makes RS undefined, so the RSI point is undefined
// (a gap on the chart) rather than 100 or infinity.
// =============================================================================

use super::ema::ewm_recursive;
use super::{finite, Series};

/// Compute the full RSI series for the given `closes` and `period`.
///
/// # Edge cases
/// - Index 0 is always undefined (no prior close).
/// - `period == 0` => every point undefined.
/// - Average loss of zero (flat or only rising) => undefined point.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Series {
    if period == 0 {
        return vec![None; closes.len()];
    }
    let alpha = 1.0 / period as f64;

    let deltas: Series = std::iter::once(None)
        .chain(closes.windows(2).map(|w| finite(w[1] - w[0])))
        .take(closes.len())
        .collect();

    let gains: Series = deltas.iter().map(|d| d.map(|d| d.max(0.0))).collect();
    let losses: Series = deltas.iter().map(|d| d.map(|d| (-d).max(0.0))).collect();

    let avg_gain = ewm_recursive(&gains, alpha);
    let avg_loss = ewm_recursive(&losses, alpha);

    avg_gain
        .iter()
        .zip(avg_loss.iter())
        .map(|(g, l)| match (g, l) {
            (Some(g), Some(l)) => rsi_from_averages(*g, *l),
            _ => None,
        })
        .collect()
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Convert average gain / average loss into an RSI value in [0, 100].
///
/// Returns `None` when the ratio is undefined (zero average loss) or the
/// result is non-finite.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        return None;
    }
    let rs = avg_gain / avg_loss;
    finite(100.0 - 100.0 / (1.0 + rs))
}
