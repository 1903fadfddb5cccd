// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (SMA), an upper band (SMA + k*σ),
// and a lower band (SMA - k*σ), where σ is the rolling *sample* standard
// deviation (n - 1 denominator) over the same window as the SMA.
//
// The first n - 1 points of every band are undefined.  With n == 1 the middle
// band equals the close while σ of a single sample is undefined, so the outer
// bands are undefined everywhere.
// =============================================================================

use serde::Serialize;

use super::{finite, Series};

/// The three bands, each aligned with the input closes.
#[derive(Debug, Clone, Serialize)]
pub struct BollingerSeries {
    pub upper: Series,
    pub mid: Series,
    pub lower: Series,
}

/// Rolling simple moving average over a trailing window of `period` values.
///
/// Windows containing a non-finite value are undefined.
pub fn rolling_mean(values: &[f64], period: usize) -> Series {
    rolling(values, period, |w| Some(w.iter().sum::<f64>() / w.len() as f64))
}

/// Rolling sample standard deviation over a trailing window of `period`.
pub fn rolling_std(values: &[f64], period: usize) -> Series {
    rolling(values, period, |w| {
        if w.len() < 2 {
            return None;
        }
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        let ss: f64 = w.iter().map(|x| (x - mean).powi(2)).sum();
        Some((ss / (w.len() - 1) as f64).sqrt())
    })
}

fn rolling<F>(values: &[f64], period: usize, f: F) -> Series
where
    F: Fn(&[f64]) -> Option<f64>,
{
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }
    for (i, window) in values.windows(period).enumerate() {
        if window.iter().all(|v| v.is_finite()) {
            out[i + period - 1] = f(window).and_then(finite);
        }
    }
    out
}

/// Calculate Bollinger Bands for the given closing prices.
///
/// - `mid`   = SMA(`period`)
/// - `upper` = mid + `num_std` * σ
/// - `lower` = mid - `num_std` * σ
///
/// `period == 0` yields all-undefined bands.
pub fn bollinger_bands(closes: &[f64], period: usize, num_std: f64) -> BollingerSeries {
    let mid = rolling_mean(closes, period);
    let std = rolling_std(closes, period);

    let (upper, lower): (Series, Series) = mid
        .iter()
        .zip(std.iter())
        .map(|(m, s)| match (m, s) {
            (Some(m), Some(s)) => (finite(m + num_std * s), finite(m - num_std * s)),
            _ => (None, None),
        })
        .unzip();

    BollingerSeries { upper, mid, lower }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_closes() -> Vec<f64> {
        vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 44.18, 44.22, 44.57, 43.42, 42.66, 43.13,
        ]
    }

    #[test]
    fn warm_up_is_undefined() {
        let bb = bollinger_bands(&sample_closes(), 5, 2.0);
        for i in 0..4 {
            assert!(bb.mid[i].is_none());
            assert!(bb.upper[i].is_none());
            assert!(bb.lower[i].is_none());
        }
        assert!(bb.mid[4].is_some());
        assert_eq!(bb.mid.len(), sample_closes().len());
    }

    #[test]
    fn band_width_is_twice_k_sigma() {
        let closes = sample_closes();
        let (n, k) = (5, 2.5);
        let bb = bollinger_bands(&closes, n, k);
        let std = rolling_std(&closes, n);
        for t in (n - 1)..closes.len() {
            let width = bb.upper[t].unwrap() - bb.lower[t].unwrap();
            assert!((width - 2.0 * k * std[t].unwrap()).abs() < 1e-9);

            let sma = closes[t + 1 - n..=t].iter().sum::<f64>() / n as f64;
            assert!((bb.mid[t].unwrap() - sma).abs() < 1e-9);
        }
    }

    #[test]
    fn sample_standard_deviation() {
        // Sample σ of [2, 4, 4, 4, 5, 5, 7, 9] is sqrt(32 / 7).
        let closes = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let std = rolling_std(&closes, 8);
        assert!((std[7].unwrap() - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn flat_series_has_zero_width() {
        let bb = bollinger_bands(&[100.0; 30], 20, 2.0);
        for t in 19..30 {
            assert_eq!(bb.upper[t], Some(100.0));
            assert_eq!(bb.mid[t], Some(100.0));
            assert_eq!(bb.lower[t], Some(100.0));
        }
    }

    #[test]
    fn period_one_leaves_outer_bands_undefined() {
        let closes = [1.0, 2.0, 3.0];
        let bb = bollinger_bands(&closes, 1, 2.0);
        assert_eq!(bb.mid, vec![Some(1.0), Some(2.0), Some(3.0)]);
        assert!(bb.upper.iter().all(Option::is_none));
        assert!(bb.lower.iter().all(Option::is_none));
    }

    #[test]
    fn period_zero_or_too_long_is_undefined() {
        let closes = [1.0, 2.0, 3.0];
        assert!(bollinger_bands(&closes, 0, 2.0).mid.iter().all(Option::is_none));
        let bb = bollinger_bands(&closes, 10, 2.0);
        assert_eq!(bb.upper.len(), 3);
        assert!(bb.upper.iter().all(Option::is_none));
    }

    #[test]
    fn nan_close_poisons_only_its_windows() {
        let closes = [1.0, 2.0, f64::NAN, 4.0, 5.0, 6.0];
        let bb = bollinger_bands(&closes, 2, 1.0);
        assert!(bb.mid[2].is_none());
        assert!(bb.mid[3].is_none());
        assert_eq!(bb.mid[4], Some(4.5));
    }
}
