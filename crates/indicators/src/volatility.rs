use crate::error::{require_period, IndicatorError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBand {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerBand {
    /// Position of `price` inside the band: 0 at the lower band, 1 at the upper.
    pub fn percent_b(&self, price: f64) -> Option<f64> {
        let width = self.upper - self.lower;
        (width > 0.0).then(|| (price - self.lower) / width)
    }
}

/// Bollinger Bands: a `period` SMA plus and minus `k` sample standard
/// deviations of the same window.
pub fn bollinger_bands(
    values: &[f64],
    period: usize,
    k: f64,
) -> Result<Vec<Option<BollingerBand>>, IndicatorError> {
    require_period("period", period, 2)?;
    if !(k.is_finite() && k >= 0.0) {
        return Err(IndicatorError::InvalidParameter {
            name: "k",
            reason: format!("must be a non-negative number, got {k}"),
        });
    }

    let mut out = vec![None; values.len()];
    for (end, slot) in out.iter_mut().enumerate().skip(period - 1) {
        let window = &values[end + 1 - period..=end];
        let middle = window.iter().sum::<f64>() / period as f64;
        let variance =
            window.iter().map(|v| (v - middle).powi(2)).sum::<f64>() / (period - 1) as f64;
        let offset = k * variance.sqrt();
        *slot = Some(BollingerBand {
            upper: middle + offset,
            middle,
            lower: middle - offset,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bands_use_sample_standard_deviation() {
        let out = bollinger_bands(&[1.0, 2.0, 3.0], 3, 2.0).unwrap();
        assert_eq!(out[..2], [None, None]);
        let band = out[2].unwrap();
        assert_relative_eq!(band.middle, 2.0);
        assert_relative_eq!(band.upper, 4.0);
        assert_relative_eq!(band.lower, 0.0);
        assert_relative_eq!(band.percent_b(3.0).unwrap(), 0.75);
    }

    #[test]
    fn flat_prices_collapse_the_band() {
        let out = bollinger_bands(&[4.0; 25], 20, 2.0).unwrap();
        let band = out[24].unwrap();
        assert_eq!(band.upper, band.lower);
        assert_eq!(band.percent_b(4.0), None);
    }

    #[test]
    fn period_of_one_is_rejected() {
        assert!(bollinger_bands(&[1.0, 2.0], 1, 2.0).is_err());
        assert!(bollinger_bands(&[1.0, 2.0], 2, -1.0).is_err());
    }
}
