//! Descriptive statistics over return series.

use crate::error::{require_len, RiskError};

pub fn mean(values: &[f64]) -> Result<f64, RiskError> {
    require_len("mean", values, 1)?;
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Variance with `ddof` delta degrees of freedom (0 = population, 1 = sample).
pub fn variance(values: &[f64], ddof: usize) -> Result<f64, RiskError> {
    require_len("variance", values, ddof + 1)?;
    let m = mean(values)?;
    let ss = values.iter().map(|v| (v - m).powi(2)).sum::<f64>();
    Ok(ss / (values.len() - ddof) as f64)
}

pub fn std_dev(values: &[f64], ddof: usize) -> Result<f64, RiskError> {
    variance(values, ddof).map(f64::sqrt)
}

fn central_moments(values: &[f64]) -> Result<(f64, f64, f64), RiskError> {
    let m = mean(values)?;
    let n = values.len() as f64;
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for v in values {
        let d = v - m;
        m2 += d * d;
        m3 += d * d * d;
        m4 += d * d * d * d;
    }
    Ok((m2 / n, m3 / n, m4 / n))
}

/// Biased (Fisher-Pearson) sample skewness. `None` for a constant series.
pub fn skewness(values: &[f64]) -> Result<Option<f64>, RiskError> {
    require_len("skewness", values, 2)?;
    let (m2, m3, _) = central_moments(values)?;
    Ok((m2 > 0.0).then(|| m3 / m2.powf(1.5)))
}

/// Biased excess kurtosis (normal = 0). `None` for a constant series.
pub fn excess_kurtosis(values: &[f64]) -> Result<Option<f64>, RiskError> {
    require_len("kurtosis", values, 2)?;
    let (m2, _, m4) = central_moments(values)?;
    Ok((m2 > 0.0).then(|| m4 / (m2 * m2) - 3.0))
}

/// The `q`-quantile (`q` in `[0, 1]`) with linear interpolation between the
/// two nearest ranks.
pub fn percentile(values: &[f64], q: f64) -> Result<f64, RiskError> {
    require_len("percentile", values, 1)?;
    if !(0.0..=1.0).contains(&q) {
        return Err(RiskError::InvalidParameters(format!(
            "quantile must be within [0, 1], got {q}"
        )));
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = q * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    Ok(sorted[lower] + fraction * (sorted[upper] - sorted[lower]))
}

fn check_lengths(a: &[f64], b: &[f64]) -> Result<(), RiskError> {
    if a.len() != b.len() {
        return Err(RiskError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(())
}

/// Sample covariance.
pub fn covariance(a: &[f64], b: &[f64]) -> Result<f64, RiskError> {
    check_lengths(a, b)?;
    require_len("covariance", a, 2)?;
    let (ma, mb) = (mean(a)?, mean(b)?);
    let sum = a.iter().zip(b).map(|(x, y)| (x - ma) * (y - mb)).sum::<f64>();
    Ok(sum / (a.len() - 1) as f64)
}

/// Pearson correlation coefficient. `None` when either series is constant.
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> Result<Option<f64>, RiskError> {
    let cov = covariance(a, b)?;
    let (sa, sb) = (std_dev(a, 1)?, std_dev(b, 1)?);
    if sa == 0.0 || sb == 0.0 {
        return Ok(None);
    }
    Ok(Some((cov / (sa * sb)).clamp(-1.0, 1.0)))
}

/// Pairwise Pearson correlations. Entry `[i][j]` correlates `series[i]` with `series[j]`.
pub fn correlation_matrix<S: AsRef<[f64]>>(series: &[S]) -> Result<Vec<Vec<Option<f64>>>, RiskError> {
    let n = series.len();
    let mut matrix = vec![vec![None; n]; n];
    for i in 0..n {
        for j in i..n {
            let rho = pearson_correlation(series[i].as_ref(), series[j].as_ref())?;
            matrix[i][j] = rho;
            matrix[j][i] = rho;
        }
    }
    Ok(matrix)
}

/// Sensitivity of `asset` returns to `benchmark` returns.
pub fn beta(asset: &[f64], benchmark: &[f64]) -> Result<Option<f64>, RiskError> {
    let cov = covariance(asset, benchmark)?;
    let var = variance(benchmark, 1)?;
    Ok((var > 0.0).then(|| cov / var))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn variance_population_and_sample() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(variance(&values, 0).unwrap(), 4.0);
        assert_relative_eq!(std_dev(&values, 0).unwrap(), 2.0);
        assert_relative_eq!(variance(&values, 1).unwrap(), 32.0 / 7.0, epsilon = 1e-12);
    }

    #[test]
    fn sample_variance_needs_two_values() {
        assert!(variance(&[1.0], 1).is_err());
        assert!(mean(&[]).is_err());
    }

    #[rstest]
    #[case(0.0, 1.0)]
    #[case(0.25, 1.75)]
    #[case(0.5, 2.5)]
    #[case(1.0, 4.0)]
    fn percentile_interpolates_linearly(#[case] q: f64, #[case] expected: f64) {
        assert_relative_eq!(percentile(&[4.0, 1.0, 3.0, 2.0], q).unwrap(), expected);
    }

    #[test]
    fn percentile_rejects_out_of_range_quantiles() {
        assert!(percentile(&[1.0], 1.5).is_err());
    }

    #[test]
    fn symmetric_series_has_zero_skew() {
        let skew = skewness(&[-2.0, -1.0, 0.0, 1.0, 2.0]).unwrap().unwrap();
        assert_relative_eq!(skew, 0.0, epsilon = 1e-12);
        assert_eq!(skewness(&[1.0, 1.0, 1.0]).unwrap(), None);
    }

    #[test]
    fn two_point_distribution_kurtosis() {
        // m2 = 1, m4 = 1 for +/-1, so excess kurtosis is -2
        let kurt = excess_kurtosis(&[-1.0, 1.0, -1.0, 1.0]).unwrap().unwrap();
        assert_relative_eq!(kurt, -2.0, epsilon = 1e-12);
    }

    #[test]
    fn correlation_of_linear_series() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [2.0, 4.0, 6.0, 8.0];
        let c = [4.0, 3.0, 2.0, 1.0];
        assert_relative_eq!(pearson_correlation(&a, &b).unwrap().unwrap(), 1.0);
        assert_relative_eq!(pearson_correlation(&a, &c).unwrap().unwrap(), -1.0);
        assert_eq!(pearson_correlation(&a, &[5.0; 4]).unwrap(), None);
    }

    #[test]
    fn correlation_requires_equal_lengths() {
        assert_eq!(
            pearson_correlation(&[1.0, 2.0], &[1.0, 2.0, 3.0]),
            Err(RiskError::LengthMismatch { left: 2, right: 3 })
        );
    }

    #[test]
    fn correlation_matrix_is_symmetric_with_unit_diagonal() {
        let series = vec![vec![1.0, 2.0, 3.0, 5.0], vec![2.0, 1.0, 4.0, 3.0], vec![9.0, 7.0, 4.0, 1.0]];
        let matrix = correlation_matrix(&series).unwrap();
        for i in 0..3 {
            assert_relative_eq!(matrix[i][i].unwrap(), 1.0, epsilon = 1e-12);
            for j in 0..3 {
                assert_eq!(matrix[i][j], matrix[j][i]);
            }
        }
    }

    #[test]
    fn beta_of_scaled_series() {
        let bench = [0.01, -0.02, 0.015, 0.003];
        let asset: Vec<f64> = bench.iter().map(|r| 1.5 * r).collect();
        assert_relative_eq!(beta(&asset, &bench).unwrap().unwrap(), 1.5, epsilon = 1e-12);
    }
}
