use crate::error::{require_period, IndicatorError};

/// Simple moving average over a trailing window.
///
/// The first `period - 1` entries are `None`.
pub fn sma(values: &[f64], period: usize) -> Result<Vec<Option<f64>>, IndicatorError> {
    require_period("period", period, 1)?;

    let mut out = vec![None; values.len()];
    let mut window_sum = 0.0;
    for (i, value) in values.iter().enumerate() {
        window_sum += value;
        if i >= period {
            window_sum -= values[i - period];
        }
        if i + 1 >= period {
            out[i] = Some(window_sum / period as f64);
        }
    }
    Ok(out)
}

/// Exponentially weighted moving average with `alpha = 2 / (span + 1)`.
///
/// Uses the bias-adjusted form: each output is the weighted mean of every
/// value seen so far with weights `(1 - alpha)^age`, so early outputs are not
/// dragged towards the first observation. Defined from the first value.
pub fn ema(values: &[f64], span: usize) -> Result<Vec<f64>, IndicatorError> {
    require_period("span", span, 1)?;

    let decay = 1.0 - 2.0 / (span as f64 + 1.0);
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    Ok(values
        .iter()
        .map(|value| {
            weighted_sum = value + decay * weighted_sum;
            weight_total = 1.0 + decay * weight_total;
            weighted_sum / weight_total
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sma_waits_for_a_full_window() {
        let out = sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 3).unwrap();
        assert_eq!(out, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn sma_rejects_zero_period() {
        assert!(matches!(
            sma(&[1.0], 0),
            Err(IndicatorError::InvalidParameter { name: "period", .. })
        ));
    }

    #[test]
    fn sma_of_short_input_is_all_none() {
        assert_eq!(sma(&[1.0, 2.0], 5).unwrap(), vec![None, None]);
        assert!(sma(&[], 5).unwrap().is_empty());
    }

    #[test]
    fn ema_is_bias_adjusted() {
        // alpha = 0.5: (2 + 0.5 * 1) / (1 + 0.5)
        let out = ema(&[1.0, 2.0], 3).unwrap();
        assert_relative_eq!(out[0], 1.0);
        assert_relative_eq!(out[1], 2.5 / 1.5, epsilon = 1e-12);
    }

    #[test]
    fn ema_of_constant_series_is_constant() {
        let out = ema(&[7.0; 30], 12).unwrap();
        for value in out {
            assert_relative_eq!(value, 7.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn ema_with_span_one_tracks_input() {
        let input = [3.0, 1.0, 4.0, 1.0, 5.0];
        assert_eq!(ema(&input, 1).unwrap(), input.to_vec());
    }
}
