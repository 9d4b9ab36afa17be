use crate::error::{require_period, IndicatorError};
use crate::moving_average::ema;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use ta::{Next, Reset};

/// How average gains and losses are smoothed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RsiSmoothing {
    /// Plain mean of the trailing `period` deltas (Cutler's RSI).
    #[default]
    Simple,
    /// Wilder's recursive smoothing, seeded with the simple mean.
    Wilder,
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 { 50.0 } else { 100.0 }
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

/// Relative Strength Index.
///
/// The first defined value is at index `period`, since `period` price deltas
/// are needed.
pub fn rsi(
    values: &[f64],
    period: usize,
    smoothing: RsiSmoothing,
) -> Result<Vec<Option<f64>>, IndicatorError> {
    require_period("period", period, 1)?;

    let mut out = vec![None; values.len()];
    if values.len() <= period {
        return Ok(out);
    }

    let gains: Vec<f64> = values.windows(2).map(|w| (w[1] - w[0]).max(0.0)).collect();
    let losses: Vec<f64> = values.windows(2).map(|w| (w[0] - w[1]).max(0.0)).collect();
    let n = period as f64;

    match smoothing {
        RsiSmoothing::Simple => {
            for t in period..values.len() {
                // delta index d covers values[d]..values[d + 1]
                let window = t - period..t;
                let avg_gain = gains[window.clone()].iter().sum::<f64>() / n;
                let avg_loss = losses[window].iter().sum::<f64>() / n;
                out[t] = Some(rsi_from_averages(avg_gain, avg_loss));
            }
        }
        RsiSmoothing::Wilder => {
            let mut avg_gain = gains[..period].iter().sum::<f64>() / n;
            let mut avg_loss = losses[..period].iter().sum::<f64>() / n;
            out[period] = Some(rsi_from_averages(avg_gain, avg_loss));
            for t in period + 1..values.len() {
                avg_gain = (avg_gain * (n - 1.0) + gains[t - 1]) / n;
                avg_loss = (avg_loss * (n - 1.0) + losses[t - 1]) / n;
                out[t] = Some(rsi_from_averages(avg_gain, avg_loss));
            }
        }
    }
    Ok(out)
}

/// Streaming simple RSI, value-for-value identical to
/// [`rsi`] with [`RsiSmoothing::Simple`].
#[derive(Debug, Clone)]
pub struct RollingRsi {
    period: usize,
    prev: Option<f64>,
    gains: VecDeque<f64>,
    losses: VecDeque<f64>,
}

impl RollingRsi {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        require_period("period", period, 1)?;
        Ok(Self {
            period,
            prev: None,
            gains: VecDeque::with_capacity(period),
            losses: VecDeque::with_capacity(period),
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Next<f64> for RollingRsi {
    type Output = Option<f64>;

    fn next(&mut self, input: f64) -> Self::Output {
        let Some(prev) = self.prev.replace(input) else {
            return None;
        };

        if self.gains.len() == self.period {
            self.gains.pop_front();
            self.losses.pop_front();
        }
        self.gains.push_back((input - prev).max(0.0));
        self.losses.push_back((prev - input).max(0.0));

        if self.gains.len() < self.period {
            return None;
        }
        let n = self.period as f64;
        Some(rsi_from_averages(
            self.gains.iter().sum::<f64>() / n,
            self.losses.iter().sum::<f64>() / n,
        ))
    }
}

impl Reset for RollingRsi {
    fn reset(&mut self) {
        self.prev = None;
        self.gains.clear();
        self.losses.clear();
    }
}

/// The three MACD series, each the length of the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Macd {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// Moving Average Convergence Divergence: `ema(fast) - ema(slow)`, its
/// `signal`-span EMA, and their difference.
pub fn macd(values: &[f64], fast: usize, slow: usize, signal: usize) -> Result<Macd, IndicatorError> {
    if fast >= slow {
        return Err(IndicatorError::InvalidParameter {
            name: "fast",
            reason: format!("fast span {fast} must be shorter than slow span {slow}"),
        });
    }
    let fast_ema = ema(values, fast)?;
    let slow_ema = ema(values, slow)?;
    let line: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();
    let signal_line = ema(&line, signal)?;
    let histogram = line.iter().zip(&signal_line).map(|(m, s)| m - s).collect();

    Ok(Macd {
        macd: line,
        signal: signal_line,
        histogram,
    })
}
