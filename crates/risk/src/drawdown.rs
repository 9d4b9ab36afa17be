use crate::error::{require_len, RiskError};
use crate::returns::cumulative_returns;
use serde::{Deserialize, Serialize};

/// The deepest peak-to-trough decline of an equity curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawdownStats {
    /// Positive fraction of the peak lost at the trough; `0.0` for a curve that never declines.
    pub max_drawdown: f64,
    pub peak_index: usize,
    pub trough_index: usize,
    /// First index after the trough at which equity regains the peak, if it ever does.
    pub recovery_index: Option<usize>,
}

/// Fractional distance below the running peak at every point (`0.0` at new highs).
pub fn drawdown_series(equity: &[f64]) -> Result<Vec<f64>, RiskError> {
    require_len("drawdown", equity, 1)?;
    check_equity(equity)?;
    let mut peak = f64::MIN;
    Ok(equity
        .iter()
        .map(|value| {
            peak = peak.max(*value);
            (peak - value) / peak
        })
        .collect())
}

pub fn max_drawdown(equity: &[f64]) -> Result<DrawdownStats, RiskError> {
    require_len("drawdown", equity, 1)?;
    check_equity(equity)?;

    let mut stats = DrawdownStats {
        max_drawdown: 0.0,
        peak_index: 0,
        trough_index: 0,
        recovery_index: None,
    };
    let mut running_peak = 0;
    for (i, value) in equity.iter().enumerate() {
        if *value > equity[running_peak] {
            running_peak = i;
        }
        let drawdown = (equity[running_peak] - value) / equity[running_peak];
        if drawdown > stats.max_drawdown {
            stats.max_drawdown = drawdown;
            stats.peak_index = running_peak;
            stats.trough_index = i;
        }
    }

    if stats.max_drawdown > 0.0 {
        let peak = equity[stats.peak_index];
        stats.recovery_index = equity[stats.trough_index..]
            .iter()
            .position(|v| *v >= peak)
            .map(|offset| stats.trough_index + offset);
    }
    Ok(stats)
}

/// Maximum drawdown of the wealth index implied by `returns`, starting from 1.0.
pub fn max_drawdown_from_returns(returns: &[f64]) -> Result<DrawdownStats, RiskError> {
    require_len("drawdown", returns, 1)?;
    let mut wealth = Vec::with_capacity(returns.len() + 1);
    wealth.push(1.0);
    wealth.extend(cumulative_returns(returns));
    max_drawdown(&wealth)
}

fn check_equity(equity: &[f64]) -> Result<(), RiskError> {
    match equity.iter().position(|v| !(v.is_finite() && *v > 0.0)) {
        Some(index) => Err(RiskError::NonPositiveEquity {
            index,
            value: equity[index],
        }),
        None => Ok(()),
    }
}
