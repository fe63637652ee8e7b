//! Balance phases and lot factors.
//!
//! A phase is a 1-based tier: the first threshold the balance is below, or the
//! tier after the last threshold. Each phase carries a lot factor that scales
//! breakout position sizes.

use crate::domain::error::CoinsignalError;

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSchedule {
    thresholds: Vec<f64>,
    lot_factors: Vec<f64>,
}

impl Default for PhaseSchedule {
    fn default() -> Self {
        Self {
            thresholds: vec![25_000.0, 40_000.0, 50_000.0],
            lot_factors: vec![1.0, 1.25, 1.5, 2.0],
        }
    }
}

impl PhaseSchedule {
    pub fn new(thresholds: Vec<f64>, lot_factors: Vec<f64>) -> Result<Self, CoinsignalError> {
        if lot_factors.len() != thresholds.len() + 1 {
            return Err(CoinsignalError::config_invalid(
                "phase",
                "lot_factors",
                format!(
                    "expected {} lot factors for {} thresholds, got {}",
                    thresholds.len() + 1,
                    thresholds.len(),
                    lot_factors.len()
                ),
            ));
        }
        if thresholds.iter().any(|t| !t.is_finite())
            || thresholds.windows(2).any(|w| w[1] <= w[0])
        {
            return Err(CoinsignalError::config_invalid(
                "phase",
                "thresholds",
                "must be finite and strictly ascending",
            ));
        }
        if lot_factors.iter().any(|f| !f.is_finite() || *f <= 0.0) {
            return Err(CoinsignalError::config_invalid(
                "phase",
                "lot_factors",
                "must be positive",
            ));
        }
        Ok(Self {
            thresholds,
            lot_factors,
        })
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    pub fn lot_factors(&self) -> &[f64] {
        &self.lot_factors
    }

    pub fn phase_for(&self, balance: f64) -> usize {
        self.thresholds
            .iter()
            .position(|t| balance < *t)
            .unwrap_or(self.thresholds.len())
            + 1
    }

    /// Lot factor of a 1-based phase; out-of-range phases clamp to the ends.
    pub fn lot_factor(&self, phase: usize) -> f64 {
        let idx = phase.clamp(1, self.lot_factors.len()) - 1;
        self.lot_factors[idx]
    }
}

/// Balance and phase, fixed for one trading cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccountState {
    pub balance: f64,
    pub phase: usize,
    pub lot_factor: f64,
}

impl AccountState {
    pub fn new(balance: f64, schedule: &PhaseSchedule) -> Self {
        let phase = schedule.phase_for(balance);
        Self {
            balance,
            phase,
            lot_factor: schedule.lot_factor(phase),
        }
    }
}
