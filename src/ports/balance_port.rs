//! Account balance store port trait.

use crate::domain::error::CoinsignalError;

pub trait BalanceStore {
    /// Stored balance, or `None` when nothing has been persisted yet.
    fn load(&self) -> Result<Option<f64>, CoinsignalError>;

    fn save(&self, balance: f64) -> Result<(), CoinsignalError>;
}
