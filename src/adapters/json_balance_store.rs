//! Balance persisted as `{"balance": <number>}`.

use crate::domain::error::CoinsignalError;
use crate::ports::balance_port::BalanceStore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Serialize, Deserialize)]
struct BalanceFile {
    balance: f64,
}

pub struct JsonBalanceStore {
    path: PathBuf,
}

impl JsonBalanceStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl BalanceStore for JsonBalanceStore {
    fn load(&self) -> Result<Option<f64>, CoinsignalError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let file: BalanceFile = serde_json::from_str(&content)?;
        debug!(path = %self.path.display(), balance = file.balance, "balance loaded");
        Ok(Some(file.balance))
    }

    fn save(&self, balance: f64) -> Result<(), CoinsignalError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&BalanceFile { balance })?;
        fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), balance, "balance saved");
        Ok(())
    }
}
