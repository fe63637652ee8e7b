//! Domain error types.
//!
//! Insufficient indicator history and degenerate computations are not errors:
//! they resolve to neutral votes or boundary values inside the engine.

/// Top-level error type for coinsignal.
#[derive(Debug, thiserror::Error)]
pub enum CoinsignalError {
    #[error("no usable data for {instrument}: {reason}")]
    DataUnavailable { instrument: String, reason: String },

    #[error("incompatible input for {instrument}: missing or invalid column '{column}'")]
    SchemaMismatch { instrument: String, column: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("http error: {reason}")]
    Http { reason: String },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("pipeline error: {reason}")]
    Pipeline { reason: String },

    #[error("all {count} instruments failed")]
    AllInstrumentsFailed { count: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CoinsignalError {
    pub fn data_unavailable(instrument: &str, reason: impl Into<String>) -> Self {
        CoinsignalError::DataUnavailable {
            instrument: instrument.to_string(),
            reason: reason.into(),
        }
    }

    pub fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        CoinsignalError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Process exit status for this error category.
    pub fn exit_code(&self) -> u8 {
        match self {
            CoinsignalError::Io(_) | CoinsignalError::Csv(_) | CoinsignalError::Json(_) => 1,
            CoinsignalError::ConfigParse { .. }
            | CoinsignalError::ConfigMissing { .. }
            | CoinsignalError::ConfigInvalid { .. } => 2,
            CoinsignalError::Http { .. } => 3,
            CoinsignalError::Pipeline { .. } => 4,
            CoinsignalError::DataUnavailable { .. }
            | CoinsignalError::SchemaMismatch { .. }
            | CoinsignalError::AllInstrumentsFailed { .. } => 5,
        }
    }
}

impl From<&CoinsignalError> for std::process::ExitCode {
    fn from(err: &CoinsignalError) -> Self {
        std::process::ExitCode::from(err.exit_code())
    }
}
