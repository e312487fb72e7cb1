//! Domain error types.

/// Top-level error type for algotrader.
#[derive(Debug, thiserror::Error)]
pub enum AlgoTraderError {
    #[error("data error: {reason}")]
    Data { reason: String },

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

    #[error("trade log error: {reason}")]
    TradeLog { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AlgoTraderError {
    pub fn data(reason: impl Into<String>) -> Self {
        AlgoTraderError::Data {
            reason: reason.into(),
        }
    }

    pub fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        AlgoTraderError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn missing(section: &str, key: &str) -> Self {
        AlgoTraderError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(
            self,
            AlgoTraderError::ConfigParse { .. }
                | AlgoTraderError::ConfigMissing { .. }
                | AlgoTraderError::ConfigInvalid { .. }
        )
    }
}

impl From<csv::Error> for AlgoTraderError {
    fn from(err: csv::Error) -> Self {
        AlgoTraderError::TradeLog {
            reason: err.to_string(),
        }
    }
}

impl From<&AlgoTraderError> for std::process::ExitCode {
    fn from(err: &AlgoTraderError) -> Self {
        let code: u8 = match err {
            AlgoTraderError::Io(_) => 1,
            AlgoTraderError::ConfigParse { .. }
            | AlgoTraderError::ConfigMissing { .. }
            | AlgoTraderError::ConfigInvalid { .. } => 2,
            AlgoTraderError::TradeLog { .. } => 3,
            AlgoTraderError::Data { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
