//! Domain error types.

/// Top-level error type for tsitrader.
#[derive(Debug, thiserror::Error)]
pub enum TsiTraderError {
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

    #[error("market data error: {reason}")]
    Data { reason: String },

    #[error("no historical bars available from {source_name}")]
    NoData { source_name: String },

    #[error("connectivity lost: {reason}")]
    Connectivity { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TsiTraderError> for std::process::ExitCode {
    fn from(err: &TsiTraderError) -> Self {
        let code: u8 = match err {
            TsiTraderError::Io(_) => 1,
            TsiTraderError::ConfigParse { .. }
            | TsiTraderError::ConfigMissing { .. }
            | TsiTraderError::ConfigInvalid { .. } => 2,
            TsiTraderError::Connectivity { .. } => 3,
            TsiTraderError::Data { .. } | TsiTraderError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
