//! Domain error types.

/// Top-level error type for biasfeed.
///
/// Every variant except `MalformedShape` is fatal to a run. `MalformedShape`
/// is produced while classifying a single record and is handled by dropping
/// that record.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
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

    #[error("indicator source unavailable: {reason}")]
    SourceUnavailable { reason: String },

    #[error("malformed indicator record '{id}': {reason}")]
    MalformedShape { id: String, reason: String },

    #[error("no usable data for {symbol} on {timeframe}: zero bars after merging")]
    NoUsableData { symbol: String, timeframe: String },

    #[error("snapshot field '{field}' could not be populated")]
    MissingField { field: String },

    #[error("publish failed: {reason}")]
    PublishFailure { reason: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FeedError {
    /// Name of the pipeline stage an error belongs to, for operator-facing messages.
    pub fn stage(&self) -> &'static str {
        match self {
            FeedError::ConfigParse { .. }
            | FeedError::ConfigMissing { .. }
            | FeedError::ConfigInvalid { .. } => "config",
            FeedError::SourceUnavailable { .. } => "fetch",
            FeedError::MalformedShape { .. } | FeedError::NoUsableData { .. } => "merge",
            FeedError::MissingField { .. } | FeedError::Json(_) => "snapshot",
            FeedError::PublishFailure { .. } => "publish",
            FeedError::Io(_) => "io",
        }
    }
}

impl From<&FeedError> for std::process::ExitCode {
    fn from(err: &FeedError) -> Self {
        let code: u8 = match err {
            FeedError::Io(_) | FeedError::Json(_) => 1,
            FeedError::ConfigParse { .. }
            | FeedError::ConfigMissing { .. }
            | FeedError::ConfigInvalid { .. } => 2,
            FeedError::SourceUnavailable { .. } => 3,
            FeedError::MalformedShape { .. } | FeedError::NoUsableData { .. } => 4,
            FeedError::MissingField { .. } => 5,
            FeedError::PublishFailure { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
