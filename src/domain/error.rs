//! Domain error types.

/// Top-level error type for sigtrader.
#[derive(Debug, thiserror::Error)]
pub enum SigtraderError {
    #[error("insufficient history for {indicator}: have {bars} bars, need {minimum}")]
    InsufficientHistory {
        indicator: String,
        bars: usize,
        minimum: usize,
    },

    #[error("signal/price alignment mismatch: {reason}")]
    AlignmentMismatch { reason: String },

    #[error("initial capital must be positive, got {capital}")]
    InvalidCapital { capital: f64 },

    #[error("invalid price series: {reason}")]
    InvalidPrices { reason: String },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

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

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SigtraderError> for std::process::ExitCode {
    fn from(err: &SigtraderError) -> Self {
        let code: u8 = match err {
            SigtraderError::Io(_) | SigtraderError::Report { .. } => 1,
            SigtraderError::ConfigParse { .. }
            | SigtraderError::ConfigMissing { .. }
            | SigtraderError::ConfigInvalid { .. }
            | SigtraderError::InvalidParameter { .. } => 2,
            SigtraderError::Data { .. } => 3,
            SigtraderError::InsufficientHistory { .. } | SigtraderError::InvalidPrices { .. } => 5,
            SigtraderError::AlignmentMismatch { .. } | SigtraderError::InvalidCapital { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
