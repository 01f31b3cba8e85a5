//! Domain error types.

/// A parse error with position information for rule parsing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    /// Format the error with a caret pointing at the error position in the input.
    pub fn display_with_context(&self, input: &str) -> String {
        let caret = " ".repeat(self.position) + "^";
        format!(
            "{input}\n{caret}\n{err}",
            input = input,
            caret = caret,
            err = self
        )
    }
}

/// Top-level error type for stratlogic.
///
/// Strategy evaluation itself never fails; every variant here comes from
/// construction, configuration or data loading.
#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    #[error("invalid argument {name}: {reason}")]
    InvalidArgument { name: String, reason: String },

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

    #[error(transparent)]
    RuleParse(#[from] ParseError),

    #[error("invalid rule: {reason}")]
    RuleInvalid { reason: String },

    #[error("signal data error: {reason}")]
    DataLoad { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convert a signed unstable period into the unsigned count strategies store.
///
/// Negative values are rejected, never clamped.
pub fn unstable_period_from(value: i64) -> Result<usize, StrategyError> {
    usize::try_from(value).map_err(|_| StrategyError::InvalidArgument {
        name: "unstable_period".to_string(),
        reason: format!("must be non-negative, got {value}"),
    })
}

impl From<&StrategyError> for std::process::ExitCode {
    fn from(err: &StrategyError) -> Self {
        let code: u8 = match err {
            StrategyError::Io(_) => 1,
            StrategyError::ConfigParse { .. }
            | StrategyError::ConfigMissing { .. }
            | StrategyError::ConfigInvalid { .. }
            | StrategyError::InvalidArgument { .. } => 2,
            StrategyError::DataLoad { .. } => 3,
            StrategyError::RuleParse(_) | StrategyError::RuleInvalid { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
