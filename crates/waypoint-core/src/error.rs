use thiserror::Error;

/// User-recoverable input problems. Never change state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Waypoint name cannot be empty")]
    EmptyName,

    #[error("Waypoint name cannot be longer than {max} characters")]
    NameTooLong { max: usize },

    #[error("Waypoint name must be alpha-numeric")]
    NameNotAlphanumeric,

    #[error("Invalid title specified")]
    InvalidTitle,

    #[error("Display contains illegal characters, please pick a different display format.")]
    InvalidDisplay,

    #[error("Invalid page number specified.")]
    InvalidPage,
}

/// Failure reported by an external store or limit policy.
///
/// Propagated to the caller untouched; the external layer owns any retry.
#[derive(Debug, Error)]
#[error("{context}: {source}")]
pub struct ExternalError {
    pub context: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl ExternalError {
    pub fn new(
        context: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            context: context.into(),
            source: source.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse waypoint config RON: {0}")]
    ParseError(String),
}
