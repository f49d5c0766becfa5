use rust_decimal::Decimal;
use thiserror::Error;

use crate::TypeTag;

/// Fatal errors. Any of these aborts the configuration session: they point
/// at a broken entry declaration or a broken collaborator, not at bad input.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Unknown config key '{0}'")]
    UnknownKey(String),

    #[error("Config key '{0}' has no resolved value yet")]
    UnresolvedDependency(String),

    #[error("Config key '{0}' is already resolved for this session")]
    AlreadyResolved(String),

    #[error("Config key '{key}' holds a {actual} value, expected {expected}")]
    TypeMismatch {
        key: String,
        expected: TypeTag,
        actual: TypeTag,
    },

    #[error("on-validated hook for '{key}' failed: {reason}")]
    Hook { key: String, reason: String },

    #[error("Input ended before '{0}' was resolved")]
    InputExhausted(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Exchange API error: {0}")]
    Exchange(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A failure inside an external lookup (minimum order amount, pair split).
/// Never shown to the user directly; see [`ValidationError::LookupFailed`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("trading pair '{0}' is not of the form BASE-QUOTE")]
    MalformedPair(String),

    #[error("no minimum order amount known for '{0}'")]
    NoMinimum(String),

    #[error("lookup service unavailable: {0}")]
    Unavailable(String),
}

/// User-correctable rejection of a raw input. The session shows the
/// `Display` text and re-prompts; nothing else happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid {expected} value: '{raw}'.")]
    Parse { expected: TypeTag, raw: String },

    #[error("Invalid exchange name '{0}'.")]
    UnknownExchange(String),

    #[error("'{pair}' is not a valid trading pair on {market}.")]
    UnlistedPair { market: String, pair: String },

    #[error("Value must be between {min} and {max} ({}).", bound_kind(.inclusive))]
    OutOfRange {
        min: Decimal,
        max: Decimal,
        inclusive: bool,
    },

    #[error("Order amount must be at least {minimum}.")]
    BelowMinimum { minimum: Decimal },

    /// The cause is kept for logs and tests; users only see the generic text.
    #[error("Invalid order amount.")]
    LookupFailed(LookupError),
}

fn bound_kind(inclusive: &bool) -> &'static str {
    if *inclusive {
        "inclusive"
    } else {
        "exclusive"
    }
}
