use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Entry {entry_id} has a zero conversion rate with a non-zero native amount")]
    ZeroRateDivision { entry_id: i64 },

    #[error("Division by zero in expression")]
    DivisionByZero,

    #[error("Cannot evaluate an empty expression")]
    EmptyEvaluation,

    #[error("Malformed expression: {0}")]
    MalformedExpression(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),

    #[error("Unknown calculator key: {0}")]
    UnknownKey(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
