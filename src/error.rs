use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SurvivalError {
    /// Malformed architecture parameters, raised at model construction.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No comparable pairs exist, so a ranking statistic is undefined.
    #[error("no eligible pairs: {0}")]
    EmptyInput(&'static str),

    /// Values outside the domain of the statistic (negative times, non-binary events...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Inconsistent lengths or shapes between related inputs.
    #[error("shape mismatch: {0}")]
    Shape(String),
}

pub type Result<T> = std::result::Result<T, SurvivalError>;
