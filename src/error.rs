use thiserror::Error;

/// Errors raised by the listing core.
///
/// Every normalization failure is fatal to the operation that triggered it:
/// the record is left untouched and the caller decides the user-visible
/// response. There is no recoverable or transient class here since the core
/// does no I/O.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BienError {
    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: String, reason: String },
}

impl BienError {
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        BienError::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Name of the offending field, for callers that map errors onto
    /// per-field API responses.
    pub fn field(&self) -> &str {
        match self {
            BienError::InvalidField { field, .. } => field,
        }
    }
}
