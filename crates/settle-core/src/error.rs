use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettleError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Financial impossibility: {0}")]
    FinancialImpossibility(String),

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Payment failed via {merchant}: {message}")]
    Gateway { merchant: String, message: String },

    #[error("No payment gateway registered for merchant {0}")]
    UnsupportedMerchant(String),

    #[error("Invalid status transition: {event} is not allowed from {from}")]
    InvalidTransition { from: String, event: String },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl SettleError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        SettleError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for SettleError {
    fn from(e: serde_json::Error) -> Self {
        SettleError::SerializationError(e.to_string())
    }
}
