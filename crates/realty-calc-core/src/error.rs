use thiserror::Error;

#[derive(Debug, Error)]
pub enum RealtyCalcError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl RealtyCalcError {
    /// Message shown to a form user when a calculation cannot be completed.
    pub fn user_message(&self) -> String {
        format!("Please check your inputs: {self}")
    }
}

impl From<serde_json::Error> for RealtyCalcError {
    fn from(e: serde_json::Error) -> Self {
        RealtyCalcError::SerializationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_wraps_error() {
        let err = RealtyCalcError::InvalidInput {
            field: "loan_term_years".into(),
            reason: "must be positive".into(),
        };
        let msg = err.user_message();
        assert!(msg.starts_with("Please check your inputs"));
        assert!(msg.contains("loan_term_years"));
    }
}
