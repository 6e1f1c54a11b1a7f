//! Error types for the OmniPay core

use thiserror::Error;

/// Main error type for the payment flow
#[derive(Error, Debug)]
pub enum OmniPayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("No route found: {0}")]
    RouteNotFound(String),

    #[error("Routing provider error: {0}")]
    Provider(String),

    #[error("Ledger storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OmniPayError {
    /// Check if error was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(self, OmniPayError::InvalidRequest(_))
    }

    /// Stable machine-readable tag used in API envelopes and metrics labels
    pub fn kind(&self) -> &'static str {
        match self {
            OmniPayError::Config(_) => "config",
            OmniPayError::InvalidRequest(_) => "invalid_request",
            OmniPayError::RouteNotFound(_) => "route_not_found",
            OmniPayError::Provider(_) => "provider_error",
            OmniPayError::Storage(_) => "storage_error",
            OmniPayError::Internal(_) => "internal",
        }
    }
}

/// Result type for payment flow operations
pub type OmniPayResult<T> = Result<T, OmniPayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(OmniPayError::InvalidRequest("missing txHash".into()).is_client_error());
        assert!(!OmniPayError::Provider("upstream 503".into()).is_client_error());
        assert!(!OmniPayError::Storage("disk full".into()).is_client_error());
    }

    #[test]
    fn test_error_kind_tags() {
        assert_eq!(OmniPayError::RouteNotFound("x".into()).kind(), "route_not_found");
        assert_eq!(OmniPayError::Internal("x".into()).kind(), "internal");
    }
}
