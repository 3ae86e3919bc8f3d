use serde::{Deserialize, Serialize};
use std::fmt;

use crate::codes;
use crate::context::ErrorContext;

/// Abstract failure kinds produced by the authorization and dispatch core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Request-level policy denial
    Unauthorized,
    /// Object-level policy denial
    Forbidden,
    /// Unknown route or unknown instance
    NotFound,
    /// Payload rejected by the store
    ValidationError,
    /// Policy configuration cannot be used; raised at startup
    ConfigurationError,
    /// Unclassified store or host failure
    Internal,
}

impl ErrorKind {
    /// Stable code for this kind
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => codes::authorization::UNAUTHORIZED,
            ErrorKind::Forbidden => codes::authorization::FORBIDDEN,
            ErrorKind::NotFound => codes::lookup::NOT_FOUND,
            ErrorKind::ValidationError => codes::validation::INVALID_PAYLOAD,
            ErrorKind::ConfigurationError => codes::configuration::INVALID_CONFIGURATION,
            ErrorKind::Internal => codes::internal::INTERNAL,
        }
    }

    /// True for policy denials of either level
    pub fn is_denial(self) -> bool {
        matches!(self, ErrorKind::Unauthorized | ErrorKind::Forbidden)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::ValidationError => "validation_error",
            ErrorKind::ConfigurationError => "configuration_error",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Errors that can be reduced to an abstract [`ErrorKind`]
pub trait Classified: std::error::Error {
    fn kind(&self) -> ErrorKind;

    fn code(&self) -> &'static str {
        self.kind().code()
    }
}

/// Log a classified error together with its request context.
///
/// Denials and misses are expected traffic and log at `warn`/`debug`;
/// everything else logs at `error`.
pub fn log_error<E: Classified>(context: &ErrorContext, error: &E) {
    let kind = error.kind();
    match kind {
        ErrorKind::Unauthorized | ErrorKind::Forbidden => tracing::warn!(
            request_id = ?context.request_id,
            user_id = ?context.user_id,
            resource = context.resource.as_deref(),
            action = context.action.as_deref(),
            error_code = error.code(),
            error_kind = %kind,
            error = %error,
            "Request denied"
        ),
        ErrorKind::NotFound => tracing::debug!(
            request_id = ?context.request_id,
            resource = context.resource.as_deref(),
            error_code = error.code(),
            error = %error,
            "Lookup failed"
        ),
        _ => tracing::error!(
            request_id = ?context.request_id,
            user_id = ?context.user_id,
            resource = context.resource.as_deref(),
            action = context.action.as_deref(),
            error_code = error.code(),
            error_kind = %kind,
            error = %error,
            "Request failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let kinds = [
            ErrorKind::Unauthorized,
            ErrorKind::Forbidden,
            ErrorKind::NotFound,
            ErrorKind::ValidationError,
            ErrorKind::ConfigurationError,
            ErrorKind::Internal,
        ];
        let codes: std::collections::HashSet<_> = kinds.iter().map(|k| k.code()).collect();
        assert_eq!(codes.len(), kinds.len());
    }

    #[test]
    fn test_denial_kinds() {
        assert!(ErrorKind::Unauthorized.is_denial());
        assert!(ErrorKind::Forbidden.is_denial());
        assert!(!ErrorKind::NotFound.is_denial());
        assert_eq!(ErrorKind::ValidationError.to_string(), "validation_error");
    }
}
