use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;

use crate::domain::catalog::CatalogError;
use crate::domain::order::OrderError;
use crate::error::ErrorKind;

const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred";

/// JSON body of every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: &'static str,
    message: String,
}

impl ApiError {
    pub fn from_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        let status = StatusCode::from_u16(kind.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = match kind {
            ErrorKind::Unexpected => UNEXPECTED_MESSAGE.to_string(),
            _ => message.into(),
        };
        Self {
            status,
            error: kind.as_str(),
            message,
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: "UNAUTHENTICATED",
            message: message.into(),
        }
    }

    pub fn forbidden() -> Self {
        Self::from_kind(ErrorKind::AccessDenied, "Access denied")
    }

    /// Malformed body, query or path. Kept apart from domain rule failures.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: "INVALID_REQUEST",
            message: message.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status).json(ErrorBody {
            error: self.error,
            message: self.message.clone(),
        })
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        let kind = err.kind();
        if kind == ErrorKind::Unexpected {
            tracing::error!(error = %err, "Unexpected order failure");
        }
        Self::from_kind(kind, err.to_string())
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        let kind = err.kind();
        if kind == ErrorKind::Unexpected {
            tracing::error!(error = %err, "Unexpected catalog failure");
        }
        Self::from_kind(kind, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderStatus;
    use crate::store::StoreError;

    #[test]
    fn test_business_errors_keep_their_message() {
        let err: ApiError = OrderError::InvalidTransition {
            from: OrderStatus::Confirmed,
            to: OrderStatus::Delivered,
        }
        .into();

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error, "BUSINESS_RULE_VIOLATION");
        assert!(err.message.contains("CONFIRMED"));
    }

    #[test]
    fn test_unexpected_errors_hide_details() {
        let err: ApiError = OrderError::Storage(StoreError::InvalidRecord("secret table".into())).into();

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, UNEXPECTED_MESSAGE);
    }

    #[test]
    fn test_kind_status_codes() {
        assert_eq!(ApiError::from(OrderError::AccessDenied).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::from(OrderError::OrderNotFound(uuid::Uuid::new_v4())).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(OrderError::DuplicateOrderNumber("ORD-1".into())).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(ApiError::unauthenticated("missing").status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_malformed_requests_have_their_own_token() {
        let err = ApiError::invalid_request("expected value at line 1");

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error, "INVALID_REQUEST");
        assert_ne!(err.error, ErrorKind::BusinessRuleViolation.as_str());
    }
}
