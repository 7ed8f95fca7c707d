use serde::Serialize;
use std::fmt;

// ============================================================================
// Error Taxonomy
// ============================================================================
//
// Every failure the order engine returns is classified into one of these
// kinds. The transport layer maps a kind to a status code and decides how
// much of the message the caller gets to see.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    BusinessRuleViolation,
    Conflict,
    AccessDenied,
    Unexpected,
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::BusinessRuleViolation => 400,
            ErrorKind::Conflict => 409,
            ErrorKind::AccessDenied => 403,
            ErrorKind::Unexpected => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::BusinessRuleViolation => "BUSINESS_RULE_VIOLATION",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::AccessDenied => "ACCESS_DENIED",
            ErrorKind::Unexpected => "UNEXPECTED",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
