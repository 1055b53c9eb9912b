//! Engine result codes and the immutable error value handed to listeners.

use thiserror::Error;

/// Result classes reported by the client engine.
///
/// Non-positive codes are engine classes; positive codes are HTTP status
/// values passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// No error
    Ok,
    /// Internal error
    Internal,
    /// Invalid arguments
    Args,
    /// Request failed, will be retried
    Again,
    /// Rate limit exceeded
    RateLimit,
    /// Failed permanently
    Failed,
    /// Too many concurrent connections or transfers
    TooMany,
    /// Out of range
    Range,
    /// Expired
    Expired,
    /// Resource does not exist
    NoEnt,
    /// Circular linkage
    Circular,
    /// Access denied
    Access,
    /// Resource already exists
    Exist,
    /// Incomplete
    Incomplete,
    /// Invalid key or decryption failure
    Key,
    /// Bad session id
    Sid,
    /// Resource blocked
    Blocked,
    /// Over quota
    OverQuota,
    /// Temporarily unavailable
    TempUnavail,
    /// Connection overflow
    TooManyConnections,
    /// Local write error
    Write,
    /// Local read error
    Read,
    /// Invalid application key
    AppKey,
    /// HTTP status passthrough
    Http(u16),
    /// Negative code outside the known set
    Unknown(i32),
}

impl From<i32> for ErrorCode {
    fn from(code: i32) -> Self {
        match code {
            0 => ErrorCode::Ok,
            -1 => ErrorCode::Internal,
            -2 => ErrorCode::Args,
            -3 => ErrorCode::Again,
            -4 => ErrorCode::RateLimit,
            -5 => ErrorCode::Failed,
            -6 => ErrorCode::TooMany,
            -7 => ErrorCode::Range,
            -8 => ErrorCode::Expired,
            -9 => ErrorCode::NoEnt,
            -10 => ErrorCode::Circular,
            -11 => ErrorCode::Access,
            -12 => ErrorCode::Exist,
            -13 => ErrorCode::Incomplete,
            -14 => ErrorCode::Key,
            -15 => ErrorCode::Sid,
            -16 => ErrorCode::Blocked,
            -17 => ErrorCode::OverQuota,
            -18 => ErrorCode::TempUnavail,
            -19 => ErrorCode::TooManyConnections,
            -20 => ErrorCode::Write,
            -21 => ErrorCode::Read,
            -22 => ErrorCode::AppKey,
            c if c > 0 => ErrorCode::Http(u16::try_from(c).unwrap_or(u16::MAX)),
            c => ErrorCode::Unknown(c),
        }
    }
}

impl ErrorCode {
    /// Signed wire value of this code.
    pub fn code(&self) -> i32 {
        match self {
            ErrorCode::Ok => 0,
            ErrorCode::Internal => -1,
            ErrorCode::Args => -2,
            ErrorCode::Again => -3,
            ErrorCode::RateLimit => -4,
            ErrorCode::Failed => -5,
            ErrorCode::TooMany => -6,
            ErrorCode::Range => -7,
            ErrorCode::Expired => -8,
            ErrorCode::NoEnt => -9,
            ErrorCode::Circular => -10,
            ErrorCode::Access => -11,
            ErrorCode::Exist => -12,
            ErrorCode::Incomplete => -13,
            ErrorCode::Key => -14,
            ErrorCode::Sid => -15,
            ErrorCode::Blocked => -16,
            ErrorCode::OverQuota => -17,
            ErrorCode::TempUnavail => -18,
            ErrorCode::TooManyConnections => -19,
            ErrorCode::Write => -20,
            ErrorCode::Read => -21,
            ErrorCode::AppKey => -22,
            ErrorCode::Http(status) => i32::from(*status),
            ErrorCode::Unknown(c) => *c,
        }
    }

    pub fn is_ok(&self) -> bool {
        *self == ErrorCode::Ok
    }

    /// Get human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::Ok => "No error",
            ErrorCode::Internal => "Internal error",
            ErrorCode::Args => "Invalid argument",
            ErrorCode::Again => "Request failed, retrying",
            ErrorCode::RateLimit => "Rate limit exceeded",
            ErrorCode::Failed => "Failed permanently",
            ErrorCode::TooMany => "Too many concurrent connections or transfers",
            ErrorCode::Range => "Out of range",
            ErrorCode::Expired => "Expired",
            ErrorCode::NoEnt => "Not found",
            ErrorCode::Circular => "Circular linkage detected",
            ErrorCode::Access => "Access denied",
            ErrorCode::Exist => "Already exists",
            ErrorCode::Incomplete => "Incomplete",
            ErrorCode::Key => "Invalid key/Decryption error",
            ErrorCode::Sid => "Bad session ID",
            ErrorCode::Blocked => "Blocked",
            ErrorCode::OverQuota => "Over quota",
            ErrorCode::TempUnavail => "Temporarily not available",
            ErrorCode::TooManyConnections => "Connection overflow",
            ErrorCode::Write => "Write error",
            ErrorCode::Read => "Read error",
            ErrorCode::AppKey => "Invalid application key",
            ErrorCode::Http(_) => "HTTP Error",
            ErrorCode::Unknown(_) => "Unknown error",
        }
    }
}

/// Immutable error snapshot delivered to listeners on finish and
/// temporary-error events.
///
/// Listeners receive it by reference and must not retain it past the
/// callback; copy it if it is needed later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{}", .code.description())]
pub struct ApiError {
    code: ErrorCode,
    next_attempt: Option<i64>,
}

impl ApiError {
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            next_attempt: None,
        }
    }

    pub fn ok() -> Self {
        Self::new(ErrorCode::Ok)
    }

    /// Attach the engine's next retry timestamp (deciseconds).
    pub fn with_next_attempt(mut self, next_attempt: i64) -> Self {
        self.next_attempt = Some(next_attempt);
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn error_code(&self) -> i32 {
        self.code.code()
    }

    pub fn error_string(&self) -> &'static str {
        self.code.description()
    }

    pub fn is_ok(&self) -> bool {
        self.code.is_ok()
    }

    /// True when the engine has not scheduled another attempt.
    pub fn is_temporary(&self) -> bool {
        self.next_attempt.is_none()
    }

    pub fn next_attempt(&self) -> Option<i64> {
        self.next_attempt
    }
}

impl From<ErrorCode> for ApiError {
    fn from(code: ErrorCode) -> Self {
        ApiError::new(code)
    }
}
