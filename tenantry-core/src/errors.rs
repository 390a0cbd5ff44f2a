//! # Errors
//!
//! Tenantry carries a small set of structured errors.
//! Core goals:
//! - consistent status codes + names
//! - can be carried through anyhow::Error (identity service calls return it)
//! - transport-agnostic (the UI layer decides how to display them)

use std::fmt;

use anyhow::Error as AnyError;

/// A convenience result type for tenantry APIs.
pub type TenantryResult<T> = std::result::Result<T, AnyError>;

/// Error names + status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,       // 400
    NotAuthenticated, // 401
    NotConfirmed,     // 401 (account exists but registration is pending)
    NoSession,        // 401 (no active session at the identity service)
    NotFound,         // 404
    Conflict,         // 409
    Unprocessable,    // 422
    GeneralError,     // 500
    ContextMisuse,    // 500 (state accessed outside its provider lifetime)
    Unavailable,      // 503
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotAuthenticated | ErrorKind::NotConfirmed | ErrorKind::NoSession => 401,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Unprocessable => 422,
            ErrorKind::GeneralError | ErrorKind::ContextMisuse => 500,
            ErrorKind::Unavailable => 503,
        }
    }

    /// Error `name` (e.g. "NotFound")
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::NotAuthenticated => "NotAuthenticated",
            ErrorKind::NotConfirmed => "NotConfirmed",
            ErrorKind::NoSession => "NoSession",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::Unprocessable => "Unprocessable",
            ErrorKind::GeneralError => "GeneralError",
            ErrorKind::ContextMisuse => "ContextMisuse",
            ErrorKind::Unavailable => "Unavailable",
        }
    }
}

/// A structured tenantry error that can live inside `anyhow::Error`.
///
/// `source` is kept for logging and `Error::source` chains.
#[derive(Debug)]
pub struct TenantryError {
    pub kind: ErrorKind,
    pub message: String,
    pub source: Option<AnyError>,
}

impl TenantryError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: AnyError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Convert into `anyhow::Error`.
    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Downcast an `anyhow::Error` to a `TenantryError` if possible.
    pub fn from_anyhow(err: &AnyError) -> Option<&TenantryError> {
        err.downcast_ref::<TenantryError>()
    }

    /// Kind of an `anyhow::Error`, if it carries a `TenantryError`.
    pub fn kind_of(err: &AnyError) -> Option<ErrorKind> {
        Self::from_anyhow(err).map(|e| e.kind)
    }

    // ---- Constructors ----

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }
    pub fn not_authenticated(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotAuthenticated, msg)
    }
    pub fn not_confirmed(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotConfirmed, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, msg)
    }
    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unprocessable, msg)
    }
    pub fn general_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeneralError, msg)
    }
    pub fn context_misuse(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::ContextMisuse, msg)
    }
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, msg)
    }
}

impl fmt::Display for TenantryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for TenantryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Convenience helper for "bail with TenantryError".
#[macro_export]
macro_rules! bail_tenantry {
    ($ctor:ident, $msg:expr) => {
        return Err($crate::errors::TenantryError::$ctor($msg).into_anyhow())
    };
    ($ctor:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::errors::TenantryError::$ctor(format!($fmt, $($arg)*)).into_anyhow())
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_name_and_code() {
        let err = TenantryError::not_confirmed("User is not confirmed.");
        assert_eq!(err.code(), 401);
        assert_eq!(err.to_string(), "NotConfirmed (401): User is not confirmed.");
    }

    #[test]
    fn kind_survives_anyhow() {
        let err = TenantryError::general_error("pool failed")
            .with_source(anyhow::anyhow!("socket closed"))
            .into_anyhow();
        assert_eq!(TenantryError::kind_of(&err), Some(ErrorKind::GeneralError));
        assert!(std::error::Error::source(TenantryError::from_anyhow(&err).unwrap()).is_some());
        assert_eq!(TenantryError::kind_of(&anyhow::anyhow!("plain")), None);
    }

    #[test]
    fn bail_macro_returns_early() {
        fn check(flag: bool) -> TenantryResult<u8> {
            if flag {
                bail_tenantry!(not_found, "tenant '{}' is not registered", "acme");
            }
            Ok(1)
        }

        let err = check(true).unwrap_err();
        assert_eq!(TenantryError::kind_of(&err), Some(ErrorKind::NotFound));
        assert!(err.to_string().contains("acme"));
        assert_eq!(check(false).unwrap(), 1);
    }
}
