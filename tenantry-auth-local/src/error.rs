use tenantry_core::TenantryError;
use thiserror::Error;

/// Failures raised by the in-memory user pool.
///
/// Messages follow the wording hosted identity providers use so that
/// callers see the same text they would in production.
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("User already exists")]
    UserExists,

    #[error("Incorrect username or password.")]
    InvalidCredentials,

    #[error("User is not confirmed.")]
    NotConfirmed,

    #[error("Username/client id combination not found.")]
    UnknownUser,

    #[error("User cannot be confirmed. Current status is CONFIRMED")]
    AlreadyConfirmed,

    #[error("Invalid verification code provided, please try again.")]
    CodeMismatch,

    #[error("Invalid code provided, please request a code again.")]
    CodeExpired,

    #[error("Password did not conform with policy: {0}")]
    InvalidPassword(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

impl From<PoolError> for TenantryError {
    fn from(err: PoolError) -> Self {
        let message = err.to_string();
        match err {
            PoolError::UserExists => TenantryError::conflict(message),
            PoolError::InvalidCredentials => TenantryError::not_authenticated(message),
            PoolError::NotConfirmed => TenantryError::not_confirmed(message),
            PoolError::UnknownUser => TenantryError::not_found(message),
            PoolError::AlreadyConfirmed
            | PoolError::CodeMismatch
            | PoolError::CodeExpired
            | PoolError::InvalidPassword(_)
            | PoolError::InvalidParameter(_) => TenantryError::bad_request(message),
            PoolError::Hash(e) => {
                TenantryError::general_error(message).with_source(anyhow::Error::new(e))
            }
        }
    }
}

impl PoolError {
    /// Classified error ready to cross the identity-service boundary.
    pub fn into_anyhow(self) -> anyhow::Error {
        TenantryError::from(self).into_anyhow()
    }
}
