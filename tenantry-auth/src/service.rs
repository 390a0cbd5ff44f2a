// External identity service boundary.

use anyhow::Result;
use async_trait::async_trait;

use crate::identity::{
    CodeDeliveryDetails, ConfirmSignUpResult, Credentials, RegistrationRequest, SessionUser,
    SignInResult, SignUpResult,
};

/// The system of record for credentials and session tokens.
///
/// Each call resolves with a payload or fails with a classified error
/// (a `TenantryError` inside the `anyhow::Error`). Callers receive failures
/// unchanged; retries and timeouts are the implementation's business.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Look up the currently valid session. `Ok(None)` means "not signed in"
    /// and is not an error.
    async fn probe_session(&self) -> Result<Option<SessionUser>>;

    async fn register(&self, request: RegistrationRequest) -> Result<SignUpResult>;

    async fn authenticate(&self, credentials: Credentials) -> Result<SignInResult>;

    async fn terminate_session(&self) -> Result<()>;

    async fn confirm_registration(&self, email: &str, code: &str) -> Result<ConfirmSignUpResult>;

    async fn resend_confirmation_code(&self, email: &str) -> Result<CodeDeliveryDetails>;
}
