// In-memory identity service.

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use async_trait::async_trait;
use bcrypt::{hash, verify};
use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use rand::Rng;
use serde_json::json;
use tenantry_auth::{
    CodeDeliveryDetails, ConfirmSignUpResult, Credentials, DeliveryMedium, IdentityService,
    RegistrationRequest, SessionUser, SignInResult, SignUpResult, SignUpStep,
};
use tenantry_core::TenantryError;
use uuid::Uuid;

use crate::error::PoolError;

#[derive(Clone, Debug)]
pub struct MemoryIdentityOptions {
    /// bcrypt cost
    pub hash_size: u32,
    pub code_ttl: Duration,
    pub min_password_length: usize,
    /// Skip the confirmation step; registrations complete immediately.
    pub auto_confirm: bool,
    /// Attribute holding the address confirmation codes are "sent" to.
    pub email_attribute: String,
}

impl Default for MemoryIdentityOptions {
    fn default() -> Self {
        Self {
            hash_size: 10,
            code_ttl: Duration::hours(24),
            min_password_length: 8,
            auto_confirm: false,
            email_attribute: "email".to_string(),
        }
    }
}

/// Identity-service calls, used to target injected failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Probe,
    Register,
    Authenticate,
    Terminate,
    Confirm,
    Resend,
}

#[derive(Clone, Debug)]
struct PendingCode {
    code: String,
    issued_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
struct UserRecord {
    id: Uuid,
    username: String,
    password_hash: String,
    attributes: BTreeMap<String, String>,
    confirmed: bool,
    pending: Option<PendingCode>,
}

#[derive(Default)]
struct Pool {
    users: HashMap<String, UserRecord>,
    /// Username owning the single active session.
    session: Option<String>,
}

/// A user pool kept in memory.
///
/// Holds at most one active session, like a browser client would. Passwords
/// are stored as bcrypt hashes; confirmation codes are six digits and expire
/// after `code_ttl`.
pub struct MemoryIdentityService {
    options: MemoryIdentityOptions,
    pool: RwLock<Pool>,
    failures: Mutex<HashMap<Operation, TenantryError>>,
}

impl Default for MemoryIdentityService {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIdentityService {
    pub fn new() -> Self {
        Self::with_options(MemoryIdentityOptions::default())
    }

    pub fn with_options(options: MemoryIdentityOptions) -> Self {
        Self {
            options,
            pool: RwLock::new(Pool::default()),
            failures: Mutex::new(HashMap::new()),
        }
    }

    pub fn options(&self) -> &MemoryIdentityOptions {
        &self.options
    }

    /// Make the next call of `op` fail with `error`. One-shot.
    pub fn fail_next(&self, op: Operation, error: TenantryError) {
        self.failures.lock().insert(op, error);
    }

    /// The confirmation code waiting for `username`, as a mailbox would show it.
    pub fn pending_code(&self, username: &str) -> Option<String> {
        self.pool
            .read()
            .users
            .get(username)
            .and_then(|u| u.pending.as_ref())
            .map(|p| p.code.clone())
    }

    pub fn is_confirmed(&self, username: &str) -> Option<bool> {
        self.pool.read().users.get(username).map(|u| u.confirmed)
    }

    pub fn user_attributes(&self, username: &str) -> Option<BTreeMap<String, String>> {
        self.pool
            .read()
            .users
            .get(username)
            .map(|u| u.attributes.clone())
    }

    pub fn user_count(&self) -> usize {
        self.pool.read().users.len()
    }

    /// Username owning the active session.
    pub fn active_session(&self) -> Option<String> {
        self.pool.read().session.clone()
    }

    /// Shift a pending code's issue time into the past.
    pub fn age_pending_code(&self, username: &str, by: Duration) -> bool {
        let mut pool = self.pool.write();
        match pool.users.get_mut(username).and_then(|u| u.pending.as_mut()) {
            Some(pending) => {
                pending.issued_at -= by;
                true
            }
            None => false,
        }
    }

    fn injected(&self, op: Operation) -> Result<()> {
        match self.failures.lock().remove(&op) {
            Some(err) => {
                tracing::debug!(?op, kind = %err.name(), "injected failure");
                Err(err.into_anyhow())
            }
            None => Ok(()),
        }
    }

    fn issue_code(&self) -> PendingCode {
        let code = rand::thread_rng().gen_range(0..1_000_000u32);
        PendingCode {
            code: format!("{code:06}"),
            issued_at: Utc::now(),
        }
    }

    fn delivery_details(&self, user: &UserRecord) -> CodeDeliveryDetails {
        let address = user
            .attributes
            .get(&self.options.email_attribute)
            .unwrap_or(&user.username);
        CodeDeliveryDetails {
            destination: mask_address(address),
            delivery_medium: DeliveryMedium::Email,
            attribute_name: self.options.email_attribute.clone(),
        }
    }

    fn check_password_policy(&self, password: &str) -> Result<(), PoolError> {
        if password.chars().count() < self.options.min_password_length {
            return Err(PoolError::InvalidPassword(format!(
                "Password not long enough (minimum {})",
                self.options.min_password_length
            )));
        }
        Ok(())
    }
}

/// `ada@example.com` → `a***@e***`
fn mask_address(address: &str) -> String {
    match address.split_once('@') {
        Some((local, domain)) => {
            let l = local.chars().next().map(String::from).unwrap_or_default();
            let d = domain.chars().next().map(String::from).unwrap_or_default();
            format!("{l}***@{d}***")
        }
        None => {
            let head = address.chars().next().map(String::from).unwrap_or_default();
            format!("{head}***")
        }
    }
}

fn session_user(user: &UserRecord) -> SessionUser {
    let id = user.id.to_string();
    SessionUser {
        user_id: id.clone(),
        username: id.clone(),
        login_id: Some(user.username.clone()),
        raw: json!({
            "userId": id,
            "username": id,
            "signInDetails": {
                "loginId": user.username,
                "authFlowType": "USER_PASSWORD_AUTH"
            }
        }),
    }
}

#[async_trait]
impl IdentityService for MemoryIdentityService {
    async fn probe_session(&self) -> Result<Option<SessionUser>> {
        self.injected(Operation::Probe)?;
        let pool = self.pool.read();
        Ok(pool
            .session
            .as_ref()
            .and_then(|name| pool.users.get(name))
            .map(session_user))
    }

    async fn register(&self, request: RegistrationRequest) -> Result<SignUpResult> {
        self.injected(Operation::Register)?;

        let username = request.username.trim().to_string();
        if username.is_empty() {
            return Err(
                PoolError::InvalidParameter("username is required".to_string()).into_anyhow(),
            );
        }
        self.check_password_policy(&request.password)
            .map_err(PoolError::into_anyhow)?;

        if self.pool.read().users.contains_key(&username) {
            return Err(PoolError::UserExists.into_anyhow());
        }

        let password_hash = hash(&request.password, self.options.hash_size)
            .map_err(|e| PoolError::from(e).into_anyhow())?;

        let confirmed = self.options.auto_confirm;
        let user = UserRecord {
            id: Uuid::new_v4(),
            username: username.clone(),
            password_hash,
            attributes: request.attributes,
            confirmed,
            pending: (!confirmed).then(|| self.issue_code()),
        };

        let result = SignUpResult {
            user_id: Some(user.id.to_string()),
            is_sign_up_complete: confirmed,
            next_step: if confirmed {
                SignUpStep::Done
            } else {
                SignUpStep::ConfirmSignUp
            },
            code_delivery: (!confirmed).then(|| self.delivery_details(&user)),
        };

        let mut pool = self.pool.write();
        // Re-checked under the write lock; hashing ran without it.
        if pool.users.contains_key(&username) {
            return Err(PoolError::UserExists.into_anyhow());
        }
        tracing::debug!(username = %username, user_id = %user.id, "user registered");
        pool.users.insert(username, user);
        Ok(result)
    }

    async fn authenticate(&self, credentials: Credentials) -> Result<SignInResult> {
        self.injected(Operation::Authenticate)?;

        let mut pool = self.pool.write();
        let user = pool
            .users
            .get(credentials.username.trim())
            .ok_or_else(|| PoolError::InvalidCredentials.into_anyhow())?;

        let ok = verify(&credentials.password, &user.password_hash)
            .map_err(|e| PoolError::from(e).into_anyhow())?;
        if !ok {
            return Err(PoolError::InvalidCredentials.into_anyhow());
        }
        if !user.confirmed {
            return Err(PoolError::NotConfirmed.into_anyhow());
        }

        let username = user.username.clone();
        pool.session = Some(username);
        Ok(SignInResult::done())
    }

    async fn terminate_session(&self) -> Result<()> {
        self.injected(Operation::Terminate)?;
        self.pool.write().session = None;
        Ok(())
    }

    async fn confirm_registration(&self, email: &str, code: &str) -> Result<ConfirmSignUpResult> {
        self.injected(Operation::Confirm)?;

        let ttl = self.options.code_ttl;
        let mut pool = self.pool.write();
        let user = pool
            .users
            .get_mut(email.trim())
            .ok_or_else(|| PoolError::UnknownUser.into_anyhow())?;

        if user.confirmed {
            return Err(PoolError::AlreadyConfirmed.into_anyhow());
        }
        let pending = user
            .pending
            .as_ref()
            .ok_or_else(|| PoolError::CodeExpired.into_anyhow())?;
        if Utc::now() - pending.issued_at >= ttl {
            return Err(PoolError::CodeExpired.into_anyhow());
        }
        if pending.code != code.trim() {
            return Err(PoolError::CodeMismatch.into_anyhow());
        }

        user.confirmed = true;
        user.pending = None;
        Ok(ConfirmSignUpResult {
            is_sign_up_complete: true,
            next_step: SignUpStep::Done,
        })
    }

    async fn resend_confirmation_code(&self, email: &str) -> Result<CodeDeliveryDetails> {
        self.injected(Operation::Resend)?;

        let code = self.issue_code();
        let mut pool = self.pool.write();
        let user = pool
            .users
            .get_mut(email.trim())
            .ok_or_else(|| PoolError::UnknownUser.into_anyhow())?;
        if user.confirmed {
            return Err(PoolError::AlreadyConfirmed.into_anyhow());
        }

        user.pending = Some(code);
        Ok(self.delivery_details(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_addresses() {
        assert_eq!(mask_address("ada@example.com"), "a***@e***");
        assert_eq!(mask_address("ada"), "a***");
        assert_eq!(mask_address(""), "***");
    }

    #[test]
    fn codes_are_six_digits() {
        let svc = MemoryIdentityService::new();
        for _ in 0..50 {
            let c = svc.issue_code().code;
            assert_eq!(c.len(), 6);
            assert!(c.chars().all(|ch| ch.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn injected_failure_is_one_shot() {
        let svc = MemoryIdentityService::new();
        svc.fail_next(Operation::Terminate, TenantryError::unavailable("offline"));

        assert!(svc.terminate_session().await.is_err());
        assert!(svc.terminate_session().await.is_ok());
    }
}
