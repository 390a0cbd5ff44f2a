// Authentication session state.

use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;
use tenantry_core::{
    ErrorKind, EventHub, Lifecycle, Listener, ListenerId, Scoped, TenantAccessor, TenantId,
    TenantryError,
};

use crate::events::AuthEvent;
use crate::identity::{
    CodeDeliveryDetails, ConfirmSignUpResult, Credentials, Identity, RegistrationRequest,
    SessionUser, SignInResult, SignUpData, SignUpResult,
};
use crate::options::AuthOptions;
use crate::service::IdentityService;

#[derive(Debug)]
struct AuthState {
    identity: Option<Identity>,
    lifecycle: Lifecycle,
    /// Bumped by every sign-in and sign-out; a probe started under an older
    /// generation must not overwrite their outcome.
    generation: u64,
}

pub(crate) struct AuthSessionInner {
    service: Arc<dyn IdentityService>,
    tenant: Arc<dyn TenantAccessor>,
    options: AuthOptions,
    state: RwLock<AuthState>,
    events: EventHub<AuthEvent>,
}

/// Owner of the local identity record.
///
/// Wraps one identity-service call per operation. The tenant accessor is read
/// when an identity is established and the id is copied into it; switching
/// tenants afterwards leaves existing identities untouched.
///
/// Timing: `sign_in` reads the tenant after the service calls complete, so a
/// tenant switch issued while sign-in is in flight is the one that gets
/// stamped on the identity.
#[derive(Clone)]
pub struct AuthSession {
    inner: Arc<AuthSessionInner>,
}

impl AuthSession {
    pub fn new(service: Arc<dyn IdentityService>, tenant: Arc<dyn TenantAccessor>) -> Self {
        Self::build(service, tenant, AuthOptions::default())
    }

    pub fn with_options(
        service: Arc<dyn IdentityService>,
        tenant: Arc<dyn TenantAccessor>,
        options: AuthOptions,
    ) -> Result<Self> {
        options
            .validate()
            .map_err(|e| TenantryError::unprocessable(e).into_anyhow())?;
        Ok(Self::build(service, tenant, options))
    }

    fn build(
        service: Arc<dyn IdentityService>,
        tenant: Arc<dyn TenantAccessor>,
        options: AuthOptions,
    ) -> Self {
        Self {
            inner: Arc::new(AuthSessionInner {
                service,
                tenant,
                options,
                state: RwLock::new(AuthState {
                    identity: None,
                    lifecycle: Lifecycle::Absent,
                    generation: 0,
                }),
                events: EventHub::new(),
            }),
        }
    }

    pub fn options(&self) -> &AuthOptions {
        &self.inner.options
    }

    /// Probe the identity service for an existing session.
    ///
    /// "No session" is the normal signed-out outcome; probe failures are
    /// logged and leave the session signed out. Loading always ends.
    pub async fn initialize(&self) {
        let started = {
            let mut state = self.inner.state.write();
            if state.lifecycle != Lifecycle::Absent {
                return;
            }
            state.lifecycle = Lifecycle::Loading;
            state.generation
        };

        let restored = match self.inner.service.probe_session().await {
            Ok(Some(user)) => Some(self.identity_from_probe(user)),
            Ok(None) => {
                tracing::debug!("no authenticated user");
                None
            }
            Err(e) if TenantryError::kind_of(&e) == Some(ErrorKind::NoSession) => {
                tracing::debug!(reason = %e, "no authenticated user");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "session probe failed, continuing signed out");
                None
            }
        };

        let restored = {
            let mut state = self.inner.state.write();
            state.lifecycle = Lifecycle::Ready;
            match restored {
                // A sign-in or sign-out that finished while the probe was pending wins.
                Some(identity) if state.generation == started => {
                    state.identity = Some(identity.clone());
                    Some(identity)
                }
                Some(identity) => {
                    tracing::debug!(user = %identity.id, "discarding stale restored session");
                    None
                }
                None => None,
            }
        };

        if let Some(identity) = restored {
            tracing::info!(user = %identity.id, tenant = %identity.tenant_id, "session restored");
            self.inner.events.emit(&AuthEvent::SessionRestored(identity));
        }
    }

    /// Register a new account tagged with the active tenant.
    ///
    /// No local identity is created: the service may still require confirmation.
    pub async fn sign_up(&self, data: SignUpData) -> Result<SignUpResult> {
        let request = self.registration_request(&data);
        let tenant = request
            .attribute(&self.inner.options.tenant_attribute)
            .unwrap_or_default()
            .to_string();

        let result = self
            .inner
            .service
            .register(request)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "sign up failed"))?;

        tracing::info!(
            email = %data.email,
            tenant = %tenant,
            complete = result.is_sign_up_complete,
            "sign up submitted"
        );
        Ok(result)
    }

    /// The request `sign_up` would send right now.
    pub fn registration_request(&self, data: &SignUpData) -> RegistrationRequest {
        let o = &self.inner.options;
        let mut attributes = std::collections::BTreeMap::new();
        attributes.insert(o.email_attribute.clone(), data.email.clone());
        attributes.insert(o.given_name_attribute.clone(), data.first_name.clone());
        attributes.insert(o.family_name_attribute.clone(), data.last_name.clone());
        attributes.insert(o.tenant_attribute.clone(), self.tenant_tag().0);
        if let Some(phone) = data.phone_number.as_ref().filter(|p| !p.trim().is_empty()) {
            attributes.insert(o.phone_number_attribute.clone(), phone.clone());
        }

        RegistrationRequest {
            username: data.email.clone(),
            password: data.password.clone(),
            attributes,
        }
    }

    /// Authenticate and, when the service reports a completed sign-in,
    /// establish the local identity. Failures leave local state unchanged.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignInResult> {
        let credentials = Credentials {
            username: email.to_string(),
            password: password.to_string(),
        };

        let result = self
            .inner
            .service
            .authenticate(credentials)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "sign in failed"))?;

        if !result.is_signed_in {
            tracing::info!(
                email = %email,
                next_step = ?result.next_step,
                "sign in needs another step"
            );
            return Ok(result);
        }

        let user = self
            .inner
            .service
            .probe_session()
            .await
            .and_then(|user| {
                user.ok_or_else(|| {
                    TenantryError::not_authenticated("sign in completed but no session is active")
                        .into_anyhow()
                })
            })
            .inspect_err(|e| tracing::error!(error = %e, "sign in failed"))?;

        let identity = Identity {
            id: user.user_id,
            email: email.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            tenant_id: self.tenant_tag(),
            attributes: user.raw,
        };

        {
            let mut state = self.inner.state.write();
            state.identity = Some(identity.clone());
            state.generation += 1;
        }
        tracing::info!(user = %identity.id, tenant = %identity.tenant_id, "signed in");
        self.inner.events.emit(&AuthEvent::SignedIn(identity));
        Ok(result)
    }

    /// End the session at the identity service, then clear the local identity.
    ///
    /// Idempotent when already signed out. If the service call fails the
    /// local identity is kept.
    pub async fn sign_out(&self) -> Result<()> {
        self.inner
            .service
            .terminate_session()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "sign out failed"))?;

        let previous = {
            let mut state = self.inner.state.write();
            state.generation += 1;
            state.identity.take()
        };
        tracing::info!(
            user = previous.as_ref().map(|i| i.id.as_str()).unwrap_or("<none>"),
            "signed out"
        );
        self.inner.events.emit(&AuthEvent::SignedOut { previous });
        Ok(())
    }

    pub async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<ConfirmSignUpResult> {
        let result = self
            .inner
            .service
            .confirm_registration(email, code)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "confirm sign up failed"))?;
        tracing::info!(email = %email, complete = result.is_sign_up_complete, "sign up confirmed");
        Ok(result)
    }

    pub async fn resend_confirmation_code(&self, email: &str) -> Result<CodeDeliveryDetails> {
        let details = self
            .inner
            .service
            .resend_confirmation_code(email)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "resend confirmation failed"))?;
        tracing::info!(
            email = %email,
            destination = %details.destination,
            "confirmation code resent"
        );
        Ok(details)
    }

    pub fn identity(&self) -> Option<Identity> {
        self.inner.state.read().identity.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.read().identity.is_some()
    }

    /// True until the startup probe has finished.
    pub fn is_loading(&self) -> bool {
        self.lifecycle() != Lifecycle::Ready
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.inner.state.read().lifecycle
    }

    /// Tenant id that would be stamped on an identity created now.
    pub fn tenant_tag(&self) -> TenantId {
        self.inner
            .tenant
            .current_tenant_id()
            .unwrap_or_else(|| TenantId::new(self.inner.options.fallback_tenant_tag.clone()))
    }

    pub fn subscribe(&self, listener: Listener<AuthEvent>) -> ListenerId {
        self.inner.events.on(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.inner.events.off(id)
    }

    pub fn handle(&self) -> AuthHandle {
        AuthHandle {
            scope: Scoped::new(&self.inner, "auth"),
        }
    }

    fn identity_from_probe(&self, user: SessionUser) -> Identity {
        let login_id = user.login_id.unwrap_or_default();
        Identity {
            id: user.user_id,
            email: login_id.clone(),
            first_name: login_id,
            last_name: String::new(),
            tenant_id: self.tenant_tag(),
            attributes: user.raw,
        }
    }
}

/// Consumer view of an [`AuthSession`]; panics once the session is gone.
#[derive(Clone, Debug)]
pub struct AuthHandle {
    scope: Scoped<AuthSessionInner>,
}

impl AuthHandle {
    pub fn try_session(&self) -> Result<AuthSession, TenantryError> {
        self.scope.try_get().map(|inner| AuthSession { inner })
    }

    pub fn session(&self) -> AuthSession {
        AuthSession {
            inner: self.scope.get(),
        }
    }

    pub fn identity(&self) -> Option<Identity> {
        self.session().identity()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.session().is_loading()
    }

    pub async fn sign_up(&self, data: SignUpData) -> Result<SignUpResult> {
        self.session().sign_up(data).await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignInResult> {
        self.session().sign_in(email, password).await
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.session().sign_out().await
    }

    pub async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<ConfirmSignUpResult> {
        self.session().confirm_sign_up(email, code).await
    }

    pub async fn resend_confirmation_code(&self, email: &str) -> Result<CodeDeliveryDetails> {
        self.session().resend_confirmation_code(email).await
    }
}
