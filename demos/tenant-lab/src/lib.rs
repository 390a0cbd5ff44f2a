pub mod config;

use std::sync::Arc;

use anyhow::Result;
use tenantry_auth::{AuthSession, SignUpData};
use tenantry_auth_local::{MemoryIdentityService, Operation};
use tenantry_core::{
    TenantEvent, TenantId, TenantRegistry, TenantSession, TenantryError, UrlEnvironment,
};

pub use config::LabConfig;

/// What a lab run observed.
#[derive(Clone, Debug)]
pub struct LabReport {
    pub resolved: TenantId,
    pub resolution_source: &'static str,
    pub css: String,
    pub signed_in_under: TenantId,
    pub switched_to: Option<TenantId>,
    /// Identity tenant read back after the switch
    pub identity_tenant_after_switch: Option<TenantId>,
}

pub fn load_registry(config: &LabConfig) -> Result<TenantRegistry> {
    match &config.registry_path {
        Some(path) => TenantRegistry::from_json_file(path),
        None => Ok(TenantRegistry::builtin()),
    }
}

/// Resolve, sign up, confirm, sign in, switch, sign out.
pub async fn run(config: &LabConfig) -> Result<LabReport> {
    let registry = Arc::new(load_registry(config)?);
    let env = UrlEnvironment::parse(&config.url)?;

    let tenants = TenantSession::with_registry(registry.clone());
    tenants.subscribe(Arc::new(|event: &TenantEvent| {
        tracing::info!(tenant = %event.current().id, "tenant event");
    }));

    let tenant = tenants.initialize(&env);
    let resolution_source = tenants
        .resolution_source()
        .map(|s| s.as_str())
        .unwrap_or("unknown");
    tracing::info!(
        tenant = %tenant.id,
        name = %tenant.name,
        source = resolution_source,
        "tenant ready"
    );
    let css = tenants.presentation().snapshot().to_css();

    let identity = Arc::new(MemoryIdentityService::new());
    let auth = AuthSession::new(identity.clone(), Arc::new(tenants.clone()));
    auth.initialize().await;

    auth.sign_up(SignUpData {
        email: config.email.clone(),
        password: config.password.clone(),
        first_name: "Lab".to_string(),
        last_name: "User".to_string(),
        phone_number: None,
    })
    .await?;

    let code = identity.pending_code(&config.email).ok_or_else(|| {
        TenantryError::not_found(format!("no confirmation code for {}", config.email)).into_anyhow()
    })?;
    auth.confirm_sign_up(&config.email, &code).await?;
    auth.sign_in(&config.email, &config.password).await?;

    let signed_in_under = auth
        .identity()
        .map(|i| i.tenant_id)
        .ok_or_else(|| TenantryError::not_authenticated("sign in left no identity").into_anyhow())?;

    let switched_to = match &config.switch_to {
        Some(id) => Some(tenants.switch_to(id)?.id.clone()),
        None => None,
    };
    let identity_tenant_after_switch = auth.identity().map(|i| i.tenant_id);
    if let (Some(active), Some(stamped)) = (&switched_to, &identity_tenant_after_switch) {
        tracing::info!(active = %active, identity = %stamped, "identity keeps its sign-in tenant");
    }

    // A failing sign-out keeps the identity; the retry clears it.
    identity.fail_next(Operation::Terminate, TenantryError::unavailable("network error"));
    if auth.sign_out().await.is_err() {
        tracing::info!(still_signed_in = auth.is_authenticated(), "sign out failed");
    }
    auth.sign_out().await?;

    Ok(LabReport {
        resolved: tenant.id.clone(),
        resolution_source,
        css,
        signed_in_under,
        switched_to,
        identity_tenant_after_switch,
    })
}
