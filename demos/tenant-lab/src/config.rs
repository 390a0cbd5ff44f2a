use anyhow::{anyhow, Result};
use std::env;
use std::path::PathBuf;

/// Lab settings, read from the environment (and `.env` when present).
#[derive(Clone, Debug)]
pub struct LabConfig {
    /// Page URL the tenant is resolved from
    pub url: String,
    /// JSON registry; the built-in tenants are used when unset
    pub registry_path: Option<PathBuf>,
    pub email: String,
    pub password: String,
    /// Tenant to switch to after signing in
    pub switch_to: Option<String>,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            url: "http://twilio.localhost:3000/".to_string(),
            registry_path: None,
            email: "lab@example.com".to_string(),
            password: "Secret#123".to_string(),
            switch_to: Some("default".to_string()),
        }
    }
}

impl LabConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let url = non_empty("TENANT_URL").unwrap_or(defaults.url);
        let registry_path = non_empty("TENANT_REGISTRY_PATH").map(PathBuf::from);
        let email = non_empty("TENANT_LAB_EMAIL").unwrap_or(defaults.email);
        let password = non_empty("TENANT_LAB_PASSWORD").unwrap_or(defaults.password);
        let switch_to = match env::var("TENANT_LAB_SWITCH_TO") {
            Ok(v) if v.trim().is_empty() => None,
            Ok(v) => Some(v.trim().to_string()),
            Err(_) => defaults.switch_to,
        };

        if !email.contains('@') {
            return Err(anyhow!("TENANT_LAB_EMAIL must be an email address, got '{email}'"));
        }

        Ok(Self {
            url,
            registry_path,
            email,
            password,
            switch_to,
        })
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
