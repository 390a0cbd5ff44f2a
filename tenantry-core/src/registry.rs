use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::errors::TenantryError;
use crate::tenant::{Branding, TenantConfig, TenantId};

/// Id of the built-in `default` tenant.
pub const DEFAULT_TENANT_ID: &str = "default";

/// Tenant the built-in registry falls back to when no signal matches.
pub const BUILTIN_FALLBACK_TENANT_ID: &str = "twilio";

/// A static registry that maps tenant ids to tenant configurations.
///
/// Every id is unique and the designated fallback tenant is always present,
/// so `fallback()` never fails once a registry has been built.
#[derive(Debug, Clone)]
pub struct TenantRegistry {
    tenants: HashMap<String, Arc<TenantConfig>>,
    order: Vec<TenantId>,
    fallback: Arc<TenantConfig>,
}

/// On-disk shape: `{ "fallback": "default", "tenants": [ ... ] }`.
#[derive(Debug, Deserialize)]
struct RegistryFile {
    fallback: String,
    tenants: Vec<TenantConfig>,
}

impl TenantRegistry {
    /// Build a registry from configs, designating `fallback` as the default tenant.
    pub fn new<I>(configs: I, fallback: &str) -> Result<Self>
    where
        I: IntoIterator<Item = TenantConfig>,
    {
        let mut tenants = HashMap::new();
        let mut order = Vec::new();

        for config in configs {
            config.validate().map_err(TenantryError::into_anyhow)?;
            let key = config.id.as_str().to_string();
            if tenants.contains_key(&key) {
                bail_tenantry!(conflict, "duplicate tenant id '{}'", key);
            }
            order.push(config.id.clone());
            tenants.insert(key, Arc::new(config));
        }

        let Some(fallback) = tenants.get(fallback).cloned() else {
            bail_tenantry!(not_found, "fallback tenant '{}' is not registered", fallback);
        };

        Ok(Self {
            tenants,
            order,
            fallback,
        })
    }

    /// Load a registry from its JSON representation.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let file: RegistryFile = serde_json::from_str(raw).map_err(|e| {
            TenantryError::bad_request(format!("invalid tenant registry: {e}")).into_anyhow()
        })?;
        Self::new(file.tenants, &file.fallback)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading tenant registry {}", path.display()))?;
        Self::from_json_str(&raw)
    }

    /// The tenants shipped with the application: `twilio`, `default` and `startup`.
    /// `twilio` is the fallback.
    pub fn builtin() -> Self {
        let tenants = builtin_tenants();
        let order = tenants.iter().map(|t| t.id.clone()).collect();
        let tenants: HashMap<String, Arc<TenantConfig>> = tenants
            .into_iter()
            .map(|t| (t.id.as_str().to_string(), Arc::new(t)))
            .collect();
        let fallback = Arc::clone(&tenants[BUILTIN_FALLBACK_TENANT_ID]);

        Self {
            tenants,
            order,
            fallback,
        }
    }

    /// Look up a tenant by id.
    pub fn lookup(&self, id: &str) -> Option<Arc<TenantConfig>> {
        self.tenants.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tenants.contains_key(id)
    }

    /// The designated default tenant.
    pub fn fallback(&self) -> Arc<TenantConfig> {
        Arc::clone(&self.fallback)
    }

    /// Registered ids, in registration order.
    pub fn ids(&self) -> &[TenantId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for TenantRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn tenant(
    id: &str,
    name: &str,
    colors: (&str, &str),
    domain: &str,
    features: &[&str],
    branding: (&str, &str, &str),
) -> TenantConfig {
    TenantConfig {
        id: TenantId::new(id),
        name: name.to_string(),
        logo: None,
        primary_color: colors.0.to_string(),
        secondary_color: colors.1.to_string(),
        domain: domain.to_string(),
        features: features.iter().map(|f| f.to_string()).collect(),
        branding: Branding {
            company_name: branding.0.to_string(),
            tagline: branding.1.to_string(),
            support_email: branding.2.to_string(),
        },
    }
}

fn builtin_tenants() -> Vec<TenantConfig> {
    vec![
        tenant(
            "twilio",
            "Twilio",
            ("#e74c3c", "#f093fb"),
            "twilio.com",
            &["sms", "voice", "video", "email"],
            (
                "Twilio",
                "Start your free trial today to test out the Twilio platform with no strings attached.",
                "support@twilio.com",
            ),
        ),
        tenant(
            DEFAULT_TENANT_ID,
            "Default App",
            ("#3498db", "#667eea"),
            "localhost",
            &["auth", "dashboard"],
            (
                "Your Company",
                "Welcome to our platform. Sign up to get started.",
                "support@yourcompany.com",
            ),
        ),
        tenant(
            "startup",
            "StartupXYZ",
            ("#ff6b6b", "#4ecdc4"),
            "startupxyz.com",
            &["auth", "dashboard", "analytics"],
            (
                "StartupXYZ",
                "Innovation at scale - Join the future today!",
                "hello@startupxyz.com",
            ),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn builtin_has_three_tenants_and_twilio_fallback() {
        let reg = TenantRegistry::builtin();
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.fallback().id, BUILTIN_FALLBACK_TENANT_ID);
        assert_eq!(reg.fallback().id, "twilio");
        assert!(reg.contains(DEFAULT_TENANT_ID));
        assert_eq!(reg.lookup("twilio").unwrap().primary_color, "#e74c3c");
        assert!(reg.lookup("acme").is_none());
        let ids: Vec<&str> = reg.ids().iter().map(|i| i.as_str()).collect();
        assert_eq!(ids, ["twilio", "default", "startup"]);
    }

    #[test]
    fn builtin_entries_are_valid() {
        let reg = TenantRegistry::builtin();
        for id in reg.ids() {
            reg.lookup(id.as_str()).unwrap().validate().unwrap();
        }
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let t = builtin_tenants().remove(0);
        let err = TenantRegistry::new(vec![t.clone(), t], "twilio").unwrap_err();
        assert_eq!(TenantryError::kind_of(&err), Some(ErrorKind::Conflict));
        assert!(err.to_string().contains("duplicate tenant id 'twilio'"));
    }

    #[test]
    fn missing_fallback_is_rejected() {
        let err = TenantRegistry::new(builtin_tenants(), "acme").unwrap_err();
        assert_eq!(TenantryError::kind_of(&err), Some(ErrorKind::NotFound));
        assert!(err.to_string().contains("fallback tenant 'acme'"));
    }

    #[test]
    fn loads_from_json() {
        let raw = r##"{
            "fallback": "acme",
            "tenants": [{
                "id": "acme",
                "name": "Acme",
                "logo": "https://acme.test/logo.svg",
                "primaryColor": "#000000",
                "secondaryColor": "#ffffff",
                "domain": "acme.test",
                "features": ["auth"],
                "branding": {
                    "companyName": "Acme Corp",
                    "tagline": "Everything",
                    "supportEmail": "help@acme.test"
                }
            }]
        }"##;

        let reg = TenantRegistry::from_json_str(raw).unwrap();
        let acme = reg.fallback();
        assert_eq!(acme.id, "acme");
        assert_eq!(acme.logo.as_deref(), Some("https://acme.test/logo.svg"));
        assert_eq!(acme.branding.company_name, "Acme Corp");
    }

    #[test]
    fn json_with_bad_color_is_rejected() {
        let raw = r##"{
            "fallback": "acme",
            "tenants": [{
                "id": "acme", "name": "Acme",
                "primaryColor": "black", "secondaryColor": "#fff",
                "domain": "acme.test",
                "branding": { "companyName": "A", "tagline": "B", "supportEmail": "c@d.e" }
            }]
        }"##;
        let err = TenantRegistry::from_json_str(raw).unwrap_err();
        assert_eq!(TenantryError::kind_of(&err), Some(ErrorKind::Unprocessable));
    }
}
