//! Tenant resolution from environmental signals.
//!
//! Priority, strictly in this order:
//! 1. `?tenant=<id>` query parameter, if the id is registered
//! 2. the first dot-delimited label of the host name, if registered
//! 3. the registry's fallback tenant
//!
//! Resolution is synchronous and never fails.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use url::Url;

use crate::errors::TenantryError;
use crate::registry::TenantRegistry;
use crate::tenant::TenantConfig;

/// Query parameter carrying an explicit tenant id.
pub const TENANT_QUERY_PARAM: &str = "tenant";

/// The signals a tenant can be derived from.
pub trait TenantEnvironment: Send + Sync {
    /// First value of a query parameter, if present.
    fn query_param(&self, key: &str) -> Option<String>;

    /// Current host name, without port.
    fn hostname(&self) -> Option<String>;
}

/// Environment backed by the current page URL.
#[derive(Debug, Clone)]
pub struct UrlEnvironment {
    url: Url,
}

impl UrlEnvironment {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).map_err(|e| {
            TenantryError::bad_request(format!("invalid url '{raw}': {e}")).into_anyhow()
        })?;
        Ok(Self::new(url))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl TenantEnvironment for UrlEnvironment {
    fn query_param(&self, key: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    fn hostname(&self) -> Option<String> {
        self.url.host_str().map(str::to_string)
    }
}

/// Fixed signals, for test harnesses and non-browser callers.
#[derive(Debug, Clone, Default)]
pub struct StaticEnvironment {
    pub query: HashMap<String, String>,
    pub host: Option<String>,
}

impl StaticEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }
}

impl TenantEnvironment for StaticEnvironment {
    fn query_param(&self, key: &str) -> Option<String> {
        self.query.get(key).cloned()
    }

    fn hostname(&self) -> Option<String> {
        self.host.clone()
    }
}

/// Which signal selected the tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    QueryParameter,
    Subdomain,
    Fallback,
}

impl ResolutionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionSource::QueryParameter => "query-parameter",
            ResolutionSource::Subdomain => "subdomain",
            ResolutionSource::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub config: Arc<TenantConfig>,
    pub source: ResolutionSource,
}

/// Derives the active tenant from a [`TenantEnvironment`].
#[derive(Debug, Clone)]
pub struct TenantResolver {
    registry: Arc<TenantRegistry>,
}

impl TenantResolver {
    pub fn new(registry: Arc<TenantRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<TenantRegistry> {
        &self.registry
    }

    /// Resolve the tenant for `env`. Always returns a registered config.
    pub fn resolve(&self, env: &dyn TenantEnvironment) -> Arc<TenantConfig> {
        self.resolve_with_source(env).config
    }

    pub fn resolve_with_source(&self, env: &dyn TenantEnvironment) -> Resolution {
        if let Some(config) = env
            .query_param(TENANT_QUERY_PARAM)
            .and_then(|id| self.registry.lookup(&id))
        {
            return self.resolved(config, ResolutionSource::QueryParameter);
        }

        if let Some(config) = env
            .hostname()
            .as_deref()
            .and_then(subdomain)
            .and_then(|label| self.registry.lookup(label))
        {
            return self.resolved(config, ResolutionSource::Subdomain);
        }

        self.resolved(self.registry.fallback(), ResolutionSource::Fallback)
    }

    fn resolved(&self, config: Arc<TenantConfig>, source: ResolutionSource) -> Resolution {
        tracing::debug!(tenant = %config.id, source = source.as_str(), "tenant resolved");
        Resolution { config, source }
    }
}

/// First dot-delimited label of a host name.
pub fn subdomain(host: &str) -> Option<&str> {
    host.split('.').next().filter(|label| !label.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> TenantResolver {
        TenantResolver::new(Arc::new(TenantRegistry::builtin()))
    }

    #[test]
    fn query_param_wins_over_subdomain() {
        let env = UrlEnvironment::parse("https://twilio.example.com/?tenant=default").unwrap();
        let res = resolver().resolve_with_source(&env);
        assert_eq!(res.config.id, "default");
        assert_eq!(res.source, ResolutionSource::QueryParameter);
    }

    #[test]
    fn unknown_query_param_falls_through_to_subdomain() {
        let env = UrlEnvironment::parse("https://twilio.example.com/login?tenant=acme").unwrap();
        let res = resolver().resolve_with_source(&env);
        assert_eq!(res.config.id, "twilio");
        assert_eq!(res.source, ResolutionSource::Subdomain);
    }

    #[test]
    fn unknown_subdomain_falls_back() {
        let env = UrlEnvironment::parse("https://unknown.example.com/").unwrap();
        let res = resolver().resolve_with_source(&env);
        assert_eq!(res.config.id, "twilio");
        assert_eq!(res.source, ResolutionSource::Fallback);
    }

    #[test]
    fn empty_environment_falls_back() {
        let res = resolver().resolve_with_source(&StaticEnvironment::new());
        assert_eq!(res.source, ResolutionSource::Fallback);
    }

    #[test]
    fn first_query_value_is_used() {
        let env = UrlEnvironment::parse("http://localhost:3000/?tenant=startup&tenant=twilio")
            .unwrap();
        assert_eq!(resolver().resolve(&env).id, "startup");
    }

    #[test]
    fn subdomain_label() {
        assert_eq!(subdomain("twilio.example.com"), Some("twilio"));
        assert_eq!(subdomain("localhost"), Some("localhost"));
        assert_eq!(subdomain(".example.com"), None);
        assert_eq!(subdomain(""), None);
    }

    #[test]
    fn bad_url_is_rejected() {
        assert!(UrlEnvironment::parse("not a url").is_err());
    }
}
