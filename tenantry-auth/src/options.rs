// Authentication options and configuration.

use serde::{Deserialize, Serialize};

/// Attribute names used when building registration requests, plus the
/// tenant tag used while tenant state is not ready yet.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AuthOptions {
    /// Custom attribute carrying the tenant id on the identity-service side
    pub tenant_attribute: String,
    /// Tenant id stamped on identities when no tenant is active
    pub fallback_tenant_tag: String,
    pub email_attribute: String,
    pub given_name_attribute: String,
    pub family_name_attribute: String,
    pub phone_number_attribute: String,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            tenant_attribute: "custom:tenant_id".to_string(),
            fallback_tenant_tag: "default".to_string(),
            email_attribute: "email".to_string(),
            given_name_attribute: "given_name".to_string(),
            family_name_attribute: "family_name".to_string(),
            phone_number_attribute: "phone_number".to_string(),
        }
    }
}

impl AuthOptions {
    /// Validate the authentication configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.fallback_tenant_tag.trim().is_empty() {
            return Err("Fallback tenant tag cannot be empty".to_string());
        }

        let attributes = [
            ("tenant_attribute", &self.tenant_attribute),
            ("email_attribute", &self.email_attribute),
            ("given_name_attribute", &self.given_name_attribute),
            ("family_name_attribute", &self.family_name_attribute),
            ("phone_number_attribute", &self.phone_number_attribute),
        ];

        for (field, value) in &attributes {
            if value.trim().is_empty() {
                return Err(format!("{field} cannot be empty"));
            }
        }

        // Two settings pointing at the same attribute would silently overwrite each other
        for (i, (field, value)) in attributes.iter().enumerate() {
            if let Some((other, _)) = attributes[i + 1..].iter().find(|(_, v)| v == value) {
                return Err(format!("{field} and {other} both map to attribute '{value}'"));
            }
        }

        Ok(())
    }

    /// Create a new AuthOptions builder
    pub fn builder() -> AuthOptionsBuilder {
        AuthOptionsBuilder::new()
    }
}

/// Builder pattern for AuthOptions configuration
#[derive(Clone, Debug, Default)]
pub struct AuthOptionsBuilder {
    options: AuthOptions,
}

impl AuthOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tenant_attribute(mut self, name: impl Into<String>) -> Self {
        self.options.tenant_attribute = name.into();
        self
    }

    pub fn fallback_tenant_tag(mut self, tag: impl Into<String>) -> Self {
        self.options.fallback_tenant_tag = tag.into();
        self
    }

    pub fn email_attribute(mut self, name: impl Into<String>) -> Self {
        self.options.email_attribute = name.into();
        self
    }

    pub fn given_name_attribute(mut self, name: impl Into<String>) -> Self {
        self.options.given_name_attribute = name.into();
        self
    }

    pub fn family_name_attribute(mut self, name: impl Into<String>) -> Self {
        self.options.family_name_attribute = name.into();
        self
    }

    pub fn phone_number_attribute(mut self, name: impl Into<String>) -> Self {
        self.options.phone_number_attribute = name.into();
        self
    }

    pub fn build(self) -> AuthOptions {
        self.options
    }

    /// Build and validate the AuthOptions configuration
    pub fn build_validated(self) -> Result<AuthOptions, String> {
        let options = self.build();
        options.validate()?;
        Ok(options)
    }
}
