//! Core multi-tenant types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::TenantryError;

/// A simple tenant identifier (the registry key, e.g. `"twilio"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub String);

impl TenantId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TenantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for TenantId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TenantId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Copy shown on sign-up / sign-in screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branding {
    pub company_name: String,
    pub tagline: String,
    pub support_email: String,
}

/// A branded customer configuration.
///
/// Immutable once looked up; a tenant switch replaces the whole value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantConfig {
    pub id: TenantId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub primary_color: String,
    pub secondary_color: String,
    pub domain: String,
    /// Enabled capability tags. Order is display order only.
    #[serde(default)]
    pub features: Vec<String>,
    pub branding: Branding,
}

impl TenantConfig {
    pub fn has_feature(&self, tag: &str) -> bool {
        self.features.iter().any(|f| f == tag)
    }

    /// Check the invariants every registry entry must hold.
    pub fn validate(&self) -> Result<(), TenantryError> {
        if self.id.as_str().trim().is_empty() {
            return Err(TenantryError::unprocessable("tenant id cannot be empty"));
        }
        for (field, value) in [
            ("primaryColor", &self.primary_color),
            ("secondaryColor", &self.secondary_color),
        ] {
            if !is_css_hex_color(value) {
                return Err(TenantryError::unprocessable(format!(
                    "tenant '{}': {field} '{value}' is not a valid CSS hex color",
                    self.id
                )));
            }
        }
        Ok(())
    }
}

/// `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa`.
pub fn is_css_hex_color(value: &str) -> bool {
    let Some(hex) = value.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit())
}
