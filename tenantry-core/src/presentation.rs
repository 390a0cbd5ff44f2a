//! # Presentation variables
//!
//! A shared string key/value store through which brand colors reach
//! renderers. Renderers read it without going back to tenant state; the
//! tenant session is its only writer and overwrites both color entries on
//! every initialize and switch.
//!
//! ```rust
//! use tenantry_core::{PresentationStore, TenantRegistry, PRIMARY_COLOR_VAR};
//!
//! let store = PresentationStore::new();
//! let tenant = TenantRegistry::builtin().fallback();
//! store.apply_brand(&tenant);
//!
//! assert_eq!(store.get(PRIMARY_COLOR_VAR), Some("#e74c3c".to_string()));
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::tenant::TenantConfig;

pub const PRIMARY_COLOR_VAR: &str = "primary-color";
pub const SECONDARY_COLOR_VAR: &str = "secondary-color";

/// Cheaply clonable handle; clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct PresentationStore {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl PresentationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a variable by key.
    pub fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }

    pub fn primary_color(&self) -> Option<String> {
        self.get(PRIMARY_COLOR_VAR)
    }

    pub fn secondary_color(&self) -> Option<String> {
        self.get(SECONDARY_COLOR_VAR)
    }

    /// Push a tenant's two brand colors. Both entries are written under one lock.
    pub fn apply_brand(&self, tenant: &TenantConfig) {
        {
            let mut values = self.values.write();
            values.insert(PRIMARY_COLOR_VAR.to_string(), tenant.primary_color.clone());
            values.insert(SECONDARY_COLOR_VAR.to_string(), tenant.secondary_color.clone());
        }
        tracing::trace!(
            tenant = %tenant.id,
            primary = %tenant.primary_color,
            secondary = %tenant.secondary_color,
            "presentation variables applied"
        );
    }

    pub fn snapshot(&self) -> PresentationSnapshot {
        PresentationSnapshot::new(self.values.read().clone())
    }
}

/// Point-in-time copy of the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresentationSnapshot {
    map: HashMap<String, String>,
}

impl PresentationSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Render as CSS custom properties, sorted by name.
    pub fn to_css(&self) -> String {
        let mut keys: Vec<&String> = self.map.keys().collect();
        keys.sort();
        keys.into_iter()
            .map(|k| format!("--{k}: {};", self.map[k]))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TenantRegistry;

    #[test]
    fn clones_share_entries() {
        let store = PresentationStore::new();
        let reader = store.clone();
        let twilio = TenantRegistry::builtin().lookup("twilio").unwrap();

        store.apply_brand(&twilio);

        assert_eq!(reader.primary_color().as_deref(), Some("#e74c3c"));
        assert_eq!(reader.secondary_color().as_deref(), Some("#f093fb"));
    }

    #[test]
    fn apply_overwrites_previous_brand() {
        let reg = TenantRegistry::builtin();
        let store = PresentationStore::new();
        store.apply_brand(&reg.lookup("twilio").unwrap());
        store.apply_brand(&reg.lookup("startup").unwrap());

        let snap = store.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap.get(PRIMARY_COLOR_VAR), Some("#ff6b6b"));
        assert_eq!(
            snap.to_css(),
            "--primary-color: #ff6b6b; --secondary-color: #4ecdc4;"
        );
    }
}
