//! Scoped access to session state.
//!
//! A session owns its state; consumers get a [`Scoped`] handle that only
//! works while the owning session is alive. Reaching through a handle after
//! the owner is gone is a wiring bug and fails fast.

use std::sync::{Arc, Weak};

use crate::errors::TenantryError;
use crate::tenant::TenantId;

/// Weak handle to state owned by a session ("provider").
pub struct Scoped<T> {
    inner: Weak<T>,
    scope: &'static str,
}

impl<T> Clone for Scoped<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
            scope: self.scope,
        }
    }
}

impl<T> std::fmt::Debug for Scoped<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scoped")
            .field("scope", &self.scope)
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl<T> Scoped<T> {
    pub fn new(owner: &Arc<T>, scope: &'static str) -> Self {
        Self {
            inner: Arc::downgrade(owner),
            scope,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    pub fn try_get(&self) -> Result<Arc<T>, TenantryError> {
        self.inner.upgrade().ok_or_else(|| {
            TenantryError::context_misuse(format!(
                "{} state accessed outside of its provider scope",
                self.scope
            ))
        })
    }

    /// Upgrade or panic.
    pub fn get(&self) -> Arc<T> {
        match self.inner.upgrade() {
            Some(inner) => inner,
            None => panic!(
                "{} state accessed outside of its provider scope; \
                 keep the owning session alive while handles are in use",
                self.scope
            ),
        }
    }
}

/// Read access to the active tenant id, handed to collaborators that stamp
/// records with it.
pub trait TenantAccessor: Send + Sync {
    /// `None` while tenant state is not ready yet.
    fn current_tenant_id(&self) -> Option<TenantId>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn handle_works_while_owner_alive() {
        let owner = Arc::new(5u8);
        let handle = Scoped::new(&owner, "demo");
        assert_eq!(*handle.get(), 5);
        assert!(handle.is_alive());
    }

    #[test]
    fn try_get_reports_misuse_after_drop() {
        let owner = Arc::new(5u8);
        let handle = Scoped::new(&owner, "demo");
        drop(owner);
        let err = handle.try_get().unwrap_err();
        assert_eq!(err.kind, ErrorKind::ContextMisuse);
        assert!(err.message.contains("demo"));
    }

    #[test]
    #[should_panic(expected = "outside of its provider scope")]
    fn get_panics_after_drop() {
        let owner = Arc::new(5u8);
        let handle = Scoped::new(&owner, "demo");
        drop(owner);
        let _ = handle.get();
    }
}
