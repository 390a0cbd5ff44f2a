//! Tenant session state.
//!
//! Holds the active [`TenantConfig`], lets callers switch it, pushes the
//! tenant's brand colors into the [`PresentationStore`] and notifies
//! subscribers. Reading `current()` before `initialize()` yields `None`;
//! treat that as "not ready", not as an error.

use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;

use crate::context::{Scoped, TenantAccessor};
use crate::errors::TenantryError;
use crate::events::{EventHub, Listener, ListenerId, TenantEvent};
use crate::presentation::PresentationStore;
use crate::registry::TenantRegistry;
use crate::resolver::{ResolutionSource, TenantEnvironment, TenantResolver};
use crate::tenant::{TenantConfig, TenantId};

/// `Absent → Loading → Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Constructed, initializer not run yet.
    Absent,
    /// Initializer running.
    Loading,
    Ready,
}

#[derive(Debug)]
struct TenantState {
    current: Option<Arc<TenantConfig>>,
    lifecycle: Lifecycle,
    /// Signal that selected the tenant at initialize.
    source: Option<ResolutionSource>,
}

pub(crate) struct TenantSessionInner {
    resolver: TenantResolver,
    presentation: PresentationStore,
    state: RwLock<TenantState>,
    events: EventHub<TenantEvent>,
}

/// Owner of tenant state. Clones share the same state.
#[derive(Clone)]
pub struct TenantSession {
    inner: Arc<TenantSessionInner>,
}

impl TenantSession {
    pub fn new(resolver: TenantResolver, presentation: PresentationStore) -> Self {
        Self {
            inner: Arc::new(TenantSessionInner {
                resolver,
                presentation,
                state: RwLock::new(TenantState {
                    current: None,
                    lifecycle: Lifecycle::Absent,
                    source: None,
                }),
                events: EventHub::new(),
            }),
        }
    }

    /// Session over `registry` with a fresh presentation store.
    pub fn with_registry(registry: Arc<TenantRegistry>) -> Self {
        Self::new(TenantResolver::new(registry), PresentationStore::new())
    }

    /// Resolve the tenant from `env`, make it current and apply its colors.
    ///
    /// Resolution happens once per session; later calls return the current tenant.
    pub fn initialize(&self, env: &dyn TenantEnvironment) -> Arc<TenantConfig> {
        let resolved = {
            let mut state = self.inner.state.write();
            if let (Lifecycle::Ready, Some(current)) = (state.lifecycle, state.current.as_ref()) {
                tracing::debug!(tenant = %current.id, "tenant session already initialized");
                return Arc::clone(current);
            }
            state.lifecycle = Lifecycle::Loading;

            let resolution = self.inner.resolver.resolve_with_source(env);
            state.current = Some(Arc::clone(&resolution.config));
            state.source = Some(resolution.source);
            state.lifecycle = Lifecycle::Ready;
            self.inner.presentation.apply_brand(&resolution.config);
            resolution
        };

        if resolved.source == ResolutionSource::Fallback {
            tracing::info!(
                tenant = %resolved.config.id,
                "no tenant signal matched, using fallback tenant"
            );
        } else {
            tracing::info!(
                tenant = %resolved.config.id,
                source = resolved.source.as_str(),
                "tenant initialized"
            );
        }

        self.inner
            .events
            .emit(&TenantEvent::Initialized(Arc::clone(&resolved.config)));
        resolved.config
    }

    /// Replace the current tenant wholesale and re-apply its colors.
    ///
    /// Does not touch any authenticated identity: identities keep the tenant
    /// id they were created with.
    pub fn switch_tenant(&self, config: impl Into<Arc<TenantConfig>>) -> Result<()> {
        let config: Arc<TenantConfig> = config.into();
        config.validate().map_err(TenantryError::into_anyhow)?;

        let previous = {
            let mut state = self.inner.state.write();
            let previous = state.current.replace(Arc::clone(&config));
            state.lifecycle = Lifecycle::Ready;
            self.inner.presentation.apply_brand(&config);
            previous
        };

        tracing::info!(
            from = previous.as_ref().map(|p| p.id.as_str()).unwrap_or("<none>"),
            to = %config.id,
            "tenant switched"
        );

        self.inner.events.emit(&TenantEvent::Switched {
            previous,
            current: config,
        });
        Ok(())
    }

    /// Switch to a registered tenant by id.
    pub fn switch_to(&self, id: &str) -> Result<Arc<TenantConfig>> {
        let Some(config) = self.inner.resolver.registry().lookup(id) else {
            bail_tenantry!(not_found, "tenant '{}' is not registered", id);
        };
        self.switch_tenant(Arc::clone(&config))?;
        Ok(config)
    }

    pub fn current(&self) -> Option<Arc<TenantConfig>> {
        self.inner.state.read().current.clone()
    }

    pub fn current_id(&self) -> Option<TenantId> {
        self.inner.state.read().current.as_ref().map(|c| c.id.clone())
    }

    pub fn is_loading(&self) -> bool {
        self.lifecycle() != Lifecycle::Ready
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.inner.state.read().lifecycle
    }

    /// How `initialize` picked its tenant. `None` until it has run; later
    /// switches do not change it.
    pub fn resolution_source(&self) -> Option<ResolutionSource> {
        self.inner.state.read().source
    }

    pub fn presentation(&self) -> &PresentationStore {
        &self.inner.presentation
    }

    pub fn registry(&self) -> &Arc<TenantRegistry> {
        self.inner.resolver.registry()
    }

    pub fn subscribe(&self, listener: Listener<TenantEvent>) -> ListenerId {
        self.inner.events.on(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.inner.events.off(id)
    }

    /// Consumer handle valid for as long as this session (or a clone) lives.
    pub fn handle(&self) -> TenantHandle {
        TenantHandle {
            scope: Scoped::new(&self.inner, "tenant"),
        }
    }
}

impl TenantAccessor for TenantSession {
    fn current_tenant_id(&self) -> Option<TenantId> {
        self.current_id()
    }
}

/// Consumer view of a [`TenantSession`].
///
/// Every accessor panics once the owning session has been dropped; use
/// [`TenantHandle::try_session`] to probe instead.
#[derive(Clone, Debug)]
pub struct TenantHandle {
    scope: Scoped<TenantSessionInner>,
}

impl TenantHandle {
    pub fn try_session(&self) -> Result<TenantSession, TenantryError> {
        self.scope.try_get().map(|inner| TenantSession { inner })
    }

    pub fn session(&self) -> TenantSession {
        TenantSession {
            inner: self.scope.get(),
        }
    }

    pub fn current(&self) -> Option<Arc<TenantConfig>> {
        self.session().current()
    }

    pub fn is_loading(&self) -> bool {
        self.session().is_loading()
    }

    pub fn switch_tenant(&self, config: impl Into<Arc<TenantConfig>>) -> Result<()> {
        self.session().switch_tenant(config)
    }

    pub fn switch_to(&self, id: &str) -> Result<Arc<TenantConfig>> {
        self.session().switch_to(id)
    }

    pub fn subscribe(&self, listener: Listener<TenantEvent>) -> ListenerId {
        self.session().subscribe(listener)
    }
}

impl TenantAccessor for TenantHandle {
    fn current_tenant_id(&self) -> Option<TenantId> {
        self.session().current_id()
    }
}
