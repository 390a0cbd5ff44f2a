//! tenantry-core: tenant registry, resolution and session state.
//!
//! Leaf-first:
//! - [`TenantRegistry`]: static id → [`TenantConfig`] mapping with a designated fallback
//! - [`TenantResolver`]: query parameter → subdomain → fallback
//! - [`TenantSession`]: the active tenant, switching, change notification and
//!   the [`PresentationStore`] brand colors

#[macro_use]
pub mod errors;
pub mod context;
pub mod events;
pub mod presentation;
pub mod registry;
pub mod resolver;
pub mod session;
pub mod tenant;

pub use context::{Scoped, TenantAccessor};
pub use errors::{ErrorKind, TenantryError, TenantryResult};
pub use events::{EventHub, Listener, ListenerId, TenantEvent};
pub use presentation::{
    PresentationSnapshot, PresentationStore, PRIMARY_COLOR_VAR, SECONDARY_COLOR_VAR,
};
pub use registry::{TenantRegistry, BUILTIN_FALLBACK_TENANT_ID, DEFAULT_TENANT_ID};
pub use resolver::{
    Resolution, ResolutionSource, StaticEnvironment, TenantEnvironment, TenantResolver,
    UrlEnvironment, TENANT_QUERY_PARAM,
};
pub use session::{Lifecycle, TenantHandle, TenantSession};
pub use tenant::{is_css_hex_color, Branding, TenantConfig, TenantId};
