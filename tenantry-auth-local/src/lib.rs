//! In-memory identity service for tenantry.
//!
//! [`MemoryIdentityService`] implements [`tenantry_auth::IdentityService`]
//! over a user pool kept in process memory. It backs the integration tests
//! and the demo binary.

pub mod error;
pub mod memory;

pub use error::PoolError;
pub use memory::{MemoryIdentityOptions, MemoryIdentityService, Operation};
