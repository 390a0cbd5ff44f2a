//! tenantry-auth: tenant-aware authentication session state.
//!
//! [`AuthSession`] owns the local [`Identity`] and forwards sign-up, sign-in,
//! sign-out and confirmation calls to an [`IdentityService`]. Identities are
//! stamped with the tenant active at the moment they are established.

pub mod events;
pub mod identity;
pub mod options;
pub mod service;
pub mod session;

pub use events::AuthEvent;
pub use identity::{
    CodeDeliveryDetails, ConfirmSignUpResult, Credentials, DeliveryMedium, Identity,
    RegistrationRequest, SessionUser, SignInResult, SignInStep, SignUpData, SignUpResult,
    SignUpStep,
};
pub use options::{AuthOptions, AuthOptionsBuilder};
pub use service::IdentityService;
pub use session::{AuthHandle, AuthSession};
