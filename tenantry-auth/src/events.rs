// Auth session events.

use crate::identity::Identity;

#[derive(Clone, Debug, PartialEq)]
pub enum AuthEvent {
    /// An existing session was found at startup.
    SessionRestored(Identity),
    SignedIn(Identity),
    /// Local identity cleared; `previous` is `None` when nobody was signed in.
    SignedOut { previous: Option<Identity> },
}

impl AuthEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AuthEvent::SessionRestored(_) => "session-restored",
            AuthEvent::SignedIn(_) => "login",
            AuthEvent::SignedOut { .. } => "logout",
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthEvent::SessionRestored(identity) | AuthEvent::SignedIn(identity) => Some(identity),
            AuthEvent::SignedOut { previous } => previous.as_ref(),
        }
    }
}
