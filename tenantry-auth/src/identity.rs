// Identity records and the payloads exchanged with the identity service.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tenantry_core::TenantId;

/// The local record of an authenticated user.
///
/// Replaced wholesale, never patched. `tenant_id` is the tenant that was
/// active when the identity was established; later tenant switches do not
/// change it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub tenant_id: TenantId,
    /// Raw profile payload as returned by the identity service.
    #[serde(default)]
    pub attributes: Value,
}

/// Session owner reported by `probe_session`.
///
/// `raw` keeps the untouched payload; only `user_id` and `login_id` are read
/// by the session logic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub user_id: String,
    pub username: String,
    pub login_id: Option<String>,
    #[serde(default)]
    pub raw: Value,
}

impl SessionUser {
    /// Map a loosely-shaped service payload (`userId`, `username`,
    /// `signInDetails.loginId`) into a `SessionUser`.
    pub fn from_payload(raw: Value) -> Option<Self> {
        let user_id = raw.get("userId")?.as_str()?.to_string();
        let username = raw
            .get("username")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let login_id = raw
            .get("signInDetails")
            .and_then(|d| d.get("loginId"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Some(Self {
            user_id,
            username,
            login_id,
            raw,
        })
    }
}

/// What the sign-up form collects.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpData {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// Registration request sent to the identity service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub username: String,
    pub password: String,
    pub attributes: BTreeMap<String, String>,
}

impl RegistrationRequest {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryMedium {
    Email,
    Sms,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeDeliveryDetails {
    pub destination: String,
    pub delivery_medium: DeliveryMedium,
    pub attribute_name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignUpStep {
    ConfirmSignUp,
    Done,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpResult {
    pub user_id: Option<String>,
    pub is_sign_up_complete: bool,
    pub next_step: SignUpStep,
    pub code_delivery: Option<CodeDeliveryDetails>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmSignUpResult {
    pub is_sign_up_complete: bool,
    pub next_step: SignUpStep,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignInStep {
    ConfirmSignUp,
    ResetPassword,
    Done,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResult {
    pub is_signed_in: bool,
    pub next_step: SignInStep,
}

impl SignInResult {
    pub fn done() -> Self {
        Self {
            is_signed_in: true,
            next_step: SignInStep::Done,
        }
    }
}
