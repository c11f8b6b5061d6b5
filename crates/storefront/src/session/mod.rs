//! Customer session state machine.
//!
//! [`SessionState`] records who the customer is and the access credential
//! Shopify issued at login. It changes only through [`reduce`] with one of the
//! three [`SessionAction`]s. Whether the session is *authorized* is never
//! stored: [`SessionManager`] derives it from the credential and a live
//! customer lookup, and publishes it on a `watch` channel.

mod manager;

pub use manager::SessionManager;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shopify::{Customer, CustomerAccessToken};

/// Customer details kept in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfile {
    /// Full name, or email/phone when no name is set.
    pub display_name: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepts_marketing: Option<bool>,
}

impl From<Customer> for CustomerProfile {
    fn from(customer: Customer) -> Self {
        Self {
            display_name: customer.display_name,
            email: customer.email.unwrap_or_default(),
            first_name: customer.first_name,
            last_name: customer.last_name,
            accepts_marketing: customer.accepts_marketing,
        }
    }
}

/// Access token and its expiry. One never exists without the other.
///
/// `Debug` redacts the token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessCredential {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessCredential {
    /// Whether the credential has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl From<CustomerAccessToken> for AccessCredential {
    fn from(token: CustomerAccessToken) -> Self {
        Self {
            access_token: token.access_token,
            expires_at: token.expires_at,
        }
    }
}

impl std::fmt::Debug for AccessCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessCredential")
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// What the local half of the authorization check concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStatus<'a> {
    /// No access token.
    Missing,
    /// Token present but past its expiry.
    Expired,
    /// Token present and unexpired; only Shopify can say if it still works.
    Unexpired(&'a AccessCredential),
}

/// The persisted session.
///
/// Stored as `{}` when empty, otherwise
/// `{ "customer"?: {...}, "accessToken": "...", "expiresAt": "..." }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerProfile>,
    #[serde(flatten)]
    pub credential: Option<AccessCredential>,
}

impl SessionState {
    /// The signed-out session.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            customer: None,
            credential: None,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.customer.is_none() && self.credential.is_none()
    }

    /// The access token, if any.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.credential.as_ref().map(|c| c.access_token.as_str())
    }

    /// Local part of the authorization check.
    #[must_use]
    pub fn credential_status(&self, now: DateTime<Utc>) -> CredentialStatus<'_> {
        match &self.credential {
            None => CredentialStatus::Missing,
            Some(credential) if credential.is_expired_at(now) => CredentialStatus::Expired,
            Some(credential) => CredentialStatus::Unexpired(credential),
        }
    }
}

/// A change to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Set the customer profile; the credential is kept.
    Create(CustomerProfile),
    /// Set the credential; the customer is kept.
    Login(AccessCredential),
    /// Back to the empty session.
    Logout,
}

impl SessionAction {
    /// Short name for logs and breadcrumbs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Login(_) => "login",
            Self::Logout => "logout",
        }
    }
}

/// Apply `action` to `state`, returning the next state.
#[must_use]
pub fn reduce(state: &SessionState, action: SessionAction) -> SessionState {
    match action {
        SessionAction::Create(profile) => SessionState {
            customer: Some(profile),
            credential: state.credential.clone(),
        },
        SessionAction::Login(credential) => SessionState {
            customer: state.customer.clone(),
            credential: Some(credential),
        },
        SessionAction::Logout => SessionState::empty(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn profile() -> CustomerProfile {
        CustomerProfile {
            display_name: "Marie Harel".to_string(),
            email: "marie@camembert.fr".to_string(),
            first_name: Some("Marie".to_string()),
            last_name: Some("Harel".to_string()),
            accepts_marketing: None,
        }
    }

    fn credential(valid_for: TimeDelta) -> AccessCredential {
        AccessCredential {
            access_token: "tok_123".to_string(),
            expires_at: Utc::now() + valid_for,
        }
    }

    #[test]
    fn test_create_keeps_credential() {
        let cred = credential(TimeDelta::hours(1));
        let state = reduce(&SessionState::empty(), SessionAction::Login(cred.clone()));
        let state = reduce(&state, SessionAction::Create(profile()));
        assert_eq!(state.credential, Some(cred));
        assert_eq!(state.customer, Some(profile()));
    }

    #[test]
    fn test_login_keeps_customer() {
        let state = reduce(&SessionState::empty(), SessionAction::Create(profile()));
        let state = reduce(&state, SessionAction::Login(credential(TimeDelta::hours(1))));
        assert_eq!(state.customer, Some(profile()));
        assert_eq!(state.access_token(), Some("tok_123"));
    }

    #[test]
    fn test_logout_empties() {
        let state = reduce(&SessionState::empty(), SessionAction::Create(profile()));
        let state = reduce(&state, SessionAction::Login(credential(TimeDelta::hours(1))));
        let state = reduce(&state, SessionAction::Logout);
        assert!(state.is_empty());

        let again = reduce(&state, SessionAction::Logout);
        assert_eq!(again, SessionState::empty());
    }

    #[test]
    fn test_credential_status() {
        let now = Utc::now();
        assert_eq!(
            SessionState::empty().credential_status(now),
            CredentialStatus::Missing
        );

        let expired = reduce(
            &SessionState::empty(),
            SessionAction::Login(credential(TimeDelta::seconds(-1))),
        );
        assert_eq!(expired.credential_status(now), CredentialStatus::Expired);

        let live = reduce(
            &SessionState::empty(),
            SessionAction::Login(credential(TimeDelta::hours(1))),
        );
        assert!(matches!(
            live.credential_status(now),
            CredentialStatus::Unexpired(_)
        ));
    }

    #[test]
    fn test_expiry_boundary_is_expired() {
        let cred = credential(TimeDelta::zero());
        assert!(cred.is_expired_at(cred.expires_at));
    }

    #[test]
    fn test_empty_serializes_to_empty_object() {
        assert_eq!(serde_json::to_string(&SessionState::empty()).unwrap(), "{}");
        let state: SessionState = serde_json::from_str("{}").unwrap();
        assert!(state.is_empty());
    }

    #[test]
    fn test_persisted_shape_is_flat() {
        let state = reduce(
            &reduce(&SessionState::empty(), SessionAction::Create(profile())),
            SessionAction::Login(credential(TimeDelta::hours(1))),
        );
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["accessToken"], "tok_123");
        assert!(json["expiresAt"].is_string());
        assert_eq!(json["customer"]["displayName"], "Marie Harel");

        let back: SessionState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_token_without_expiry_is_dropped() {
        let state: SessionState = serde_json::from_str(
            r#"{"customer": null, "accessToken": "tok_123", "expiresAt": null}"#,
        )
        .unwrap();
        assert!(state.credential.is_none());
    }

    #[test]
    fn test_credential_debug_redacts_token() {
        let cred = credential(TimeDelta::hours(1));
        assert!(!format!("{cred:?}").contains("tok_123"));
    }
}
