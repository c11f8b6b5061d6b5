//! Domain types for the Shopify Storefront customer API.
//!
//! Field names follow the GraphQL schema (camelCase) so the same types parse
//! responses and serialize mutation inputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// User Errors
// =============================================================================

/// Machine-readable code attached to a [`CustomerUserError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerErrorCode {
    /// Input was blank.
    Blank,
    /// Input was invalid.
    Invalid,
    /// Input is already taken (e.g. duplicate email).
    Taken,
    /// Input is too long.
    TooLong,
    /// Input is too short.
    TooShort,
    /// No customer matches the credentials.
    UnidentifiedCustomer,
    /// The customer account is disabled.
    CustomerDisabled,
    /// Password starts or ends with whitespace.
    PasswordStartsOrEndsWithWhitespace,
    /// Input contains HTML tags.
    ContainsHtmlTags,
    /// Input contains a URL.
    ContainsUrl,
    /// The token is invalid.
    TokenInvalid,
    /// The account is already enabled.
    AlreadyEnabled,
    /// The resource was not found.
    NotFound,
    /// The email domain is rejected.
    BadDomain,
    /// Anything else, including codes added to the API after this was written.
    #[default]
    #[serde(other)]
    Unknown,
}

/// A business-rule failure returned by a customer mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerUserError {
    /// Error code (absent on plain `UserError`s, which read as `Unknown`).
    #[serde(default)]
    pub code: CustomerErrorCode,
    /// Path to the input field that caused the error, e.g. `["input", "email"]`.
    pub field: Option<Vec<String>>,
    /// Human-readable error message.
    pub message: String,
}

impl CustomerUserError {
    /// An error not attributable to any field.
    #[must_use]
    pub fn unknown(message: impl Into<String>) -> Self {
        Self {
            code: CustomerErrorCode::Unknown,
            field: None,
            message: message.into(),
        }
    }

    /// An `INVALID` error on a single form field.
    #[must_use]
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        Self {
            code: CustomerErrorCode::Invalid,
            field: Some(vec!["input".to_string(), field.to_string()]),
            message: message.into(),
        }
    }

    /// Form field this error belongs to: the last segment of `field`.
    #[must_use]
    pub fn form_field(&self) -> Option<&str> {
        self.field.as_ref()?.last().map(String::as_str)
    }
}

/// Result of a customer mutation: the value on success, user errors otherwise.
///
/// Shopify may return both (a value with warnings) or neither; callers decide
/// how to treat those.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationPayload<T> {
    /// The created/updated object, when the mutation succeeded.
    pub value: Option<T>,
    /// Business-rule failures.
    pub user_errors: Vec<CustomerUserError>,
}

impl<T> MutationPayload<T> {
    /// A successful payload.
    #[must_use]
    pub const fn success(value: T) -> Self {
        Self {
            value: Some(value),
            user_errors: Vec::new(),
        }
    }

    /// A payload carrying only user errors.
    #[must_use]
    pub const fn rejected(user_errors: Vec<CustomerUserError>) -> Self {
        Self {
            value: None,
            user_errors,
        }
    }
}

// =============================================================================
// Access Tokens
// =============================================================================

/// Customer access token issued by `customerAccessTokenCreate`.
///
/// `Debug` redacts the token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAccessToken {
    /// The opaque token.
    pub access_token: String,
    /// When Shopify stops honouring the token.
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for CustomerAccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomerAccessToken")
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

// =============================================================================
// Customers
// =============================================================================

/// A Shopify customer as returned by the Storefront API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Name to show: full name, or email/phone when no name is set.
    pub display_name: String,
    /// Email address.
    pub email: Option<String>,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Whether the customer accepts marketing.
    pub accepts_marketing: Option<bool>,
}

/// Input for `customerCreate`.
///
/// `Debug` redacts the password.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerCreateInput {
    /// Email address.
    pub email: String,
    /// Account password.
    pub password: String,
    /// First name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Last name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Whether the customer opts into marketing.
    pub accepts_marketing: bool,
}

impl std::fmt::Debug for CustomerCreateInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomerCreateInput")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("accepts_marketing", &self.accepts_marketing)
            .finish()
    }
}
