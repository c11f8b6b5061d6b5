//! Shopify Storefront API access for customer accounts.
//!
//! # Architecture
//!
//! - [`CommerceApi`] is the capability set the session state machine consumes:
//!   token issuance, customer lookup, token revocation, customer creation and
//!   password recovery
//! - [`StorefrontClient`] implements it over HTTP against the Storefront
//!   GraphQL endpoint
//! - Shopify is source of truth - the client keeps no cache, every call is a
//!   live round trip
//!
//! Every operation resolves to either a typed payload (which may carry
//! structured [`CustomerUserError`]s) or a [`ShopifyError`] for anything that
//! went wrong on the way: transport, HTTP status, GraphQL errors, bad JSON.
//!
//! # Example
//!
//! ```rust,ignore
//! use fromage_storefront::shopify::{CommerceApi, StorefrontClient};
//!
//! let client = StorefrontClient::new(&config.shopify)?;
//! let payload = client.create_access_token("brie@fromage.fr", "hunter22").await?;
//! if let Some(token) = payload.value {
//!     let customer = client.fetch_customer(&token.access_token).await?;
//! }
//! ```

mod storefront;
#[cfg(any(test, feature = "test-support"))]
pub mod stub;
pub mod types;

pub use storefront::StorefrontClient;
pub use types::*;

use std::future::Future;

use thiserror::Error;

/// Errors that can occur when interacting with Shopify APIs.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors (or the endpoint answered non-2xx).
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The client could not be constructed from configuration.
    #[error("Invalid client configuration: {0}")]
    Config(String),
}

impl ShopifyError {
    /// Build a `GraphQL` error carrying a single message.
    pub(crate) fn message(message: impl Into<String>) -> Self {
        Self::GraphQL(vec![GraphQLError {
            message: message.into(),
            path: vec![],
        }])
    }
}

/// A GraphQL error returned by the Shopify API.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Path to the error in the response.
    #[serde(default)]
    pub path: Vec<serde_json::Value>,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();

            if !e.message.is_empty() {
                parts.push(e.message.clone());
            }

            if !e.path.is_empty() {
                let path_str = e
                    .path
                    .iter()
                    .map(|p| match p {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                parts.push(format!("path: {path_str}"));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// CommerceApi
// =============================================================================

/// Remote operations the customer session depends on.
///
/// Implementations must be cheap to share between the session manager and its
/// background re-validation task (`Send + Sync + 'static`).
pub trait CommerceApi: Send + Sync + 'static {
    /// Exchange email + password for a customer access token
    /// (`customerAccessTokenCreate`).
    fn create_access_token(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<MutationPayload<CustomerAccessToken>, ShopifyError>> + Send;

    /// Look up the customer a token belongs to (`customer(customerAccessToken:)`).
    ///
    /// `Ok(None)` means the token no longer identifies a customer.
    fn fetch_customer(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<Option<Customer>, ShopifyError>> + Send;

    /// Revoke a customer access token (`customerAccessTokenDelete`).
    fn revoke_access_token(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<Vec<CustomerUserError>, ShopifyError>> + Send;

    /// Create a customer account (`customerCreate`).
    fn create_customer(
        &self,
        input: &CustomerCreateInput,
    ) -> impl Future<Output = Result<MutationPayload<Customer>, ShopifyError>> + Send;

    /// Send a password recovery email (`customerRecover`).
    fn recover_customer(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Vec<CustomerUserError>, ShopifyError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_error() {
        let err = ShopifyError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }

    #[test]
    fn test_graphql_error_formatting() {
        let err = ShopifyError::GraphQL(vec![
            GraphQLError {
                message: "Field 'customer' doesn't accept argument 'token'".to_string(),
                path: vec![],
            },
            GraphQLError {
                message: "Throttled".to_string(),
                path: vec![],
            },
        ]);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Field 'customer' doesn't accept argument 'token'; Throttled"
        );
    }

    #[test]
    fn test_graphql_error_path_only() {
        let err = ShopifyError::GraphQL(vec![GraphQLError {
            message: String::new(),
            path: vec![
                serde_json::Value::String("customerCreate".to_string()),
                serde_json::Value::Number(0.into()),
            ],
        }]);
        assert_eq!(err.to_string(), "GraphQL errors: path: customerCreate.0");
    }

    #[test]
    fn test_graphql_error_empty() {
        assert_eq!(
            ShopifyError::GraphQL(vec![]).to_string(),
            "GraphQL errors: (no error details provided)"
        );
        let err = ShopifyError::GraphQL(vec![GraphQLError {
            message: String::new(),
            path: vec![],
        }]);
        assert_eq!(err.to_string(), "GraphQL errors: [error 1]: (no details)");
    }
}
