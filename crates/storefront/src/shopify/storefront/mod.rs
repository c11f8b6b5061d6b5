//! Shopify Storefront API client implementation.
//!
//! Posts hand-written GraphQL documents with `reqwest` and decodes the
//! responses with `serde`. Only the customer-account operations the session
//! needs are implemented.

pub mod queries;

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};
use url::Url;

use crate::config::ShopifyStorefrontConfig;
use crate::shopify::types::{
    Customer, CustomerAccessToken, CustomerCreateInput, CustomerUserError, MutationPayload,
};
use crate::shopify::{CommerceApi, GraphQLError, ShopifyError};

// =============================================================================
// Response Envelopes
// =============================================================================

#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenCreateData {
    customer_access_token_create: Option<TokenCreatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenCreatePayload {
    customer_access_token: Option<CustomerAccessToken>,
    #[serde(default)]
    customer_user_errors: Vec<CustomerUserError>,
}

#[derive(Debug, Deserialize)]
struct CustomerData {
    customer: Option<Customer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenDeleteData {
    customer_access_token_delete: Option<TokenDeletePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenDeletePayload {
    deleted_access_token: Option<String>,
    #[serde(default)]
    user_errors: Vec<CustomerUserError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerCreateData {
    customer_create: Option<CustomerCreatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerCreatePayload {
    customer: Option<Customer>,
    #[serde(default)]
    customer_user_errors: Vec<CustomerUserError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerRecoverData {
    customer_recover: Option<CustomerRecoverPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerRecoverPayload {
    #[serde(default)]
    customer_user_errors: Vec<CustomerUserError>,
}

fn missing_payload(operation: &str) -> ShopifyError {
    ShopifyError::message(format!("{operation} returned no payload"))
}

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: Url,
    access_token: SecretString,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Config` if the store domain does not form a valid
    /// endpoint URL, or `ShopifyError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ShopifyStorefrontConfig) -> Result<Self, ShopifyError> {
        let endpoint = Url::parse(&format!(
            "https://{}/api/{}/graphql.json",
            config.store, config.api_version
        ))
        .map_err(|e| ShopifyError::Config(format!("invalid store domain: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!("fromage/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(StorefrontClientInner {
                client,
                endpoint,
                access_token: config.storefront_token.clone(),
            }),
        })
    }

    /// The GraphQL endpoint this client posts to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.inner.endpoint.as_str()
    }

    /// Execute a GraphQL document and decode its `data`.
    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, ShopifyError> {
        let body = json!({ "query": query, "variables": variables });

        let response = self
            .inner
            .client
            .post(self.inner.endpoint.clone())
            .header(
                "X-Shopify-Storefront-Access-Token",
                self.inner.access_token.expose_secret(),
            )
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Read the body first so failures can be logged with context
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::message(format!(
                "HTTP {status}: {}",
                response_text.chars().take(200).collect::<String>()
            )));
        }

        let response: GraphQLResponse<T> = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse Shopify GraphQL response"
            );
            ShopifyError::Parse(e)
        })?;

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(errors));
        }

        response
            .data
            .ok_or_else(|| ShopifyError::message("No data in response"))
    }
}

impl CommerceApi for StorefrontClient {
    #[instrument(skip_all)]
    async fn create_access_token(
        &self,
        email: &str,
        password: &str,
    ) -> Result<MutationPayload<CustomerAccessToken>, ShopifyError> {
        let variables = json!({ "input": { "email": email, "password": password } });
        let data: TokenCreateData = self
            .execute(queries::CUSTOMER_ACCESS_TOKEN_CREATE, variables)
            .await?;

        let payload = data
            .customer_access_token_create
            .ok_or_else(|| missing_payload("customerAccessTokenCreate"))?;

        Ok(MutationPayload {
            value: payload.customer_access_token,
            user_errors: payload.customer_user_errors,
        })
    }

    #[instrument(skip_all)]
    async fn fetch_customer(&self, access_token: &str) -> Result<Option<Customer>, ShopifyError> {
        let variables = json!({ "customerAccessToken": access_token });
        let data: CustomerData = self.execute(queries::CUSTOMER_BY_TOKEN, variables).await?;
        Ok(data.customer)
    }

    #[instrument(skip_all)]
    async fn revoke_access_token(
        &self,
        access_token: &str,
    ) -> Result<Vec<CustomerUserError>, ShopifyError> {
        let variables = json!({ "customerAccessToken": access_token });
        let data: TokenDeleteData = self
            .execute(queries::CUSTOMER_ACCESS_TOKEN_DELETE, variables)
            .await?;

        let payload = data
            .customer_access_token_delete
            .ok_or_else(|| missing_payload("customerAccessTokenDelete"))?;

        debug!(
            deleted = payload.deleted_access_token.is_some(),
            "Customer access token delete finished"
        );
        Ok(payload.user_errors)
    }

    #[instrument(skip_all)]
    async fn create_customer(
        &self,
        input: &CustomerCreateInput,
    ) -> Result<MutationPayload<Customer>, ShopifyError> {
        let variables = json!({ "input": input });
        let data: CustomerCreateData = self.execute(queries::CUSTOMER_CREATE, variables).await?;

        let payload = data
            .customer_create
            .ok_or_else(|| missing_payload("customerCreate"))?;

        Ok(MutationPayload {
            value: payload.customer,
            user_errors: payload.customer_user_errors,
        })
    }

    #[instrument(skip_all)]
    async fn recover_customer(&self, email: &str) -> Result<Vec<CustomerUserError>, ShopifyError> {
        let variables = json!({ "email": email });
        let data: CustomerRecoverData = self.execute(queries::CUSTOMER_RECOVER, variables).await?;

        let payload = data
            .customer_recover
            .ok_or_else(|| missing_payload("customerRecover"))?;

        Ok(payload.customer_user_errors)
    }
}
