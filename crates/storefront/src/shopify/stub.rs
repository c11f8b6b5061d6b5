//! Scripted [`CommerceApi`] for tests.
//!
//! Every operation answers with whatever was last scripted for it and counts
//! how often it was called. Unscripted operations fail with a GraphQL error.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::types::{
    Customer, CustomerAccessToken, CustomerCreateInput, CustomerUserError, MutationPayload,
};
use super::{CommerceApi, ShopifyError};

/// Scripted answer for one operation.
#[derive(Debug, Clone)]
enum Reply<T> {
    Value(T),
    Fail(String),
}

impl<T: Clone> Reply<T> {
    fn get(&self) -> Result<T, ShopifyError> {
        match self {
            Self::Value(v) => Ok(v.clone()),
            Self::Fail(message) => Err(ShopifyError::message(message.clone())),
        }
    }
}

fn unscripted<T>(operation: &str) -> Mutex<Reply<T>> {
    Mutex::new(Reply::Fail(format!("{operation}: no scripted response")))
}

#[derive(Debug, Default)]
struct Calls {
    create_access_token: AtomicUsize,
    fetch_customer: AtomicUsize,
    revoke_access_token: AtomicUsize,
    create_customer: AtomicUsize,
    recover_customer: AtomicUsize,
}

/// In-memory Commerce API with scripted responses and call counters.
#[derive(Debug)]
pub struct StubCommerceApi {
    access_token: Mutex<Reply<MutationPayload<CustomerAccessToken>>>,
    customer: Mutex<Reply<Option<Customer>>>,
    revoke: Mutex<Reply<Vec<CustomerUserError>>>,
    create: Mutex<Reply<MutationPayload<Customer>>>,
    recover: Mutex<Reply<Vec<CustomerUserError>>>,
    fetch_delay: Mutex<Option<Duration>>,
    fetched_tokens: Mutex<Vec<String>>,
    revoked_tokens: Mutex<Vec<String>>,
    calls: Calls,
}

impl Default for StubCommerceApi {
    fn default() -> Self {
        Self::new()
    }
}

fn set<T>(slot: &Mutex<T>, value: T) {
    *slot.lock().unwrap_or_else(PoisonError::into_inner) = value;
}

fn read<T: Clone>(slot: &Mutex<T>) -> T {
    slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

impl StubCommerceApi {
    /// A stub where every operation fails until scripted.
    #[must_use]
    pub fn new() -> Self {
        Self {
            access_token: unscripted("customerAccessTokenCreate"),
            customer: unscripted("customer"),
            revoke: unscripted("customerAccessTokenDelete"),
            create: unscripted("customerCreate"),
            recover: unscripted("customerRecover"),
            fetch_delay: Mutex::new(None),
            fetched_tokens: Mutex::new(Vec::new()),
            revoked_tokens: Mutex::new(Vec::new()),
            calls: Calls::default(),
        }
    }

    // -------------------------------------------------------------------------
    // Scripting
    // -------------------------------------------------------------------------

    /// `create_access_token` issues `token`.
    pub fn issue_token(&self, token: CustomerAccessToken) {
        set(&self.access_token, Reply::Value(MutationPayload::success(token)));
    }

    /// `create_access_token` answers with user errors and no token.
    pub fn reject_token(&self, user_errors: Vec<CustomerUserError>) {
        set(
            &self.access_token,
            Reply::Value(MutationPayload::rejected(user_errors)),
        );
    }

    /// `create_access_token` fails outright.
    pub fn fail_token(&self, message: &str) {
        set(&self.access_token, Reply::Fail(message.to_string()));
    }

    /// `fetch_customer` returns `customer` (or null).
    pub fn return_customer(&self, customer: Option<Customer>) {
        set(&self.customer, Reply::Value(customer));
    }

    /// `fetch_customer` fails outright.
    pub fn fail_customer(&self, message: &str) {
        set(&self.customer, Reply::Fail(message.to_string()));
    }

    /// Delay every `fetch_customer` answer.
    pub fn delay_customer(&self, delay: Duration) {
        set(&self.fetch_delay, Some(delay));
    }

    /// `revoke_access_token` succeeds.
    pub fn accept_revoke(&self) {
        set(&self.revoke, Reply::Value(Vec::new()));
    }

    /// `revoke_access_token` fails outright.
    pub fn fail_revoke(&self, message: &str) {
        set(&self.revoke, Reply::Fail(message.to_string()));
    }

    /// `create_customer` answers with `payload`.
    pub fn create_result(&self, payload: MutationPayload<Customer>) {
        set(&self.create, Reply::Value(payload));
    }

    /// `create_customer` fails outright.
    pub fn fail_create(&self, message: &str) {
        set(&self.create, Reply::Fail(message.to_string()));
    }

    /// `recover_customer` answers with `user_errors` (empty means sent).
    pub fn recover_result(&self, user_errors: Vec<CustomerUserError>) {
        set(&self.recover, Reply::Value(user_errors));
    }

    /// `recover_customer` fails outright.
    pub fn fail_recover(&self, message: &str) {
        set(&self.recover, Reply::Fail(message.to_string()));
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn create_access_token_calls(&self) -> usize {
        self.calls.create_access_token.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn fetch_customer_calls(&self) -> usize {
        self.calls.fetch_customer.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn revoke_access_token_calls(&self) -> usize {
        self.calls.revoke_access_token.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn create_customer_calls(&self) -> usize {
        self.calls.create_customer.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn recover_customer_calls(&self) -> usize {
        self.calls.recover_customer.load(Ordering::SeqCst)
    }

    /// Tokens passed to `fetch_customer`, in call order.
    #[must_use]
    pub fn fetched_tokens(&self) -> Vec<String> {
        read(&self.fetched_tokens)
    }

    /// Tokens passed to `revoke_access_token`, in call order.
    #[must_use]
    pub fn revoked_tokens(&self) -> Vec<String> {
        read(&self.revoked_tokens)
    }
}

impl CommerceApi for StubCommerceApi {
    async fn create_access_token(
        &self,
        _email: &str,
        _password: &str,
    ) -> Result<MutationPayload<CustomerAccessToken>, ShopifyError> {
        self.calls.create_access_token.fetch_add(1, Ordering::SeqCst);
        read(&self.access_token).get()
    }

    async fn fetch_customer(&self, access_token: &str) -> Result<Option<Customer>, ShopifyError> {
        self.calls.fetch_customer.fetch_add(1, Ordering::SeqCst);
        self.fetched_tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(access_token.to_string());

        // Capture the reply before sleeping so a re-script mid-flight does not
        // change what this call returns.
        let reply = read(&self.customer);
        if let Some(delay) = read(&self.fetch_delay) {
            tokio::time::sleep(delay).await;
        }
        reply.get()
    }

    async fn revoke_access_token(
        &self,
        access_token: &str,
    ) -> Result<Vec<CustomerUserError>, ShopifyError> {
        self.calls.revoke_access_token.fetch_add(1, Ordering::SeqCst);
        self.revoked_tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(access_token.to_string());
        read(&self.revoke).get()
    }

    async fn create_customer(
        &self,
        _input: &CustomerCreateInput,
    ) -> Result<MutationPayload<Customer>, ShopifyError> {
        self.calls.create_customer.fetch_add(1, Ordering::SeqCst);
        read(&self.create).get()
    }

    async fn recover_customer(&self, _email: &str) -> Result<Vec<CustomerUserError>, ShopifyError> {
        self.calls.recover_customer.fetch_add(1, Ordering::SeqCst);
        read(&self.recover).get()
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// A customer with the given name and email.
#[must_use]
pub fn customer(display_name: &str, email: &str) -> Customer {
    let mut names = display_name.splitn(2, ' ');
    Customer {
        display_name: display_name.to_string(),
        email: Some(email.to_string()),
        first_name: names.next().map(str::to_string),
        last_name: names.next().map(str::to_string),
        accepts_marketing: Some(false),
    }
}

/// An access token expiring at `expires_at`.
#[must_use]
pub fn access_token(token: &str, expires_at: DateTime<Utc>) -> CustomerAccessToken {
    CustomerAccessToken {
        access_token: token.to_string(),
        expires_at,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unscripted_operations_fail() {
        let stub = StubCommerceApi::new();
        assert!(stub.fetch_customer("tok").await.is_err());
        assert!(stub.recover_customer("a@b.fr").await.is_err());
        assert_eq!(stub.fetch_customer_calls(), 1);
        assert_eq!(stub.recover_customer_calls(), 1);
        assert_eq!(stub.fetched_tokens(), vec!["tok".to_string()]);
    }

    #[tokio::test]
    async fn test_scripted_customer() {
        let stub = StubCommerceApi::new();
        stub.return_customer(Some(customer("Marie Harel", "marie@camembert.fr")));
        let found = stub.fetch_customer("tok").await.unwrap().unwrap();
        assert_eq!(found.first_name.as_deref(), Some("Marie"));
        assert_eq!(found.last_name.as_deref(), Some("Harel"));

        stub.return_customer(None);
        assert!(stub.fetch_customer("tok").await.unwrap().is_none());
        assert_eq!(stub.fetch_customer_calls(), 2);
    }
}
