//! Session flows against the Commerce API.

use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use fromage_core::Email;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use super::{CredentialStatus, CustomerProfile, SessionAction, SessionState, reduce};
use crate::error::{
    AccountError, Flow, add_breadcrumb, clear_sentry_user, report_failure, set_sentry_user,
};
use crate::persist::{self, StorageBackend, keys};
use crate::shopify::{CommerceApi, CustomerCreateInput, CustomerUserError, ShopifyError};

/// Owner of the customer session.
///
/// Holds the current [`SessionState`], persists every change and publishes
/// both the state and the derived `authorized` flag on `watch` channels.
/// Cheap to clone; clones share one session.
pub struct SessionManager<C> {
    inner: Arc<SessionManagerInner<C>>,
}

struct SessionManagerInner<C> {
    api: C,
    state: watch::Sender<SessionState>,
    authorized: watch::Sender<bool>,
    storage: Arc<dyn StorageBackend>,
}

impl<C> Clone for SessionManager<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn invalid_email(error: &fromage_core::EmailError) -> AccountError {
    AccountError::Rejected(vec![CustomerUserError::invalid_field(
        "email",
        error.to_string(),
    )])
}

impl<C: CommerceApi> SessionManager<C> {
    /// Rehydrate the session from storage. The session starts unauthorized
    /// until [`SessionManager::revalidate`] runs.
    #[must_use]
    pub fn load(api: C, storage: Arc<dyn StorageBackend>) -> Self {
        let state: SessionState =
            persist::load(storage.as_ref(), keys::SESSION, SessionState::empty());
        debug!(
            has_customer = state.customer.is_some(),
            has_credential = state.credential.is_some(),
            "Session loaded"
        );

        Self {
            inner: Arc::new(SessionManagerInner {
                api,
                state: watch::Sender::new(state),
                authorized: watch::Sender::new(false),
                storage,
            }),
        }
    }

    /// The Commerce API this session talks to.
    #[must_use]
    pub fn api(&self) -> &C {
        &self.inner.api
    }

    /// A copy of the current session.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Receiver that observes every committed session change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Last published authorization result.
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        *self.inner.authorized.borrow()
    }

    /// Receiver for the derived authorization flag.
    #[must_use]
    pub fn authorized(&self) -> watch::Receiver<bool> {
        self.inner.authorized.subscribe()
    }

    /// Apply an action. Returns whether the session changed.
    ///
    /// The session is marked unauthorized immediately when it is left without
    /// a usable credential or when its access token changes. A new token
    /// stays unauthorized until a remote check succeeds for it.
    pub fn dispatch(&self, action: SessionAction) -> bool {
        let name = action.name();
        let mut revoke_authorization = false;

        let changed = self.inner.state.send_if_modified(|state| {
            let next = reduce(state, action);
            let usable_credential = matches!(
                next.credential_status(Utc::now()),
                CredentialStatus::Unexpired(_)
            );
            revoke_authorization =
                !usable_credential || next.access_token() != state.access_token();
            if next == *state {
                return false;
            }
            *state = next;
            persist::save(self.inner.storage.as_ref(), keys::SESSION, state);
            true
        });

        if revoke_authorization {
            self.publish_authorized(false);
        }

        if changed {
            info!(action = name, "Session updated");
            add_breadcrumb("session", name, None);
        } else {
            debug!(action = name, "Session unchanged");
        }
        changed
    }

    fn publish_authorized(&self, authorized: bool) {
        self.inner.authorized.send_if_modified(|current| {
            let changed = *current != authorized;
            *current = authorized;
            changed
        });
    }

    /// Run the authorization check and publish its result.
    ///
    /// No token or an expired token is unauthorized without a remote call.
    /// Otherwise the customer is looked up with the token; a failed or empty
    /// lookup is unauthorized. When the session's token changed while the
    /// lookup was in flight, the result is discarded and the current flag is
    /// returned.
    #[instrument(skip_all)]
    pub async fn revalidate(&self) -> bool {
        let snapshot = self.snapshot();

        let authorized = match snapshot.credential_status(Utc::now()) {
            CredentialStatus::Missing => false,
            CredentialStatus::Expired => {
                debug!("Access token expired");
                false
            }
            CredentialStatus::Unexpired(credential) => {
                match self.inner.api.fetch_customer(&credential.access_token).await {
                    Ok(Some(_)) => true,
                    Ok(None) => {
                        debug!("Access token no longer identifies a customer");
                        false
                    }
                    Err(e) => {
                        warn!(error = %e, "Customer lookup failed during revalidation");
                        false
                    }
                }
            }
        };

        let token_unchanged =
            self.inner.state.borrow().access_token() == snapshot.access_token();
        if !token_unchanged {
            debug!("Session changed during revalidation, discarding result");
            return self.is_authorized();
        }

        self.publish_authorized(authorized);
        authorized
    }

    /// Log in with email and password.
    ///
    /// On success the session holds the new credential and the customer's
    /// profile. If the customer lookup fails after the token was issued, the
    /// token stays in the session and the login is reported as failed.
    ///
    /// # Errors
    ///
    /// `AccountError::Rejected` for a malformed email, `AccountError::Failed`
    /// for everything else, including wrong credentials.
    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<CustomerProfile, AccountError> {
        let email = Email::parse(email).map_err(|e| invalid_email(&e))?;

        let payload = self
            .inner
            .api
            .create_access_token(email.as_str(), password)
            .await
            .map_err(|e| report_failure(Flow::Login, &e))?;

        if !payload.user_errors.is_empty() {
            info!(
                codes = ?payload.user_errors.iter().map(|e| e.code).collect::<Vec<_>>(),
                "Login rejected"
            );
            return Err(AccountError::Failed);
        }

        let token = payload.value.ok_or_else(|| {
            report_failure(
                Flow::Login,
                &ShopifyError::message("customerAccessTokenCreate returned no token"),
            )
        })?;

        let access_token = token.access_token.clone();
        self.dispatch(SessionAction::Login(token.into()));

        let customer = match self.inner.api.fetch_customer(&access_token).await {
            Ok(Some(customer)) => customer,
            Ok(None) => {
                return Err(report_failure(
                    Flow::Login,
                    &ShopifyError::message("new access token does not identify a customer"),
                ));
            }
            Err(e) => return Err(report_failure(Flow::Login, &e)),
        };

        let profile = CustomerProfile::from(customer);
        self.dispatch(SessionAction::Create(profile.clone()));

        // The lookup above is exactly the remote check.
        if self.inner.state.borrow().access_token() == Some(access_token.as_str()) {
            self.publish_authorized(true);
        }

        set_sentry_user(&profile.display_name, Some(&profile.email));
        info!("Customer logged in");
        Ok(profile)
    }

    /// Create a customer account. The session is not touched; the customer
    /// logs in separately.
    ///
    /// # Errors
    ///
    /// `AccountError::Rejected` with Shopify's user errors (or a malformed
    /// email), `AccountError::SignupFailed` for everything else.
    #[instrument(skip_all)]
    pub async fn create_customer(
        &self,
        input: &CustomerCreateInput,
    ) -> Result<CustomerProfile, AccountError> {
        Email::parse(&input.email).map_err(|e| invalid_email(&e))?;

        let payload = self
            .inner
            .api
            .create_customer(input)
            .await
            .map_err(|e| report_failure(Flow::CreateCustomer, &e))?;

        if !payload.user_errors.is_empty() {
            info!(count = payload.user_errors.len(), "Customer creation rejected");
            return Err(AccountError::Rejected(payload.user_errors));
        }

        let customer = payload.value.ok_or_else(|| {
            report_failure(
                Flow::CreateCustomer,
                &ShopifyError::message("customerCreate returned no customer"),
            )
        })?;

        add_breadcrumb("session", "create_customer", None);
        info!("Customer account created");
        Ok(customer.into())
    }

    /// Log out. The token is revoked best-effort; the session is emptied
    /// whatever the outcome.
    #[instrument(skip_all)]
    pub async fn logout(&self) {
        let token = self.snapshot().credential.map(|c| c.access_token);

        if let Some(token) = token {
            match self.inner.api.revoke_access_token(&token).await {
                Ok(errors) if errors.is_empty() => debug!("Access token revoked"),
                Ok(errors) => warn!(count = errors.len(), "Access token revocation rejected"),
                Err(e) => warn!(error = %e, "Access token revocation failed"),
            }
        }

        self.dispatch(SessionAction::Logout);
        clear_sentry_user();
        info!("Customer logged out");
    }

    /// Ask Shopify to email a password reset link. Never changes the session.
    ///
    /// # Errors
    ///
    /// `AccountError::Rejected` with Shopify's user errors (or a malformed
    /// email), `AccountError::Failed` for everything else.
    #[instrument(skip_all)]
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AccountError> {
        let email = Email::parse(email).map_err(|e| invalid_email(&e))?;

        let user_errors = self
            .inner
            .api
            .recover_customer(email.as_str())
            .await
            .map_err(|e| report_failure(Flow::PasswordReset, &e))?;

        if !user_errors.is_empty() {
            info!(count = user_errors.len(), "Password reset rejected");
            return Err(AccountError::Rejected(user_errors));
        }

        add_breadcrumb("session", "request_password_reset", None);
        info!("Password reset requested");
        Ok(())
    }

    /// Re-run [`SessionManager::revalidate`] on every session change and every
    /// `period`, starting immediately.
    ///
    /// The task ends once every `SessionManager` clone has been dropped.
    pub fn spawn_revalidation(&self, period: Duration) -> JoinHandle<()> {
        let weak: Weak<SessionManagerInner<C>> = Arc::downgrade(&self.inner);
        let mut changes = self.subscribe();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    changed = changes.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }

                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let authorized = Self { inner }.revalidate().await;
                debug!(authorized, "Background revalidation finished");
            }

            debug!("Session dropped, revalidation stopped");
        })
    }
}

impl<C> std::fmt::Debug for SessionManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &*self.inner.state.borrow())
            .field("authorized", &*self.inner.authorized.borrow())
            .finish_non_exhaustive()
    }
}
