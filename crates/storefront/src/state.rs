//! Application state: the cart and the customer session, wired together.

use std::sync::Arc;
use std::time::Duration;

use fromage_core::CurrencyCode;
use tokio::task::JoinHandle;

use crate::cart::CartStore;
use crate::config::StorefrontConfig;
use crate::persist::{FileStorage, StorageBackend};
use crate::session::SessionManager;
use crate::shopify::{CommerceApi, ShopifyError, StorefrontClient};

/// Everything a storefront front end needs.
///
/// This struct is cheaply cloneable via `Arc`. Both stores share one storage
/// backend, each in its own slot.
pub struct AppState<C = StorefrontClient> {
    inner: Arc<AppStateInner<C>>,
}

struct AppStateInner<C> {
    cart: CartStore,
    session: SessionManager<C>,
    revalidate_interval: Duration,
}

impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl AppState<StorefrontClient> {
    /// Create the production state: Storefront API client and file storage
    /// in the configured data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the Storefront API client cannot be built.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ShopifyError> {
        let api = StorefrontClient::new(&config.shopify)?;
        let storage: Arc<dyn StorageBackend> = Arc::new(FileStorage::new(&config.data_dir));

        Ok(Self::from_parts(
            api,
            storage,
            config.default_currency.clone(),
            config.revalidate_interval,
        ))
    }
}

impl<C: CommerceApi> AppState<C> {
    /// Assemble the state from explicit parts, loading both stores from
    /// `storage`.
    #[must_use]
    pub fn from_parts(
        api: C,
        storage: Arc<dyn StorageBackend>,
        default_currency: CurrencyCode,
        revalidate_interval: Duration,
    ) -> Self {
        let cart = CartStore::load(Arc::clone(&storage), default_currency);
        let session = SessionManager::load(api, storage);

        Self {
            inner: Arc::new(AppStateInner {
                cart,
                session,
                revalidate_interval,
            }),
        }
    }

    /// The cart.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// The customer session.
    #[must_use]
    pub fn session(&self) -> &SessionManager<C> {
        &self.inner.session
    }

    /// Start background session revalidation.
    pub fn spawn_background_tasks(&self) -> JoinHandle<()> {
        self.inner
            .session
            .spawn_revalidation(self.inner.revalidate_interval)
    }
}
