//! Live cart state with persistence and change notification.

use std::convert::Infallible;
use std::fmt::Display;
use std::sync::Arc;

use fromage_core::{CurrencyCode, Price, VariantId};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{CartAction, CartError, CartState, LineItem, Shrink, reduce, shrink};
use crate::error::add_breadcrumb;
use crate::persist::{self, StorageBackend, keys};

/// Owner of the current [`CartState`].
///
/// Cheap to clone; clones share the same cart. Every dispatch runs the reducer
/// synchronously, writes the new state to storage when it changed and then
/// wakes subscribers.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    state: watch::Sender<CartState>,
    storage: Arc<dyn StorageBackend>,
    default_currency: CurrencyCode,
}

impl CartStore {
    /// Rehydrate the cart from storage, starting empty when nothing usable is
    /// stored.
    #[must_use]
    pub fn load(storage: Arc<dyn StorageBackend>, default_currency: CurrencyCode) -> Self {
        let state: CartState = persist::load(storage.as_ref(), keys::CART, CartState::new());
        debug!(
            lines = state.len(),
            items = state.item_count(),
            "Cart loaded"
        );

        Self {
            inner: Arc::new(CartStoreInner {
                state: watch::Sender::new(state),
                storage,
                default_currency,
            }),
        }
    }

    /// A copy of the current cart.
    #[must_use]
    pub fn snapshot(&self) -> CartState {
        self.inner.state.borrow().clone()
    }

    /// Receiver that observes every committed change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.inner.state.subscribe()
    }

    /// Currency used to price an empty cart.
    #[must_use]
    pub fn default_currency(&self) -> &CurrencyCode {
        &self.inner.default_currency
    }

    /// Apply an action. Returns whether the cart changed.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the action would break a cart invariant; the
    /// cart is left as it was.
    pub fn dispatch(&self, action: CartAction) -> Result<bool, CartError> {
        let name = action.name();
        let variant_id = action.variant_id().clone();
        self.commit(name, &variant_id, |state| reduce(state, action))
    }

    fn commit<E: Display>(
        &self,
        name: &'static str,
        variant_id: &VariantId,
        step: impl FnOnce(&CartState) -> Result<CartState, E>,
    ) -> Result<bool, E> {
        let variant_id = variant_id.as_str();
        let mut outcome = Ok(false);

        self.inner.state.send_if_modified(|state| match step(state) {
            Ok(next) if next != *state => {
                *state = next;
                persist::save(self.inner.storage.as_ref(), keys::CART, state);
                outcome = Ok(true);
                true
            }
            Ok(_) => false,
            Err(e) => {
                outcome = Err(e);
                false
            }
        });

        match &outcome {
            Ok(true) => {
                info!(action = name, variant = %variant_id, "Cart updated");
                add_breadcrumb("cart", name, Some(&[("variant_id", variant_id)]));
            }
            Ok(false) => debug!(action = name, variant = %variant_id, "Cart unchanged"),
            Err(e) => warn!(action = name, variant = %variant_id, error = %e, "Cart action rejected"),
        }

        outcome
    }

    /// Add an item, merging with an existing line for the same variant.
    ///
    /// # Errors
    ///
    /// See [`CartStore::dispatch`].
    pub fn add(&self, item: LineItem) -> Result<(), CartError> {
        self.dispatch(CartAction::Add(item)).map(|_| ())
    }

    /// One more unit of a variant in the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::QuantityOverflow`] at the quantity limit and
    /// [`CartError::TotalOverflow`] when the cart total would no longer fit.
    pub fn increment(&self, variant_id: &VariantId) -> Result<(), CartError> {
        self.dispatch(CartAction::Increment(variant_id.clone()))
            .map(|_| ())
    }

    /// One fewer unit of a variant; removes the line at its last unit.
    /// Returns whether the cart changed.
    pub fn decrement(&self, variant_id: &VariantId) -> bool {
        let Ok(changed) = self.commit("decrement", variant_id, |state| {
            Ok::<_, Infallible>(shrink(state, variant_id, Shrink::OneUnit))
        });
        changed
    }

    /// Remove a variant from the cart. Returns whether the cart changed.
    pub fn remove(&self, variant_id: &VariantId) -> bool {
        let Ok(changed) = self.commit("remove", variant_id, |state| {
            Ok::<_, Infallible>(shrink(state, variant_id, Shrink::WholeLine))
        });
        changed
    }

    /// Total for one line, `None` if the variant is not in the cart.
    ///
    /// # Errors
    ///
    /// See [`LineItem::line_total`].
    pub fn line_total(&self, variant_id: &VariantId) -> Result<Option<Price>, CartError> {
        self.inner
            .state
            .borrow()
            .get(variant_id)
            .map(LineItem::line_total)
            .transpose()
    }

    /// Cart total, zero in the default currency when empty.
    ///
    /// # Errors
    ///
    /// See [`CartState::total`].
    pub fn total(&self) -> Result<Price, CartError> {
        self.inner.state.borrow().total(&self.inner.default_currency)
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.inner.state.borrow().item_count()
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("state", &*self.inner.state.borrow())
            .field("default_currency", &self.inner.default_currency)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::*;
    use crate::cart::tests::item;
    use crate::persist::{MemoryStorage, UnavailableStorage};

    fn store_with(storage: Arc<dyn StorageBackend>) -> CartStore {
        CartStore::load(storage, CurrencyCode::eur())
    }

    #[test]
    fn test_dispatch_persists_changes() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(storage.clone());
        store.add(item(1, 2, "9.50")).unwrap();

        let raw = storage.read(keys::CART).unwrap().unwrap();
        let persisted: CartState = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted, store.snapshot());
    }

    #[test]
    fn test_reload_restores_cart() {
        let storage: Arc<dyn StorageBackend> = Arc::new(MemoryStorage::new());
        let store = store_with(storage.clone());
        store.add(item(1, 2, "9.50")).unwrap();
        store.add(item(2, 1, "3.25")).unwrap();

        let reloaded = store_with(storage);
        assert_eq!(reloaded.snapshot(), store.snapshot());
        assert_eq!(reloaded.item_count(), 3);
    }

    #[test]
    fn test_noop_does_not_write() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(storage.clone());
        assert!(!store.decrement(&VariantId::new("gid://shopify/ProductVariant/404")));
        assert!(!store.remove(&VariantId::new("gid://shopify/ProductVariant/404")));
        assert!(storage.read(keys::CART).unwrap().is_none());
    }

    #[test]
    fn test_decrement_and_remove_report_changes() {
        let store = store_with(Arc::new(MemoryStorage::new()));
        let a = item(1, 2, "9.50");
        let id = a.variant_id.clone();
        store.add(a).unwrap();

        assert!(store.decrement(&id));
        assert_eq!(store.item_count(), 1);
        assert!(store.remove(&id));
        assert!(store.snapshot().is_empty());
        assert!(!store.remove(&id));
    }

    #[test]
    fn test_total_overflow_leaves_state() {
        let store = store_with(Arc::new(MemoryStorage::new()));
        store.add(item(1, 1, &Decimal::MAX.to_string())).unwrap();
        let before = store.snapshot();

        let err = store.add(item(2, 1, "1")).unwrap_err();
        assert!(matches!(err, CartError::TotalOverflow(_)));
        assert_eq!(store.snapshot(), before);
        assert_eq!(store.total().unwrap().amount, Decimal::MAX);
    }

    #[test]
    fn test_rejected_action_leaves_state() {
        let store = store_with(Arc::new(MemoryStorage::new()));
        store.add(item(1, 1, "9.50")).unwrap();
        let before = store.snapshot();

        let mut usd = item(2, 1, "1.00");
        usd.currency_code = CurrencyCode::usd();
        assert!(store.add(usd).is_err());
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_subscribers_see_changes() {
        let store = store_with(Arc::new(MemoryStorage::new()));
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());

        store.add(item(1, 1, "9.50")).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().item_count(), 1);

        store.remove(&VariantId::new("gid://shopify/ProductVariant/404"));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_totals() {
        let store = store_with(Arc::new(MemoryStorage::new()));
        assert_eq!(store.total().unwrap(), Price::zero(CurrencyCode::eur()));

        let a = item(1, 2, "9.95");
        let id = a.variant_id.clone();
        store.add(a).unwrap();
        store.add(item(2, 1, "0.10")).unwrap();

        assert_eq!(
            store.line_total(&id).unwrap().unwrap().amount,
            Decimal::from_str("19.90").unwrap()
        );
        assert_eq!(store.total().unwrap().amount, Decimal::from_str("20.00").unwrap());
        assert!(store.line_total(&VariantId::new("nope")).unwrap().is_none());
    }

    #[test]
    fn test_unavailable_storage_still_works() {
        let store = store_with(Arc::new(UnavailableStorage));
        store.add(item(1, 1, "9.50")).unwrap();
        assert_eq!(store.item_count(), 1);
    }
}
