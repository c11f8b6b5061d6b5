//! Shopping cart ledger.
//!
//! The cart maps each product variant to one [`LineItem`]. All changes go
//! through [`reduce`], a pure function from the current state and a
//! [`CartAction`] to the next state. [`CartStore`] owns the live state,
//! persists it and notifies subscribers.
//!
//! # Invariants
//!
//! - Quantities are at least one (enforced by [`Quantity`]); an item that
//!   would drop to zero is removed instead
//! - All items in a non-empty cart share one currency
//! - Totals are exact decimal sums, never floating point; an action whose
//!   total would leave the `Decimal` range is rejected

mod store;

pub use store::CartStore;

use std::collections::BTreeMap;

use fromage_core::{CurrencyCode, Price, Quantity, VariantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned when an action would break a cart invariant.
///
/// The cart is left unchanged whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The item is priced in a different currency than the cart.
    #[error("cart is priced in {cart}, item {variant_id} is priced in {item}")]
    CurrencyMismatch {
        variant_id: VariantId,
        cart: CurrencyCode,
        item: CurrencyCode,
    },

    /// Merging the quantities would overflow.
    #[error("quantity overflow for {0}")]
    QuantityOverflow(VariantId),

    /// A line or cart total does not fit in a `Decimal`.
    #[error("total overflow at {0}")]
    TotalOverflow(VariantId),

    /// A stored entry is filed under a different variant than it describes.
    #[error("cart entry {key} holds line item {variant_id}")]
    MisfiledEntry {
        key: VariantId,
        variant_id: VariantId,
    },
}

// =============================================================================
// Line Items
// =============================================================================

/// One product variant in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Shopify `ProductVariant` GID.
    pub variant_id: VariantId,
    /// Units in the cart. For [`CartAction::Add`], the units to add.
    pub quantity: Quantity,
    /// Price of one unit, as a decimal string.
    pub unit_price: Decimal,
    /// Currency of `unit_price`.
    pub currency_code: CurrencyCode,
    /// Product title shown on the cart page.
    pub title: String,
    /// Product handle, for linking back to the product page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_handle: Option<String>,
    /// Product image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Alt text for the product image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

impl LineItem {
    /// Price of one unit.
    #[must_use]
    pub fn unit_price(&self) -> Price {
        Price::new(self.unit_price, self.currency_code.clone())
    }

    /// `unit_price × quantity`.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::TotalOverflow`] when the product does not fit.
    pub fn line_total(&self) -> Result<Price, CartError> {
        self.unit_price()
            .checked_times(self.quantity.get())
            .ok_or_else(|| CartError::TotalOverflow(self.variant_id.clone()))
    }
}

/// Total for one line: `unit_price × quantity`.
///
/// # Errors
///
/// See [`LineItem::line_total`].
pub fn line_total(item: &LineItem) -> Result<Price, CartError> {
    item.line_total()
}

// =============================================================================
// Cart State
// =============================================================================

/// The cart: line items keyed and ordered by variant id.
///
/// Persisted as a JSON object `{ "<variantId>": <LineItem>, ... }`.
/// Deserialization rejects data that breaks a cart invariant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<VariantId, LineItem>",
    into = "BTreeMap<VariantId, LineItem>"
)]
pub struct CartState {
    items: BTreeMap<VariantId, LineItem>,
}

impl CartState {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }

    /// The line item for a variant.
    #[must_use]
    pub fn get(&self, variant_id: &VariantId) -> Option<&LineItem> {
        self.items.get(variant_id)
    }

    /// Line items ordered by variant id.
    pub fn iter(&self) -> impl Iterator<Item = &LineItem> {
        self.items.values()
    }

    /// Number of distinct variants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Currency shared by every item, `None` for an empty cart.
    #[must_use]
    pub fn currency(&self) -> Option<&CurrencyCode> {
        self.items.values().next().map(|item| &item.currency_code)
    }

    /// Sum of all line totals. An empty cart totals zero in `default_currency`.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::TotalOverflow`] naming the line at which the sum
    /// left the `Decimal` range.
    pub fn total(&self, default_currency: &CurrencyCode) -> Result<Price, CartError> {
        let currency = self.currency().unwrap_or(default_currency).clone();
        Ok(Price::new(self.amount()?, currency))
    }

    fn amount(&self) -> Result<Decimal, CartError> {
        self.items.values().try_fold(Decimal::ZERO, |sum, item| {
            sum.checked_add(item.line_total()?.amount)
                .ok_or_else(|| CartError::TotalOverflow(item.variant_id.clone()))
        })
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items
            .values()
            .map(|item| u64::from(item.quantity.get()))
            .sum()
    }
}

impl TryFrom<BTreeMap<VariantId, LineItem>> for CartState {
    type Error = CartError;

    fn try_from(items: BTreeMap<VariantId, LineItem>) -> Result<Self, Self::Error> {
        let mut currency: Option<&CurrencyCode> = None;
        for (key, item) in &items {
            if *key != item.variant_id {
                return Err(CartError::MisfiledEntry {
                    key: key.clone(),
                    variant_id: item.variant_id.clone(),
                });
            }
            match currency {
                Some(cart) if *cart != item.currency_code => {
                    return Err(CartError::CurrencyMismatch {
                        variant_id: item.variant_id.clone(),
                        cart: cart.clone(),
                        item: item.currency_code.clone(),
                    });
                }
                Some(_) => {}
                None => currency = Some(&item.currency_code),
            }
        }
        Ok(Self { items })
    }
}

impl From<CartState> for BTreeMap<VariantId, LineItem> {
    fn from(state: CartState) -> Self {
        state.items
    }
}

// =============================================================================
// Reducer
// =============================================================================

/// A change to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    /// Insert the item, or add its quantity to the existing line.
    Add(LineItem),
    /// One more unit of a variant already in the cart.
    Increment(VariantId),
    /// One fewer unit; the line is removed when its last unit goes.
    Decrement(VariantId),
    /// Drop the line entirely.
    Remove(VariantId),
}

impl CartAction {
    /// Short name for logs and breadcrumbs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Add(_) => "add",
            Self::Increment(_) => "increment",
            Self::Decrement(_) => "decrement",
            Self::Remove(_) => "remove",
        }
    }

    /// The variant the action targets.
    #[must_use]
    pub const fn variant_id(&self) -> &VariantId {
        match self {
            Self::Add(item) => &item.variant_id,
            Self::Increment(id) | Self::Decrement(id) | Self::Remove(id) => id,
        }
    }
}

/// How much of a line [`shrink`] takes away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shrink {
    OneUnit,
    WholeLine,
}

/// The part of the reducer that can only make the cart smaller.
fn shrink(state: &CartState, variant_id: &VariantId, by: Shrink) -> CartState {
    let mut items = state.items.clone();
    match by {
        Shrink::OneUnit => {
            if let Some(existing) = items.get_mut(variant_id) {
                match existing.quantity.decremented() {
                    Some(quantity) => existing.quantity = quantity,
                    None => {
                        items.remove(variant_id);
                    }
                }
            }
        }
        Shrink::WholeLine => {
            items.remove(variant_id);
        }
    }
    CartState { items }
}

/// Apply `action` to `state`, returning the next state.
///
/// Actions on variants that are not in the cart (other than `Add`) leave it
/// unchanged.
///
/// # Errors
///
/// Returns [`CartError::CurrencyMismatch`] when adding an item priced in a
/// different currency than the cart, [`CartError::QuantityOverflow`] when
/// a merge exceeds the quantity range and [`CartError::TotalOverflow`] when
/// the cart total would no longer fit.
pub fn reduce(state: &CartState, action: CartAction) -> Result<CartState, CartError> {
    let mut items = state.items.clone();

    match action {
        CartAction::Add(item) => {
            if let Some(cart) = state.currency()
                && *cart != item.currency_code
            {
                return Err(CartError::CurrencyMismatch {
                    variant_id: item.variant_id,
                    cart: cart.clone(),
                    item: item.currency_code,
                });
            }

            match items.get_mut(&item.variant_id) {
                Some(existing) => {
                    existing.quantity = existing
                        .quantity
                        .checked_add(item.quantity)
                        .ok_or_else(|| CartError::QuantityOverflow(item.variant_id.clone()))?;
                }
                None => {
                    items.insert(item.variant_id.clone(), item);
                }
            }
        }
        CartAction::Increment(variant_id) => {
            if let Some(existing) = items.get_mut(&variant_id) {
                existing.quantity = existing
                    .quantity
                    .checked_add(Quantity::ONE)
                    .ok_or(CartError::QuantityOverflow(variant_id))?;
            }
        }
        CartAction::Decrement(variant_id) => {
            return Ok(shrink(state, &variant_id, Shrink::OneUnit));
        }
        CartAction::Remove(variant_id) => {
            return Ok(shrink(state, &variant_id, Shrink::WholeLine));
        }
    }

    let next = CartState { items };
    next.amount()?;
    Ok(next)
}
