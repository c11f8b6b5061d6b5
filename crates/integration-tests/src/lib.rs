//! Integration tests for the French Fromage storefront.
//!
//! # Running Tests
//!
//! ```bash
//! # Offline tests (file storage + scripted Commerce API)
//! cargo test -p fromage-integration-tests
//!
//! # Live Storefront API tests
//! SHOPIFY_STORE=... SHOPIFY_STOREFRONT_TOKEN=... \
//!     cargo test -p fromage-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `cart_persistence` - cart ledger against real files
//! - `session_flows` - account flows end to end through `AppState`
//! - `storefront_live` - the HTTP client against a real shop

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use fromage_core::{CurrencyCode, Quantity, VariantId};
use fromage_storefront::cart::LineItem;
use fromage_storefront::persist::{FileStorage, StorageBackend};
use fromage_storefront::shopify::stub::StubCommerceApi;
use fromage_storefront::state::AppState;
use rust_decimal::Decimal;
use tempfile::TempDir;

/// An `AppState` over file storage in a fresh temp directory.
///
/// Keep the returned `TempDir` alive for as long as the state is used.
#[must_use]
#[allow(clippy::missing_panics_doc, clippy::unwrap_used)]
pub fn file_backed_state() -> (AppState<StubCommerceApi>, TempDir) {
    let dir = TempDir::new().unwrap();
    let state = state_in(&dir);
    (state, dir)
}

/// A fresh `AppState` over the files in `dir`, as a restarted process would
/// see them.
#[must_use]
pub fn state_in(dir: &TempDir) -> AppState<StubCommerceApi> {
    let storage: Arc<dyn StorageBackend> = Arc::new(FileStorage::new(dir.path()));
    AppState::from_parts(
        StubCommerceApi::new(),
        storage,
        CurrencyCode::eur(),
        Duration::from_secs(300),
    )
}

/// A line item priced in euros.
#[must_use]
#[allow(clippy::missing_panics_doc, clippy::unwrap_used)]
pub fn cheese(n: u64, quantity: u32, price: &str) -> LineItem {
    LineItem {
        variant_id: VariantId::new(format!("gid://shopify/ProductVariant/{n}")),
        quantity: Quantity::new(quantity).unwrap(),
        unit_price: Decimal::from_str(price).unwrap(),
        currency_code: CurrencyCode::eur(),
        title: format!("Fromage {n}"),
        product_handle: Some(format!("fromage-{n}")),
        image_url: Some(format!("https://cdn.shopify.com/fromage-{n}.jpg")),
        alt_text: Some(format!("A wheel of fromage {n}")),
    }
}
