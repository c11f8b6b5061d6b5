//! Cart ledger against real files.

#![allow(clippy::unwrap_used)]

use std::fs;
use std::str::FromStr;

use fromage_core::{CurrencyCode, Price, VariantId};
use fromage_integration_tests::{cheese, file_backed_state, state_in};
use fromage_storefront::cart::CartError;
use rust_decimal::Decimal;

#[test]
fn test_add_twice_merges_and_survives_restart() {
    let (state, dir) = file_backed_state();
    state.cart().add(cheese(1, 2, "24.90")).unwrap();
    state.cart().add(cheese(1, 3, "24.90")).unwrap();

    let restarted = state_in(&dir);
    let cart = restarted.cart().snapshot();
    assert_eq!(cart.len(), 1);
    assert_eq!(cart.iter().next().unwrap().quantity.get(), 5);
    assert_eq!(
        restarted.cart().total().unwrap().amount,
        Decimal::from_str("124.50").unwrap()
    );
}

#[test]
fn test_cart_file_uses_storefront_slot() {
    let (state, dir) = file_backed_state();
    state.cart().add(cheese(7, 1, "8.40")).unwrap();

    let raw = fs::read_to_string(dir.path().join("__cart__.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let entry = &json["gid://shopify/ProductVariant/7"];
    assert_eq!(entry["unitPrice"], "8.40");
    assert_eq!(entry["currencyCode"], "EUR");
    assert_eq!(entry["title"], "Fromage 7");
    assert_eq!(entry["altText"], "A wheel of fromage 7");
}

#[test]
fn test_corrupt_cart_file_starts_empty() {
    let (state, dir) = file_backed_state();
    state.cart().add(cheese(1, 1, "5.00")).unwrap();
    fs::write(dir.path().join("__cart__.json"), "{\"truncated\": ").unwrap();

    let restarted = state_in(&dir);
    assert!(restarted.cart().snapshot().is_empty());
    assert_eq!(restarted.cart().total().unwrap(), Price::zero(CurrencyCode::eur()));

    // The next change overwrites the corrupt file.
    restarted.cart().add(cheese(2, 1, "5.00")).unwrap();
    assert_eq!(state_in(&dir).cart().item_count(), 1);
}

#[test]
fn test_decrement_to_zero_removes_and_persists() {
    let (state, dir) = file_backed_state();
    let brie = cheese(3, 1, "12.00");
    let id = brie.variant_id.clone();
    state.cart().add(brie).unwrap();
    state.cart().add(cheese(4, 2, "6.00")).unwrap();

    state.cart().decrement(&id);
    state.cart().decrement(&id);
    state.cart().remove(&VariantId::new("gid://shopify/ProductVariant/404"));

    let restarted = state_in(&dir);
    assert!(restarted.cart().snapshot().get(&id).is_none());
    assert_eq!(restarted.cart().item_count(), 2);
    assert_eq!(
        restarted.cart().total().unwrap().amount,
        Decimal::from_str("12.00").unwrap()
    );
}

#[test]
fn test_mixed_currency_rejected_and_not_persisted() {
    let (state, dir) = file_backed_state();
    state.cart().add(cheese(1, 1, "5.00")).unwrap();

    let mut swiss = cheese(2, 1, "9.00");
    swiss.currency_code = CurrencyCode::parse("CHF").unwrap();
    let err = state.cart().add(swiss).unwrap_err();
    assert!(matches!(err, CartError::CurrencyMismatch { .. }));

    assert_eq!(state_in(&dir).cart().snapshot().len(), 1);
}
