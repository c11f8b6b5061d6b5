//! Fromage Core - Shared types library.
//!
//! This crate provides common types used across the Fromage components:
//! - `storefront` - Cart ledger, customer session and the Shopify client
//! - `cli` - Command-line front end driving the storefront state machines
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for Shopify IDs, prices, quantities and emails

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
