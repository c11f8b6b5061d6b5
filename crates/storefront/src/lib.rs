//! French Fromage storefront client core.
//!
//! Two client-side state machines and the plumbing around them:
//!
//! - [`cart`] - the shopping cart ledger
//! - [`session`] - the customer session and its login, signup, logout and
//!   password-reset flows
//! - [`persist`] - durable storage both of them mirror into
//! - [`shopify`] - the Commerce API contract and the Storefront API client
//!
//! [`state::AppState`] wires them together from a [`config::StorefrontConfig`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod error;
pub mod persist;
pub mod session;
pub mod shopify;
pub mod state;
