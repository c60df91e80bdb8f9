//! Merch Cart storefront library.
//!
//! Storefront API client, cart session and the axum routes rendering the cart
//! widget. The binary and the integration tests both build on this crate.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod shopify;
pub mod state;
