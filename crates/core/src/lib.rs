//! Merch Cart Core - Shared types library.
//!
//! This crate provides common types used across all Merch Cart components:
//! - `storefront` - Cart widget server and Storefront API client
//! - `cli` - Command-line access to the same cart
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Opaque Shopify IDs and currency-aware money

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
