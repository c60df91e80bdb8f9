//! Type conversion functions for Shopify Storefront API responses.

pub mod cart;

pub use cart::{cart_from_payload, convert_cart};
