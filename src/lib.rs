//! Handcart
//!
//! Handcart is a multi-tenant shopping cart and tiered volume-discount pricing engine written in Rust.

pub mod cart;
pub mod discounts;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod storage;
pub mod summary;
pub mod tenants;
