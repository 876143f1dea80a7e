//! Handcart prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{CartError, CartLineItem, CartStore},
    discounts::{BulkDiscountTier, best_tier},
    pricing::{LinePricing, PricingError, resolve_pricing},
    products::{ProductId, ProductSnapshot},
    storage::{CartStorage, FileStorage, MemoryStorage, STORAGE_KEY, StorageError, StoredLine},
    summary::{CartSummary, summarize},
    tenants::TenantId,
};
