//! Pricing

use jiff::Timestamp;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    discounts::{BulkDiscountTier, best_tier},
    products::ProductSnapshot,
};

/// Errors that can occur while resolving line pricing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    /// A zero quantity is a removal, not a priced line; callers must reject it
    /// before reaching the resolver.
    #[error("quantity must be at least 1")]
    InvalidQuantity,
}

/// Price components for one cart line.
///
/// Every monetary field except `unit_net_price` is a **line total**: the
/// quantity has already been applied. Values are unrounded; rounding happens
/// once, when the cart summary is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinePricing {
    /// Tax-exclusive line total.
    pub excl_tax: Decimal,

    /// Tax owed on the line.
    pub tax_amount: Decimal,

    /// Tax-inclusive line total before any discount.
    pub incl_tax: Decimal,

    /// Volume discount applied to the tax-inclusive total; zero when no tier
    /// qualifies.
    pub discount_amount: Decimal,

    /// Payable line total (`incl_tax - discount_amount`).
    pub net_price: Decimal,

    /// Payable price per unit, for "price per unit" display.
    pub unit_net_price: Decimal,
}

/// Resolves the price components for a quantity of one product.
///
/// Pure function: tier validity windows are evaluated against the explicit
/// `now`, and the same inputs always produce the same output.
///
/// # Errors
///
/// Returns [`PricingError::InvalidQuantity`] when `quantity` is zero.
pub fn resolve_pricing(
    product: &ProductSnapshot,
    quantity: u32,
    tiers: &[BulkDiscountTier],
    now: Timestamp,
) -> Result<LinePricing, PricingError> {
    if quantity == 0 {
        return Err(PricingError::InvalidQuantity);
    }

    let quantity_dec = Decimal::from(quantity);

    let unit_excl = product.sale_price;
    let unit_tax = unit_excl * product.vat / Decimal::ONE_HUNDRED;

    let excl_tax = unit_excl * quantity_dec;
    let tax_amount = unit_tax * quantity_dec;
    let incl_tax = excl_tax + tax_amount;

    let discount_amount = best_tier(product, quantity, tiers, now).map_or(Decimal::ZERO, |tier| {
        incl_tax * tier.discount_percentage / Decimal::ONE_HUNDRED
    });

    let net_price = incl_tax - discount_amount;
    let unit_net_price = net_price / quantity_dec;

    Ok(LinePricing {
        excl_tax,
        tax_amount,
        incl_tax,
        discount_amount,
        net_price,
        unit_net_price,
    })
}
