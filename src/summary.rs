//! Summary

use rust_decimal::{Decimal, RoundingStrategy};

use crate::{cart::CartLineItem, tenants::TenantId};

/// Decimal places for money in summaries.
const MONEY_DP: u32 = 2;

/// Aggregate totals for one tenant's cart.
///
/// A pure projection: recomputed wholesale from the line items on every
/// mutation, never patched incrementally. Monetary totals are rounded to two
/// decimal places, half away from zero, at production time; line items keep
/// their unrounded values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSummary {
    /// Whether the tenant has no lines at all.
    pub is_empty: bool,

    /// Number of distinct lines.
    pub line_count: usize,

    /// Total number of units across all lines.
    pub unit_count: u64,

    /// Tax-exclusive total.
    pub excl_tax: Decimal,

    /// Total tax.
    pub tax_amount: Decimal,

    /// Tax-inclusive total before discounts.
    pub incl_tax: Decimal,

    /// Total volume discount.
    pub discount_amount: Decimal,

    /// Payable total (`incl_tax - discount_amount`).
    pub grand_total: Decimal,
}

impl Default for CartSummary {
    fn default() -> Self {
        Self {
            is_empty: true,
            line_count: 0,
            unit_count: 0,
            excl_tax: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            incl_tax: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            grand_total: Decimal::ZERO,
        }
    }
}

/// Rounds a monetary total for presentation in a summary.
fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Aggregates the lines belonging to `tenant` into a [`CartSummary`].
///
/// Lines owned by other tenants are ignored. Line pricing fields already carry
/// the quantity, so they are summed directly; rounding is applied once per
/// total, at the end, to keep cumulative drift out of the figures.
pub fn summarize<'a, I>(lines: I, tenant: &TenantId) -> CartSummary
where
    I: IntoIterator<Item = &'a CartLineItem>,
{
    let mut line_count = 0usize;
    let mut unit_count = 0u64;
    let mut excl_tax = Decimal::ZERO;
    let mut tax_amount = Decimal::ZERO;
    let mut incl_tax = Decimal::ZERO;
    let mut discount_amount = Decimal::ZERO;

    for line in lines.into_iter().filter(|line| line.tenant() == tenant) {
        line_count += 1;
        unit_count += u64::from(line.quantity());
        excl_tax += line.pricing().excl_tax;
        tax_amount += line.pricing().tax_amount;
        incl_tax += line.pricing().incl_tax;
        discount_amount += line.pricing().discount_amount;
    }

    CartSummary {
        is_empty: line_count == 0,
        line_count,
        unit_count,
        excl_tax: round_money(excl_tax),
        tax_amount: round_money(tax_amount),
        incl_tax: round_money(incl_tax),
        discount_amount: round_money(discount_amount),
        grand_total: round_money(incl_tax - discount_amount),
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use super::*;
    use crate::{
        cart::CartLineItem,
        discounts::BulkDiscountTier,
        pricing::resolve_pricing,
        products::{ProductId, ProductSnapshot},
    };

    fn product(id: &str, sale_price: Decimal) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::new(id),
            sale_price,
            vat: Decimal::from(25),
            has_volume_discount: true,
            units_per_package: 1,
            stock: 100,
        }
    }

    fn line(tenant: &str, id: &str, sale_price: Decimal, quantity: u32) -> TestResult<CartLineItem>
    {
        let product = product(id, sale_price);
        let tiers: [BulkDiscountTier; 0] = [];
        let pricing = resolve_pricing(&product, quantity, &tiers, Timestamp::UNIX_EPOCH)?;

        Ok(CartLineItem::new(
            TenantId::new(tenant),
            product,
            quantity,
            pricing,
            Timestamp::UNIX_EPOCH,
        ))
    }

    #[test]
    fn default_summary_is_the_empty_state() {
        let summary = CartSummary::default();

        assert!(summary.is_empty);
        assert_eq!(summary.line_count, 0);
        assert_eq!(summary.unit_count, 0);
        assert_eq!(summary.grand_total, Decimal::ZERO);
    }

    #[test]
    fn sums_only_the_given_tenants_lines() -> TestResult {
        let lines = [
            line("acme", "sku-1", Decimal::from(100), 2)?,
            line("acme", "sku-2", Decimal::from(40), 1)?,
            line("globex", "sku-1", Decimal::from(100), 9)?,
        ];

        let summary = summarize(&lines, &TenantId::new("acme"));

        assert_eq!(summary.line_count, 2);
        assert_eq!(summary.unit_count, 3);
        assert_eq!(summary.excl_tax, Decimal::from(240));
        assert_eq!(summary.tax_amount, Decimal::from(60));
        assert_eq!(summary.incl_tax, Decimal::from(300));
        assert_eq!(summary.grand_total, Decimal::from(300));
        assert!(!summary.is_empty);

        Ok(())
    }

    #[test]
    fn no_matching_lines_yields_empty_summary() -> TestResult {
        let lines = [line("acme", "sku-1", Decimal::from(100), 2)?];

        let summary = summarize(&lines, &TenantId::new("globex"));

        assert_eq!(summary, CartSummary::default());

        Ok(())
    }

    #[test]
    fn summarize_is_idempotent() -> TestResult {
        let lines = [
            line("acme", "sku-1", Decimal::from(100), 3)?,
            line("acme", "sku-2", Decimal::new(1999, 2), 7)?,
        ];
        let tenant = TenantId::new("acme");

        assert_eq!(summarize(&lines, &tenant), summarize(&lines, &tenant));

        Ok(())
    }

    #[test]
    fn midpoints_round_away_from_zero() -> TestResult {
        // 0.125 with no VAT leaves a raw total of 0.125, a midpoint at 2 dp.
        let mut product = product("sku-1", Decimal::new(125, 3));
        product.vat = Decimal::ZERO;
        let pricing = resolve_pricing(&product, 1, &[], Timestamp::UNIX_EPOCH)?;
        let lines = [CartLineItem::new(
            TenantId::new("acme"),
            product,
            1,
            pricing,
            Timestamp::UNIX_EPOCH,
        )];

        let summary = summarize(&lines, &TenantId::new("acme"));

        assert_eq!(summary.excl_tax, Decimal::new(13, 2)); // 0.125 -> 0.13
        assert_eq!(summary.grand_total, Decimal::new(13, 2));

        Ok(())
    }

    #[test]
    fn totals_are_rounded_once_not_per_line() -> TestResult {
        // Three lines of 0.004 each: per-line rounding would give 0.00,
        // summing first gives 0.012 -> 0.01.
        let mut lines = Vec::new();
        for id in ["sku-1", "sku-2", "sku-3"] {
            let mut product = product(id, Decimal::new(4, 3));
            product.vat = Decimal::ZERO;
            let pricing = resolve_pricing(&product, 1, &[], Timestamp::UNIX_EPOCH)?;
            lines.push(CartLineItem::new(
                TenantId::new("acme"),
                product,
                1,
                pricing,
                Timestamp::UNIX_EPOCH,
            ));
        }

        let summary = summarize(&lines, &TenantId::new("acme"));

        assert_eq!(summary.excl_tax, Decimal::new(1, 2)); // 0.01

        Ok(())
    }
}
