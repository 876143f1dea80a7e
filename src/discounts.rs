//! Discounts

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::products::ProductSnapshot;

/// A volume discount rule that unlocks once a line's quantity reaches a
/// minimum threshold.
///
/// Tiers are global and tenant-independent; the discount collaborator supplies
/// the current list to every operation that prices a line, so there is no
/// cached tier state that can go stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkDiscountTier {
    /// Identifier assigned by the discount subsystem.
    pub id: String,

    /// Minimum line quantity required to unlock this tier. Must be positive.
    pub min_quantity: u32,

    /// Discount as a percentage in `[0, 100]`, applied to the tax-inclusive
    /// line total.
    pub discount_percentage: Decimal,

    /// Start of the validity window; unbounded when absent.
    pub valid_from: Option<Timestamp>,

    /// End of the validity window; unbounded when absent.
    pub valid_to: Option<Timestamp>,

    /// Whether the tier is currently enabled by an administrator.
    pub is_active: bool,
}

impl BulkDiscountTier {
    /// Returns whether this tier applies to the given product and quantity at
    /// the given instant.
    pub fn qualifies(&self, product: &ProductSnapshot, quantity: u32, now: Timestamp) -> bool {
        if !product.has_volume_discount || !self.is_active || quantity < self.min_quantity {
            return false;
        }

        if self.valid_from.is_some_and(|from| now < from) {
            return false;
        }

        if self.valid_to.is_some_and(|to| now > to) {
            return false;
        }

        true
    }
}

/// Selects the best-qualifying tier for a product and quantity.
///
/// "Best" means the qualifying tier with the highest `min_quantity` — the most
/// generous threshold the quantity has unlocked. Selection is independent of
/// the order of `tiers`; ties on `min_quantity` resolve to the higher
/// percentage so the result is deterministic. Returns `None` when no tier
/// qualifies.
pub fn best_tier<'a>(
    product: &ProductSnapshot,
    quantity: u32,
    tiers: &'a [BulkDiscountTier],
    now: Timestamp,
) -> Option<&'a BulkDiscountTier> {
    tiers
        .iter()
        .filter(|tier| tier.qualifies(product, quantity, now))
        .max_by(|a, b| {
            a.min_quantity
                .cmp(&b.min_quantity)
                .then_with(|| a.discount_percentage.cmp(&b.discount_percentage))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::products::ProductId;

    fn product(has_volume_discount: bool) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::new("sku-1"),
            sale_price: Decimal::from(100),
            vat: Decimal::from(25),
            has_volume_discount,
            units_per_package: 1,
            stock: 100,
        }
    }

    fn tier(min_quantity: u32, percentage: u32) -> BulkDiscountTier {
        BulkDiscountTier {
            id: format!("tier-{min_quantity}"),
            min_quantity,
            discount_percentage: Decimal::from(percentage),
            valid_from: None,
            valid_to: None,
            is_active: true,
        }
    }

    fn now() -> Timestamp {
        Timestamp::UNIX_EPOCH
    }

    #[test]
    fn tier_qualifies_at_and_above_threshold() {
        let tier = tier(5, 10);
        let product = product(true);

        assert!(!tier.qualifies(&product, 4, now()));
        assert!(tier.qualifies(&product, 5, now()));
        assert!(tier.qualifies(&product, 50, now()));
    }

    #[test]
    fn tier_never_qualifies_for_ineligible_product() {
        let tier = tier(1, 10);

        assert!(!tier.qualifies(&product(false), 10, now()));
    }

    #[test]
    fn inactive_tier_never_qualifies() {
        let mut tier = tier(1, 10);
        tier.is_active = false;

        assert!(!tier.qualifies(&product(true), 10, now()));
    }

    #[test]
    fn validity_window_bounds_are_inclusive() {
        let mut tier = tier(1, 10);
        tier.valid_from = Some(Timestamp::UNIX_EPOCH);
        tier.valid_to = Some(Timestamp::UNIX_EPOCH + jiff::Span::new().hours(1));
        let product = product(true);

        assert!(tier.qualifies(&product, 1, Timestamp::UNIX_EPOCH));
        assert!(tier.qualifies(
            &product,
            1,
            Timestamp::UNIX_EPOCH + jiff::Span::new().minutes(30)
        ));
        assert!(!tier.qualifies(
            &product,
            1,
            Timestamp::UNIX_EPOCH + jiff::Span::new().hours(2)
        ));
        assert!(!tier.qualifies(
            &product,
            1,
            Timestamp::UNIX_EPOCH - jiff::Span::new().hours(1)
        ));
    }

    #[test]
    fn missing_window_bound_is_unbounded() {
        let mut from_only = tier(1, 10);
        from_only.valid_from = Some(Timestamp::UNIX_EPOCH);

        let mut to_only = tier(1, 10);
        to_only.valid_to = Some(Timestamp::UNIX_EPOCH);

        let product = product(true);
        let later = Timestamp::UNIX_EPOCH + jiff::Span::new().hours(1);

        assert!(from_only.qualifies(&product, 1, later));
        assert!(!to_only.qualifies(&product, 1, later));
        assert!(to_only.qualifies(&product, 1, Timestamp::UNIX_EPOCH));
    }

    #[test]
    fn best_tier_picks_highest_unlocked_threshold() {
        let tiers = [tier(5, 10), tier(10, 20)];

        let best = best_tier(&product(true), 12, &tiers, now());

        assert_eq!(
            best.map(|t| t.min_quantity),
            Some(10),
            "quantity 12 should unlock the min-10 tier"
        );
    }

    #[test]
    fn best_tier_is_order_independent() {
        let ascending = [tier(5, 10), tier(10, 20)];
        let descending = [tier(10, 20), tier(5, 10)];

        let from_ascending = best_tier(&product(true), 12, &ascending, now());
        let from_descending = best_tier(&product(true), 12, &descending, now());

        assert_eq!(from_ascending, from_descending);
        assert_eq!(from_ascending.map(|t| t.min_quantity), Some(10));
    }

    #[test]
    fn best_tier_breaks_min_quantity_ties_on_percentage() {
        let mut generous = tier(5, 15);
        generous.id = "tier-5-generous".to_string();
        let tiers = [tier(5, 10), generous];

        let best = best_tier(&product(true), 5, &tiers, now());

        assert_eq!(
            best.map(|t| t.discount_percentage),
            Some(Decimal::from(15)),
            "equal thresholds should resolve to the higher percentage"
        );
    }

    #[test]
    fn best_tier_returns_none_below_all_thresholds() {
        let tiers = [tier(5, 10), tier(10, 20)];

        assert_eq!(best_tier(&product(true), 4, &tiers, now()), None);
        assert_eq!(best_tier(&product(true), 4, &[], now()), None);
    }
}
