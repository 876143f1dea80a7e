//! Products

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifier for a product in the external catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a new product identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Read-only snapshot of a catalog product, as supplied by the catalog
/// collaborator at add-to-cart time.
///
/// The cart core never mutates a snapshot; it is embedded verbatim in the line
/// item (and in the persisted payload) so pricing can be re-derived without a
/// catalog round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Catalog identifier.
    pub id: ProductId,

    /// Tax-exclusive sale price per unit. Must be non-negative.
    pub sale_price: Decimal,

    /// Tax rate as a percentage in `[0, 100]`.
    pub vat: Decimal,

    /// Whether volume-discount tiers may apply to this product.
    pub has_volume_discount: bool,

    /// Number of individual units in one package.
    pub units_per_package: u32,

    /// Stock level at snapshot time.
    pub stock: u32,
}
