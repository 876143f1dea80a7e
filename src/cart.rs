//! Cart

use jiff::Timestamp;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    discounts::BulkDiscountTier,
    pricing::{LinePricing, PricingError, resolve_pricing},
    products::{ProductId, ProductSnapshot},
    storage::{CartStorage, StoredLine},
    summary::{CartSummary, summarize},
    tenants::TenantId,
};

/// Errors surfaced by cart mutations.
///
/// Every variant is a user-facing rejection: the operation is a no-op and the
/// cart state is unchanged.
#[derive(Debug, Error)]
pub enum CartError {
    /// A mutating call arrived while no tenant was active.
    #[error("no active tenant; sign in before changing the cart")]
    NotAuthenticated,

    /// An add was requested with a zero quantity.
    #[error("quantity must be at least 1, got {0}")]
    InvalidQuantity(u32),

    /// Bubbled up from the pricing resolver.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// One (tenant, product) pairing with a quantity and derived price components.
///
/// The monetary fields live in [`LinePricing`] and are derived, never mutated
/// independently of quantity; all writes go through [`CartStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct CartLineItem {
    tenant: TenantId,
    product: ProductSnapshot,
    quantity: u32,
    pricing: LinePricing,
    added_at: Timestamp,
    updated_at: Timestamp,
}

impl CartLineItem {
    pub(crate) fn new(
        tenant: TenantId,
        product: ProductSnapshot,
        quantity: u32,
        pricing: LinePricing,
        at: Timestamp,
    ) -> Self {
        Self {
            tenant,
            product,
            quantity,
            pricing,
            added_at: at,
            updated_at: at,
        }
    }

    pub(crate) fn restored(
        tenant: TenantId,
        product: ProductSnapshot,
        quantity: u32,
        pricing: LinePricing,
        added_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            tenant,
            product,
            quantity,
            pricing,
            added_at,
            updated_at,
        }
    }

    /// Tenant owning this line.
    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    /// Product snapshot captured when the line was first added.
    pub fn product(&self) -> &ProductSnapshot {
        &self.product
    }

    /// Units of the product in this line. Always at least one.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Derived price components for the current quantity.
    pub fn pricing(&self) -> &LinePricing {
        &self.pricing
    }

    /// When the line was first added. Immutable once set.
    pub fn added_at(&self) -> Timestamp {
        self.added_at
    }

    /// When the line was last mutated.
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }
}

type LineKey = (TenantId, ProductId);

/// Multi-tenant cart store with tiered volume-discount pricing.
///
/// Holds one line table for all tenants, keyed by (tenant, product). Every
/// mutation scopes its read-modify-write to the active tenant, re-runs the
/// pricing resolver for the affected line, recomputes the tenant's summary and
/// line view wholesale, and persists the raw lines to the attached storage
/// backend. Persistence failures are logged and never roll back in-memory
/// state.
///
/// Construct one store at application start and keep it alive for the process;
/// there is no hidden global instance.
#[derive(Debug)]
pub struct CartStore {
    lines: FxHashMap<LineKey, CartLineItem>,
    active_tenant: Option<TenantId>,
    summary: CartSummary,
    view: Vec<CartLineItem>,
    storage: Option<Box<dyn CartStorage>>,
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CartStore {
    /// Creates an empty store with no storage backend and no active tenant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: FxHashMap::default(),
            active_tenant: None,
            summary: CartSummary::default(),
            view: Vec::new(),
            storage: None,
        }
    }

    /// Creates a store backed by `storage`, rehydrating any persisted lines.
    ///
    /// Only raw facts are read back; every line's pricing is re-derived against
    /// `tiers` so that expired or edited discounts never survive a restart. A
    /// missing or corrupt payload yields an empty cart.
    #[must_use]
    pub fn with_storage(
        storage: Box<dyn CartStorage>,
        tiers: &[BulkDiscountTier],
        active_tenant: Option<TenantId>,
    ) -> Self {
        let mut store = Self::new();
        store.storage = Some(storage);
        store.rehydrate(tiers);
        store.active_tenant = active_tenant;
        store.recompute();
        store
    }

    /// Switches which tenant's lines are projected into the summary and view.
    ///
    /// `None` (logout) resets the projection to the empty defaults while
    /// preserving every stored line for the next login. `Some` re-resolves the
    /// incoming tenant's pricing against `tiers`, so a tier edited or expired
    /// while the tenant was away is reflected immediately.
    pub fn set_active_tenant(&mut self, tenant: Option<TenantId>, tiers: &[BulkDiscountTier]) {
        self.active_tenant = tenant;

        if let Some(tenant) = self.active_tenant.clone() {
            let now = Timestamp::now();
            for line in self
                .lines
                .values_mut()
                .filter(|line| line.tenant == tenant)
            {
                match resolve_pricing(&line.product, line.quantity, tiers, now) {
                    Ok(pricing) => line.pricing = pricing,
                    // Unreachable while the table only holds positive quantities.
                    Err(err) => warn!(error = %err, product = %line.product.id, "skipping reprice"),
                }
            }
        }

        self.recompute();
    }

    /// Adds `quantity` units of `product` to the active tenant's cart.
    ///
    /// An existing line for the same product has its quantity incremented and
    /// its pricing re-resolved for the new total; otherwise a new line is
    /// created.
    ///
    /// # Errors
    ///
    /// - [`CartError::NotAuthenticated`] when no tenant is active.
    /// - [`CartError::InvalidQuantity`] when `quantity` is zero.
    pub fn add_to_cart(
        &mut self,
        product: &ProductSnapshot,
        quantity: u32,
        tiers: &[BulkDiscountTier],
    ) -> Result<(), CartError> {
        let tenant = self.require_tenant()?;

        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }

        let now = Timestamp::now();
        let key = (tenant.clone(), product.id.clone());

        if let Some(line) = self.lines.get_mut(&key) {
            let new_quantity = line.quantity.saturating_add(quantity);
            let pricing = resolve_pricing(&line.product, new_quantity, tiers, now)?;
            line.quantity = new_quantity;
            line.pricing = pricing;
            line.updated_at = now;
        } else {
            let pricing = resolve_pricing(product, quantity, tiers, now)?;
            self.lines.insert(
                key,
                CartLineItem::new(tenant, product.clone(), quantity, pricing, now),
            );
        }

        self.refresh();

        Ok(())
    }

    /// Removes the active tenant's line for `product_id`.
    ///
    /// An absent line is a benign no-op, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotAuthenticated`] when no tenant is active.
    pub fn remove_from_cart(&mut self, product_id: &ProductId) -> Result<(), CartError> {
        let tenant = self.require_tenant()?;

        if self.lines.remove(&(tenant, product_id.clone())).is_some() {
            self.refresh();
        }

        Ok(())
    }

    /// Overwrites the quantity of the active tenant's line for `product_id`,
    /// re-deriving all monetary fields from scratch.
    ///
    /// A zero quantity delegates to [`Self::remove_from_cart`]; a product not
    /// in the cart is a benign no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotAuthenticated`] when no tenant is active.
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        new_quantity: u32,
        tiers: &[BulkDiscountTier],
    ) -> Result<(), CartError> {
        let tenant = self.require_tenant()?;

        if new_quantity == 0 {
            return self.remove_from_cart(product_id);
        }

        let now = Timestamp::now();
        let Some(line) = self.lines.get_mut(&(tenant, product_id.clone())) else {
            return Ok(());
        };

        let pricing = resolve_pricing(&line.product, new_quantity, tiers, now)?;
        line.quantity = new_quantity;
        line.pricing = pricing;
        line.updated_at = now;

        self.refresh();

        Ok(())
    }

    /// Removes every line belonging to the active tenant, leaving other
    /// tenants' lines untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotAuthenticated`] when no tenant is active.
    pub fn clear_cart(&mut self) -> Result<(), CartError> {
        let tenant = self.require_tenant()?;

        self.lines.retain(|(owner, _), _| *owner != tenant);
        self.refresh();

        Ok(())
    }

    /// Quantity of `product_id` in the active tenant's cart; zero when absent
    /// or when no tenant is active. Never errors.
    pub fn item_quantity(&self, product_id: &ProductId) -> u32 {
        self.active_tenant
            .as_ref()
            .and_then(|tenant| self.lines.get(&(tenant.clone(), product_id.clone())))
            .map_or(0, CartLineItem::quantity)
    }

    /// Whether the active tenant's cart holds a line for `product_id`.
    pub fn is_in_cart(&self, product_id: &ProductId) -> bool {
        self.item_quantity(product_id) > 0
    }

    /// Aggregate totals for the active tenant.
    pub fn summary(&self) -> &CartSummary {
        &self.summary
    }

    /// The active tenant's lines, ordered by when they were added.
    pub fn lines(&self) -> &[CartLineItem] {
        &self.view
    }

    /// The tenant whose lines are currently projected, if any.
    pub fn active_tenant(&self) -> Option<&TenantId> {
        self.active_tenant.as_ref()
    }

    fn require_tenant(&self) -> Result<TenantId, CartError> {
        self.active_tenant
            .clone()
            .ok_or(CartError::NotAuthenticated)
    }

    /// Recomputes derived state and persists the raw lines.
    fn refresh(&mut self) {
        self.recompute();
        self.persist();
    }

    /// Rebuilds the active tenant's summary and ordered line view wholesale.
    fn recompute(&mut self) {
        match self.active_tenant.clone() {
            Some(tenant) => {
                self.summary = summarize(self.lines.values(), &tenant);

                let mut view: Vec<CartLineItem> = self
                    .lines
                    .values()
                    .filter(|line| line.tenant == tenant)
                    .cloned()
                    .collect();
                view.sort_by(|a, b| {
                    a.added_at
                        .cmp(&b.added_at)
                        .then_with(|| a.product.id.cmp(&b.product.id))
                });
                self.view = view;
            }
            None => {
                self.summary = CartSummary::default();
                self.view.clear();
            }
        }
    }

    /// Writes the raw cross-tenant lines to storage, fire-and-forget.
    ///
    /// Derived values are never written; a failed write is logged and the
    /// in-memory state stands.
    fn persist(&mut self) {
        let Some(storage) = self.storage.as_mut() else {
            return;
        };

        let mut stored: Vec<StoredLine> = self.lines.values().map(StoredLine::from).collect();
        stored.sort_by(|a, b| {
            (&a.tenant, a.added_at, &a.product.id).cmp(&(&b.tenant, b.added_at, &b.product.id))
        });

        match serde_json::to_string(&stored) {
            Ok(payload) => {
                if let Err(err) = storage.save(&payload) {
                    warn!(error = %err, "failed to persist cart lines; in-memory state unaffected");
                }
            }
            Err(err) => warn!(error = %err, "failed to serialize cart lines"),
        }
    }

    /// Loads persisted raw lines and re-derives all pricing against `tiers`.
    fn rehydrate(&mut self, tiers: &[BulkDiscountTier]) {
        let Some(storage) = self.storage.as_ref() else {
            return;
        };

        let payload = match storage.load() {
            Ok(Some(payload)) => payload,
            Ok(None) => return,
            Err(err) => {
                warn!(error = %err, "failed to load persisted cart; starting empty");
                return;
            }
        };

        let stored: Vec<StoredLine> = match serde_json::from_str(&payload) {
            Ok(stored) => stored,
            Err(err) => {
                warn!(error = %err, "discarding corrupt persisted cart payload");
                return;
            }
        };

        let now = Timestamp::now();
        for line in stored {
            // A zero quantity is a removal that never got flushed; drop it.
            let Ok(pricing) = resolve_pricing(&line.product, line.quantity, tiers, now) else {
                continue;
            };

            self.lines.insert(
                (line.tenant.clone(), line.product.id.clone()),
                CartLineItem::restored(
                    line.tenant,
                    line.product,
                    line.quantity,
                    pricing,
                    line.added_at,
                    line.updated_at,
                ),
            );
        }

        debug!(lines = self.lines.len(), "rehydrated cart from storage");
    }
}
