//! Persisted Cart Store
//!
//! The single source of truth for what is in the cart right now, independent
//! of whether the shopper is signed in. Every mutation is applied in memory
//! first and then written through to the [`KeyValueStore`]; the returned
//! `Result` only reports whether that write reached storage.

use std::{fmt, sync::Arc};

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::{
    ids::{ProductId, VariantId},
    items::CartLineItem,
    storage::{KeyValueStore, StorageError, read_json, write_json},
};

/// Storage key holding the JSON array of cart lines.
pub const CART_STORAGE_KEY: &str = "cart";

/// Cart
pub struct CartStore {
    lines: Vec<CartLineItem>,
    storage: Arc<dyn KeyValueStore>,
}

impl fmt::Debug for CartStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("lines", &self.lines)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Hydrate the cart from storage.
    ///
    /// A missing, unreadable or corrupt record yields an empty cart. Stored
    /// lines sharing a product and variant are merged into the first one.
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let lines = match read_json::<Vec<CartLineItem>>(storage.as_ref(), CART_STORAGE_KEY) {
            Ok(Some(stored)) => merge_lines(stored),
            Ok(None) => Vec::new(),
            Err(source) => {
                warn!(error = %source, "discarding unreadable cart");

                Vec::new()
            }
        };

        debug!(lines = lines.len(), "cart hydrated");

        Self { lines, storage }
    }

    /// Add a line, merging quantities with an existing line for the same
    /// product and variant.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the updated cart could not be persisted.
    /// The in-memory cart is updated regardless.
    pub fn add_item(&mut self, line: CartLineItem) -> Result<(), StorageError> {
        if line.quantity == 0 {
            return Ok(());
        }

        match self
            .lines
            .iter_mut()
            .find(|existing| existing.matches(&line.product_id, &line.variant_id))
        {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
            None => self.lines.push(line),
        }

        self.persist()
    }

    /// Remove the line for the given product and variant, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the updated cart could not be persisted.
    pub fn remove_item(
        &mut self,
        product_id: &ProductId,
        variant_id: &VariantId,
    ) -> Result<(), StorageError> {
        self.lines.retain(|line| !line.matches(product_id, variant_id));

        self.persist()
    }

    /// Set the absolute quantity of a line. Zero or negative removes it.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the updated cart could not be persisted.
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        variant_id: &VariantId,
        quantity: i64,
    ) -> Result<(), StorageError> {
        if quantity <= 0 {
            return self.remove_item(product_id, variant_id);
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.matches(product_id, variant_id))
        {
            line.quantity = quantity;
        }

        self.persist()
    }

    /// Empty the cart and erase its stored record.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the stored record could not be removed.
    pub fn clear_cart(&mut self) -> Result<(), StorageError> {
        self.lines.clear();

        self.storage.remove(CART_STORAGE_KEY)
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Sum of `unit_price * quantity` across all lines.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.lines.iter().map(CartLineItem::line_total).sum()
    }

    /// Current lines.
    #[must_use]
    pub fn lines(&self) -> &[CartLineItem] {
        &self.lines
    }

    /// The line for the given product and variant.
    #[must_use]
    pub fn line(&self, product_id: &ProductId, variant_id: &VariantId) -> Option<&CartLineItem> {
        self.lines
            .iter()
            .find(|line| line.matches(product_id, variant_id))
    }

    /// Quantity held for the given product and variant, zero when absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId, variant_id: &VariantId) -> u32 {
        self.line(product_id, variant_id)
            .map_or(0, |line| line.quantity)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn persist(&self) -> Result<(), StorageError> {
        write_json(self.storage.as_ref(), CART_STORAGE_KEY, &self.lines)
    }
}

fn merge_lines(stored: Vec<CartLineItem>) -> Vec<CartLineItem> {
    let mut lines: Vec<CartLineItem> = Vec::with_capacity(stored.len());

    for line in stored.into_iter().filter(|line| line.quantity > 0) {
        match lines
            .iter_mut()
            .find(|existing| existing.matches(&line.product_id, &line.variant_id))
        {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
            None => lines.push(line),
        }
    }

    lines
}
