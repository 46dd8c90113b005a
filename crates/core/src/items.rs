//! Cart Line Items

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{ProductId, VariantId};

/// Identity of a purchasable unit: the `(product, variant)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineKey {
    /// Product identifier
    pub product_id: ProductId,

    /// Variant identifier
    pub variant_id: VariantId,
}

impl LineKey {
    /// Create a new key.
    pub fn new(product_id: impl Into<ProductId>, variant_id: impl Into<VariantId>) -> Self {
        Self {
            product_id: product_id.into(),
            variant_id: variant_id.into(),
        }
    }
}

/// A single line in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    /// Product identifier
    pub product_id: ProductId,

    /// Variant identifier
    pub variant_id: VariantId,

    /// Product name shown to the shopper
    #[serde(default)]
    pub display_name: String,

    /// Product image
    #[serde(default)]
    pub image_url: String,

    /// Unit description, e.g. "500 g"
    #[serde(default)]
    pub unit_label: String,

    /// Price of a single unit
    pub unit_price: Decimal,

    /// Number of units, always at least one while the line exists
    pub quantity: u32,
}

impl CartLineItem {
    /// Create a line with empty presentation fields.
    pub fn new(
        product_id: impl Into<ProductId>,
        variant_id: impl Into<VariantId>,
        unit_price: Decimal,
        quantity: u32,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            variant_id: variant_id.into(),
            display_name: String::new(),
            image_url: String::new(),
            unit_label: String::new(),
            unit_price,
            quantity,
        }
    }

    /// Set the presentation fields.
    #[must_use]
    pub fn with_details(
        mut self,
        display_name: impl Into<String>,
        image_url: impl Into<String>,
        unit_label: impl Into<String>,
    ) -> Self {
        self.display_name = display_name.into();
        self.image_url = image_url.into();
        self.unit_label = unit_label.into();
        self
    }

    /// The `(product, variant)` identity of this line.
    pub fn key(&self) -> LineKey {
        LineKey {
            product_id: self.product_id.clone(),
            variant_id: self.variant_id.clone(),
        }
    }

    /// Whether this line belongs to the given product and variant.
    pub fn matches(&self, product_id: &ProductId, variant_id: &VariantId) -> bool {
        self.product_id == *product_id && self.variant_id == *variant_id
    }

    /// `unit_price * quantity`
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}
