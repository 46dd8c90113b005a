//! Guest order archive
//!
//! Guests have no account to query later, so each successful guest order is
//! snapshotted locally. The archive holds at most [`GUEST_ORDER_LIMIT`]
//! records, newest first; records are never edited after they are written.

use std::{fmt, sync::Arc};

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    ids::{OrderId, PaymentMethodId, ProductId, VariantId},
    items::CartLineItem,
    orders::{OrderPayload, OrderReceipt},
    reference::PaymentMethod,
    storage::{KeyValueStore, StorageError, read_json, write_json},
};

/// Storage key holding the JSON array of guest orders.
pub const GUEST_ORDERS_STORAGE_KEY: &str = "guest_orders";

/// Maximum number of archived guest orders.
pub const GUEST_ORDER_LIMIT: usize = 5;

/// Line of an archived order, with presentation fields recovered from the
/// cart at the time of ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestOrderLine {
    /// Product identifier
    pub product_id: Option<ProductId>,

    /// Variant identifier
    pub variant_id: VariantId,

    /// Product name
    pub display_name: String,

    /// Product image
    pub image_url: String,

    /// Unit description
    pub unit_label: String,

    /// Unit price charged
    pub unit_price: Decimal,

    /// Units ordered
    pub quantity: u32,
}

impl GuestOrderLine {
    fn enrich(
        product_id: Option<ProductId>,
        variant_id: &VariantId,
        unit_price: Option<Decimal>,
        quantity: u32,
        cart_snapshot: &[CartLineItem],
    ) -> Self {
        let cart_line = cart_snapshot
            .iter()
            .find(|line| line.variant_id == *variant_id);

        Self {
            product_id: product_id.or_else(|| cart_line.map(|line| line.product_id.clone())),
            variant_id: variant_id.clone(),
            display_name: cart_line
                .map(|line| line.display_name.clone())
                .unwrap_or_default(),
            image_url: cart_line
                .map(|line| line.image_url.clone())
                .unwrap_or_default(),
            unit_label: cart_line
                .map(|line| line.unit_label.clone())
                .unwrap_or_default(),
            unit_price: unit_price
                .or_else(|| cart_line.map(|line| line.unit_price))
                .unwrap_or_default(),
            quantity,
        }
    }
}

/// Where the guest order is delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestAddress {
    /// Recipient name
    pub full_name: String,

    /// Recipient phone
    pub phone_number: String,

    /// Street address
    pub address_line: String,

    /// City
    pub city: String,

    /// Area or district
    #[serde(default)]
    pub area: Option<String>,

    /// Postal code
    #[serde(default)]
    pub postal_code: Option<String>,
}

/// Snapshot of a placed guest order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestOrderRecord {
    /// Order identifier
    pub order_id: OrderId,

    /// Human-facing order number
    pub order_number: Option<String>,

    /// Status at the time of ordering
    pub status: Option<String>,

    /// Subtotal before discount
    pub subtotal: Decimal,

    /// Discount applied
    pub discount: Decimal,

    /// Delivery charge
    pub delivery_charge: Decimal,

    /// Amount payable
    pub total: Decimal,

    /// Ordered lines
    pub items: Vec<GuestOrderLine>,

    /// Delivery address
    pub address: GuestAddress,

    /// Selected payment method
    pub payment_method_id: PaymentMethodId,

    /// Payment method title resolved when the order was saved
    pub payment_method_title: Option<String>,

    /// When the order was placed
    pub placed_at: Timestamp,
}

impl GuestOrderRecord {
    /// Denormalize a receipt against the cart snapshot and payment methods.
    ///
    /// Receipt lines are preferred; when the receipt echoes no lines the
    /// submitted payload lines are used instead.
    pub fn from_receipt(
        receipt: &OrderReceipt,
        payload: &OrderPayload,
        cart_snapshot: &[CartLineItem],
        payment_methods: &[PaymentMethod],
    ) -> Self {
        let items = if receipt.items.is_empty() {
            payload
                .items()
                .iter()
                .map(|line| {
                    GuestOrderLine::enrich(
                        Some(line.product_id.clone()),
                        &line.variant_product_id,
                        Some(line.unit_price),
                        line.quantity,
                        cart_snapshot,
                    )
                })
                .collect()
        } else {
            receipt
                .items
                .iter()
                .map(|line| {
                    GuestOrderLine::enrich(
                        line.product_id.clone(),
                        &line.variant_product_id,
                        line.unit_price,
                        line.quantity,
                        cart_snapshot,
                    )
                })
                .collect()
        };

        Self {
            order_id: receipt.id.clone(),
            order_number: receipt.order_number.clone(),
            status: receipt.status.clone(),
            subtotal: payload.subtotal(),
            discount: payload.discount_amount(),
            delivery_charge: payload.delivery_charge(),
            total: receipt.total.unwrap_or_else(|| payload.total()),
            items,
            address: GuestAddress {
                full_name: payload.full_name().unwrap_or_default().to_string(),
                phone_number: payload.phone_number().unwrap_or_default().to_string(),
                address_line: payload.address_line().unwrap_or_default().to_string(),
                city: payload.city().unwrap_or_default().to_string(),
                area: payload.area().map(str::to_string),
                postal_code: payload.postal_code().map(str::to_string),
            },
            payment_method_id: payload.payment_method_id().clone(),
            payment_method_title: PaymentMethod::title_of(
                payment_methods,
                payload.payment_method_id(),
            )
            .map(str::to_string),
            placed_at: receipt.created_at.unwrap_or_else(Timestamp::now),
        }
    }
}

/// Bounded, newest-first archive of guest orders.
#[derive(Clone)]
pub struct GuestOrderArchive {
    storage: Arc<dyn KeyValueStore>,
}

impl fmt::Debug for GuestOrderArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuestOrderArchive").finish_non_exhaustive()
    }
}

impl GuestOrderArchive {
    /// Archive backed by `storage`.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Snapshot a placed order and prepend it, keeping the newest
    /// [`GUEST_ORDER_LIMIT`] records.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the archive could not be written.
    pub fn save(
        &self,
        receipt: &OrderReceipt,
        payload: &OrderPayload,
        cart_snapshot: &[CartLineItem],
        payment_methods: &[PaymentMethod],
    ) -> Result<GuestOrderRecord, StorageError> {
        let record =
            GuestOrderRecord::from_receipt(receipt, payload, cart_snapshot, payment_methods);

        self.push(record.clone())?;

        Ok(record)
    }

    /// Prepend an already built record.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the archive could not be written.
    pub fn push(&self, record: GuestOrderRecord) -> Result<(), StorageError> {
        let mut records = self.load_all();

        records.insert(0, record);
        records.truncate(GUEST_ORDER_LIMIT);

        debug!(records = records.len(), "guest order archived");

        write_json(self.storage.as_ref(), GUEST_ORDERS_STORAGE_KEY, &records)
    }

    /// Archived orders, newest first. Empty when absent or unreadable.
    pub fn load_all(&self) -> Vec<GuestOrderRecord> {
        match read_json(self.storage.as_ref(), GUEST_ORDERS_STORAGE_KEY) {
            Ok(records) => records.unwrap_or_default(),
            Err(source) => {
                warn!(error = %source, "discarding unreadable guest order archive");

                Vec::new()
            }
        }
    }

    /// Erase every archived order.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the record could not be removed.
    pub fn clear_all(&self) -> Result<(), StorageError> {
        self.storage.remove(GUEST_ORDERS_STORAGE_KEY)
    }
}
