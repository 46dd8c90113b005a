//! Backend models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storefront::{
    ids::{CartRowId, ProductId, UserId, VariantId},
    items::{CartLineItem, LineKey},
};

/// A row of the signed-in shopper's remote cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCartRow {
    pub id: CartRowId,
    pub product_id: ProductId,
    pub variant_product_id: VariantId,

    #[serde(default)]
    pub product_title: String,

    #[serde(default)]
    pub product_image_url: String,

    #[serde(default, with = "rust_decimal::serde::float")]
    pub product_price: Decimal,

    #[serde(default)]
    pub unit_title: String,

    pub quantity: i64,
}

impl RemoteCartRow {
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey::new(self.product_id.clone(), self.variant_product_id.clone())
    }

    /// Local cart line mirroring this row, `None` for rows holding no units.
    #[must_use]
    pub fn to_line_item(&self) -> Option<CartLineItem> {
        let quantity = u32::try_from(self.quantity).ok().filter(|qty| *qty > 0)?;

        Some(
            CartLineItem::new(
                self.product_id.clone(),
                self.variant_product_id.clone(),
                self.product_price,
                quantity,
            )
            .with_details(
                self.product_title.clone(),
                self.product_image_url.clone(),
                self.unit_title.clone(),
            ),
        )
    }
}

/// Signed quantity change for one variant of the remote cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDelta {
    pub user_id: UserId,
    pub variant_product_id: VariantId,
    pub quantity: i64,
}

/// Soft update of a remote cart row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartRowUpdate {
    pub id: CartRowId,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_discarded: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_purchased: Option<bool>,
}

impl CartRowUpdate {
    #[must_use]
    pub fn discard(id: CartRowId) -> Self {
        Self {
            id,
            is_discarded: Some(true),
            is_purchased: None,
        }
    }

    #[must_use]
    pub fn purchased(id: CartRowId) -> Self {
        Self {
            id,
            is_discarded: None,
            is_purchased: Some(true),
        }
    }
}

/// Proof that an OTP was dispatched, echoed back when verifying it.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpTicket {
    pub verification_token: String,
}

impl std::fmt::Debug for OtpTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpTicket").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn remote_row_decodes_backend_shape() -> TestResult {
        let row: RemoteCartRow = serde_json::from_value(json!({
            "id": "r1",
            "productId": "p1",
            "variantProductId": "v1",
            "productTitle": "Basmati Rice",
            "productImageUrl": "https://cdn/rice.png",
            "productPrice": 100.5,
            "unitTitle": "5 kg",
            "quantity": 2
        }))?;

        let line = row.to_line_item().ok_or("row should map to a line")?;

        assert_eq!(row.key(), LineKey::new("p1", "v1"));
        assert_eq!(line.unit_price, Decimal::new(1005, 1));
        assert_eq!(line.quantity, 2);
        assert_eq!(line.display_name, "Basmati Rice");

        Ok(())
    }

    #[test]
    fn empty_remote_row_has_no_local_line() -> TestResult {
        let row: RemoteCartRow = serde_json::from_value(json!({
            "id": "r1",
            "productId": "p1",
            "variantProductId": "v1",
            "quantity": 0
        }))?;

        assert!(row.to_line_item().is_none());

        Ok(())
    }

    #[test]
    fn row_updates_only_send_the_flag_being_set() -> TestResult {
        let discard = serde_json::to_value(CartRowUpdate::discard(CartRowId::new("r1")))?;
        let purchased = serde_json::to_value(CartRowUpdate::purchased(CartRowId::new("r2")))?;

        assert_eq!(discard, json!({ "id": "r1", "isDiscarded": true }));
        assert_eq!(purchased, json!({ "id": "r2", "isPurchased": true }));

        Ok(())
    }

    #[test]
    fn delta_is_signed() -> TestResult {
        let delta = CartDelta {
            user_id: UserId::new("u1"),
            variant_product_id: VariantId::new("v1"),
            quantity: -2,
        };

        assert_eq!(
            serde_json::to_value(delta)?,
            json!({ "userId": "u1", "variantProductId": "v1", "quantity": -2 })
        );

        Ok(())
    }
}
