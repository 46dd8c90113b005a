//! Cart service
//!
//! Applies shopper cart actions to the local [`CartStore`] and, for signed-in
//! shoppers, to the remote cart. The remote change must succeed before the
//! local cart is touched, so the local cart never shows a state the backend
//! refused.

use thiserror::Error;
use tracing::{debug, warn};

use storefront::{
    cart::CartStore,
    ids::{ProductId, VariantId},
    items::CartLineItem,
    storage::StorageError,
};

use crate::sync::{RemoteCartSync, SyncError};

#[derive(Debug, Error)]
pub enum CartServiceError {
    #[error("remote cart rejected the change: {0}")]
    Sync(#[from] SyncError),

    #[error("product {product_id}, variant {variant_id} is not in the cart")]
    UnknownLine {
        product_id: ProductId,
        variant_id: VariantId,
    },
}

/// Cart actions for one shopper.
#[derive(Debug)]
pub struct CartService<'a> {
    cart: &'a mut CartStore,
    remote: Option<&'a RemoteCartSync>,
}

impl<'a> CartService<'a> {
    /// Cart service for a guest; changes stay local.
    pub fn guest(cart: &'a mut CartStore) -> Self {
        Self { cart, remote: None }
    }

    /// Cart service for a signed-in shopper.
    pub fn member(cart: &'a mut CartStore, remote: &'a RemoteCartSync) -> Self {
        Self {
            cart,
            remote: Some(remote),
        }
    }

    pub fn new(cart: &'a mut CartStore, remote: Option<&'a RemoteCartSync>) -> Self {
        Self { cart, remote }
    }

    /// Add `line`, merging with an existing line for the same variant.
    ///
    /// # Errors
    ///
    /// Returns an error when the remote cart refused the delta; the local cart
    /// is then unchanged.
    pub async fn add_item(&mut self, line: CartLineItem) -> Result<(), CartServiceError> {
        if line.quantity == 0 {
            return Ok(());
        }

        if let Some(remote) = self.remote {
            remote
                .apply_quantity_delta(&line.variant_id, i64::from(line.quantity))
                .await?;
        }

        let key = line.key();

        kept_locally(self.cart.add_item(line), "add");

        debug!(product_id = %key.product_id, variant_id = %key.variant_id, "cart line added");

        Ok(())
    }

    /// Set the absolute quantity of a line already in the cart. Zero or less
    /// removes it.
    ///
    /// The remote cart receives the difference from the current local
    /// quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CartServiceError::UnknownLine`] when raising the quantity of a
    /// line that is not in the cart, or a sync error when the remote cart
    /// refused the change.
    pub async fn set_quantity(
        &mut self,
        product_id: &ProductId,
        variant_id: &VariantId,
        quantity: i64,
    ) -> Result<(), CartServiceError> {
        if quantity <= 0 {
            return self.remove_item(product_id, variant_id).await;
        }

        let current = i64::from(self.cart.quantity_of(product_id, variant_id));

        if current == 0 {
            return Err(CartServiceError::UnknownLine {
                product_id: product_id.clone(),
                variant_id: variant_id.clone(),
            });
        }

        if let Some(remote) = self.remote {
            remote
                .apply_quantity_delta(variant_id, quantity - current)
                .await?;
        }

        kept_locally(
            self.cart.update_quantity(product_id, variant_id, quantity),
            "update",
        );

        Ok(())
    }

    /// Remove a line. Removing a line that is not in the cart is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error when the remote row could not be discarded.
    pub async fn remove_item(
        &mut self,
        product_id: &ProductId,
        variant_id: &VariantId,
    ) -> Result<(), CartServiceError> {
        if let Some(remote) = self.remote {
            match remote.discard_remote_row(product_id, variant_id).await {
                Ok(()) => {}
                Err(SyncError::RowNotFound { .. }) => {
                    debug!(%product_id, %variant_id, "no remote row to discard");
                }
                Err(source) => return Err(source.into()),
            }
        }

        kept_locally(self.cart.remove_item(product_id, variant_id), "remove");

        Ok(())
    }

    /// Empty the local cart. Remote rows are left for the backend to keep.
    pub fn clear(&mut self) {
        kept_locally(self.cart.clear_cart(), "clear");
    }

    /// The local cart.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &*self.cart
    }
}

fn kept_locally(result: Result<(), StorageError>, action: &str) {
    if let Err(source) = result {
        warn!(error = %source, action, "cart change kept in memory only");
    }
}

#[cfg(test)]
mod tests {
    use std::{io, sync::Arc};

    use rust_decimal::Decimal;
    use testresult::TestResult;

    use storefront::{
        ids::CartRowId,
        storage::{KeyValueStore, MemoryStorage},
    };

    use crate::{
        api::{ApiError, MockStorefrontApi, RemoteCartRow},
        session::Session,
    };

    use super::*;

    fn empty_cart() -> CartStore {
        CartStore::load(Arc::new(MemoryStorage::new()))
    }

    /// Storage that refuses every write.
    struct ReadOnlyStorage;

    impl KeyValueStore for ReadOnlyStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io {
                key: key.to_string(),
                source: io::Error::new(io::ErrorKind::StorageFull, "disk full"),
            })
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.set(key, "")
        }
    }

    fn remote(api: MockStorefrontApi) -> RemoteCartSync {
        RemoteCartSync::new(Arc::new(api), Session::new("u1", "token"))
    }

    fn ids() -> (ProductId, VariantId) {
        (ProductId::new("p1"), VariantId::new("v1"))
    }

    #[tokio::test]
    async fn guest_changes_stay_local() -> TestResult {
        let mut cart = empty_cart();
        let (p1, v1) = ids();

        let mut service = CartService::guest(&mut cart);

        service
            .add_item(CartLineItem::new("p1", "v1", Decimal::from(100), 2))
            .await?;
        service.set_quantity(&p1, &v1, 5).await?;

        assert_eq!(cart.quantity_of(&p1, &v1), 5);

        Ok(())
    }

    #[tokio::test]
    async fn member_add_pushes_delta_before_local_change() -> TestResult {
        let mut api = MockStorefrontApi::new();

        api.expect_add_cart_delta()
            .withf(|_, delta| delta.quantity == 2)
            .times(1)
            .returning(|_, _| Ok(()));

        let remote = remote(api);
        let mut cart = empty_cart();

        CartService::member(&mut cart, &remote)
            .add_item(CartLineItem::new("p1", "v1", Decimal::from(100), 2))
            .await?;

        assert_eq!(cart.total_items(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn refused_delta_leaves_local_cart_unchanged() {
        let mut api = MockStorefrontApi::new();

        api.expect_add_cart_delta()
            .returning(|_, _| Err(ApiError::Rejected { message: None }));

        let remote = remote(api);
        let mut cart = empty_cart();

        let result = CartService::member(&mut cart, &remote)
            .add_item(CartLineItem::new("p1", "v1", Decimal::from(100), 2))
            .await;

        assert!(
            matches!(result, Err(CartServiceError::Sync(_))),
            "expected Sync, got {result:?}"
        );
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn set_quantity_sends_difference_from_local_quantity() -> TestResult {
        let mut api = MockStorefrontApi::new();
        let mut expected = vec![-3, 5];

        api.expect_add_cart_delta()
            .times(2)
            .returning(move |_, delta| {
                assert_eq!(Some(delta.quantity), expected.pop());
                Ok(())
            });

        let remote = remote(api);
        let mut cart = empty_cart();
        let (p1, v1) = ids();

        let mut service = CartService::member(&mut cart, &remote);

        service
            .add_item(CartLineItem::new("p1", "v1", Decimal::from(100), 5))
            .await?;
        service.set_quantity(&p1, &v1, 2).await?;

        assert_eq!(cart.quantity_of(&p1, &v1), 2);

        Ok(())
    }

    #[tokio::test]
    async fn set_quantity_of_absent_line_is_unknown_line() {
        let remote = remote(MockStorefrontApi::new());
        let mut cart = empty_cart();
        let (p1, v1) = ids();

        let result = CartService::member(&mut cart, &remote)
            .set_quantity(&p1, &v1, 3)
            .await;

        assert!(
            matches!(result, Err(CartServiceError::UnknownLine { .. })),
            "expected UnknownLine, got {result:?}"
        );
    }

    #[tokio::test]
    async fn set_quantity_to_zero_discards_remote_row() -> TestResult {
        let mut api = MockStorefrontApi::new();

        api.expect_add_cart_delta().returning(|_, _| Ok(()));
        api.expect_get_cart().times(1).returning(|_| {
            Ok(vec![RemoteCartRow {
                id: CartRowId::new("r1"),
                product_id: ProductId::new("p1"),
                variant_product_id: VariantId::new("v1"),
                product_title: String::new(),
                product_image_url: String::new(),
                product_price: Decimal::from(100),
                unit_title: String::new(),
                quantity: 2,
            }])
        });
        api.expect_update_cart_row()
            .withf(|_, update| update.is_discarded == Some(true))
            .times(1)
            .returning(|_, _| Ok(()));

        let remote = remote(api);
        let mut cart = empty_cart();
        let (p1, v1) = ids();

        let mut service = CartService::member(&mut cart, &remote);

        service
            .add_item(CartLineItem::new("p1", "v1", Decimal::from(100), 2))
            .await?;
        service.set_quantity(&p1, &v1, 0).await?;

        assert!(cart.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn remove_proceeds_when_remote_has_no_row() -> TestResult {
        let mut api = MockStorefrontApi::new();

        api.expect_get_cart().returning(|_| Ok(Vec::new()));

        let remote = remote(api);
        let mut cart = empty_cart();
        let (p1, v1) = ids();

        cart.add_item(CartLineItem::new("p1", "v1", Decimal::from(100), 2))?;

        CartService::member(&mut cart, &remote)
            .remove_item(&p1, &v1)
            .await?;

        assert!(cart.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn clear_leaves_remote_cart_alone() -> TestResult {
        let remote = remote(MockStorefrontApi::new());
        let mut cart = empty_cart();

        cart.add_item(CartLineItem::new("p1", "v1", Decimal::from(100), 2))?;

        CartService::member(&mut cart, &remote).clear();

        assert!(cart.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn failed_discard_keeps_local_line() -> TestResult {
        let mut api = MockStorefrontApi::new();

        api.expect_get_cart()
            .returning(|_| Err(ApiError::UnexpectedResponse("status 503".to_string())));

        let remote = remote(api);
        let mut cart = empty_cart();
        let (p1, v1) = ids();

        cart.add_item(CartLineItem::new("p1", "v1", Decimal::from(100), 2))?;

        let result = CartService::member(&mut cart, &remote)
            .remove_item(&p1, &v1)
            .await;

        assert!(result.is_err(), "expected failure, got {result:?}");
        assert_eq!(cart.quantity_of(&p1, &v1), 2);

        Ok(())
    }

    #[tokio::test]
    async fn failed_storage_write_keeps_change_in_memory() -> TestResult {
        let mut api = MockStorefrontApi::new();

        api.expect_add_cart_delta()
            .times(1)
            .returning(|_, _| Ok(()));

        let remote = remote(api);
        let mut cart = CartStore::load(Arc::new(ReadOnlyStorage));
        let (p1, v1) = ids();

        let mut service = CartService::member(&mut cart, &remote);

        service
            .add_item(CartLineItem::new("p1", "v1", Decimal::from(100), 2))
            .await?;

        assert_eq!(service.cart().quantity_of(&p1, &v1), 2);

        service.clear();

        assert!(cart.is_empty());

        Ok(())
    }
}
