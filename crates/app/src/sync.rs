//! Remote cart synchronization
//!
//! Mirrors local cart mutations onto the signed-in shopper's remote cart.
//! Quantities travel as signed deltas so the backend applies them to its own
//! authoritative count. Every operation holds the row cache lock for its whole
//! duration, which keeps at most one request per remote cart in flight.

use std::{fmt, sync::Arc};

use futures::future::join_all;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use storefront::{
    ids::{CartRowId, ProductId, VariantId},
    items::LineKey,
};

use crate::{
    api::{ApiError, CartDelta, CartRowUpdate, RemoteCartRow, StorefrontApi},
    session::Session,
};

/// Outcome of fetching the remote cart.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCartSnapshot {
    /// The rows the backend currently holds.
    Known(Vec<RemoteCartRow>),

    /// The fetch failed; this is not the same as an empty cart.
    Unknown,
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("no remote cart row for product {product_id}, variant {variant_id}")]
    RowNotFound {
        product_id: ProductId,
        variant_id: VariantId,
    },

    #[error("{failed} of {attempted} cart rows could not be marked purchased")]
    PartialPurchase { failed: usize, attempted: usize },
}

type RowCache = FxHashMap<LineKey, CartRowId>;

/// Remote cart of one signed-in shopper.
pub struct RemoteCartSync {
    api: Arc<dyn StorefrontApi>,
    session: Session,
    rows: Mutex<RowCache>,
}

impl fmt::Debug for RemoteCartSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteCartSync")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl RemoteCartSync {
    #[must_use]
    pub fn new(api: Arc<dyn StorefrontApi>, session: Session) -> Self {
        Self {
            api,
            session,
            rows: Mutex::new(RowCache::default()),
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Fetch the remote cart and rebuild the row cache from it.
    ///
    /// On failure the cache is left as it was and [`RemoteCartSnapshot::Unknown`]
    /// is returned.
    pub async fn fetch_remote_cart(&self) -> RemoteCartSnapshot {
        let mut rows = self.rows.lock().await;

        match self.refresh(&mut rows).await {
            Ok(fetched) => RemoteCartSnapshot::Known(fetched),
            Err(source) => {
                warn!(error = %source, user_id = %self.session.user_id, "remote cart unavailable");

                RemoteCartSnapshot::Unknown
            }
        }
    }

    /// Push a signed quantity change for `variant_id`. A zero delta sends
    /// nothing.
    ///
    /// Deltas are not idempotent: sending the same delta twice applies it
    /// twice.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend did not accept the delta.
    pub async fn apply_quantity_delta(
        &self,
        variant_id: &VariantId,
        delta: i64,
    ) -> Result<(), SyncError> {
        if delta == 0 {
            return Ok(());
        }

        let _rows = self.rows.lock().await;

        let delta = CartDelta {
            user_id: self.session.user_id.clone(),
            variant_product_id: variant_id.clone(),
            quantity: delta,
        };

        self.api.add_cart_delta(&self.session, &delta).await?;

        debug!(
            variant_id = %delta.variant_product_id,
            delta = delta.quantity,
            "remote cart delta applied"
        );

        Ok(())
    }

    /// Soft-delete the remote row for the given product and variant.
    ///
    /// The row id comes from the cache, or from a fresh fetch when it is not
    /// cached yet. The cache entry is evicted once the backend confirms.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::RowNotFound`] when the remote cart has no such row,
    /// or the backend error when the fetch or the update fails.
    pub async fn discard_remote_row(
        &self,
        product_id: &ProductId,
        variant_id: &VariantId,
    ) -> Result<(), SyncError> {
        let mut rows = self.rows.lock().await;
        let key = LineKey::new(product_id.clone(), variant_id.clone());

        let cached = rows.get(&key).cloned();

        let row_id = match cached {
            Some(row_id) => row_id,
            None => {
                self.refresh(&mut rows).await?;

                rows.get(&key).cloned().ok_or_else(|| SyncError::RowNotFound {
                    product_id: product_id.clone(),
                    variant_id: variant_id.clone(),
                })?
            }
        };

        self.api
            .update_cart_row(&self.session, &CartRowUpdate::discard(row_id))
            .await?;

        rows.remove(&key);

        debug!(%product_id, %variant_id, "remote cart row discarded");

        Ok(())
    }

    /// Flag every cached row as purchased, concurrently.
    ///
    /// The cache is refreshed first so rows added since the last fetch are
    /// included. When that refresh fails the rows already cached are used.
    /// Rows the backend confirms are evicted; the rest stay cached.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the refresh fails with nothing cached, and
    /// [`SyncError::PartialPurchase`] unless every row was confirmed.
    pub async fn mark_rows_purchased(&self) -> Result<(), SyncError> {
        let mut rows = self.rows.lock().await;

        if let Err(source) = self.refresh(&mut rows).await {
            if rows.is_empty() {
                return Err(source.into());
            }

            warn!(error = %source, rows = rows.len(), "marking cached rows without refresh");
        }

        let pending: Vec<(LineKey, CartRowId)> = rows
            .iter()
            .map(|(key, row_id)| (key.clone(), row_id.clone()))
            .collect();

        let attempted = pending.len();

        let updates: Vec<CartRowUpdate> = pending
            .iter()
            .map(|(_, row_id)| CartRowUpdate::purchased(row_id.clone()))
            .collect();

        let results = join_all(
            updates
                .iter()
                .map(|update| self.api.update_cart_row(&self.session, update)),
        )
        .await;

        let mut failed = 0;

        for ((key, row_id), result) in pending.into_iter().zip(results) {
            match result {
                Ok(()) => {
                    rows.remove(&key);
                }
                Err(source) => {
                    warn!(error = %source, %row_id, "cart row not marked purchased");

                    failed += 1;
                }
            }
        }

        if failed > 0 {
            return Err(SyncError::PartialPurchase { failed, attempted });
        }

        info!(rows = attempted, "remote cart marked purchased");

        Ok(())
    }

    /// Drop every cached row id.
    pub async fn invalidate(&self) {
        self.rows.lock().await.clear();
    }

    /// Cached remote row id for the given line.
    pub async fn cached_row(&self, key: &LineKey) -> Option<CartRowId> {
        self.rows.lock().await.get(key).cloned()
    }

    async fn refresh(&self, rows: &mut RowCache) -> Result<Vec<RemoteCartRow>, ApiError> {
        let fetched = self.api.get_cart(&self.session).await?;

        *rows = fetched
            .iter()
            .map(|row| (row.key(), row.id.clone()))
            .collect();

        debug!(rows = rows.len(), "remote cart row cache rebuilt");

        Ok(fetched)
    }
}
