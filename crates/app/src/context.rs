//! App Context

use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

use storefront::{
    archive::GuestOrderArchive,
    cart::CartStore,
    checkout::CheckoutRequest,
    discounts::DiscountDescriptor,
    reference::PaymentMethod,
    storage::{FileStorage, KeyValueStore, StorageError},
};

use crate::{
    api::{ApiError, HttpStorefrontApi, StorefrontApi},
    cart::CartService,
    checkout::{CheckoutOrchestrator, CheckoutState, Shopper, TransitionError},
    config::AppConfig,
    session::{Identity, Session},
    sync::{RemoteCartSnapshot, RemoteCartSync},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to open local storage: {0}")]
    Storage(#[source] StorageError),

    #[error("failed to build backend client: {0}")]
    Api(#[source] ApiError),
}

/// Everything one storefront process works with: the single cart instance,
/// the guest order archive, the current identity and, while signed in, the
/// remote cart of that shopper.
pub struct Storefront {
    api: Arc<dyn StorefrontApi>,
    cart: CartStore,
    archive: GuestOrderArchive,
    identity: Identity,
    remote: Option<RemoteCartSync>,
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("cart", &self.cart)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl Storefront {
    /// Hydrate the cart from `storage` and start as a guest.
    pub fn new(api: Arc<dyn StorefrontApi>, storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            api,
            cart: CartStore::load(storage.clone()),
            archive: GuestOrderArchive::new(storage),
            identity: Identity::Guest,
            remote: None,
        }
    }

    /// Build the context from configuration, signing in when credentials
    /// are configured.
    ///
    /// # Errors
    ///
    /// Returns an error when the data directory cannot be opened or the HTTP
    /// client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppInitError> {
        let storage = FileStorage::open(&config.storage.data_dir).map_err(AppInitError::Storage)?;

        let api = HttpStorefrontApi::new(&config.api.base_url, config.api.timeout())
            .map_err(AppInitError::Api)?;

        let mut storefront = Self::new(Arc::new(api), Arc::new(storage));

        if let Some(session) = config.session.session() {
            storefront.login(session);
        }

        Ok(storefront)
    }

    /// Switch to a signed-in identity with a fresh remote cart.
    pub fn login(&mut self, session: Session) {
        info!(user_id = %session.user_id, "signed in");

        self.remote = Some(RemoteCartSync::new(self.api.clone(), session.clone()));
        self.identity = Identity::Authenticated(session);
    }

    /// Return to a guest identity, dropping the remote row cache.
    pub async fn logout(&mut self) {
        if let Some(remote) = self.remote.take() {
            remote.invalidate().await;

            info!(user_id = %remote.session().user_id, "signed out");
        }

        self.identity = Identity::Guest;
    }

    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    #[must_use]
    pub fn api(&self) -> &Arc<dyn StorefrontApi> {
        &self.api
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    #[must_use]
    pub fn archive(&self) -> &GuestOrderArchive {
        &self.archive
    }

    #[must_use]
    pub fn remote(&self) -> Option<&RemoteCartSync> {
        self.remote.as_ref()
    }

    /// Cart actions for the current identity.
    pub fn cart_service(&mut self) -> CartService<'_> {
        CartService::new(&mut self.cart, self.remote.as_ref())
    }

    /// Fetch the signed-in shopper's remote cart. Guests have none.
    pub async fn fetch_remote_cart(&self) -> Option<RemoteCartSnapshot> {
        match &self.remote {
            Some(remote) => Some(remote.fetch_remote_cart().await),
            None => None,
        }
    }

    /// Resolve a coupon against the current cart subtotal.
    ///
    /// # Errors
    ///
    /// Returns the backend error when the coupon is refused.
    pub async fn apply_coupon(&self, code: &str) -> Result<DiscountDescriptor, ApiError> {
        let subtotal: Decimal = storefront::pricing::subtotal(self.cart.lines());

        self.api.apply_coupon(code.trim(), subtotal).await
    }

    /// A checkout orchestrator sharing this context's backend and archive.
    #[must_use]
    pub fn checkout(&self, payment_methods: Vec<PaymentMethod>) -> CheckoutOrchestrator {
        CheckoutOrchestrator::new(self.api.clone(), self.archive.clone(), payment_methods)
    }

    /// Start a checkout attempt as the current identity.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] when `orchestrator` is mid-attempt.
    pub async fn place_order(
        &mut self,
        orchestrator: &mut CheckoutOrchestrator,
        request: &CheckoutRequest,
    ) -> Result<CheckoutState, TransitionError> {
        let shopper = match &self.remote {
            Some(remote) => Shopper::Member(remote),
            None => Shopper::Guest,
        };

        orchestrator
            .place_order(&mut self.cart, shopper, request)
            .await
            .cloned()
    }

    /// Continue a checkout waiting for a one-time password. A successful
    /// verification signs the shopper in.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] when no password is awaited.
    pub async fn confirm_otp(
        &mut self,
        orchestrator: &mut CheckoutOrchestrator,
        code: &str,
    ) -> Result<CheckoutState, TransitionError> {
        let state = orchestrator.confirm_otp(&mut self.cart, code).await?.clone();

        if let Some(session) = orchestrator.upgraded_session() {
            self.login(session.clone());
        }

        Ok(state)
    }
}
