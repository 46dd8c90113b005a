//! Order placement
//!
//! A checkout attempt moves through explicit states:
//!
//! ```text
//! Idle -> Validating -> Submitting -> Succeeded | Failed
//!                    \-> AwaitingOtp -> AwaitingAddressCreation -> Submitting
//! ```
//!
//! The OTP branch is taken by guests who opt into an account; once the code
//! is verified the order continues as a signed-in order. A failed attempt
//! leaves the cart and the remote cart untouched and is never retried
//! automatically.

use std::{fmt, sync::Arc};

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, warn};

use storefront::{
    archive::{GuestOrderArchive, GuestOrderRecord},
    cart::CartStore,
    checkout::{
        CheckoutError, CheckoutRequest, GuestDetails, ValidRecipient, ValidatedCheckout, validate,
    },
    ids::UserId,
    orders::{OrderPayload, OrderReceipt},
    reference::{NewAddress, PaymentMethod},
};

use crate::{
    api::{ApiError, OtpTicket, StorefrontApi},
    session::Session,
    sync::RemoteCartSync,
};

const ORDER_FALLBACK: &str = "Failed to place order. Please try again.";
const OTP_SEND_FALLBACK: &str = "Failed to send OTP. Please try again.";
const OTP_VERIFY_FALLBACK: &str = "Failed to verify OTP. Please try again.";
const ADDRESS_FALLBACK: &str = "Failed to save your address. Please try again.";

/// A placed order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderConfirmation {
    pub receipt: OrderReceipt,

    /// Amount submitted with the order
    pub total: Decimal,

    /// Local snapshot, for guest orders
    pub archived: Option<GuestOrderRecord>,
}

/// Why an attempt ended in [`CheckoutState::Failed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutFailure {
    /// The checkout form is incomplete; nothing was sent.
    Invalid(CheckoutError),

    /// Saved addresses need a signed-in shopper.
    SignInRequired,

    /// The backend refused the request or could not be reached.
    Submission { message: String },
}

impl CheckoutFailure {
    /// Message for the shopper.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Invalid(error) => error.to_string(),
            Self::SignInRequired => "Please sign in to use a saved address.".to_string(),
            Self::Submission { message } => message.clone(),
        }
    }

    fn from_api(error: &ApiError, fallback: &str) -> Self {
        Self::Submission {
            message: error.user_message(fallback),
        }
    }
}

impl fmt::Display for CheckoutFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutState {
    Idle,
    Validating,

    /// Waiting for the code sent to `phone_number`.
    AwaitingOtp { phone_number: String },

    AwaitingAddressCreation,
    Submitting,
    Succeeded(OrderConfirmation),
    Failed(CheckoutFailure),
}

impl CheckoutState {
    /// Whether an attempt is underway and a new one cannot start.
    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            Self::Validating
                | Self::AwaitingOtp { .. }
                | Self::AwaitingAddressCreation
                | Self::Submitting
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("a checkout attempt is already in progress")]
    InProgress,

    #[error("no one-time password is being awaited")]
    NotAwaitingOtp,
}

/// Who is checking out.
#[derive(Debug, Clone, Copy)]
pub enum Shopper<'a> {
    Guest,
    Member(&'a RemoteCartSync),
}

struct PendingUpgrade {
    checkout: ValidatedCheckout,
    guest: GuestDetails,
    ticket: OtpTicket,
}

/// Drives one checkout at a time.
pub struct CheckoutOrchestrator {
    api: Arc<dyn StorefrontApi>,
    archive: GuestOrderArchive,
    payment_methods: Vec<PaymentMethod>,
    state: CheckoutState,
    pending: Option<PendingUpgrade>,
    upgraded: Option<Session>,
}

impl fmt::Debug for CheckoutOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutOrchestrator")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl CheckoutOrchestrator {
    /// `payment_methods` resolves method titles for archived guest orders.
    pub fn new(
        api: Arc<dyn StorefrontApi>,
        archive: GuestOrderArchive,
        payment_methods: Vec<PaymentMethod>,
    ) -> Self {
        Self {
            api,
            archive,
            payment_methods,
            state: CheckoutState::Idle,
            pending: None,
            upgraded: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    /// Session issued when a guest checkout was upgraded to an account.
    #[must_use]
    pub fn upgraded_session(&self) -> Option<&Session> {
        self.upgraded.as_ref()
    }

    /// Abandon the current attempt.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.state = CheckoutState::Idle;
    }

    /// Start a checkout attempt for the contents of `cart`.
    ///
    /// Runs until the order succeeds or fails, or suspends in
    /// [`CheckoutState::AwaitingOtp`] for guests registering an account.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::InProgress`] while another attempt is
    /// underway.
    pub async fn place_order(
        &mut self,
        cart: &mut CartStore,
        shopper: Shopper<'_>,
        request: &CheckoutRequest,
    ) -> Result<&CheckoutState, TransitionError> {
        if self.state.is_in_progress() {
            return Err(TransitionError::InProgress);
        }

        self.pending = None;
        self.upgraded = None;
        self.state = CheckoutState::Validating;

        let checkout = match validate(request, cart.lines()) {
            Ok(checkout) => checkout,
            Err(error) => return Ok(self.fail(CheckoutFailure::Invalid(error))),
        };

        match shopper {
            Shopper::Guest => match checkout.recipient.clone() {
                ValidRecipient::Guest(guest) if guest.create_account => {
                    self.request_otp(checkout, guest).await;
                }
                ValidRecipient::Guest(_) => self.submit_guest(cart, &checkout).await,
                ValidRecipient::Account { .. } => {
                    self.fail(CheckoutFailure::SignInRequired);
                }
            },
            Shopper::Member(remote) => match checkout.recipient {
                ValidRecipient::Guest(_) => {
                    self.fail(CheckoutFailure::Invalid(CheckoutError::MissingAddress));
                }
                ValidRecipient::Account { .. } => {
                    self.submit_member(cart, remote, &checkout).await;
                }
            },
        }

        Ok(&self.state)
    }

    /// Continue an attempt suspended in [`CheckoutState::AwaitingOtp`].
    ///
    /// Verifies `code`, saves the guest address against the new account and
    /// submits the order as that account.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::NotAwaitingOtp`] outside
    /// [`CheckoutState::AwaitingOtp`].
    pub async fn confirm_otp(
        &mut self,
        cart: &mut CartStore,
        code: &str,
    ) -> Result<&CheckoutState, TransitionError> {
        let CheckoutState::AwaitingOtp { phone_number } = &self.state else {
            return Err(TransitionError::NotAwaitingOtp);
        };

        let phone_number = phone_number.clone();

        let Some(pending) = self.pending.take() else {
            return Err(TransitionError::NotAwaitingOtp);
        };

        let session = match self
            .api
            .verify_mobile_otp(&phone_number, code.trim(), &pending.ticket)
            .await
        {
            Ok(session) => session,
            Err(error) => {
                return Ok(self.fail(CheckoutFailure::from_api(&error, OTP_VERIFY_FALLBACK)));
            }
        };

        info!(user_id = %session.user_id, "guest checkout upgraded to account");

        self.upgraded = Some(session.clone());
        self.state = CheckoutState::AwaitingAddressCreation;

        let address = new_address(session.user_id.clone(), &pending.guest);

        let address = match self.api.create_address(&session, &address).await {
            Ok(address) => address,
            Err(error) => {
                return Ok(self.fail(CheckoutFailure::from_api(&error, ADDRESS_FALLBACK)));
            }
        };

        let checkout = pending.checkout.with_recipient(ValidRecipient::Account {
            address_id: address.id,
        });

        let remote = RemoteCartSync::new(self.api.clone(), session);

        self.submit_member(cart, &remote, &checkout).await;

        Ok(&self.state)
    }

    async fn request_otp(&mut self, checkout: ValidatedCheckout, guest: GuestDetails) {
        let phone_number = guest.phone_number.trim().to_string();

        match self.api.send_mobile_otp(&phone_number).await {
            Ok(ticket) => {
                self.pending = Some(PendingUpgrade {
                    checkout,
                    guest,
                    ticket,
                });
                self.state = CheckoutState::AwaitingOtp { phone_number };
            }
            Err(error) => {
                self.fail(CheckoutFailure::from_api(&error, OTP_SEND_FALLBACK));
            }
        }
    }

    async fn submit_guest(&mut self, cart: &mut CartStore, checkout: &ValidatedCheckout) {
        self.state = CheckoutState::Submitting;

        let Some(payload) = self.build_payload(checkout, cart, None) else {
            return;
        };

        let receipt = match self.api.create_guest_order(&payload).await {
            Ok(receipt) => receipt,
            Err(error) => {
                self.fail(CheckoutFailure::from_api(&error, ORDER_FALLBACK));
                return;
            }
        };

        let archived = match self
            .archive
            .save(&receipt, &payload, cart.lines(), &self.payment_methods)
        {
            Ok(record) => Some(record),
            Err(source) => {
                warn!(error = %source, order_id = %receipt.id, "guest order not archived");

                None
            }
        };

        self.succeed(cart, receipt, &payload, archived);
    }

    async fn submit_member(
        &mut self,
        cart: &mut CartStore,
        remote: &RemoteCartSync,
        checkout: &ValidatedCheckout,
    ) {
        self.state = CheckoutState::Submitting;

        let session = remote.session();

        let Some(payload) = self.build_payload(checkout, cart, Some(&session.user_id)) else {
            return;
        };

        let receipt = match self.api.create_order(session, &payload).await {
            Ok(receipt) => receipt,
            Err(error) => {
                self.fail(CheckoutFailure::from_api(&error, ORDER_FALLBACK));
                return;
            }
        };

        if let Err(source) = remote.mark_rows_purchased().await {
            warn!(error = %source, order_id = %receipt.id, "remote cart not finalized");
        }

        self.succeed(cart, receipt, &payload, None);
    }

    fn build_payload(
        &mut self,
        checkout: &ValidatedCheckout,
        cart: &CartStore,
        user_id: Option<&UserId>,
    ) -> Option<OrderPayload> {
        match OrderPayload::build(checkout, cart.lines(), user_id) {
            Ok(payload) => Some(payload),
            Err(source) => {
                warn!(error = %source, "order totals could not be computed");

                self.fail(CheckoutFailure::Submission {
                    message: ORDER_FALLBACK.to_string(),
                });

                None
            }
        }
    }

    fn succeed(
        &mut self,
        cart: &mut CartStore,
        receipt: OrderReceipt,
        payload: &OrderPayload,
        archived: Option<GuestOrderRecord>,
    ) {
        if let Err(source) = cart.clear_cart() {
            warn!(error = %source, "cart cleared in memory only");
        }

        info!(order_id = %receipt.id, total = %payload.total(), "order placed");

        self.state = CheckoutState::Succeeded(OrderConfirmation {
            receipt,
            total: payload.total(),
            archived,
        });
    }

    fn fail(&mut self, failure: CheckoutFailure) -> &CheckoutState {
        warn!(reason = %failure, "checkout failed");

        self.pending = None;
        self.state = CheckoutState::Failed(failure);

        &self.state
    }
}

fn new_address(user_id: UserId, guest: &GuestDetails) -> NewAddress {
    NewAddress {
        user_id,
        full_name: guest.full_name.trim().to_string(),
        phone_number: guest.phone_number.trim().to_string(),
        address_line: guest.address_line.trim().to_string(),
        city: guest.city.trim().to_string(),
        area: guest.area.clone(),
        postal_code: guest.postal_code.clone(),
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use jiff::civil::Date;
    use testresult::TestResult;

    use storefront::{
        archive::GUEST_ORDERS_STORAGE_KEY,
        cart::CART_STORAGE_KEY,
        checkout::{Recipient, TransactionProof},
        ids::{
            AddressId, CartRowId, DeliveryZoneId, OrderId, PaymentMethodId, ProductId, VariantId,
        },
        items::CartLineItem,
        reference::{Address, DeliverySlot, DeliveryZone},
        storage::{KeyValueStore, MemoryStorage, StorageError},
    };

    use crate::api::{MockStorefrontApi, RemoteCartRow};

    use super::*;

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

    struct Fixture {
        storage: Arc<MemoryStorage>,
        cart: CartStore,
        archive: GuestOrderArchive,
    }

    impl Fixture {
        fn new() -> TestResult<Self> {
            let storage = Arc::new(MemoryStorage::new());
            let mut cart = CartStore::load(storage.clone());

            cart.add_item(
                CartLineItem::new("p1", "v1", Decimal::from(100), 2).with_details(
                    "Basmati Rice",
                    "https://cdn/rice.png",
                    "5 kg",
                ),
            )?;

            Ok(Self {
                archive: GuestOrderArchive::new(storage.clone()),
                storage,
                cart,
            })
        }

        fn orchestrator(&self, api: MockStorefrontApi) -> CheckoutOrchestrator {
            CheckoutOrchestrator::new(Arc::new(api), self.archive.clone(), vec![cod()])
        }
    }

    fn cod() -> PaymentMethod {
        PaymentMethod {
            id: PaymentMethodId::new("pm-cod"),
            title: "Cash on Delivery".to_string(),
            code: "cod".to_string(),
        }
    }

    fn guest() -> GuestDetails {
        GuestDetails {
            full_name: "Rahim Uddin".to_string(),
            phone_number: "01712345678".to_string(),
            address_line: "House 4, Road 7".to_string(),
            city: "Dhaka".to_string(),
            ..GuestDetails::default()
        }
    }

    fn request(recipient: Recipient) -> CheckoutRequest {
        CheckoutRequest {
            delivery_zone: Some(DeliveryZone {
                id: DeliveryZoneId::new("z1"),
                name: "Inside city".to_string(),
                delivery_charge: Decimal::from(20),
            }),
            payment_method: Some(cod()),
            delivery_slot: Some(DeliverySlot {
                date: Date::constant(2026, 10, 20),
                time_slot: "10:00-12:00".to_string(),
            }),
            discount: None,
            transaction: TransactionProof::default(),
            recipient,
            note: None,
        }
    }

    fn receipt(id: &str) -> OrderReceipt {
        OrderReceipt {
            id: OrderId::new(id),
            order_number: Some(format!("#{id}")),
            status: Some("pending".to_string()),
            total: None,
            items: Vec::new(),
            created_at: None,
        }
    }

    fn member_remote(api: &Arc<MockStorefrontApi>) -> RemoteCartSync {
        RemoteCartSync::new(api.clone(), Session::new("u1", "token"))
    }

    #[tokio::test]
    async fn guest_order_is_archived_and_cart_cleared() -> TestResult {
        let mut fixture = Fixture::new()?;
        let mut api = MockStorefrontApi::new();

        api.expect_create_guest_order()
            .withf(|payload| payload.total() == Decimal::from(220) && payload.user_id().is_none())
            .times(1)
            .returning(|_| Ok(receipt("o1")));

        let mut orchestrator = fixture.orchestrator(api);

        let state = orchestrator
            .place_order(&mut fixture.cart, Shopper::Guest, &request(Recipient::Guest(guest())))
            .await?;

        let CheckoutState::Succeeded(confirmation) = state else {
            return Err(format!("expected Succeeded, got {state:?}").into());
        };

        assert_eq!(confirmation.total, Decimal::from(220));
        assert_eq!(fixture.cart.total_items(), 0);
        assert_eq!(fixture.storage.get(CART_STORAGE_KEY)?, None);

        let archived = fixture.archive.load_all();

        assert_eq!(archived.len(), 1);
        assert_eq!(archived.first().map(|r| r.order_id.as_str()), Some("o1"));
        assert_eq!(
            archived.first().and_then(|r| r.items.first()).map(|l| l.display_name.as_str()),
            Some("Basmati Rice")
        );
        assert!(fixture.storage.get(GUEST_ORDERS_STORAGE_KEY)?.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn storage_failure_does_not_fail_a_placed_order() -> TestResult {
        let storage: Arc<dyn KeyValueStore> = Arc::new(ReadOnlyStorage);
        let mut cart = CartStore::load(storage.clone());
        let mut api = MockStorefrontApi::new();

        let added = cart.add_item(CartLineItem::new("p1", "v1", Decimal::from(100), 2));
        assert!(added.is_err(), "expected write failure, got {added:?}");

        api.expect_create_guest_order()
            .times(1)
            .returning(|_| Ok(receipt("o9")));

        let mut orchestrator =
            CheckoutOrchestrator::new(Arc::new(api), GuestOrderArchive::new(storage), vec![cod()]);

        let state = orchestrator
            .place_order(&mut cart, Shopper::Guest, &request(Recipient::Guest(guest())))
            .await?;

        assert!(
            matches!(state, CheckoutState::Succeeded(_)),
            "expected Succeeded, got {state:?}"
        );
        assert!(cart.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn invalid_request_fails_before_any_request() -> TestResult {
        let mut fixture = Fixture::new()?;
        let mut orchestrator = fixture.orchestrator(MockStorefrontApi::new());

        let mut request = request(Recipient::Guest(guest()));
        request.delivery_zone = None;
        request.payment_method = None;

        let state = orchestrator
            .place_order(&mut fixture.cart, Shopper::Guest, &request)
            .await?;

        assert_eq!(
            *state,
            CheckoutState::Failed(CheckoutFailure::Invalid(CheckoutError::MissingDeliveryZone))
        );
        assert_eq!(fixture.cart.total_items(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn rejected_order_keeps_cart_and_shows_server_message() -> TestResult {
        let mut fixture = Fixture::new()?;
        let mut api = MockStorefrontApi::new();

        api.expect_create_guest_order().returning(|_| {
            Err(ApiError::Rejected {
                message: Some("Delivery zone is closed".to_string()),
            })
        });

        let mut orchestrator = fixture.orchestrator(api);

        let state = orchestrator
            .place_order(&mut fixture.cart, Shopper::Guest, &request(Recipient::Guest(guest())))
            .await?;

        let CheckoutState::Failed(failure) = state else {
            return Err(format!("expected Failed, got {state:?}").into());
        };

        assert_eq!(failure.message(), "Delivery zone is closed");
        assert_eq!(fixture.cart.total_items(), 2);
        assert!(fixture.archive.load_all().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn transport_failure_uses_generic_message() -> TestResult {
        let mut fixture = Fixture::new()?;
        let mut api = MockStorefrontApi::new();

        api.expect_create_guest_order()
            .returning(|_| Err(ApiError::UnexpectedResponse("status 500".to_string())));

        let mut orchestrator = fixture.orchestrator(api);

        let state = orchestrator
            .place_order(&mut fixture.cart, Shopper::Guest, &request(Recipient::Guest(guest())))
            .await?;

        assert_eq!(
            *state,
            CheckoutState::Failed(CheckoutFailure::Submission {
                message: ORDER_FALLBACK.to_string()
            })
        );

        Ok(())
    }

    #[tokio::test]
    async fn member_order_finalizes_remote_cart_then_clears_local() -> TestResult {
        let mut fixture = Fixture::new()?;
        let mut api = MockStorefrontApi::new();

        api.expect_create_order()
            .withf(|session, payload| {
                session.user_id.as_str() == "u1"
                    && payload.user_id().map(UserId::as_str) == Some("u1")
                    && payload.address_id() == Some(&AddressId::new("a1"))
            })
            .times(1)
            .returning(|_, _| Ok(receipt("o2")));
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
            .withf(|_, update| update.id.as_str() == "r1" && update.is_purchased == Some(true))
            .times(1)
            .returning(|_, _| Ok(()));

        let api = Arc::new(api);
        let remote = member_remote(&api);
        let mut orchestrator =
            CheckoutOrchestrator::new(api.clone(), fixture.archive.clone(), vec![cod()]);

        let request = request(Recipient::Account {
            address_id: Some(AddressId::new("a1")),
        });

        let state = orchestrator
            .place_order(&mut fixture.cart, Shopper::Member(&remote), &request)
            .await?;

        assert!(
            matches!(state, CheckoutState::Succeeded(_)),
            "expected Succeeded, got {state:?}"
        );
        assert!(fixture.cart.is_empty());
        assert!(fixture.archive.load_all().is_empty(), "member orders are not archived");

        Ok(())
    }

    #[tokio::test]
    async fn member_without_address_is_invalid() -> TestResult {
        let mut fixture = Fixture::new()?;
        let api = Arc::new(MockStorefrontApi::new());
        let remote = member_remote(&api);
        let mut orchestrator =
            CheckoutOrchestrator::new(api.clone(), fixture.archive.clone(), Vec::new());

        let state = orchestrator
            .place_order(
                &mut fixture.cart,
                Shopper::Member(&remote),
                &request(Recipient::Account { address_id: None }),
            )
            .await?;

        assert_eq!(
            *state,
            CheckoutState::Failed(CheckoutFailure::Invalid(CheckoutError::MissingAddress))
        );

        Ok(())
    }

    #[tokio::test]
    async fn guest_can_upgrade_to_account_mid_checkout() -> TestResult {
        let mut fixture = Fixture::new()?;
        let mut api = MockStorefrontApi::new();

        api.expect_send_mobile_otp()
            .withf(|phone| phone == "01712345678")
            .times(1)
            .returning(|_| {
                Ok(OtpTicket {
                    verification_token: "vt-1".to_string(),
                })
            });
        api.expect_verify_mobile_otp()
            .withf(|phone, otp, ticket| {
                phone == "01712345678" && otp == "123456" && ticket.verification_token == "vt-1"
            })
            .times(1)
            .returning(|_, _, _| Ok(Session::new("u9", "fresh-token")));
        api.expect_create_address()
            .withf(|session, address| {
                session.user_id.as_str() == "u9"
                    && address.user_id.as_str() == "u9"
                    && address.city == "Dhaka"
            })
            .times(1)
            .returning(|_, address| {
                Ok(Address {
                    id: AddressId::new("a9"),
                    user_id: address.user_id.clone(),
                    full_name: address.full_name.clone(),
                    phone_number: address.phone_number.clone(),
                    address_line: address.address_line.clone(),
                    city: address.city.clone(),
                    area: None,
                    postal_code: None,
                })
            });
        api.expect_create_order()
            .withf(|session, payload| {
                session.access_token == "fresh-token"
                    && payload.address_id() == Some(&AddressId::new("a9"))
                    && payload.full_name().is_none()
            })
            .times(1)
            .returning(|_, _| Ok(receipt("o3")));
        api.expect_get_cart().returning(|_| Ok(Vec::new()));

        let mut orchestrator = fixture.orchestrator(api);
        let details = GuestDetails {
            create_account: true,
            ..guest()
        };

        let state = orchestrator
            .place_order(&mut fixture.cart, Shopper::Guest, &request(Recipient::Guest(details)))
            .await?;

        assert_eq!(
            *state,
            CheckoutState::AwaitingOtp {
                phone_number: "01712345678".to_string()
            }
        );
        assert_eq!(fixture.cart.total_items(), 2);

        let state = orchestrator.confirm_otp(&mut fixture.cart, " 123456 ").await?;

        assert!(
            matches!(state, CheckoutState::Succeeded(_)),
            "expected Succeeded, got {state:?}"
        );
        assert_eq!(
            orchestrator.upgraded_session().map(|s| s.user_id.as_str()),
            Some("u9")
        );
        assert!(fixture.cart.is_empty());
        assert!(fixture.archive.load_all().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn otp_dispatch_failure_fails_the_attempt() -> TestResult {
        let mut fixture = Fixture::new()?;
        let mut api = MockStorefrontApi::new();

        api.expect_send_mobile_otp()
            .returning(|_| Err(ApiError::Rejected { message: None }));

        let mut orchestrator = fixture.orchestrator(api);
        let details = GuestDetails {
            create_account: true,
            ..guest()
        };

        let state = orchestrator
            .place_order(&mut fixture.cart, Shopper::Guest, &request(Recipient::Guest(details)))
            .await?;

        assert_eq!(
            *state,
            CheckoutState::Failed(CheckoutFailure::Submission {
                message: OTP_SEND_FALLBACK.to_string()
            })
        );
        assert_eq!(fixture.cart.total_items(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn wrong_otp_fails_without_creating_an_address() -> TestResult {
        let mut fixture = Fixture::new()?;
        let mut api = MockStorefrontApi::new();

        api.expect_send_mobile_otp().returning(|_| {
            Ok(OtpTicket {
                verification_token: "vt-1".to_string(),
            })
        });
        api.expect_verify_mobile_otp().returning(|_, _, _| {
            Err(ApiError::Rejected {
                message: Some("Invalid OTP".to_string()),
            })
        });

        let mut orchestrator = fixture.orchestrator(api);
        let details = GuestDetails {
            create_account: true,
            ..guest()
        };

        orchestrator
            .place_order(&mut fixture.cart, Shopper::Guest, &request(Recipient::Guest(details)))
            .await?;

        let state = orchestrator.confirm_otp(&mut fixture.cart, "000000").await?;

        assert_eq!(
            *state,
            CheckoutState::Failed(CheckoutFailure::Submission {
                message: "Invalid OTP".to_string()
            })
        );
        assert!(orchestrator.upgraded_session().is_none());
        assert_eq!(fixture.cart.total_items(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn transitions_are_checked() -> TestResult {
        let mut fixture = Fixture::new()?;
        let mut api = MockStorefrontApi::new();

        api.expect_send_mobile_otp().returning(|_| {
            Ok(OtpTicket {
                verification_token: "vt-1".to_string(),
            })
        });

        let mut orchestrator = fixture.orchestrator(api);

        let result = orchestrator.confirm_otp(&mut fixture.cart, "123456").await;
        assert_eq!(result.err(), Some(TransitionError::NotAwaitingOtp));

        let details = GuestDetails {
            create_account: true,
            ..guest()
        };
        let request = request(Recipient::Guest(details));

        orchestrator
            .place_order(&mut fixture.cart, Shopper::Guest, &request)
            .await?;

        let result = orchestrator
            .place_order(&mut fixture.cart, Shopper::Guest, &request)
            .await;
        assert_eq!(result.err(), Some(TransitionError::InProgress));

        orchestrator.cancel();

        assert_eq!(*orchestrator.state(), CheckoutState::Idle);

        Ok(())
    }

    #[tokio::test]
    async fn failed_attempt_can_be_retried() -> TestResult {
        let mut fixture = Fixture::new()?;
        let mut api = MockStorefrontApi::new();
        let mut outcomes = vec![Ok(receipt("o4")), Err(ApiError::Rejected { message: None })];

        api.expect_create_guest_order()
            .times(2)
            .returning(move |_| outcomes.pop().unwrap_or_else(|| Ok(receipt("unexpected"))));

        let mut orchestrator = fixture.orchestrator(api);
        let request = request(Recipient::Guest(guest()));

        let first = orchestrator
            .place_order(&mut fixture.cart, Shopper::Guest, &request)
            .await?;
        assert!(matches!(first, CheckoutState::Failed(_)), "got {first:?}");

        let second = orchestrator
            .place_order(&mut fixture.cart, Shopper::Guest, &request)
            .await?;
        assert!(matches!(second, CheckoutState::Succeeded(_)), "got {second:?}");

        Ok(())
    }
}
