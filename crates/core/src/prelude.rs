//! Storefront prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    archive::{GuestOrderArchive, GuestOrderRecord},
    cart::CartStore,
    checkout::{
        CheckoutError, CheckoutRequest, GuestDetails, Recipient, TransactionProof,
        ValidRecipient, ValidatedCheckout, validate,
    },
    discounts::{DiscountDescriptor, DiscountError, DiscountKind},
    ids::{
        AddressId, CartRowId, CouponId, DeliveryZoneId, OrderId, PaymentMethodId, ProductId,
        UserId, VariantId,
    },
    items::{CartLineItem, LineKey},
    orders::{OrderPayload, OrderReceipt},
    pricing::{CheckoutTotals, round_money},
    reference::{Address, DeliverySlot, DeliveryZone, NewAddress, PaymentMethod},
    storage::{FileStorage, KeyValueStore, MemoryStorage, StorageError},
};
