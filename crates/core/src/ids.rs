//! Typed Identifiers
//!
//! The backend hands out opaque string identifiers. [`TypedId`] keeps them
//! apart at compile time so a variant id can never be passed where a product
//! id is expected.

use std::{
    borrow::Borrow,
    cmp::Ordering,
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    hash::{Hash, Hasher},
    marker::PhantomData,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Opaque string identifier tagged with the entity it refers to.
pub struct TypedId<T>(String, PhantomData<fn() -> T>);

impl<T> TypedId<T> {
    /// Wrap a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into(), PhantomData)
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Unwrap into the raw identifier.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl<T> Clone for TypedId<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone(), PhantomData)
    }
}

impl<T> Debug for TypedId<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Debug::fmt(&self.0, f)
    }
}

impl<T> Display for TypedId<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

impl<T> PartialEq for TypedId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for TypedId<T> {}

impl<T> Hash for TypedId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T> PartialOrd for TypedId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for TypedId<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T> Borrow<str> for TypedId<T> {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl<T> From<&str> for TypedId<T> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<T> From<String> for TypedId<T> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl<T> Serialize for TypedId<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de, T> Deserialize<'de> for TypedId<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

macro_rules! typed_ids {
    ($($(#[$meta:meta])* $alias:ident => $marker:ident;)*) => {
        $(
            #[doc = concat!("Marker for [`", stringify!($alias), "`].")]
            #[derive(Debug)]
            pub enum $marker {}

            $(#[$meta])*
            pub type $alias = TypedId<$marker>;
        )*
    };
}

typed_ids! {
    /// Product identifier.
    ProductId => ProductMarker;
    /// Product variant identifier (pack size, flavour, ...).
    VariantId => VariantMarker;
    /// Remote cart row identifier.
    CartRowId => CartRowMarker;
    /// Authenticated user identifier.
    UserId => UserMarker;
    /// Saved delivery address identifier.
    AddressId => AddressMarker;
    /// Delivery zone identifier.
    DeliveryZoneId => DeliveryZoneMarker;
    /// Payment method identifier.
    PaymentMethodId => PaymentMethodMarker;
    /// Placed order identifier.
    OrderId => OrderMarker;
    /// Coupon identifier.
    CouponId => CouponMarker;
}
