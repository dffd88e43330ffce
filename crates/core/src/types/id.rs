//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types.
//!
//! Records are keyed by strings in the data file, so every ID wraps a
//! `String`. Each entity has its own generation scheme:
//!
//! | Entity   | Format                               |
//! |----------|--------------------------------------|
//! | User     | 32 hex chars                         |
//! | Customer | 32 hex chars                         |
//! | Product  | `P` + 12 upper-case hex chars        |
//! | Order    | `ORD` + unix millis + 4 hex chars    |
//! | Inquiry  | `INQ` + unix millis + 4 hex chars    |

use chrono::Utc;
use uuid::Uuid;

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`
/// - `From<String>`, `From<&str>` and `Into<String>` implementations
///
/// # Example
///
/// ```rust
/// # use leafspring_crm_core::define_id;
/// define_id!(WidgetId);
/// define_id!(GadgetId);
///
/// let widget_id = WidgetId::new("w1");
/// let gadget_id = GadgetId::new("w1");
///
/// // These are different types, so this won't compile:
/// // let _: WidgetId = gadget_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Define standard entity IDs
define_id!(UserId);
define_id!(CustomerId);
define_id!(ProductId);
define_id!(OrderId);
define_id!(InquiryId);

/// Random 32-character lower-case hex string.
fn random_hex() -> String {
    Uuid::new_v4().simple().to_string()
}

/// `<prefix><unix millis><4 upper-case hex chars>`.
///
/// The random tail keeps two records created in the same millisecond apart.
fn timestamped(prefix: &str) -> String {
    let tail = random_hex();
    format!(
        "{prefix}{}{}",
        Utc::now().timestamp_millis(),
        tail.get(..4).unwrap_or_default().to_uppercase()
    )
}

impl UserId {
    /// Generate a fresh user ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(random_hex())
    }
}

impl CustomerId {
    /// Generate a fresh customer ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(random_hex())
    }
}

impl ProductId {
    /// Generate a fresh product ID (`P` followed by 12 upper-case hex chars).
    #[must_use]
    pub fn generate() -> Self {
        let hex = random_hex();
        Self(format!("P{}", hex.get(..12).unwrap_or_default().to_uppercase()))
    }
}

impl OrderId {
    /// Generate a fresh order ID (`ORD` + unix millis + random tail).
    #[must_use]
    pub fn generate() -> Self {
        Self(timestamped("ORD"))
    }
}

impl InquiryId {
    /// Generate a fresh inquiry ID (`INQ` + unix millis + random tail).
    #[must_use]
    pub fn generate() -> Self {
        Self(timestamped("INQ"))
    }
}
