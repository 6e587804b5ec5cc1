//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types.

/// Errors that can occur when parsing an ID.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input string is empty or only whitespace.
    #[error("id cannot be empty")]
    Empty,
}

/// Macro to define a type-safe string ID wrapper.
///
/// Identifiers in the cart are assigned by the catalog, so they are opaque
/// strings rather than database integers.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `parse()`, `as_str()`, `into_inner()`
/// - `FromStr`, `Display`, `AsRef<str>` and `Borrow<str>` implementations
///
/// # Example
///
/// ```rust
/// # use go_marketplace_core::define_id;
/// define_id!(SkuId);
/// define_id!(StoreId);
///
/// let sku = SkuId::parse("sku-1").unwrap();
/// let store = StoreId::parse("sku-1").unwrap();
///
/// // These are different types, so this won't compile:
/// // let _: SkuId = store;
/// # let _ = (sku, store);
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
            /// Parse an ID, rejecting empty or whitespace-only input.
            ///
            /// # Errors
            ///
            /// Returns `IdError::Empty` if the input has no non-whitespace
            /// characters.
            pub fn parse(id: impl Into<String>) -> ::core::result::Result<Self, $crate::types::IdError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err($crate::types::IdError::Empty);
                }
                Ok(Self(id))
            }

            /// Get the ID as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }

            /// Whether the ID satisfies the constructor rules.
            ///
            /// Deserialization bypasses `parse`, so decoded IDs are checked
            /// with this before they are trusted.
            #[must_use]
            pub fn is_valid(&self) -> bool {
                !self.0.trim().is_empty()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl ::core::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Catalog product identifier, the key of a cart line.
define_id!(ProductId);
