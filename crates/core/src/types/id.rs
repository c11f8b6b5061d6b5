//! Newtype IDs for Shopify global identifiers.
//!
//! Shopify identifies everything with opaque global IDs such as
//! `gid://shopify/ProductVariant/40011236343972`. The `define_gid!` macro wraps
//! them in distinct types so an ID of one kind can never be used where another
//! is expected.

/// Macro to define a type-safe Shopify global ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>`, `Display` and `AsRef<str>`
///
/// # Example
///
/// ```rust
/// # use fromage_core::define_gid;
/// define_gid!(VariantId);
/// define_gid!(CollectionId);
///
/// let variant = VariantId::new("gid://shopify/ProductVariant/1");
/// let collection = CollectionId::new("gid://shopify/Collection/1");
///
/// // These are different types, so this won't compile:
/// // let _: VariantId = collection;
/// assert_eq!(variant.as_str(), "gid://shopify/ProductVariant/1");
/// ```
#[macro_export]
macro_rules! define_gid {
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
            /// Wrap a raw Shopify ID.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the raw ID string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the raw ID string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
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

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_gid!(VariantId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_plain_string() {
        let id = VariantId::new("gid://shopify/ProductVariant/7");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, r#""gid://shopify/ProductVariant/7""#);
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let a = VariantId::from("gid://shopify/ProductVariant/1");
        let b = VariantId::from("gid://shopify/ProductVariant/2");
        assert!(a < b);
    }
}
