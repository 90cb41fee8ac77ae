//! Identifier types for event entities
//!
//! Identifiers are caller-supplied strings. They are never merged: the
//! incoming side of a merge carries the identifier verbatim. Ordering is
//! plain lexical byte order, which is the canonical order of every
//! repeated collection.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an identifier from any string-like value
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the identifier string
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the identifier is the empty string
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifier of the root event record
    ///
    /// Also the storage key and the pagination cursor for search.
    EventId
);

string_id!(
    /// Identifier of a market, unique within its event
    MarketId
);

string_id!(
    /// Identifier of a selection, unique within its market
    SelectionId
);

/// Entities that live in an ID-keyed repeated collection.
pub trait Keyed {
    /// The key the collection is ordered and joined by.
    fn key(&self) -> &str;
}
