//! Optional-field model
//!
//! Every mutable scalar on an entity is stored as `Option<Optional<T>>`:
//!
//! - `None`: the message does not touch the field
//! - `Some(Optional { value, deleted: false })`: set the field to `value`
//! - `Some(Optional { deleted: true, .. })`: the field was explicitly cleared
//!
//! Only construction and read access are exposed. The merge engine is the
//! sole consumer of the presence and tombstone state.

use serde::{Deserialize, Serialize};

/// A scalar field that is present in a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Optional<T> {
    #[serde(default)]
    value: T,
    #[serde(default)]
    deleted: bool,
}

impl<T> Optional<T> {
    /// Present with a value.
    pub fn new(value: T) -> Self {
        Self {
            value,
            deleted: false,
        }
    }

    /// Present with an explicit tombstone flag.
    pub fn with_deleted(value: T, deleted: bool) -> Self {
        Self { value, deleted }
    }

    /// The carried value. Meaningless when the field is tombstoned.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Whether the field was explicitly cleared.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// The value, unless the field was cleared.
    pub fn live(&self) -> Option<&T> {
        if self.deleted {
            None
        } else {
            Some(&self.value)
        }
    }
}

impl<T: Default> Optional<T> {
    /// Present and cleared.
    pub fn deleted() -> Self {
        Self {
            value: T::default(),
            deleted: true,
        }
    }
}

impl<T> From<T> for Optional<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

/// Shorthand for a present, live field.
pub fn set<T>(value: impl Into<T>) -> Option<Optional<T>> {
    Some(Optional::new(value.into()))
}

/// Read the live value of a possibly absent field.
pub fn live<T>(field: &Option<Optional<T>>) -> Option<&T> {
    field.as_ref().and_then(Optional::live)
}
