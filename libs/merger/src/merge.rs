//! Right-biased structural merge
//!
//! Values on the left are overwritten with values from the right where
//! they exist, recursively. Inputs are never mutated; every merge of two
//! present values builds a new one.
//!
//! Rules:
//! - Scalar field: a present right `Optional` replaces the left one
//!   wholesale (value and tombstone together). An absent right keeps the
//!   left, including its absence.
//! - Entity: if either side is absent the other is returned as is.
//!   Otherwise the identifier is copied from the right and every field is
//!   merged recursively.
//! - Repeated collection: ID-keyed merge-join, see [`crate::slices`].

use types::event::{Event, Market, RaceData, Selection, SportData};
use types::optional::Optional;

use crate::slices::merge_keyed;

/// Values that can be merged with a second present value of the same type.
pub trait Merge: Clone {
    /// Merge `right` over `self`.
    fn merge_with(&self, right: &Self) -> Self;
}

/// Merge two possibly absent values.
///
/// Returns a copy of the other side when one side is absent and `None`
/// when both are.
pub fn merge<T: Merge>(left: Option<&T>, right: Option<&T>) -> Option<T> {
    match (left, right) {
        (left, None) => left.cloned(),
        (None, Some(right)) => Some(right.clone()),
        (Some(left), Some(right)) => Some(left.merge_with(right)),
    }
}

/// Merge a scalar field.
pub fn merge_field<T: Clone>(
    left: &Option<Optional<T>>,
    right: &Option<Optional<T>>,
) -> Option<Optional<T>> {
    merge(left.as_ref(), right.as_ref())
}

impl<T: Clone> Merge for Optional<T> {
    // whole-field replacement, never component-wise
    fn merge_with(&self, right: &Self) -> Self {
        right.clone()
    }
}

impl Merge for Event {
    fn merge_with(&self, right: &Self) -> Self {
        Event {
            id: right.id.clone(),
            name: merge_field(&self.name, &right.name),
            start_time: merge_field(&self.start_time, &right.start_time),
            betting_status: merge_field(&self.betting_status, &right.betting_status),
            event_type_id: merge_field(&self.event_type_id, &right.event_type_id),
            visibility: merge_field(&self.visibility, &right.visibility),
            markets: merge_keyed(&self.markets, &right.markets),
            sport_data: merge(self.sport_data.as_ref(), right.sport_data.as_ref()),
            race_data: merge(self.race_data.as_ref(), right.race_data.as_ref()),
        }
    }
}

impl Merge for Market {
    fn merge_with(&self, right: &Self) -> Self {
        Market {
            id: right.id.clone(),
            name: merge_field(&self.name, &right.name),
            start_time: merge_field(&self.start_time, &right.start_time),
            betting_status: merge_field(&self.betting_status, &right.betting_status),
            closed_at: merge_field(&self.closed_at, &right.closed_at),
            selections: merge_keyed(&self.selections, &right.selections),
        }
    }
}

impl Merge for Selection {
    fn merge_with(&self, right: &Self) -> Self {
        Selection {
            id: right.id.clone(),
            name: merge_field(&self.name, &right.name),
            betting_status: merge_field(&self.betting_status, &right.betting_status),
            price: merge_field(&self.price, &right.price),
        }
    }
}

impl Merge for SportData {
    fn merge_with(&self, right: &Self) -> Self {
        SportData {
            name: merge_field(&self.name, &right.name),
            league: merge_field(&self.league, &right.league),
            round: merge_field(&self.round, &right.round),
            region: merge_field(&self.region, &right.region),
        }
    }
}

impl Merge for RaceData {
    fn merge_with(&self, right: &Self) -> Self {
        RaceData {
            category: merge_field(&self.category, &right.category),
            distance: merge_field(&self.distance, &right.distance),
            racecourse: merge_field(&self.racecourse, &right.racecourse),
            state: merge_field(&self.state, &right.state),
        }
    }
}

/// Merge two possibly absent events.
pub fn merge_event(left: Option<&Event>, right: Option<&Event>) -> Option<Event> {
    merge(left, right)
}
