//! Structural checks on a caller's partial update
//!
//! Markets within an event and selections within a market are keyed by id,
//! so a partial carrying the same id twice is ambiguous and rejected.

use std::collections::HashSet;

use types::errors::ValidationError;
use types::event::Event;

pub fn validate_partial(partial: &Event) -> Result<(), ValidationError> {
    if partial.id.is_empty() {
        return Err(ValidationError::EmptyEventId);
    }

    let mut markets = HashSet::with_capacity(partial.markets.len());
    for market in &partial.markets {
        if market.id.is_empty() {
            return Err(ValidationError::EmptyMarketId {
                event_id: partial.id.to_string(),
            });
        }
        if !markets.insert(market.id.as_str()) {
            return Err(ValidationError::DuplicateMarket {
                event_id: partial.id.to_string(),
                market_id: market.id.to_string(),
            });
        }

        let mut selections = HashSet::with_capacity(market.selections.len());
        for selection in &market.selections {
            if !selections.insert(selection.id.as_str()) {
                return Err(ValidationError::DuplicateSelection {
                    market_id: market.id.to_string(),
                    selection_id: selection.id.to_string(),
                });
            }
        }
    }

    Ok(())
}
