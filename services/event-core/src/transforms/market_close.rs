//! Close timestamp stamping for markets

use std::collections::HashSet;

use chrono::Utc;
use types::event::Event;
use types::optional::set;

use super::{Transform, TransformError};

/// Current time in Unix nanoseconds.
pub type Clock = fn() -> i64;

fn system_clock() -> i64 {
    // Out of range only past the year 2262.
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}

/// Stamps `closed_at` on markets the update closes, once.
///
/// The delta carries the record's whole market collection so the stamps
/// merge in alongside the untouched markets.
#[derive(Debug, Clone, Copy)]
pub struct MarketCloseTransform {
    clock: Clock,
}

impl MarketCloseTransform {
    pub fn new() -> Self {
        Self::with_clock(system_clock)
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self { clock }
    }
}

impl Default for MarketCloseTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for MarketCloseTransform {
    fn name(&self) -> &'static str {
        "CommonTransform"
    }

    fn transform(&self, partial: &Event, full: &Event) -> Result<Option<Event>, TransformError> {
        let closing: HashSet<&str> = partial
            .markets
            .iter()
            .filter(|m| m.is_closing())
            .map(|m| m.id.as_str())
            .collect();
        if closing.is_empty() {
            return Ok(None);
        }

        let closed_at = (self.clock)();
        let mut stamped = 0usize;
        let markets = full
            .markets
            .iter()
            .map(|market| {
                let mut market = market.clone();
                if closing.contains(market.id.as_str()) && market.closed_at.is_none() {
                    market.closed_at = set(closed_at);
                    stamped += 1;
                }
                market
            })
            .collect();

        if stamped == 0 {
            return Ok(None);
        }

        Ok(Some(Event {
            markets,
            ..Event::new(partial.id.clone())
        }))
    }
}
