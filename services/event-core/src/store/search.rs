//! Search filter and pagination shared by the store backends

use std::collections::BTreeMap;
use std::ops::Bound;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use types::errors::ValidationError;
use types::event::{BettingStatus, Event, Visibility};
use types::ids::EventId;
use types::optional::live;

/// Upper bound on a page, whatever the caller asks for.
pub const MAX_PAGE_SIZE: usize = 5;

/// Criteria an event must meet to be returned. Unset criteria match
/// everything. Dates are inclusive and compared against the start time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilter {
    pub betting_status: Option<BettingStatus>,
    pub visibility: Option<Visibility>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl SearchFilter {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(ValidationError::InvertedDateRange);
            }
        }
        Ok(())
    }

    pub fn matches(&self, event: &Event) -> bool {
        if let Some(status) = self.betting_status {
            if live(&event.betting_status) != Some(&status) {
                return false;
            }
        }

        if let Some(visibility) = self.visibility {
            if live(&event.visibility) != Some(&visibility) {
                return false;
            }
        }

        if self.start_date.is_some() || self.end_date.is_some() {
            let Some(start_time) = live(&event.start_time) else {
                return false;
            };
            let start_time = Utc.timestamp_nanos(*start_time);
            if self.start_date.is_some_and(|from| start_time < from) {
                return false;
            }
            if self.end_date.is_some_and(|to| start_time > to) {
                return false;
            }
        }

        true
    }
}

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub events: Vec<Event>,
    /// Id of the last event on a full page; pass back to continue.
    pub next_page_token: Option<String>,
}

/// Clamp a requested page size: 0 or anything above the cap means the cap.
pub fn effective_page_size(requested: u64) -> usize {
    match usize::try_from(requested) {
        Ok(0) | Err(_) => MAX_PAGE_SIZE,
        Ok(n) => n.min(MAX_PAGE_SIZE),
    }
}

/// Scan an id-ordered map starting after `page_token`.
pub(crate) fn scan_page(
    records: &BTreeMap<EventId, Event>,
    filter: &SearchFilter,
    page_size: u64,
    page_token: Option<&str>,
) -> SearchPage {
    let limit = effective_page_size(page_size);
    let lower = match page_token {
        Some(token) if !token.is_empty() => Bound::Excluded(EventId::new(token)),
        _ => Bound::Unbounded,
    };

    let events: Vec<Event> = records
        .range((lower, Bound::Unbounded))
        .map(|(_, event)| event)
        .filter(|event| filter.matches(event))
        .take(limit)
        .cloned()
        .collect();

    let next_page_token = if !events.is_empty() && events.len() == limit {
        events.last().map(|e| e.id.to_string())
    } else {
        None
    };

    SearchPage {
        events,
        next_page_token,
    }
}
