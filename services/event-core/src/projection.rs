//! Customer-facing views of a stored event
//!
//! Absent or cleared fields come out empty. The start time is rendered as
//! RFC 3339 in UTC.

use chrono::{SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use types::event::{Event, Market, RaceData, SportData};
use types::optional::{live, Optional};

/// Sport-specific view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SportEventView {
    pub id: String,
    pub name: String,
    pub start_time: Option<String>,
    pub betting_status: String,
    pub sport_type_id: String,
    pub markets: Vec<Market>,
    pub league: String,
    pub sport_name: String,
    pub round: String,
    pub region: String,
}

/// Racing-specific view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RaceEventView {
    pub id: String,
    pub name: String,
    pub start_time: Option<String>,
    pub betting_status: String,
    pub category: String,
    pub distance: i64,
    pub racecourse: String,
    pub state: String,
    pub markets: Vec<Market>,
}

fn text(field: &Option<Optional<String>>) -> String {
    live(field).cloned().unwrap_or_default()
}

fn start_time(event: &Event) -> Option<String> {
    live(&event.start_time)
        .map(|nanos| Utc.timestamp_nanos(*nanos).to_rfc3339_opts(SecondsFormat::Secs, true))
}

fn betting_status(event: &Event) -> String {
    live(&event.betting_status)
        .copied()
        .unwrap_or_default()
        .label()
        .to_string()
}

impl From<&Event> for SportEventView {
    fn from(event: &Event) -> Self {
        let sport = event.sport_data.clone().unwrap_or_default();
        let SportData {
            name,
            league,
            round,
            region,
        } = &sport;
        Self {
            id: event.id.to_string(),
            name: text(&event.name),
            start_time: start_time(event),
            betting_status: betting_status(event),
            sport_type_id: text(&event.event_type_id),
            markets: event.markets.clone(),
            league: text(league),
            sport_name: text(name),
            round: text(round),
            region: text(region),
        }
    }
}

impl From<&Event> for RaceEventView {
    fn from(event: &Event) -> Self {
        let race = event.race_data.clone().unwrap_or_default();
        let RaceData {
            category,
            distance,
            racecourse,
            state,
        } = &race;
        Self {
            id: event.id.to_string(),
            name: text(&event.name),
            start_time: start_time(event),
            betting_status: betting_status(event),
            category: live(category)
                .copied()
                .unwrap_or_default()
                .label()
                .to_string(),
            distance: live(distance).copied().unwrap_or_default(),
            racecourse: text(racecourse),
            state: text(state),
            markets: event.markets.clone(),
        }
    }
}
