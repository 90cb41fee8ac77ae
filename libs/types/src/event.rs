//! Event record types
//!
//! An `Event` strictly contains its markets, and each market its
//! selections. The same types describe a full persisted record, a caller's
//! partial update and a transform's sparse delta; they differ only in which
//! fields are present.

use serde::{Deserialize, Serialize};

use crate::ids::{EventId, Keyed, MarketId, SelectionId};
use crate::optional::Optional;

/// Whether betting is accepted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BettingStatus {
    #[default]
    Unspecified,
    Open,
    Suspended,
    Closed,
}

impl BettingStatus {
    pub fn label(&self) -> &'static str {
        match self {
            BettingStatus::Unspecified => "UNSPECIFIED",
            BettingStatus::Open => "OPEN",
            BettingStatus::Suspended => "SUSPENDED",
            BettingStatus::Closed => "CLOSED",
        }
    }
}

/// Whether the event is shown to customers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    #[default]
    Unspecified,
    Visible,
    Hidden,
}

/// Racing code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RaceCategory {
    #[default]
    Unspecified,
    Thoroughbred,
    Harness,
    Greyhound,
}

impl RaceCategory {
    pub fn label(&self) -> &'static str {
        match self {
            RaceCategory::Unspecified => "UNSPECIFIED",
            RaceCategory::Thoroughbred => "THOROUGHBRED",
            RaceCategory::Harness => "HARNESS",
            RaceCategory::Greyhound => "GREYHOUND",
        }
    }
}

/// Root record.
///
/// Start time is a Unix nanosecond timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    pub id: EventId,
    pub name: Option<Optional<String>>,
    pub start_time: Option<Optional<i64>>,
    pub betting_status: Option<Optional<BettingStatus>>,
    pub event_type_id: Option<Optional<String>>,
    pub visibility: Option<Optional<Visibility>>,
    pub markets: Vec<Market>,
    pub sport_data: Option<SportData>,
    pub race_data: Option<RaceData>,
}

impl Event {
    /// An event carrying only its identifier.
    pub fn new(id: impl Into<EventId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Find a market by identifier.
    pub fn market(&self, id: &str) -> Option<&Market> {
        self.markets.iter().find(|m| m.id.as_str() == id)
    }

    pub fn sport_name(&self) -> Option<&Optional<String>> {
        self.sport_data.as_ref().and_then(|s| s.name.as_ref())
    }

    pub fn racecourse(&self) -> Option<&Optional<String>> {
        self.race_data.as_ref().and_then(|r| r.racecourse.as_ref())
    }

    pub fn race_state(&self) -> Option<&Optional<String>> {
        self.race_data.as_ref().and_then(|r| r.state.as_ref())
    }
}

/// A betting market within an event.
///
/// `closed_at` is stamped (Unix nanos) the first time the market is seen
/// closing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Market {
    pub id: MarketId,
    pub name: Option<Optional<String>>,
    pub start_time: Option<Optional<i64>>,
    pub betting_status: Option<Optional<BettingStatus>>,
    pub closed_at: Option<Optional<i64>>,
    pub selections: Vec<Selection>,
}

impl Market {
    pub fn new(id: impl Into<MarketId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Whether this message sets the market's status to closed.
    pub fn is_closing(&self) -> bool {
        matches!(
            self.betting_status.as_ref().and_then(Optional::live),
            Some(BettingStatus::Closed)
        )
    }
}

impl Keyed for Market {
    fn key(&self) -> &str {
        self.id.as_str()
    }
}

/// A runner or outcome within a market.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selection {
    pub id: SelectionId,
    pub name: Option<Optional<String>>,
    pub betting_status: Option<Optional<BettingStatus>>,
    pub price: Option<Optional<f64>>,
}

impl Selection {
    pub fn new(id: impl Into<SelectionId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

impl Keyed for Selection {
    fn key(&self) -> &str {
        self.id.as_str()
    }
}

/// Sport-specific sub-record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SportData {
    pub name: Option<Optional<String>>,
    pub league: Option<Optional<String>>,
    pub round: Option<Optional<String>>,
    pub region: Option<Optional<String>>,
}

/// Racing-specific sub-record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceData {
    pub category: Option<Optional<RaceCategory>>,
    /// Race distance in metres
    pub distance: Option<Optional<i64>>,
    pub racecourse: Option<Optional<String>>,
    /// Jurisdiction the racecourse belongs to, e.g. "VIC"
    pub state: Option<Optional<String>>,
}
