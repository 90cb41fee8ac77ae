//! Sport name derived from the event type

use types::event::{Event, SportData};
use types::optional::{live, set};

use super::{Transform, TransformError};

/// Display name for a known event type id.
fn sport_name(event_type_id: &str) -> Option<&'static str> {
    match event_type_id {
        "soccer" => Some("Soccer"),
        "rugby_league" => Some("Rugby League"),
        _ => None,
    }
}

/// Fills `sport_data.name` when an update sets the event type and no name
/// has been recorded yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct SportTransform;

impl Transform for SportTransform {
    fn name(&self) -> &'static str {
        "SportsTransform"
    }

    fn transform(&self, partial: &Event, full: &Event) -> Result<Option<Event>, TransformError> {
        if partial.event_type_id.is_none() || full.sport_name().is_some() {
            return Ok(None);
        }

        let Some(name) = live(&full.event_type_id).and_then(|id| sport_name(id)) else {
            return Ok(None);
        };

        Ok(Some(Event {
            sport_data: Some(SportData {
                name: set(name),
                ..SportData::default()
            }),
            ..Event::new(partial.id.clone())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(id: &str, event_type: &str) -> Event {
        Event {
            event_type_id: set(event_type),
            ..Event::new(id)
        }
    }

    #[test]
    fn test_skips_when_event_type_untouched() {
        let partial = Event::new("evt-1");
        let full = typed("evt-1", "soccer");
        assert_eq!(SportTransform.transform(&partial, &full).unwrap(), None);
    }

    #[test]
    fn test_sets_name_for_known_type() {
        let partial = typed("evt-2", "soccer");
        let out = SportTransform
            .transform(&partial, &partial.clone())
            .unwrap()
            .unwrap();

        assert_eq!(out.id.as_str(), "evt-2");
        assert_eq!(out.sport_name().map(|n| n.value().as_str()), Some("Soccer"));
        assert!(out.name.is_none());
        assert!(out.markets.is_empty());
    }

    #[test]
    fn test_looks_up_merged_type() {
        let partial = typed("evt-3", "rugby_league");
        let out = SportTransform.transform(&partial, &partial).unwrap().unwrap();
        assert_eq!(
            out.sport_name().map(|n| n.value().as_str()),
            Some("Rugby League")
        );
    }

    #[test]
    fn test_skips_when_name_already_set() {
        let partial = typed("evt-4", "soccer");
        let full = Event {
            sport_data: Some(SportData {
                name: set("Football"),
                ..SportData::default()
            }),
            ..typed("evt-4", "soccer")
        };
        assert_eq!(SportTransform.transform(&partial, &full).unwrap(), None);
    }

    #[test]
    fn test_unknown_type_is_a_miss() {
        let partial = typed("evt-5", "curling");
        assert_eq!(SportTransform.transform(&partial, &partial).unwrap(), None);
    }
}
