//! Racing jurisdiction derived from the racecourse

use types::event::{Event, RaceData};
use types::optional::{live, set};

use super::{Transform, TransformError};

const STATE_BY_RACECOURSE: &[(&str, &str)] = &[
    ("flemington", "VIC"),
    ("caulfield", "VIC"),
    ("moonee_valley", "VIC"),
    ("royal_randwick", "NSW"),
    ("rosehill_gardens", "NSW"),
    ("canterbury_park", "NSW"),
    ("eagle_farm", "QLD"),
    ("doomben", "QLD"),
    ("gold_coast", "QLD"),
    ("morphettville", "SA"),
    ("cheltenham", "SA"),
    ("victoria_park", "SA"),
    ("ascot", "WA"),
    ("belmont_park", "WA"),
    ("bunbury", "WA"),
    ("hobart", "TAS"),
    ("devonport", "TAS"),
    ("launceston", "TAS"),
    ("canberra", "ACT"),
    ("darwin", "NT"),
    ("alice_springs", "NT"),
];

fn state_for(racecourse: &str) -> Option<&'static str> {
    STATE_BY_RACECOURSE
        .iter()
        .find(|(course, _)| *course == racecourse)
        .map(|(_, state)| *state)
}

/// Fills `race_data.state` when an update sets the racecourse and the
/// record has no state yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct RaceTransform;

impl Transform for RaceTransform {
    fn name(&self) -> &'static str {
        "RaceTransform"
    }

    fn transform(&self, partial: &Event, full: &Event) -> Result<Option<Event>, TransformError> {
        if partial.racecourse().is_none() || full.race_state().is_some() {
            return Ok(None);
        }

        let racecourse = full.race_data.as_ref().and_then(|r| live(&r.racecourse));
        let Some(state) = racecourse.and_then(|course| state_for(course)) else {
            return Ok(None);
        };

        Ok(Some(Event {
            race_data: Some(RaceData {
                state: set(state),
                ..RaceData::default()
            }),
            ..Event::new(partial.id.clone())
        }))
    }
}
