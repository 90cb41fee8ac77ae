//! Derivation passes run after every merge
//!
//! A transform looks at the caller's raw partial update and the record as
//! merged so far, and may return a sparse delta. The pipeline merges each
//! delta into the running record before the next transform runs, so later
//! transforms see earlier derivations.
//!
//! Transforms are best effort: an error or panic is logged with the
//! transform's name and the running record is left as it was.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use merger::{validate_identifiers, Merge};
use thiserror::Error;
use tracing::{debug, error};
use types::event::Event;

pub mod market_close;
pub mod race;
pub mod sport;

pub use market_close::MarketCloseTransform;
pub use race::RaceTransform;
pub use sport::SportTransform;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("derivation failed: {0}")]
    Derivation(String),
}

/// A named derivation over (raw partial, running full record).
pub trait Transform: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` when the transform does not apply or has nothing to add.
    fn transform(&self, partial: &Event, full: &Event) -> Result<Option<Event>, TransformError>;
}

/// Ordered list of transforms.
pub struct TransformPipeline {
    transforms: Vec<Box<dyn Transform>>,
}

impl TransformPipeline {
    pub fn new(transforms: Vec<Box<dyn Transform>>) -> Self {
        Self { transforms }
    }

    /// Sport name, race jurisdiction, then market close stamping.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(SportTransform),
            Box::new(RaceTransform),
            Box::new(MarketCloseTransform::new()),
        ])
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }

    /// Run every transform in order, folding deltas into `running`.
    pub fn run(&self, partial: &Event, mut running: Event) -> Event {
        for transform in &self.transforms {
            let name = transform.name();
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| transform.transform(partial, &running)));

            match outcome {
                Ok(Ok(Some(delta))) => {
                    if let Err(err) = validate_identifiers(&running, &delta) {
                        error!(transform = name, error = %err, "Transform delta rejected");
                        continue;
                    }
                    debug!(transform = name, "Merging transform delta");
                    running = running.merge_with(&delta);
                }
                Ok(Ok(None)) => {}
                Ok(Err(err)) => {
                    error!(transform = name, error = %err, "Failed to run transform");
                }
                Err(payload) => {
                    error!(
                        transform = name,
                        panic = panic_message(&*payload),
                        "Transform panicked"
                    );
                }
            }
        }
        running
    }
}

impl Default for TransformPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::optional::set;

    struct Failing;

    impl Transform for Failing {
        fn name(&self) -> &'static str {
            "Failing"
        }

        fn transform(&self, _: &Event, _: &Event) -> Result<Option<Event>, TransformError> {
            Err(TransformError::Derivation("lookup unavailable".into()))
        }
    }

    struct Panicking;

    impl Transform for Panicking {
        fn name(&self) -> &'static str {
            "Panicking"
        }

        fn transform(&self, _: &Event, _: &Event) -> Result<Option<Event>, TransformError> {
            panic!("derivation bug");
        }
    }

    /// Sets the name, and records whether it saw an earlier delta.
    struct Naming(&'static str);

    impl Transform for Naming {
        fn name(&self) -> &'static str {
            "Naming"
        }

        fn transform(&self, partial: &Event, full: &Event) -> Result<Option<Event>, TransformError> {
            let seen = full
                .name
                .as_ref()
                .map(|n| n.value().clone())
                .unwrap_or_default();
            Ok(Some(Event {
                name: set(format!("{seen}{}", self.0)),
                ..Event::new(partial.id.clone())
            }))
        }
    }

    struct WrongId;

    impl Transform for WrongId {
        fn name(&self) -> &'static str {
            "WrongId"
        }

        fn transform(&self, _: &Event, _: &Event) -> Result<Option<Event>, TransformError> {
            Ok(Some(Event {
                name: set("hijacked"),
                ..Event::new("other")
            }))
        }
    }

    #[test]
    fn test_standard_order() {
        assert_eq!(
            TransformPipeline::standard().names(),
            vec!["SportsTransform", "RaceTransform", "CommonTransform"]
        );
    }

    #[test]
    fn test_later_transforms_see_earlier_deltas() {
        let pipeline = TransformPipeline::new(vec![Box::new(Naming("a")), Box::new(Naming("b"))]);
        let partial = Event::new("E1");
        let out = pipeline.run(&partial, partial.clone());
        assert_eq!(out.name, set("ab"));
    }

    #[test]
    fn test_failures_do_not_stop_pipeline() {
        let pipeline = TransformPipeline::new(vec![
            Box::new(Failing),
            Box::new(Panicking),
            Box::new(Naming("x")),
        ]);
        let partial = Event::new("E1");
        let out = pipeline.run(&partial, partial.clone());
        assert_eq!(out.name, set("x"));
    }

    #[test]
    fn test_delta_for_other_event_is_dropped() {
        let pipeline = TransformPipeline::new(vec![Box::new(WrongId)]);
        let partial = Event::new("E1");
        let out = pipeline.run(&partial, partial.clone());
        assert_eq!(out, Event::new("E1"));
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*payload), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(&*payload), "bang");
    }
}
