//! In-memory event capture.
//!
//! A [`CaptureLayer`] records every `tracing` event it sees, so tests can
//! assert on what a request logged without parsing stdout.
//!
//! # Example
//!
//! ```
//! use herald_telemetry::capture;
//! use tracing::Level;
//!
//! let (subscriber, events) = capture::subscriber();
//! tracing::subscriber::with_default(subscriber, || {
//!     tracing::error!(request_id = "abc", "Request failed");
//! });
//!
//! assert_eq!(events.count_at(Level::ERROR), 1);
//! assert_eq!(events.all()[0].field("request_id"), Some("abc"));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedEvent {
    /// Event level.
    pub level: Level,
    /// Event target (module path by default).
    pub target: String,
    /// The formatted `message` field.
    pub message: String,
    /// Every other field, formatted.
    pub fields: BTreeMap<String, String>,
}

impl CapturedEvent {
    /// Returns a field's formatted value.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Shared handle to the events a [`CaptureLayer`] recorded.
#[derive(Debug, Clone, Default)]
pub struct CapturedEvents {
    inner: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CapturedEvents {
    fn lock(&self) -> MutexGuard<'_, Vec<CapturedEvent>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a snapshot of all recorded events.
    #[must_use]
    pub fn all(&self) -> Vec<CapturedEvent> {
        self.lock().clone()
    }

    /// Returns the recorded events at exactly `level`.
    #[must_use]
    pub fn at(&self, level: Level) -> Vec<CapturedEvent> {
        self.lock()
            .iter()
            .filter(|event| event.level == level)
            .cloned()
            .collect()
    }

    /// Counts the recorded events at exactly `level`.
    #[must_use]
    pub fn count_at(&self, level: Level) -> usize {
        self.lock().iter().filter(|event| event.level == level).count()
    }

    /// Discards everything recorded so far.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn push(&self, event: CapturedEvent) {
        self.lock().push(event);
    }
}

/// A layer that records events into a [`CapturedEvents`] handle.
#[derive(Debug, Clone, Default)]
pub struct CaptureLayer {
    events: CapturedEvents,
}

impl CaptureLayer {
    /// Creates a layer and the handle its events can be read from.
    #[must_use]
    pub fn new() -> (Self, CapturedEvents) {
        let events = CapturedEvents::default();
        (
            Self {
                events: events.clone(),
            },
            events,
        )
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldCollector::default();
        event.record(&mut visitor);

        let metadata = event.metadata();
        self.events.push(CapturedEvent {
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

/// Builds a subscriber that only captures, for use with
/// `tracing::subscriber::set_default` or `with_default`.
#[must_use]
pub fn subscriber() -> (impl Subscriber + Send + Sync, CapturedEvents) {
    let (layer, events) = CaptureLayer::new();
    (tracing_subscriber::registry().with(layer), events)
}

#[derive(Default)]
struct FieldCollector {
    message: String,
    fields: BTreeMap<String, String>,
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields
                .insert(field.name().to_string(), value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields
                .insert(field.name().to_string(), format!("{value:?}"));
        }
    }
}
