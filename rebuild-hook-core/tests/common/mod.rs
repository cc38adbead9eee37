#![allow(dead_code)]

use std::fmt::Write as _;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::Context;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{Layer, Registry};

/// One captured tracing event: level plus every field rendered as `name=value`.
#[derive(Debug, Clone)]
pub struct Captured {
    pub level: tracing::Level,
    pub text: String,
}

struct FieldWriter<'a>(&'a mut String);

impl Visit for FieldWriter<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let _ = write!(self.0, "{}={:?} ", field.name(), value);
    }
}

/// Layer that stores every event it sees.
pub struct EventCollector {
    events: Arc<Mutex<Vec<Captured>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut text = String::new();
        event.record(&mut FieldWriter(&mut text));
        self.events.lock().unwrap().push(Captured {
            level: *event.metadata().level(),
            text,
        });
    }
}

/// Installs a collecting subscriber for the current thread.
pub fn collect_events() -> (Arc<Mutex<Vec<Captured>>>, tracing::subscriber::DefaultGuard) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = Registry::default().with(EventCollector {
        events: events.clone(),
    });
    let guard = tracing::subscriber::set_default(subscriber);
    (events, guard)
}
