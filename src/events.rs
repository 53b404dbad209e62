use log::info;
use serde::Serialize;
use serde_json::{json, Value};

/// Side effects of a learner transition, relayed to the host's
/// publish/subscribe facility.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum Event {
    Grade { value: f64, max_value: f64 },
    Completion { completion: f64 },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Grade { .. } => "grade",
            Event::Completion { .. } => "completion",
        }
    }

    /// Event body as the gradebook and completion services expect it.
    pub fn payload(&self) -> Value {
        match self {
            Event::Grade { value, max_value } => json!({"value": value, "max_value": max_value}),
            Event::Completion { completion } => json!({"completion": completion}),
        }
    }
}

/// The host's publish facility. Fire-and-forget.
pub trait Publisher {
    fn publish(&mut self, event: &Event);
}

/// Keeps every published event in order.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    pub events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

impl Publisher for EventLog {
    fn publish(&mut self, event: &Event) {
        self.events.push(event.clone());
    }
}

/// Relays events to the log facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPublisher;

impl Publisher for LogPublisher {
    fn publish(&mut self, event: &Event) {
        info!("publish {} {}", event.name(), event.payload());
    }
}
