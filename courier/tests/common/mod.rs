#![allow(dead_code)]

use courier::{Bindings, DispatchMode, Listener, Message, testing::Recorder};

// ============================================================================
// Test Event Types
// ============================================================================

#[derive(Clone, Debug, PartialEq, Message)]
pub struct Reading {
    pub label: String,
}

impl Reading {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
        }
    }
}

// ============================================================================
// Test Listeners
// ============================================================================

/// Records every `Reading` on the posting thread.
#[derive(Default)]
pub struct Subscriber {
    pub readings: Recorder<Reading>,
}

impl Listener for Subscriber {
    fn declare(bindings: &mut Bindings<Self>) {
        bindings.subscribe(DispatchMode::Immediate, |this: &Self, reading: &Reading| {
            this.readings.record(reading)
        });
    }
}

/// Produces its `last` reading, if any.
pub struct Producer {
    pub last: Option<Reading>,
}

impl Producer {
    pub fn with(label: &str) -> Self {
        Self {
            last: Some(Reading::new(label)),
        }
    }

    pub fn empty() -> Self {
        Self { last: None }
    }
}

impl Listener for Producer {
    fn declare(bindings: &mut Bindings<Self>) {
        bindings.produce(|this: &Self| this.last.clone());
    }
}
