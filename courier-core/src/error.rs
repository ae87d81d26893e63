//! Error types for Courier.
//!
//! - [`BusError`] - Errors surfaced to callers of `register`, `unregister` and `post`
//! - [`Fault`] - A handler failure caught on a queue worker or the main lane
//! - [`FaultHook`] - Receives every caught [`Fault`]

use crate::{
    message::{EventType, SharedEvent},
    mode::{DispatchMode, QueueName},
};
use std::{any::Any, fmt};
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by bus operations.
///
/// All variants except [`BusError::HandlerFault`] are usage errors: they are
/// detected before anything is delivered and are never swallowed.
#[derive(Error, Debug)]
pub enum BusError {
    /// A `None` listener or event was passed in.
    #[error("null {0} passed to the bus")]
    NullArgument(&'static str),

    /// The listener instance is already registered.
    #[error("listener `{listener}` is already registered")]
    AlreadyRegistered {
        /// Listener type name.
        listener: &'static str,
    },

    /// The listener instance is not registered.
    #[error("listener `{listener}` is not registered")]
    NotRegistered {
        /// Listener type name.
        listener: &'static str,
    },

    /// Another instance already produces this event type.
    #[error("event `{event}` already has a producer bound by `{owner}`")]
    DuplicateProducer {
        /// The produced event type.
        event: EventType,
        /// Type name of the listener owning the existing producer.
        owner: &'static str,
    },

    /// An immediate-mode handler failed.
    #[error("handler fault while delivering `{event}`")]
    HandlerFault {
        /// The delivered event type.
        event: EventType,
        /// The handler's error.
        #[source]
        source: BoxError,
    },

    /// A main-lane handler was declared on a bus without a main executor.
    #[error("listener `{listener}` declares main-lane handlers but the bus has no main executor")]
    MainLaneUnavailable {
        /// Listener type name.
        listener: &'static str,
    },

    /// The worker thread for a background queue could not be started.
    #[error("failed to spawn worker for queue `{queue}`")]
    WorkerSpawn {
        /// The queue that needed a worker.
        queue: QueueName,
        /// The spawn error.
        #[source]
        source: std::io::Error,
    },
}

/// A binding was invoked with a value of the wrong runtime type.
#[derive(Error, Debug, Clone, Copy)]
#[error("binding expected a value of type `{expected}`")]
pub struct TypeMismatch {
    /// The type the binding was declared for.
    pub expected: &'static str,
}

/// Why a delivery failed.
#[derive(Error, Debug)]
pub enum FaultCause {
    /// The handler returned an error.
    #[error("handler returned an error: {0}")]
    Error(#[source] BoxError),

    /// The handler panicked.
    #[error("handler panicked: {0}")]
    Panic(String),
}

impl FaultCause {
    /// Build a cause from a caught panic payload.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panic(message)
    }
}

/// A handler failure caught outside the posting thread.
pub struct Fault {
    event_type: EventType,
    mode: DispatchMode,
    listener: &'static str,
    event: SharedEvent,
    cause: FaultCause,
}

impl Fault {
    /// Create a fault record.
    pub fn new(
        event_type: EventType,
        mode: DispatchMode,
        listener: &'static str,
        event: SharedEvent,
        cause: FaultCause,
    ) -> Self {
        Self {
            event_type,
            mode,
            listener,
            event,
            cause,
        }
    }

    /// The event type the failing handler was bound to.
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// The lane the delivery ran on.
    pub fn mode(&self) -> &DispatchMode {
        &self.mode
    }

    /// Type name of the listener owning the handler.
    pub fn listener(&self) -> &'static str {
        self.listener
    }

    /// The delivered event, if it is a `T`.
    pub fn event<T: Any>(&self) -> Option<&T> {
        (*self.event).downcast_ref::<T>()
    }

    /// What went wrong.
    pub fn cause(&self) -> &FaultCause {
        &self.cause
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fault")
            .field("event_type", &self.event_type)
            .field("mode", &self.mode)
            .field("listener", &self.listener)
            .field("cause", &self.cause)
            .finish()
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "`{}` failed on `{}` ({}): {}",
            self.listener, self.event_type, self.mode, self.cause
        )
    }
}

/// Receives faults caught by queue workers and the main lane.
///
/// The return value is ignored and the worker keeps running.
pub trait FaultHook: Send + Sync + 'static {
    /// Called once per failed delivery.
    fn on_fault(&self, fault: &Fault);
}

impl<F> FaultHook for F
where
    F: Fn(&Fault) + Send + Sync + 'static,
{
    fn on_fault(&self, fault: &Fault) {
        (self)(fault)
    }
}
