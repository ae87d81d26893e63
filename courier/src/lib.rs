//! # courier - In-Process Publish/Subscribe Bus
//!
//! `courier` binds event types to handler methods on registered listener
//! instances and delivers posted events under one of three lanes:
//!
//! - **Immediate**: on the posting thread, before `post` returns
//! - **Main**: on the host's single-threaded context
//! - **Background**: on a dedicated worker per named queue, FIFO within the queue
//!
//! Producers replay their current value to handlers as they join.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use courier::{Bus, Message, listener};
//! use std::sync::Arc;
//!
//! #[derive(Message, Clone)]
//! struct Temperature(f32);
//!
//! struct Thermostat;
//!
//! #[listener]
//! impl Thermostat {
//!     #[subscribe(background, queue = "hvac")]
//!     fn on_temperature(&self, t: &Temperature) { /* ... */ }
//! }
//!
//! let bus = Bus::new();
//! let thermostat = Arc::new(Thermostat);
//! bus.register(&thermostat)?;
//! bus.post(Temperature(21.5))?;
//! ```

#![deny(clippy::pub_use, clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use courier_core::{
    // Typing
    AnyEvent,
    AnyListener,
    // Declarations
    Bindings,
    // Errors
    BoxError,
    BusError,
    // Lanes
    DispatchMode,
    EventType,
    Fault,
    FaultCause,
    FaultHook,
    HandlerSpec,
    IntoOutcome,
    Invocation,
    Lineage,
    Listener,
    // Host context
    MainExecutor,
    Message,
    ProducerSpec,
    Production,
    QueueName,
    SharedEvent,
    Task,
    TypeMismatch,
};

pub use courier_std::{
    Bus, BusBuilder, DEFAULT_WORKER_NAME_PREFIX, LoggingFaultHook, MainLoop, MainLoopHandle,
};

/// Standard fault hooks.
pub mod hooks {
    #![allow(clippy::wildcard_imports)]
    pub use courier_std::hooks::*;
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use courier_std::testing::*;
}

/// Prelude module - common imports for Courier.
///
/// # Usage
///
/// ```rust,ignore
/// use courier::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Bindings, Bus, BusError, DispatchMode, Fault, FaultHook, Lineage, Listener, MainExecutor,
        MainLoop, Message, QueueName,
    };

    #[cfg(feature = "macros")]
    pub use crate::listener;
}

#[cfg(feature = "macros")]
pub use courier_macros::{Message, listener};
