//! # courier-core
//!
//! Core contracts for the Courier publish/subscribe bus.
//!
//! This crate has minimal dependencies and is meant to be imported by code
//! that declares listeners or plugs a host context into a bus without
//! depending on the engine in `courier-std`.
//!
//! # Pieces
//!
//! - [`Message`] / [`EventType`] / [`Lineage`]: what can be posted and how it
//!   is looked up, including broader views of an event
//! - [`Listener`] / [`Bindings`]: a listener's declared handlers and producers
//! - [`DispatchMode`] / [`QueueName`]: the lane each handler runs on
//! - [`MainExecutor`]: the host's single-threaded context
//! - [`FaultHook`] / [`Fault`]: reporting of failures off the posting thread
//!
//! # Error Types
//!
//! - [`BusError`] - Usage errors and immediate-mode handler faults

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod error;
mod executor;
mod listener;
mod message;
mod mode;
mod outcome;

// Re-exports
pub use error::{BoxError, BusError, Fault, FaultCause, FaultHook, TypeMismatch};
pub use executor::{MainExecutor, Task};
pub use listener::{
    AnyEvent, AnyListener, Bindings, HandlerSpec, Invocation, Listener, ProducerSpec, Production,
};
pub use message::{EventType, Lineage, Message, SharedEvent};
pub use mode::{DispatchMode, QueueName};
pub use outcome::IntoOutcome;
