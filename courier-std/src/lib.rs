//! # courier-std
//!
//! The dispatch engine behind the Courier publish/subscribe bus.
//!
//! This crate provides:
//! - **Registry**: handler and producer binding tables with fail-fast checks
//! - **Dispatch**: [`Bus::post`] resolves bindings and routes one delivery per handler
//! - **Queues**: one dedicated worker thread per named background queue
//! - **Host context**: [`MainLoop`] for hosts without an event loop of their own
//! - **Fault hooks**: [`LoggingFaultHook`]
//! - **Testing**: [`testing::Recorder`], [`testing::Latch`], [`testing::CollectingFaultHook`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core contracts
pub use courier_core;

// Modules
mod bindings;
mod builder;
mod bus;
pub mod hooks;
mod main_loop;
mod queue;
mod registry;
pub mod testing;

pub use builder::{BusBuilder, DEFAULT_WORKER_NAME_PREFIX};
pub use bus::Bus;
pub use hooks::LoggingFaultHook;
pub use main_loop::{MainLoop, MainLoopHandle};
