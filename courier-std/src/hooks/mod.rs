//! Standard fault hooks.

pub mod logging;

pub use logging::LoggingFaultHook;
