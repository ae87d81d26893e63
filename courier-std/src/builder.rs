//! Bus configuration.

use crate::{bus::Bus, hooks::LoggingFaultHook, queue::QueueManager};
use courier_core::{FaultHook, MainExecutor};
use std::sync::Arc;

/// Prefix of background worker thread names; the queue's creation index follows.
pub const DEFAULT_WORKER_NAME_PREFIX: &str = "courier-worker-";

/// Builder for constructing a [`Bus`].
///
/// # Example
/// ```ignore
/// let (mut main_loop, handle) = MainLoop::new();
/// let bus = Bus::builder()
///     .worker_name_prefix("app-worker-")
///     .main_executor(handle)
///     .fault_hook(|fault: &Fault| eprintln!("{fault}"))
///     .build();
/// ```
pub struct BusBuilder {
    worker_name_prefix: String,
    worker_stack_size: Option<usize>,
    main: Option<Arc<dyn MainExecutor>>,
    fault_hook: Arc<dyn FaultHook>,
}

impl BusBuilder {
    /// Default settings: no main executor, faults logged through `tracing`.
    pub fn new() -> Self {
        Self {
            worker_name_prefix: DEFAULT_WORKER_NAME_PREFIX.to_string(),
            worker_stack_size: None,
            main: None,
            fault_hook: Arc::new(LoggingFaultHook),
        }
    }

    /// Set the worker thread name prefix.
    pub fn worker_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.worker_name_prefix = prefix.into();
        self
    }

    /// Set the stack size of background worker threads, in bytes.
    ///
    /// Unset, workers get the platform default.
    pub fn worker_stack_size(mut self, size: usize) -> Self {
        self.worker_stack_size = Some(size);
        self
    }

    /// Set the host context used for main-lane handlers.
    pub fn main_executor(mut self, executor: impl MainExecutor) -> Self {
        self.main = Some(Arc::new(executor));
        self
    }

    /// Set the hook receiving faults from workers and the main lane.
    pub fn fault_hook(mut self, hook: impl FaultHook) -> Self {
        self.fault_hook = Arc::new(hook);
        self
    }

    /// Whether a main executor is configured.
    pub fn has_main_executor(&self) -> bool {
        self.main.is_some()
    }

    /// Build the bus.
    pub fn build(self) -> Bus {
        Bus::from_parts(QueueManager::new(
            self.worker_name_prefix,
            self.worker_stack_size,
            self.main,
            self.fault_hook,
        ))
    }
}

impl Default for BusBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::main_loop::MainLoop;

    #[test]
    fn defaults_have_no_main_executor() {
        let builder = BusBuilder::default();
        assert!(!builder.has_main_executor());
        assert_eq!(builder.worker_name_prefix, DEFAULT_WORKER_NAME_PREFIX);
    }

    #[test]
    fn settings_are_applied() {
        let (_main_loop, handle) = MainLoop::new();
        let builder = BusBuilder::new()
            .worker_name_prefix("custom-")
            .main_executor(handle);
        assert!(builder.has_main_executor());
        assert_eq!(builder.worker_name_prefix, "custom-");
        let bus = builder.build();
        assert!(bus.queue_names().is_empty());
    }
}
