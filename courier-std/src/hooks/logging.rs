//! Logging hook for fault observation.

use courier_core::{Fault, FaultHook};

/// A fault hook that logs every fault through `tracing`.
///
/// This is the hook a bus uses unless another one is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingFaultHook;

impl FaultHook for LoggingFaultHook {
    fn on_fault(&self, fault: &Fault) {
        tracing::error!(
            listener = fault.listener(),
            event = %fault.event_type(),
            mode = %fault.mode(),
            cause = %fault.cause(),
            "delivery failed"
        );
    }
}
