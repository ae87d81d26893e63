//! Testing utilities for Courier.
//!
//! - [`Recorder`]: records delivered events and the thread that delivered them
//! - [`Latch`]: a count-down latch for waiting on background deliveries
//! - [`CollectingFaultHook`]: a fault hook that keeps what it receives

use courier_core::{Fault, FaultHook};
use parking_lot::{Condvar, Mutex};
use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

// ============================================================================
// Recorder
// ============================================================================

/// Records events together with the name of the delivering thread.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = Recorder::<String>::new();
/// let handle = recorder.clone();
///
/// // inside a handler:
/// handle.record(event);
///
/// assert_eq!(recorder.events(), vec!["a".to_string()]);
/// ```
pub struct Recorder<E> {
    entries: Arc<Mutex<Vec<(E, Option<String>)>>>,
}

impl<E: Clone> Recorder<E> {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Record `event` as delivered on the current thread.
    pub fn record(&self, event: &E) {
        let thread = thread::current().name().map(str::to_owned);
        self.entries.lock().push((event.clone(), thread));
    }

    /// Recorded events, in delivery order.
    pub fn events(&self) -> Vec<E> {
        self.entries.lock().iter().map(|(e, _)| e.clone()).collect()
    }

    /// Names of the delivering threads, in delivery order.
    pub fn threads(&self) -> Vec<Option<String>> {
        self.entries.lock().iter().map(|(_, t)| t.clone()).collect()
    }

    /// Number of recorded events.
    pub fn count(&self) -> usize {
        self.entries.lock().len()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl<E: Clone> Default for Recorder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for Recorder<E> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

// ============================================================================
// Latch
// ============================================================================

/// A count-down latch.
#[derive(Clone)]
pub struct Latch {
    state: Arc<(Mutex<usize>, Condvar)>,
}

impl Latch {
    /// A latch released after `count` calls to [`Latch::count_down`].
    pub fn new(count: usize) -> Self {
        Self {
            state: Arc::new((Mutex::new(count), Condvar::new())),
        }
    }

    /// Decrement the count, releasing waiters when it reaches zero.
    pub fn count_down(&self) {
        let (count, released) = &*self.state;
        let mut count = count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            released.notify_all();
        }
    }

    /// Remaining count.
    pub fn count(&self) -> usize {
        *self.state.0.lock()
    }

    /// Wait until the count reaches zero; `false` on timeout.
    pub fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let (count, released) = &*self.state;
        let mut count = count.lock();
        while *count > 0 {
            if released.wait_until(&mut count, deadline).timed_out() {
                return *count == 0;
            }
        }
        true
    }
}

// ============================================================================
// Collecting Fault Hook
// ============================================================================

/// A fault hook that keeps a description of every fault.
#[derive(Clone, Default)]
pub struct CollectingFaultHook {
    faults: Arc<Mutex<Vec<String>>>,
}

impl CollectingFaultHook {
    /// Create an empty hook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Descriptions of the faults received so far.
    pub fn faults(&self) -> Vec<String> {
        self.faults.lock().clone()
    }

    /// Number of faults received.
    pub fn count(&self) -> usize {
        self.faults.lock().len()
    }
}

impl FaultHook for CollectingFaultHook {
    fn on_fault(&self, fault: &Fault) {
        self.faults.lock().push(fault.to_string());
    }
}
