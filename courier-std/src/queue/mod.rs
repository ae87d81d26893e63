//! Execution lanes.
//!
//! The [`QueueManager`] routes each [`Delivery`] by its handler's dispatch
//! mode: inline on the caller, onto the host's main context, or onto the
//! worker owning a named background queue.

pub(crate) mod worker;

use crate::bindings::HandlerBinding;
use courier_core::{
    BusError, DispatchMode, EventType, Fault, FaultCause, FaultHook, MainExecutor, QueueName,
    SharedEvent,
};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
};
use worker::Worker;

/// One event bound for one handler.
pub(crate) struct Delivery {
    binding: Arc<HandlerBinding>,
    event: SharedEvent,
}

impl Delivery {
    pub(crate) fn new(binding: Arc<HandlerBinding>, event: SharedEvent) -> Self {
        Self { binding, event }
    }

    pub(crate) fn mode(&self) -> &DispatchMode {
        self.binding.mode()
    }

    pub(crate) fn event_type(&self) -> EventType {
        self.binding.event_type()
    }

    /// Run on the caller's thread; errors become [`BusError::HandlerFault`].
    fn run_inline(self) -> Result<(), BusError> {
        self.binding
            .deliver(&*self.event)
            .map_err(|source| BusError::HandlerFault {
                event: self.binding.event_type(),
                source,
            })
    }

    /// Run off the posting thread; errors and panics go to `hook`.
    pub(crate) fn run_reporting(self, hook: &dyn FaultHook) {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.binding.deliver(&*self.event)));
        let cause = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(err)) => FaultCause::Error(err),
            Err(payload) => FaultCause::from_panic(payload),
        };
        let fault = Fault::new(
            self.binding.event_type(),
            self.binding.mode().clone(),
            self.binding.owner_name(),
            self.event,
            cause,
        );
        hook.on_fault(&fault);
    }
}

/// Owns the background workers and the reference to the main context.
pub(crate) struct QueueManager {
    workers: Mutex<HashMap<QueueName, Worker>>,
    worker_name_prefix: String,
    worker_stack_size: Option<usize>,
    main: Option<Arc<dyn MainExecutor>>,
    fault_hook: Arc<dyn FaultHook>,
}

impl QueueManager {
    pub(crate) fn new(
        worker_name_prefix: String,
        worker_stack_size: Option<usize>,
        main: Option<Arc<dyn MainExecutor>>,
        fault_hook: Arc<dyn FaultHook>,
    ) -> Self {
        Self {
            workers: Mutex::new(HashMap::new()),
            worker_name_prefix,
            worker_stack_size,
            main,
            fault_hook,
        }
    }

    pub(crate) fn has_main(&self) -> bool {
        self.main.is_some()
    }

    /// Route one delivery to its lane.
    ///
    /// Immediate deliveries run before this returns; everything else is
    /// only enqueued.
    pub(crate) fn submit(&self, delivery: Delivery) -> Result<(), BusError> {
        match delivery.mode().clone() {
            DispatchMode::Immediate => delivery.run_inline(),
            DispatchMode::Main => {
                let Some(main) = &self.main else {
                    // Registration rejects main handlers without an executor.
                    tracing::error!(event = %delivery.event_type(), "no main executor; delivery dropped");
                    return Ok(());
                };
                let hook = Arc::clone(&self.fault_hook);
                tracing::trace!(event = %delivery.event_type(), "scheduling on main lane");
                main.schedule(Box::new(move || delivery.run_reporting(&*hook)));
                Ok(())
            }
            DispatchMode::Background(queue) => {
                let mut workers = self.workers.lock();
                if !workers.contains_key(&queue) {
                    let name = format!("{}{}", self.worker_name_prefix, workers.len());
                    let worker = Worker::spawn(
                        queue.clone(),
                        name,
                        self.worker_stack_size,
                        Arc::clone(&self.fault_hook),
                    )
                    .map_err(|source| BusError::WorkerSpawn {
                        queue: queue.clone(),
                        source,
                    })?;
                    workers.insert(queue.clone(), worker);
                }
                if let Some(worker) = workers.get(&queue) {
                    tracing::trace!(%queue, event = %delivery.event_type(), "enqueueing delivery");
                    worker.enqueue(delivery);
                }
                Ok(())
            }
        }
    }

    /// Names of the background queues started so far.
    pub(crate) fn queue_names(&self) -> Vec<QueueName> {
        let mut names: Vec<_> = self.workers.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for QueueManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueManager")
            .field("queues", &self.queue_names())
            .field("worker_name_prefix", &self.worker_name_prefix)
            .field("has_main", &self.has_main())
            .finish()
    }
}
