use super::Delivery;
use courier_core::{FaultHook, QueueName};
use std::{io, sync::Arc, thread};
use tokio::sync::mpsc;

/// A dedicated thread draining one queue, one delivery at a time.
///
/// The thread exits once the sender is dropped and the backlog is drained.
pub(crate) struct Worker {
    queue: QueueName,
    sender: mpsc::UnboundedSender<Delivery>,
}

impl Worker {
    pub(crate) fn spawn(
        queue: QueueName,
        name: String,
        stack_size: Option<usize>,
        fault_hook: Arc<dyn FaultHook>,
    ) -> io::Result<Self> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Delivery>();
        let thread_queue = queue.clone();
        let mut builder = thread::Builder::new().name(name.clone());
        if let Some(size) = stack_size {
            builder = builder.stack_size(size);
        }
        builder.spawn(move || {
            while let Some(delivery) = receiver.blocking_recv() {
                delivery.run_reporting(&*fault_hook);
            }
            tracing::debug!(queue = %thread_queue, "queue worker stopped");
        })?;
        tracing::debug!(%queue, thread = %name, "queue worker started");
        Ok(Self { queue, sender })
    }

    pub(crate) fn enqueue(&self, delivery: Delivery) {
        if self.sender.send(delivery).is_err() {
            tracing::error!(queue = %self.queue, "queue worker is gone; delivery dropped");
        }
    }
}
