//! A channel-backed host context for main-lane delivery.
//!
//! Hosts without an event loop of their own can own a [`MainLoop`] on the
//! thread that should run main-lane handlers and give the bus its
//! [`MainLoopHandle`].

use courier_core::{MainExecutor, Task};
use tokio::sync::mpsc;

/// The receiving side: drained by the thread that owns it.
pub struct MainLoop {
    receiver: mpsc::UnboundedReceiver<Task>,
}

/// The scheduling side, handed to the bus as its [`MainExecutor`].
#[derive(Clone)]
pub struct MainLoopHandle {
    sender: mpsc::UnboundedSender<Task>,
}

impl MainLoop {
    /// Create a loop and a handle scheduling onto it.
    pub fn new() -> (Self, MainLoopHandle) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { receiver }, MainLoopHandle { sender })
    }

    /// Run every task scheduled so far; returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Wait for the next task and run it. Returns `false` once every handle
    /// is dropped and the backlog is empty.
    pub async fn tick(&mut self) -> bool {
        match self.receiver.recv().await {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run tasks until every handle is dropped.
    pub async fn run(&mut self) {
        while self.tick().await {}
        tracing::debug!("main loop finished");
    }
}

impl MainExecutor for MainLoopHandle {
    fn schedule(&self, task: Task) {
        if self.sender.send(task).is_err() {
            tracing::warn!("main loop is gone; task discarded");
        }
    }
}

impl std::fmt::Debug for MainLoopHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainLoopHandle")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}
