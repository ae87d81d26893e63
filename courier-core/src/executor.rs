//! Host single-threaded context seam.

/// A unit of work handed to the host context.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// The host's single-threaded execution context, used for main-lane delivery.
///
/// The bus only schedules work; running it (and the thread's lifecycle) is
/// the host's business. Tasks must run in the order they were scheduled.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot schedule main-lane tasks",
    label = "missing `MainExecutor` implementation",
    note = "Implement `schedule` to run the task later on the host thread."
)]
pub trait MainExecutor: Send + Sync + 'static {
    /// Schedule `task` to run later on the host thread.
    fn schedule(&self, task: Task);
}

impl<F> MainExecutor for F
where
    F: Fn(Task) + Send + Sync + 'static,
{
    fn schedule(&self, task: Task) {
        (self)(task)
    }
}
