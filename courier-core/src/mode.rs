//! Dispatch modes and queue names.

use std::{borrow::Cow, fmt};

/// Name of a delivery queue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueueName(Cow<'static, str>);

impl QueueName {
    /// The implicit queue used by background handlers that do not name one.
    pub const DEFAULT: QueueName = QueueName(Cow::Borrowed("default"));

    /// Create a queue name.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for QueueName {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<&'static str> for QueueName {
    fn from(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }
}

impl From<String> for QueueName {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl fmt::Display for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Selects the execution lane for a handler's deliveries.
///
/// | Mode | Lane | Ordering |
/// |------|------|----------|
/// | `Immediate` | caller's thread | completes before `post` returns |
/// | `Main` | host single-threaded context | FIFO among main deliveries |
/// | `Background(q)` | dedicated worker for `q` | FIFO within `q` |
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum DispatchMode {
    /// Run synchronously on the posting thread.
    #[default]
    Immediate,
    /// Hand off to the host's single-threaded context.
    Main,
    /// Run on the named queue's worker.
    Background(QueueName),
}

impl DispatchMode {
    /// Background delivery on the named queue.
    pub fn background(queue: impl Into<QueueName>) -> Self {
        Self::Background(queue.into())
    }

    /// Background delivery on [`QueueName::DEFAULT`].
    pub fn default_background() -> Self {
        Self::Background(QueueName::DEFAULT)
    }

    /// The queue, for background modes.
    pub fn queue(&self) -> Option<&QueueName> {
        match self {
            Self::Background(queue) => Some(queue),
            _ => None,
        }
    }

    /// Whether deliveries run inline on the caller's thread.
    pub fn is_immediate(&self) -> bool {
        matches!(self, Self::Immediate)
    }
}

impl fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Immediate => f.write_str("immediate"),
            Self::Main => f.write_str("main"),
            Self::Background(queue) => write!(f, "background({queue})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mode_is_immediate() {
        assert_eq!(DispatchMode::default(), DispatchMode::Immediate);
        assert!(DispatchMode::default().is_immediate());
    }

    #[test]
    fn background_queue_names() {
        let mode = DispatchMode::background("io");
        assert_eq!(mode.queue().map(QueueName::as_str), Some("io"));
        assert_eq!(DispatchMode::default_background().queue(), Some(&QueueName::DEFAULT));
        assert_eq!(DispatchMode::Main.queue(), None);
        assert_eq!(
            DispatchMode::background(String::from("io")),
            DispatchMode::background("io")
        );
        assert_eq!(mode.to_string(), "background(io)");
    }
}
