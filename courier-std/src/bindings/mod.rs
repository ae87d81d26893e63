//! Handler and producer binding tables.
//!
//! Bindings hold a `Weak` reference to their listener: the tables never keep
//! a listener alive, and a binding whose listener is gone delivers nothing.

pub(crate) mod handlers;
pub(crate) mod producers;

pub(crate) use handlers::{HandlerBinding, HandlerTable};
pub(crate) use producers::{ProducerBinding, ProducerTable};

use courier_core::AnyListener;
use std::sync::{Arc, Weak};

/// Listener identity: the address of its `Arc` allocation.
///
/// The address cannot be reused while a binding holds a `Weak` to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ListenerId(usize);

impl ListenerId {
    pub(crate) fn of<L: ?Sized>(listener: &Arc<L>) -> Self {
        Self(Arc::as_ptr(listener) as *const () as usize)
    }
}

/// The listener a binding belongs to.
#[derive(Debug, Clone)]
pub(crate) struct Owner {
    pub(crate) id: ListenerId,
    pub(crate) name: &'static str,
    pub(crate) listener: Weak<AnyListener>,
}

impl Owner {
    pub(crate) fn new(id: ListenerId, name: &'static str, listener: Weak<AnyListener>) -> Self {
        Self { id, name, listener }
    }
}
