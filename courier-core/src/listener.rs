//! Listener declarations.
//!
//! A [`Listener`] declares its handlers and producers into [`Bindings`].
//! The bus consumes the resulting type-erased [`HandlerSpec`] and
//! [`ProducerSpec`] lists; how a listener fills them in (by hand or through
//! the `#[listener]` attribute) is not the bus's concern.

use crate::{
    error::{BoxError, TypeMismatch},
    message::{EventType, Message, SharedEvent},
    mode::DispatchMode,
    outcome::IntoOutcome,
};
use std::{any::Any, fmt, marker::PhantomData, sync::Arc};

/// A type-erased listener reference.
pub type AnyListener = dyn Any + Send + Sync;

/// A type-erased event reference.
pub type AnyEvent = dyn Any + Send + Sync;

/// A type-erased handler invocation: `(listener, event) -> outcome`.
pub type Invocation = Arc<dyn Fn(&AnyListener, &AnyEvent) -> Result<(), BoxError> + Send + Sync>;

/// A type-erased producer invocation: `listener -> last value`.
pub type Production = Arc<dyn Fn(&AnyListener) -> Result<Option<SharedEvent>, BoxError> + Send + Sync>;

/// An object that subscribes handlers and producers on a bus.
///
/// # Example
///
/// ```rust,ignore
/// struct Clock { now: u64 }
///
/// impl Clock {
///     fn on_tick(&self, tick: &Tick) { /* ... */ }
///     fn current(&self) -> Option<Tick> { Some(Tick(self.now)) }
/// }
///
/// impl Listener for Clock {
///     fn declare(bindings: &mut Bindings<Self>) {
///         bindings
///             .subscribe(DispatchMode::background("clock"), Self::on_tick)
///             .produce(Self::current);
///     }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a Listener",
    label = "missing `Listener` implementation",
    note = "Implement `declare` or annotate the impl block with `#[listener]`."
)]
pub trait Listener: Send + Sync + 'static {
    /// Declare handlers and producers, in a stable order.
    fn declare(bindings: &mut Bindings<Self>)
    where
        Self: Sized;
}

/// A declared handler.
#[derive(Clone)]
pub struct HandlerSpec {
    event_type: EventType,
    mode: DispatchMode,
    invoke: Invocation,
}

impl HandlerSpec {
    /// The event type this handler accepts.
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// The handler's delivery lane.
    pub fn mode(&self) -> &DispatchMode {
        &self.mode
    }

    /// Invoke the handler on `listener` with `event`.
    pub fn invoke(&self, listener: &AnyListener, event: &AnyEvent) -> Result<(), BoxError> {
        (self.invoke)(listener, event)
    }
}

impl fmt::Debug for HandlerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerSpec")
            .field("event_type", &self.event_type)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// A declared producer.
#[derive(Clone)]
pub struct ProducerSpec {
    event_type: EventType,
    produce: Production,
}

impl ProducerSpec {
    /// The event type this producer supplies.
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Ask `listener` for its current value.
    pub fn produce(&self, listener: &AnyListener) -> Result<Option<SharedEvent>, BoxError> {
        (self.produce)(listener)
    }
}

impl fmt::Debug for ProducerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProducerSpec")
            .field("event_type", &self.event_type)
            .finish_non_exhaustive()
    }
}

/// Collects the declarations of one listener type.
pub struct Bindings<L> {
    handlers: Vec<HandlerSpec>,
    producers: Vec<ProducerSpec>,
    _listener: PhantomData<fn(&L)>,
}

impl<L: Listener> Bindings<L> {
    /// Run `L::declare` and collect the result.
    pub fn scan() -> Self {
        let mut bindings = Self::new();
        L::declare(&mut bindings);
        bindings
    }
}

impl<L: Send + Sync + 'static> Bindings<L> {
    /// An empty declaration list.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            producers: Vec::new(),
            _listener: PhantomData,
        }
    }

    /// Declare a handler for events of type `E`.
    pub fn subscribe<E, R, F>(&mut self, mode: DispatchMode, handler: F) -> &mut Self
    where
        E: Message,
        R: IntoOutcome,
        F: Fn(&L, &E) -> R + Send + Sync + 'static,
    {
        let invoke = move |listener: &AnyListener, event: &AnyEvent| -> Result<(), BoxError> {
            let listener = listener.downcast_ref::<L>().ok_or(TypeMismatch {
                expected: std::any::type_name::<L>(),
            })?;
            let event = event.downcast_ref::<E>().ok_or(TypeMismatch {
                expected: std::any::type_name::<E>(),
            })?;
            handler(listener, event).into_outcome()
        };
        self.handlers.push(HandlerSpec {
            event_type: EventType::of::<E>(),
            mode,
            invoke: Arc::new(invoke),
        });
        self
    }

    /// Declare a producer of the last known `E`.
    ///
    /// Returning `None` means there is nothing to replay.
    pub fn produce<E, F>(&mut self, producer: F) -> &mut Self
    where
        E: Message,
        F: Fn(&L) -> Option<E> + Send + Sync + 'static,
    {
        let produce = move |listener: &AnyListener| -> Result<Option<SharedEvent>, BoxError> {
            let listener = listener.downcast_ref::<L>().ok_or(TypeMismatch {
                expected: std::any::type_name::<L>(),
            })?;
            Ok(producer(listener).map(|value| Arc::new(value) as SharedEvent))
        };
        self.producers.push(ProducerSpec {
            event_type: EventType::of::<E>(),
            produce: Arc::new(produce),
        });
        self
    }

    /// Declared handlers, in declaration order.
    pub fn handlers(&self) -> &[HandlerSpec] {
        &self.handlers
    }

    /// Declared producers, in declaration order.
    pub fn producers(&self) -> &[ProducerSpec] {
        &self.producers
    }

    /// Split into handler and producer lists.
    pub fn into_parts(self) -> (Vec<HandlerSpec>, Vec<ProducerSpec>) {
        (self.handlers, self.producers)
    }
}

impl<L: Send + Sync + 'static> Default for Bindings<L> {
    fn default() -> Self {
        Self::new()
    }
}
