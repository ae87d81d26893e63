//! The bus: registration entry points and the dispatch core.

use crate::{
    bindings::{ListenerId, Owner},
    builder::BusBuilder,
    queue::{Delivery, QueueManager},
    registry::{Registry, Replay},
};
use courier_core::{
    AnyListener, Bindings, BusError, DispatchMode, EventType, Listener, Message, QueueName,
};
use parking_lot::RwLock;
use std::{any::type_name, fmt, sync::Arc};

/// An in-process publish/subscribe bus.
///
/// Cloning a `Bus` yields another handle to the same registry and queues.
///
/// # Example
///
/// ```rust,ignore
/// let bus = Bus::new();
/// let listener = Arc::new(MyListener::default());
///
/// bus.register(&listener)?;
/// bus.post(MyEvent { id: 1 })?;
/// bus.unregister(&listener)?;
/// ```
#[derive(Clone)]
pub struct Bus {
    inner: Arc<Inner>,
}

struct Inner {
    registry: RwLock<Registry>,
    queues: QueueManager,
}

impl Bus {
    /// A bus with default settings and no main executor.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start configuring a bus.
    pub fn builder() -> BusBuilder {
        BusBuilder::new()
    }

    pub(crate) fn from_parts(queues: QueueManager) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry: RwLock::new(Registry::default()),
                queues,
            }),
        }
    }

    /// Register every handler and producer `listener` declares.
    ///
    /// Existing producers for the listener's handled types, and the listener's
    /// own producers, are called once and their values delivered to the
    /// matching handlers. Producers run while the registry is locked and must
    /// not call back into the bus.
    ///
    /// # Errors
    ///
    /// - [`BusError::NullArgument`] for `None`
    /// - [`BusError::AlreadyRegistered`] if this instance is registered
    /// - [`BusError::DuplicateProducer`] if another instance produces one of its types
    /// - [`BusError::MainLaneUnavailable`] for main-lane handlers without a main executor
    /// - [`BusError::WorkerSpawn`] if a replay needs a new queue worker that
    ///   cannot start; the registration is rolled back, but replay deliveries
    ///   already queued still run
    /// - [`BusError::HandlerFault`] if an immediate-mode replay fails; the
    ///   listener stays registered
    pub fn register<'a, L: Listener>(
        &self,
        listener: impl Into<Option<&'a Arc<L>>>,
    ) -> Result<(), BusError> {
        let listener = listener.into().ok_or(BusError::NullArgument("listener"))?;
        let name = type_name::<L>();
        let id = ListenerId::of(listener);
        let (handlers, producers) = Bindings::<L>::scan().into_parts();

        let erased: Arc<AnyListener> = listener.clone();
        let owner = Owner::new(id, name, Arc::downgrade(&erased));

        if !self.inner.queues.has_main()
            && handlers.iter().any(|spec| *spec.mode() == DispatchMode::Main)
        {
            return Err(BusError::MainLaneUnavailable { listener: name });
        }

        let immediate = {
            let mut registry = self.inner.registry.write();
            let replays = registry.insert(owner, handlers, producers)?;
            tracing::debug!(
                listener = name,
                replays = replays.len(),
                "listener registered"
            );
            match self.replay(replays) {
                Ok(immediate) => immediate,
                Err(err) => {
                    registry.remove(id);
                    tracing::debug!(listener = name, error = %err, "registration rolled back");
                    return Err(err);
                }
            }
        };

        self.dispatch(immediate)
    }

    /// Remove every handler and producer of `listener`.
    ///
    /// Deliveries already queued for it still run.
    ///
    /// # Errors
    ///
    /// - [`BusError::NullArgument`] for `None`
    /// - [`BusError::NotRegistered`] if this instance is not registered
    pub fn unregister<'a, L: Listener>(
        &self,
        listener: impl Into<Option<&'a Arc<L>>>,
    ) -> Result<(), BusError> {
        let listener = listener.into().ok_or(BusError::NullArgument("listener"))?;
        let name = type_name::<L>();
        if !self.inner.registry.write().remove(ListenerId::of(listener)) {
            return Err(BusError::NotRegistered { listener: name });
        }
        tracing::debug!(listener = name, "listener unregistered");
        Ok(())
    }

    /// Deliver `event` to every handler bound to its type or to one of its
    /// lineage views.
    ///
    /// Immediate handlers run before this returns. Main and background
    /// deliveries are only enqueued.
    ///
    /// # Errors
    ///
    /// - [`BusError::NullArgument`] for `None`
    /// - [`BusError::HandlerFault`] if an immediate handler fails; later
    ///   immediate handlers for this post are skipped, queued ones are still
    ///   submitted
    /// - [`BusError::WorkerSpawn`] if a new queue's worker cannot start
    pub fn post<E: Message>(&self, event: impl Into<Option<E>>) -> Result<(), BusError> {
        let event = event.into().ok_or(BusError::NullArgument("event"))?;
        let event_type = EventType::of::<E>();
        let lineage = event.lineage();
        let deliveries = self
            .inner
            .registry
            .read()
            .resolve(event_type, Arc::new(event), lineage);
        tracing::trace!(event = %event_type, deliveries = deliveries.len(), "posting event");
        self.dispatch(deliveries)
    }

    /// Whether this exact instance is registered.
    pub fn is_registered<L: Listener>(&self, listener: &Arc<L>) -> bool {
        self.inner.registry.read().contains(ListenerId::of(listener))
    }

    /// Number of handlers bound to exactly `E`.
    pub fn handler_count<E: Message>(&self) -> usize {
        self.inner
            .registry
            .read()
            .handler_count(&EventType::of::<E>())
    }

    /// Whether some listener produces `E`.
    pub fn has_producer<E: Message>(&self) -> bool {
        self.inner
            .registry
            .read()
            .has_producer(&EventType::of::<E>())
    }

    /// Background queues with a running worker, sorted by name.
    pub fn queue_names(&self) -> Vec<QueueName> {
        self.inner.queues.queue_names()
    }

    /// Call each replay's producer and submit queued deliveries; immediate
    /// deliveries are returned for the caller to run outside the lock.
    fn replay(&self, replays: Vec<Replay>) -> Result<Vec<Delivery>, BusError> {
        let mut immediate = Vec::new();
        for Replay { producer, targets } in replays {
            let value = match producer.produce() {
                Ok(Some(value)) => value,
                Ok(None) => {
                    tracing::trace!(event = %producer.event_type(), "producer has no value");
                    continue;
                }
                Err(err) => {
                    tracing::warn!(
                        listener = producer.owner_name(),
                        event = %producer.event_type(),
                        error = %err,
                        "producer failed"
                    );
                    continue;
                }
            };
            for target in targets {
                let delivery = Delivery::new(target, Arc::clone(&value));
                if delivery.mode().is_immediate() {
                    immediate.push(delivery);
                } else {
                    self.inner.queues.submit(delivery)?;
                }
            }
        }
        Ok(immediate)
    }

    /// Submit deliveries in order, skipping immediate ones after the first fault.
    fn dispatch(&self, deliveries: Vec<Delivery>) -> Result<(), BusError> {
        let mut fault = None;
        for delivery in deliveries {
            if fault.is_some() && delivery.mode().is_immediate() {
                continue;
            }
            match self.inner.queues.submit(delivery) {
                Ok(()) => {}
                Err(err @ BusError::HandlerFault { .. }) => fault = Some(err),
                Err(err) => return Err(err),
            }
        }
        fault.map_or(Ok(()), Err)
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
            .field("listeners", &self.inner.registry.read().len())
            .field("queues", &self.inner.queues)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Latch, Recorder};
    use std::time::Duration;

    struct Echo {
        seen: Recorder<String>,
    }

    impl Listener for Echo {
        fn declare(bindings: &mut Bindings<Self>) {
            bindings.subscribe(DispatchMode::Immediate, |this: &Self, text: &String| {
                this.seen.record(text)
            });
        }
    }

    struct Broken;

    impl Listener for Broken {
        fn declare(bindings: &mut Bindings<Self>) {
            bindings.subscribe(DispatchMode::Main, |_: &Self, _: &String| {});
        }
    }

    #[test]
    fn immediate_handlers_run_before_post_returns() {
        let bus = Bus::new();
        let echo = Arc::new(Echo {
            seen: Recorder::new(),
        });
        bus.register(&echo).unwrap();
        bus.post(String::from("one")).unwrap();
        assert_eq!(echo.seen.events(), vec!["one".to_string()]);
        assert!(bus.is_registered(&echo));
        assert_eq!(bus.handler_count::<String>(), 1);
    }

    #[test]
    fn null_arguments_are_rejected() {
        let bus = Bus::new();
        assert!(matches!(
            bus.register(None::<&Arc<Echo>>),
            Err(BusError::NullArgument("listener"))
        ));
        assert!(matches!(
            bus.unregister(None::<&Arc<Echo>>),
            Err(BusError::NullArgument("listener"))
        ));
        assert!(matches!(
            bus.post::<String>(None::<String>),
            Err(BusError::NullArgument("event"))
        ));
    }

    #[test]
    fn main_handlers_need_an_executor() {
        let bus = Bus::new();
        let err = bus.register(&Arc::new(Broken)).unwrap_err();
        assert!(matches!(err, BusError::MainLaneUnavailable { .. }));
    }

    #[test]
    fn dropped_listener_receives_nothing() {
        let bus = Bus::new();
        let seen = Recorder::new();
        let echo = Arc::new(Echo { seen: seen.clone() });
        bus.register(&echo).unwrap();
        drop(echo);
        bus.post(String::from("late")).unwrap();
        assert_eq!(seen.count(), 0);
    }

    #[test]
    fn clones_share_the_registry() {
        let bus = Bus::new();
        let other = bus.clone();
        let echo = Arc::new(Echo {
            seen: Recorder::new(),
        });
        bus.register(&echo).unwrap();
        other.post(String::from("shared")).unwrap();
        assert_eq!(echo.seen.count(), 1);
        other.unregister(&echo).unwrap();
        assert!(!bus.is_registered(&echo));
    }

    #[test]
    fn background_worker_is_started_on_first_post() {
        struct Slow {
            latch: Latch,
        }
        impl Listener for Slow {
            fn declare(bindings: &mut Bindings<Self>) {
                bindings.subscribe(DispatchMode::background("lazy"), |this: &Self, _: &u32| {
                    this.latch.count_down()
                });
            }
        }

        let bus = Bus::new();
        let slow = Arc::new(Slow { latch: Latch::new(1) });
        bus.register(&slow).unwrap();
        assert!(bus.queue_names().is_empty());

        bus.post(1_u32).unwrap();
        assert!(slow.latch.wait(Duration::from_secs(4)));
        assert_eq!(bus.queue_names(), vec![QueueName::from("lazy")]);
    }

    #[test]
    fn duplicate_registration_is_reported_by_the_registry() {
        let bus = Bus::new();
        let echo = Arc::new(Echo {
            seen: Recorder::new(),
        });
        bus.register(&echo).unwrap();
        assert!(matches!(
            bus.register(&echo),
            Err(BusError::AlreadyRegistered { .. })
        ));
        assert_eq!(bus.handler_count::<String>(), 1);
    }

    struct Queued;

    impl Listener for Queued {
        fn declare(bindings: &mut Bindings<Self>) {
            bindings.subscribe(DispatchMode::background("unstartable"), |_: &Self, _: &String| {});
        }
    }

    struct Source;

    impl Listener for Source {
        fn declare(bindings: &mut Bindings<Self>) {
            bindings.produce(|_: &Self| Some(String::from("current")));
        }
    }

    /// A worker stack no system can map.
    #[cfg(all(target_os = "linux", target_pointer_width = "64"))]
    fn unspawnable_bus() -> Bus {
        Bus::builder().worker_stack_size(1 << 60).build()
    }

    #[cfg(all(target_os = "linux", target_pointer_width = "64"))]
    #[test]
    fn post_reports_worker_spawn_failure() {
        let bus = unspawnable_bus();
        let queued = Arc::new(Queued);
        bus.register(&queued).unwrap();

        let err = bus.post(String::from("lost")).unwrap_err();
        assert!(matches!(err, BusError::WorkerSpawn { .. }));
        assert!(bus.queue_names().is_empty());
    }

    #[cfg(all(target_os = "linux", target_pointer_width = "64"))]
    #[test]
    fn failed_replay_rolls_back_registration() {
        let bus = unspawnable_bus();
        let source = Arc::new(Source);
        bus.register(&source).unwrap();

        let queued = Arc::new(Queued);
        let err = bus.register(&queued).unwrap_err();
        assert!(matches!(err, BusError::WorkerSpawn { .. }));
        assert!(!bus.is_registered(&queued));
        assert_eq!(bus.handler_count::<String>(), 0);
        assert!(bus.has_producer::<String>());
    }
}
