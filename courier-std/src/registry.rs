//! The joint handler/producer registry.
//!
//! All mutation happens through [`Registry::insert`] and [`Registry::remove`],
//! which the bus calls under one write lock, so a concurrent `post` sees
//! either the whole registration or none of it.

use crate::{
    bindings::{HandlerBinding, HandlerTable, ListenerId, Owner, ProducerBinding, ProducerTable},
    queue::Delivery,
};
use courier_core::{
    AnyListener, BusError, EventType, HandlerSpec, Lineage, ProducerSpec, SharedEvent,
};
use std::{
    collections::HashMap,
    sync::{Arc, Weak},
};

/// What a registered listener put into the tables.
///
/// The `Weak` pins the listener's allocation, so its [`ListenerId`] is not
/// handed to another instance while the entry exists.
#[derive(Debug)]
struct Registration {
    listener: Weak<AnyListener>,
    handler_types: Vec<EventType>,
    produced_types: Vec<EventType>,
}

impl Registration {
    fn is_live(&self) -> bool {
        self.listener.strong_count() > 0
    }
}

/// A producer to call, and the handlers that receive its value.
pub(crate) struct Replay {
    pub(crate) producer: Arc<ProducerBinding>,
    pub(crate) targets: Vec<Arc<HandlerBinding>>,
}

#[derive(Debug, Default)]
pub(crate) struct Registry {
    handlers: HandlerTable,
    producers: ProducerTable,
    listeners: HashMap<ListenerId, Registration>,
}

impl Registry {
    /// Whether `id` is registered and its listener is still alive.
    pub(crate) fn contains(&self, id: ListenerId) -> bool {
        self.listeners.get(&id).is_some_and(Registration::is_live)
    }

    /// Drop every registration whose listener is gone. Returns how many.
    pub(crate) fn prune(&mut self) -> usize {
        let stale: Vec<ListenerId> = self
            .listeners
            .iter()
            .filter(|(_, registration)| !registration.is_live())
            .map(|(id, _)| *id)
            .collect();
        for id in &stale {
            self.remove(*id);
        }
        if !stale.is_empty() {
            tracing::debug!(pruned = stale.len(), "dropped listeners pruned");
        }
        stale.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Insert all bindings of a new listener and plan its producer replay.
    ///
    /// Registrations of dropped listeners are pruned first. Nothing is
    /// inserted if any check fails.
    pub(crate) fn insert(
        &mut self,
        owner: Owner,
        handlers: Vec<HandlerSpec>,
        producers: Vec<ProducerSpec>,
    ) -> Result<Vec<Replay>, BusError> {
        self.prune();
        if self.contains(owner.id) {
            return Err(BusError::AlreadyRegistered {
                listener: owner.name,
            });
        }

        let mut produced_types: Vec<EventType> = Vec::with_capacity(producers.len());
        for spec in &producers {
            let event_type = spec.event_type();
            if let Some(existing) = self.producers.get(&event_type) {
                return Err(BusError::DuplicateProducer {
                    event: event_type,
                    owner: existing.owner_name(),
                });
            }
            if produced_types.contains(&event_type) {
                return Err(BusError::DuplicateProducer {
                    event: event_type,
                    owner: owner.name,
                });
            }
            produced_types.push(event_type);
        }

        let mut handler_types: Vec<EventType> = Vec::new();
        let mut own_handlers: Vec<Arc<HandlerBinding>> = Vec::with_capacity(handlers.len());
        for spec in handlers {
            let binding = Arc::new(HandlerBinding::new(owner.clone(), spec));
            if !handler_types.contains(&binding.event_type()) {
                handler_types.push(binding.event_type());
            }
            self.handlers.insert(Arc::clone(&binding));
            own_handlers.push(binding);
        }

        let mut replays = Vec::new();

        // Existing producers replay to the newcomer's handlers only.
        for event_type in &handler_types {
            if produced_types.contains(event_type) {
                continue;
            }
            if let Some(producer) = self.producers.get(event_type) {
                let targets = own_handlers
                    .iter()
                    .filter(|binding| binding.event_type() == *event_type)
                    .cloned()
                    .collect();
                replays.push(Replay {
                    producer: Arc::clone(producer),
                    targets,
                });
            }
        }

        // The newcomer's producers replay to every handler of their type.
        for spec in producers {
            let producer = Arc::new(ProducerBinding::new(owner.clone(), spec));
            self.producers.insert(Arc::clone(&producer));
            let targets = self.handlers.get(&producer.event_type()).to_vec();
            if !targets.is_empty() {
                replays.push(Replay { producer, targets });
            }
        }

        self.listeners.insert(
            owner.id,
            Registration {
                listener: owner.listener.clone(),
                handler_types,
                produced_types,
            },
        );
        Ok(replays)
    }

    /// Remove every binding of `id`. Returns `false` if it was not registered.
    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let Some(registration) = self.listeners.remove(&id) else {
            return false;
        };
        self.handlers.remove_owner(id, &registration.handler_types);
        self.producers.remove_owner(id, &registration.produced_types);
        true
    }

    /// Deliveries for one posted event: exact type first, then each lineage
    /// view, each group in registration order.
    pub(crate) fn resolve(
        &self,
        event_type: EventType,
        event: SharedEvent,
        lineage: Lineage,
    ) -> Vec<Delivery> {
        let mut deliveries: Vec<Delivery> = self
            .handlers
            .get(&event_type)
            .iter()
            .map(|binding| Delivery::new(Arc::clone(binding), Arc::clone(&event)))
            .collect();
        for (view_type, view) in lineage {
            deliveries.extend(
                self.handlers
                    .get(&view_type)
                    .iter()
                    .map(|binding| Delivery::new(Arc::clone(binding), Arc::clone(&view))),
            );
        }
        deliveries
    }

    pub(crate) fn handler_count(&self, event_type: &EventType) -> usize {
        self.handlers.count(event_type)
    }

    pub(crate) fn has_producer(&self, event_type: &EventType) -> bool {
        self.producers.get(event_type).is_some()
    }
}
