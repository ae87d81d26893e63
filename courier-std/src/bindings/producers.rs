use super::{ListenerId, Owner};
use courier_core::{BoxError, EventType, ProducerSpec, SharedEvent};
use std::{collections::HashMap, sync::Arc};

/// The single producer bound for one event type.
#[derive(Debug)]
pub(crate) struct ProducerBinding {
    owner: Owner,
    spec: ProducerSpec,
}

impl ProducerBinding {
    pub(crate) fn new(owner: Owner, spec: ProducerSpec) -> Self {
        Self { owner, spec }
    }

    pub(crate) fn owner_id(&self) -> ListenerId {
        self.owner.id
    }

    pub(crate) fn owner_name(&self) -> &'static str {
        self.owner.name
    }

    pub(crate) fn event_type(&self) -> EventType {
        self.spec.event_type()
    }

    /// Ask the producer for its current value. A dropped listener produces nothing.
    pub(crate) fn produce(&self) -> Result<Option<SharedEvent>, BoxError> {
        match self.owner.listener.upgrade() {
            Some(listener) => self.spec.produce(&*listener),
            None => Ok(None),
        }
    }
}

/// Event type → its producer.
#[derive(Debug, Default)]
pub(crate) struct ProducerTable {
    by_event: HashMap<EventType, Arc<ProducerBinding>>,
}

impl ProducerTable {
    pub(crate) fn get(&self, event_type: &EventType) -> Option<&Arc<ProducerBinding>> {
        self.by_event.get(event_type)
    }

    /// Bind a producer. The caller has already checked the slot is free.
    pub(crate) fn insert(&mut self, binding: Arc<ProducerBinding>) {
        let previous = self.by_event.insert(binding.event_type(), binding);
        debug_assert!(previous.is_none(), "producer slot already taken");
    }

    pub(crate) fn remove_owner(&mut self, owner: ListenerId, event_types: &[EventType]) -> usize {
        let mut removed = 0;
        for event_type in event_types {
            if self
                .by_event
                .get(event_type)
                .is_some_and(|binding| binding.owner_id() == owner)
            {
                self.by_event.remove(event_type);
                removed += 1;
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::{AnyListener, Bindings, Listener};

    struct Source(u32);

    impl Source {
        fn current(&self) -> Option<u32> {
            Some(self.0)
        }
    }

    impl Listener for Source {
        fn declare(bindings: &mut Bindings<Self>) {
            bindings.produce(Self::current);
        }
    }

    fn bind(listener: &Arc<AnyListener>) -> Arc<ProducerBinding> {
        let owner = Owner::new(ListenerId::of(listener), "Source", Arc::downgrade(listener));
        let (_, mut producers) = Bindings::<Source>::scan().into_parts();
        Arc::new(ProducerBinding::new(owner, producers.remove(0)))
    }

    #[test]
    fn produces_from_live_listener() {
        let listener: Arc<AnyListener> = Arc::new(Source(9));
        let mut table = ProducerTable::default();
        table.insert(bind(&listener));

        let binding = table.get(&EventType::of::<u32>()).unwrap();
        let value = binding.produce().unwrap().unwrap();
        assert_eq!(value.downcast_ref::<u32>(), Some(&9));
    }

    #[test]
    fn dropped_listener_produces_nothing() {
        let listener: Arc<AnyListener> = Arc::new(Source(1));
        let binding = bind(&listener);
        drop(listener);
        assert!(binding.produce().unwrap().is_none());
    }

    #[test]
    fn remove_ignores_other_owners() {
        let first: Arc<AnyListener> = Arc::new(Source(1));
        let second: Arc<AnyListener> = Arc::new(Source(2));
        let mut table = ProducerTable::default();
        table.insert(bind(&first));

        let types = [EventType::of::<u32>()];
        assert_eq!(table.remove_owner(ListenerId::of(&second), &types), 0);
        assert_eq!(table.remove_owner(ListenerId::of(&first), &types), 1);
        assert!(table.get(&EventType::of::<u32>()).is_none());
    }
}
