use super::{ListenerId, Owner};
use courier_core::{AnyEvent, BoxError, DispatchMode, EventType, HandlerSpec};
use std::{collections::HashMap, sync::Arc};

/// One handler of one registered listener.
#[derive(Debug)]
pub(crate) struct HandlerBinding {
    owner: Owner,
    spec: HandlerSpec,
}

impl HandlerBinding {
    pub(crate) fn new(owner: Owner, spec: HandlerSpec) -> Self {
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

    pub(crate) fn mode(&self) -> &DispatchMode {
        self.spec.mode()
    }

    /// Invoke the handler. A dropped listener is skipped.
    pub(crate) fn deliver(&self, event: &AnyEvent) -> Result<(), BoxError> {
        match self.owner.listener.upgrade() {
            Some(listener) => self.spec.invoke(&*listener, event),
            None => {
                tracing::debug!(
                    listener = self.owner.name,
                    event = %self.spec.event_type(),
                    "skipping delivery to dropped listener"
                );
                Ok(())
            }
        }
    }
}

/// Event type → handler bindings, each list in registration order.
#[derive(Debug, Default)]
pub(crate) struct HandlerTable {
    by_event: HashMap<EventType, Vec<Arc<HandlerBinding>>>,
}

impl HandlerTable {
    pub(crate) fn insert(&mut self, binding: Arc<HandlerBinding>) {
        self.by_event
            .entry(binding.event_type())
            .or_default()
            .push(binding);
    }

    pub(crate) fn get(&self, event_type: &EventType) -> &[Arc<HandlerBinding>] {
        self.by_event
            .get(event_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Remove every binding of `owner` under the given event types.
    pub(crate) fn remove_owner(&mut self, owner: ListenerId, event_types: &[EventType]) -> usize {
        let mut removed = 0;
        for event_type in event_types {
            if let Some(bindings) = self.by_event.get_mut(event_type) {
                let before = bindings.len();
                bindings.retain(|binding| binding.owner_id() != owner);
                removed += before - bindings.len();
                if bindings.is_empty() {
                    self.by_event.remove(event_type);
                }
            }
        }
        removed
    }

    pub(crate) fn count(&self, event_type: &EventType) -> usize {
        self.get(event_type).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::{Bindings, Listener};
    use std::sync::Weak;

    struct Probe;

    impl Probe {
        fn on_text(&self, _text: &String) {}
        fn on_number(&self, _n: &u32) {}
    }

    impl Listener for Probe {
        fn declare(bindings: &mut Bindings<Self>) {
            bindings
                .subscribe(DispatchMode::Immediate, Self::on_text)
                .subscribe(DispatchMode::background("q"), Self::on_number);
        }
    }

    fn bind(id: usize) -> Vec<Arc<HandlerBinding>> {
        let owner = Owner::new(ListenerId(id), "Probe", Weak::<Probe>::new());
        let (handlers, _) = Bindings::<Probe>::scan().into_parts();
        handlers
            .into_iter()
            .map(|spec| Arc::new(HandlerBinding::new(owner.clone(), spec)))
            .collect()
    }

    #[test]
    fn keeps_registration_order() {
        let mut table = HandlerTable::default();
        for id in 1..=3 {
            for binding in bind(id) {
                table.insert(binding);
            }
        }
        let owners: Vec<_> = table
            .get(&EventType::of::<String>())
            .iter()
            .map(|b| b.owner_id())
            .collect();
        assert_eq!(owners, vec![ListenerId(1), ListenerId(2), ListenerId(3)]);
    }

    #[test]
    fn removes_only_the_owner() {
        let mut table = HandlerTable::default();
        for id in 1..=2 {
            for binding in bind(id) {
                table.insert(binding);
            }
        }
        let types = [EventType::of::<String>(), EventType::of::<u32>()];
        assert_eq!(table.remove_owner(ListenerId(1), &types), 2);
        assert_eq!(table.count(&EventType::of::<String>()), 1);
        assert_eq!(table.remove_owner(ListenerId(2), &types), 2);
        assert!(table.get(&EventType::of::<u32>()).is_empty());
    }

    #[test]
    fn dropped_listener_is_skipped() {
        let binding = bind(1).remove(0);
        assert!(binding.deliver(&String::from("ignored")).is_ok());
    }
}
