//! Message trait and runtime event typing.
//!
//! Events are looked up by their runtime [`EventType`]. Rust has no subtype
//! relation between concrete types, so an event that should also reach
//! handlers declared for a broader type lists those broader views in its
//! [`Lineage`].

use std::{
    any::{Any, TypeId},
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

/// A shared, type-erased event value.
pub type SharedEvent = Arc<dyn Any + Send + Sync>;

/// A marker trait for values that can be posted on a bus.
///
/// Messages must be `Send + Sync + 'static` so they can cross into
/// background queue workers.
///
/// # Example
///
/// ```rust,ignore
/// struct KeyPressed { code: u32 }
/// struct InputEvent { source: &'static str }
///
/// impl Message for KeyPressed {
///     fn lineage(&self) -> Lineage {
///         Lineage::new().with(InputEvent { source: "keyboard" })
///     }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid Message",
    label = "must implement `Message`",
    note = "Events posted on a bus must be thread-safe and static; derive or implement `Message`."
)]
pub trait Message: Send + Sync + 'static {
    /// Broader views of this event, most specific first.
    ///
    /// Handlers declared for any of these types receive the corresponding
    /// view after the handlers for the exact type.
    fn lineage(&self) -> Lineage {
        Lineage::new()
    }
}

impl Message for () {}
impl Message for String {}
impl Message for &'static str {}
impl Message for bool {}
impl Message for i32 {}
impl Message for i64 {}
impl Message for u32 {}
impl Message for u64 {}
impl Message for usize {}
impl<T: Message> Message for Box<T> {}
impl<T: Message> Message for Arc<T> {}
impl<T: Message> Message for Vec<T> {}

/// The runtime type of a posted value, used as the binding lookup key.
#[derive(Clone, Copy)]
pub struct EventType {
    id: TypeId,
    name: &'static str,
}

impl EventType {
    /// The event type of `T`.
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The underlying type id.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The type name, for diagnostics only.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventType {}

impl Hash for EventType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Ordered alternative views of an event.
#[derive(Clone, Default)]
pub struct Lineage {
    views: Vec<(EventType, SharedEvent)>,
}

impl Lineage {
    /// An empty lineage: the event is matched by its exact type only.
    pub fn new() -> Self {
        Self { views: Vec::new() }
    }

    /// Add a broader view of the event.
    pub fn with<T: Message>(self, view: T) -> Self {
        self.with_shared(Arc::new(view))
    }

    /// Add a broader view that is already shared.
    pub fn with_shared<T: Message>(mut self, view: Arc<T>) -> Self {
        self.views.push((EventType::of::<T>(), view));
        self
    }

    /// Number of views.
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Whether there are no views.
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Iterate views in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &(EventType, SharedEvent)> {
        self.views.iter()
    }
}

impl IntoIterator for Lineage {
    type Item = (EventType, SharedEvent);
    type IntoIter = std::vec::IntoIter<(EventType, SharedEvent)>;

    fn into_iter(self) -> Self::IntoIter {
        self.views.into_iter()
    }
}

impl fmt::Debug for Lineage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.views.iter().map(|(ty, _)| ty))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Base(u32);
    impl Message for Base {}

    struct Derived(u32);
    impl Message for Derived {
        fn lineage(&self) -> Lineage {
            Lineage::new().with(Base(self.0))
        }
    }

    #[test]
    fn event_type_equality_ignores_name() {
        assert_eq!(EventType::of::<String>(), EventType::of::<String>());
        assert_ne!(EventType::of::<String>(), EventType::of::<&'static str>());
        assert!(EventType::of::<Base>().name().ends_with("Base"));
    }

    #[test]
    fn lineage_keeps_declaration_order() {
        let lineage = Derived(7).lineage().with(String::from("text"));
        let types: Vec<_> = lineage.iter().map(|(ty, _)| *ty).collect();
        assert_eq!(types, vec![EventType::of::<Base>(), EventType::of::<String>()]);

        let (_, view) = lineage.into_iter().next().unwrap();
        assert_eq!(view.downcast_ref::<Base>().unwrap().0, 7);
    }

    #[test]
    fn default_lineage_is_empty() {
        assert!(String::from("x").lineage().is_empty());
    }
}
