//! Delivery to handlers declared for broader views of an event.

use courier::{Bindings, Bus, DispatchMode, Lineage, Listener, Message, testing::Recorder};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
struct InputEvent {
    source: &'static str,
}

impl Message for InputEvent {}

#[derive(Clone, Debug, PartialEq)]
struct KeyPressed {
    code: u32,
}

impl Message for KeyPressed {
    fn lineage(&self) -> Lineage {
        Lineage::new()
            .with(InputEvent { source: "keyboard" })
            .with(format!("key {}", self.code))
    }
}

/// Records the order in which its handlers ran.
#[derive(Default)]
struct Journal {
    order: Recorder<String>,
}

impl Listener for Journal {
    fn declare(bindings: &mut Bindings<Self>) {
        bindings
            .subscribe(DispatchMode::Immediate, |this: &Self, text: &String| {
                this.order.record(&format!("text: {text}"))
            })
            .subscribe(DispatchMode::Immediate, |this: &Self, input: &InputEvent| {
                this.order.record(&format!("input: {}", input.source))
            })
            .subscribe(DispatchMode::Immediate, |this: &Self, key: &KeyPressed| {
                this.order.record(&format!("key: {}", key.code))
            });
    }
}

#[test]
fn test_exact_type_runs_before_broader_views() {
    let bus = Bus::new();
    let journal = Arc::new(Journal::default());
    bus.register(&journal).unwrap();

    bus.post(KeyPressed { code: 13 }).unwrap();
    assert_eq!(
        journal.order.events(),
        vec![
            "key: 13".to_string(),
            "input: keyboard".to_string(),
            "text: key 13".to_string(),
        ]
    );
}

#[test]
fn test_broad_event_does_not_reach_narrow_handler() {
    let bus = Bus::new();
    let journal = Arc::new(Journal::default());
    bus.register(&journal).unwrap();

    bus.post(InputEvent { source: "mouse" }).unwrap();
    assert_eq!(journal.order.events(), vec!["input: mouse".to_string()]);
}

/// Handles only the broad view.
#[derive(Default)]
struct InputOnly {
    inputs: Recorder<InputEvent>,
}

impl Listener for InputOnly {
    fn declare(bindings: &mut Bindings<Self>) {
        bindings.subscribe(DispatchMode::Immediate, |this: &Self, input: &InputEvent| {
            this.inputs.record(input)
        });
    }
}

#[test]
fn test_broad_handler_receives_view_of_narrow_event() {
    let bus = Bus::new();
    let listener = Arc::new(InputOnly::default());
    bus.register(&listener).unwrap();

    bus.post(KeyPressed { code: 1 }).unwrap();
    assert_eq!(
        listener.inputs.events(),
        vec![InputEvent { source: "keyboard" }]
    );
    assert_eq!(bus.handler_count::<KeyPressed>(), 0);
    assert_eq!(bus.handler_count::<InputEvent>(), 1);
}

#[test]
fn test_producer_replay_matches_exact_type_only() {
    struct KeySource;
    impl Listener for KeySource {
        fn declare(bindings: &mut Bindings<Self>) {
            bindings.produce(|_: &Self| Some(KeyPressed { code: 9 }));
        }
    }

    let bus = Bus::new();
    let source = Arc::new(KeySource);
    bus.register(&source).unwrap();

    let listener = Arc::new(InputOnly::default());
    bus.register(&listener).unwrap();
    assert_eq!(listener.inputs.count(), 0);
}
