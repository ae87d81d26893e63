//! Registration changes are atomic with respect to concurrent posts.

use courier::{Bindings, Bus, DispatchMode, Listener, testing::Recorder};
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

const HANDLERS: usize = 4;
const POSTS: u64 = 2_000;

/// Binds the same event type several times.
#[derive(Default)]
struct Fanned {
    seen: Recorder<u64>,
}

impl Listener for Fanned {
    fn declare(bindings: &mut Bindings<Self>) {
        for _ in 0..HANDLERS {
            bindings.subscribe(DispatchMode::Immediate, |this: &Self, n: &u64| {
                this.seen.record(n)
            });
        }
    }
}

#[test]
fn test_post_sees_all_or_none_of_a_registration() {
    let bus = Bus::new();
    let fanned = Arc::new(Fanned::default());
    let posting = AtomicBool::new(true);

    thread::scope(|scope| {
        scope.spawn(|| {
            while posting.load(Ordering::Acquire) {
                bus.register(&fanned).unwrap();
                bus.unregister(&fanned).unwrap();
            }
        });
        scope.spawn(|| {
            for n in 0..POSTS {
                bus.post(n).unwrap();
            }
            posting.store(false, Ordering::Release);
        });
    });

    let mut per_post: HashMap<u64, usize> = HashMap::new();
    for n in fanned.seen.events() {
        *per_post.entry(n).or_default() += 1;
    }
    for (n, count) in per_post {
        assert_eq!(count, HANDLERS, "post {n} saw a partial registration");
    }
}

#[test]
fn test_concurrent_posts_from_many_threads() {
    let bus = Bus::new();
    let fanned = Arc::new(Fanned::default());
    bus.register(&fanned).unwrap();

    thread::scope(|scope| {
        for t in 0..4_u64 {
            let bus = bus.clone();
            scope.spawn(move || {
                for i in 0..100 {
                    bus.post(t * 1_000 + i).unwrap();
                }
            });
        }
    });

    assert_eq!(fanned.seen.count(), 4 * 100 * HANDLERS);
}
