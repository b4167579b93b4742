//! Resolver properties checked end to end through the public API
//!
//! Covers the empty-source, synchronous-emission, switching and fail-fast
//! guarantees, plus a seeded random interleaving of emissions, reads and
//! source switches that checks notification counts against a model.
//!
//! Run with: `cargo test --test resolver_properties`

mod common;

use common::{source_ref, TestHost};
use extended_async::{
    AsyncSource, Cold, Failure, Fallback, LatestState, ResolveError, ResolverConfig, SourceRef,
    Subject,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::rc::Rc;

#[test]
fn empty_source_resolves_to_configured_default() {
    for default in [None, Some(0), Some(-3)] {
        let config = match default {
            Some(value) => ResolverConfig::new().with_default_value(value),
            None => ResolverConfig::new(),
        };
        let mut host = TestHost::<i32>::with_config(config);

        let value = host.resolver.read(None, Fallback::UseDefault, Fallback::UseDefault);
        assert_eq!(value.unwrap(), default);
        assert_eq!(host.notifications(), 0);
    }
}

#[test]
fn synchronous_value_is_returned_by_the_subscribing_read() {
    for value in [1, 2, 3] {
        let mut host = TestHost::<i32>::new();
        let source = source_ref(Cold::of([value]));

        let read = host.resolver.read(Some(&source), Fallback::value(0), Fallback::UseDefault);
        assert_eq!(read.unwrap(), Some(value));
        assert_eq!(host.notifications(), 0);
    }
}

#[test]
fn error_fallback_changes_without_resubscribing() {
    let mut host = TestHost::<String>::new();
    let cold = Rc::new(Cold::<String>::fail(Failure::payload("boom")));
    let source: SourceRef<String> = cold.clone();

    let x = host
        .resolver
        .read(Some(&source), Fallback::UseDefault, Fallback::value("X".to_string()));
    assert_eq!(x.unwrap().as_deref(), Some("X"));

    let y = host
        .resolver
        .read(Some(&source), Fallback::UseDefault, Fallback::value("Y".to_string()));
    assert_eq!(y.unwrap().as_deref(), Some("Y"));

    assert_eq!(cold.subscription_count(), 1);
}

#[test]
fn sentinel_on_silent_stream_raises_then_returns_absent() {
    let mut host = TestHost::<i32>::new();
    let source = source_ref(Cold::never());

    let first = host.resolver.read(Some(&source), Fallback::Sentinel, Fallback::UseDefault);
    assert!(matches!(first, Err(ResolveError::MissingInitialValue)));

    let second = host.resolver.read(Some(&source), Fallback::Sentinel, Fallback::UseDefault);
    assert_eq!(second.unwrap(), None);
}

#[test]
fn new_instance_of_a_source_gets_a_fresh_subscription() {
    let mut host = TestHost::<i32>::new();
    let first = Subject::new();
    let a1 = source_ref(first.clone());
    let b = source_ref(Subject::new());

    host.resolver.read(Some(&a1), Fallback::UseDefault, Fallback::UseDefault).unwrap();
    first.next(1);
    host.resolver.read(Some(&b), Fallback::UseDefault, Fallback::UseDefault).unwrap();
    first.next(2);
    assert_eq!(host.notifications(), 1);

    // Same underlying stream, new handle: a different source by identity
    let a2 = source_ref(first.clone());
    let read = host.resolver.read(Some(&a2), Fallback::UseDefault, Fallback::UseDefault);
    assert_eq!(read.unwrap(), None);
    assert_eq!(host.resolver.state(), LatestState::Pending);
    assert_eq!(first.subscription_count(), 2);
}

#[test]
fn native_errors_surface_unwrapped() {
    #[derive(Debug, thiserror::Error)]
    #[error("Value is too high!")]
    struct TooHigh;

    let mut host = TestHost::<i32>::new();
    let source = source_ref(Cold::fail(Failure::error(TooHigh)));

    let err = host
        .resolver
        .read(Some(&source), Fallback::UseDefault, Fallback::UseDefault)
        .unwrap_err();

    match err {
        ResolveError::Source(inner) => {
            assert_eq!(inner.to_string(), "Value is too high!");
            assert!(inner.downcast_ref::<TooHigh>().is_some());
        }
        other => panic!("expected pass-through error, got {other:?}"),
    }
}

#[test]
fn classification_failure_is_raised_on_every_switch_to_it() {
    struct Opaque;
    impl AsyncSource<i32> for Opaque {}

    let mut host = TestHost::<i32>::new();
    let bad = source_ref(Opaque);
    let good = source_ref(Cold::of([1]));

    assert!(matches!(
        host.resolver.read(Some(&bad), Fallback::UseDefault, Fallback::UseDefault),
        Err(ResolveError::Classification(_))
    ));
    let read = host.resolver.read(Some(&good), Fallback::UseDefault, Fallback::UseDefault);
    assert_eq!(read.unwrap(), Some(1));
    assert!(matches!(
        host.resolver.read(Some(&bad), Fallback::UseDefault, Fallback::UseDefault),
        Err(ResolveError::Classification(_))
    ));
}

/// Random walk over emissions, reads and switches between a small pool of
/// subjects. The model tracks what the current subscription has seen.
#[test]
fn random_interleaving_matches_model() {
    for seed in 0..20u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut host = TestHost::<u32>::new();
        let pool: Vec<Subject<u32>> = (0..3).map(|_| Subject::new()).collect();

        let mut handle = source_ref(pool[0].clone());
        let mut current = 0usize;
        let mut expected_value: Option<u32> = None;
        let mut expected_notifications = 0usize;
        let mut next_value = 0u32;

        host.resolver.read(Some(&handle), Fallback::UseDefault, Fallback::UseDefault).unwrap();

        for _ in 0..200 {
            match rng.gen_range(0..3) {
                0 => {
                    let target = rng.gen_range(0..pool.len());
                    next_value += 1;
                    pool[target].next(next_value);
                    if target == current {
                        expected_value = Some(next_value);
                        expected_notifications += 1;
                    }
                }
                1 => {
                    let read = host
                        .resolver
                        .read(Some(&handle), Fallback::UseDefault, Fallback::UseDefault)
                        .unwrap();
                    assert_eq!(read, expected_value, "seed {seed}");
                }
                _ => {
                    current = rng.gen_range(0..pool.len());
                    handle = source_ref(pool[current].clone());
                    expected_value = None;
                    let read = host
                        .resolver
                        .read(Some(&handle), Fallback::UseDefault, Fallback::UseDefault)
                        .unwrap();
                    assert_eq!(read, None, "seed {seed}");
                }
            }
            assert_eq!(host.notifications(), expected_notifications, "seed {seed}");
        }

        let active: usize = pool.iter().map(|s| s.observer_count()).sum();
        assert_eq!(active, 1, "seed {seed}");
    }
}
