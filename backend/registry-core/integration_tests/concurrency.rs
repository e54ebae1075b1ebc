use crate::helpers::{FakeProbe, LiveProcess, TestHome, default_config, identity};

use registry_core::{ServerLifecycle, StartOutcome};

use std::collections::BTreeSet;
use std::sync::{Arc, Barrier};
use std::thread;

const CONTENDERS: usize = 8;

/// **VALUE**: Simultaneous starts for distinct projects get distinct ports and
/// every one of them is recorded.
///
/// **WHY THIS MATTERS**: Editors and agents often launch several project servers
/// at once. Each uses its own handle on the lock file, exactly as separate
/// processes would.
///
/// **BUG THIS CATCHES**: Would catch the allocate step running outside the lock,
/// or a lost update where two writers both read the old file and the last rename
/// wins.
#[test]
fn given_concurrent_starts_for_distinct_projects_then_ports_are_unique() {
    // GIVEN: One live pid per contender and a shared home
    let home = TestHome::new();
    let owners: Vec<LiveProcess> = (0..CONTENDERS).map(|_| LiveProcess::spawn()).collect();
    let barrier = Arc::new(Barrier::new(CONTENDERS));

    // WHEN: All start at once
    let handles: Vec<_> = owners
        .iter()
        .enumerate()
        .map(|(index, owner)| {
            let store = home.store();
            let pid = owner.pid();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let lifecycle =
                    ServerLifecycle::with_probe(store, &default_config(), FakeProbe::default());
                barrier.wait();
                match lifecycle.start(&identity(&format!("project-{index}")), pid) {
                    Ok(StartOutcome::Registered(registration)) => {
                        let port = registration.port();
                        // Keep the entry; the registry is inspected below.
                        std::mem::forget(registration);
                        port
                    }
                    other => panic!("expected registration, got {other:?}"),
                }
            })
        })
        .collect();

    let ports: Vec<u16> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // THEN: Unique ports, all in range, all recorded
    let unique: BTreeSet<u16> = ports.iter().copied().collect();
    assert_eq!(unique.len(), CONTENDERS);
    assert!(unique.iter().all(|p| (8070..=8169).contains(p)));

    let stored = home.store().load().unwrap();
    assert_eq!(stored.len(), CONTENDERS);
    assert_eq!(stored.claimed_ports(), unique);
}

/// **VALUE**: Simultaneous starts for the same database produce one owner.
///
/// **BUG THIS CATCHES**: Would catch the reuse check and the insert happening in
/// separate critical sections.
#[test]
fn given_concurrent_starts_for_same_project_then_exactly_one_registers() {
    let home = TestHome::new();
    let owners: Vec<LiveProcess> = (0..CONTENDERS).map(|_| LiveProcess::spawn()).collect();
    let barrier = Arc::new(Barrier::new(CONTENDERS));

    let handles: Vec<_> = owners
        .iter()
        .map(|owner| {
            let store = home.store();
            let pid = owner.pid();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let lifecycle =
                    ServerLifecycle::with_probe(store, &default_config(), FakeProbe::default());
                barrier.wait();
                match lifecycle.start(&identity("shared"), pid).unwrap() {
                    StartOutcome::Registered(registration) => {
                        std::mem::forget(registration);
                        true
                    }
                    StartOutcome::ReusingExisting(_) => false,
                }
            })
        })
        .collect();

    let registered = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|&r| r)
        .count();

    assert_eq!(registered, 1);
    assert_eq!(home.store().load().unwrap().len(), 1);
}
