use crate::helpers::{FailingProbe, FakeProbe, entry};

use registry_core::error::LifecycleError;
use registry_core::{PortAllocator, PortRange};

use models::Registry;

/// **VALUE**: Allocation skips both registry claims and ports bound by strangers.
///
/// **WHY THIS MATTERS**: A port recorded for a live server may not be bound yet
/// (it is between registration and bind), so the registry alone is not enough;
/// an unrelated program may hold a port nobody recorded, so probing alone is
/// not enough either.
///
/// **BUG THIS CATCHES**: Would catch dropping either check and handing out 8070
/// or 8071 twice.
#[test]
fn given_claimed_and_bound_ports_when_allocating_then_returns_next_free() {
    // GIVEN: 8070 recorded, 8071 bound by something else
    let registry = Registry::new(vec![entry("alpha", 8070, 10)]);
    let probe = FakeProbe::occupied(&[8071]);
    let allocator = PortAllocator::with_probe(PortRange::above(8069, 100), &probe);

    // WHEN
    let port = allocator.allocate(&registry).unwrap();

    // THEN: 8072, and the claimed port was never probed
    assert_eq!(port, 8072);
    assert_eq!(probe.probed(), vec![8071, 8072]);
}

/// **VALUE**: Live servers on 8070 and 8071 push the next start to 8072, or to
/// 8073 when something outside the registry already holds 8072.
///
/// **WHY THIS MATTERS**: This is the everyday layout: a couple of projects running
/// and an unrelated program squatting on a port in the range.
#[test]
fn given_servers_on_first_two_ports_when_allocating_then_skips_to_next_free() {
    // GIVEN: Entries on 8070 and 8071
    let registry = Registry::new(vec![entry("alpha", 8070, 10), entry("beta", 8071, 11)]);
    let range = PortRange::above(8069, 100);

    // WHEN: 8072 is free
    let free = PortAllocator::with_probe(range, FakeProbe::default());

    // THEN
    assert_eq!(free.allocate(&registry).unwrap(), 8072);

    // WHEN: 8072 is bound by an untracked process
    let squatted = PortAllocator::with_probe(range, FakeProbe::occupied(&[8072]));

    // THEN
    assert_eq!(squatted.allocate(&registry).unwrap(), 8073);
}

#[test]
fn given_empty_registry_when_allocating_then_returns_first_port_above_dashboard() {
    let allocator = PortAllocator::with_probe(PortRange::above(8069, 100), FakeProbe::default());

    assert_eq!(allocator.allocate(&Registry::default()).unwrap(), 8070);
}

/// **BUG THIS CATCHES**: Would catch a stray registry entry on the dashboard port
/// making the allocator think the range starts there.
#[test]
fn given_entry_on_dashboard_port_when_allocating_then_never_returns_it() {
    let registry = Registry::new(vec![entry("dash", 8069, 10)]);
    let allocator = PortAllocator::with_probe(PortRange::above(8069, 3), FakeProbe::default());

    let port = allocator.allocate(&registry).unwrap();

    assert_eq!(port, 8070);
    assert!(!allocator.range().contains(8069));
}

#[test]
fn given_every_port_taken_when_allocating_then_returns_port_exhausted() {
    // GIVEN: Range of three, one claimed, two bound
    let registry = Registry::new(vec![entry("alpha", 8070, 10)]);
    let probe = FakeProbe::occupied(&[8071, 8072]);
    let allocator = PortAllocator::with_probe(PortRange::above(8069, 3), &probe);

    // WHEN
    let result = allocator.allocate(&registry);

    // THEN
    match result {
        Err(LifecycleError::PortExhausted { first, last, .. }) => {
            assert_eq!((first, last), (8070, 8072));
        }
        other => panic!("expected PortExhausted, got {other:?}"),
    }
}

#[test]
fn given_probe_failure_when_allocating_then_propagates_discovery_error() {
    let allocator = PortAllocator::with_probe(PortRange::above(8069, 3), FailingProbe);

    let result = allocator.allocate(&Registry::default());

    assert!(matches!(result, Err(LifecycleError::Discovery(_))));
}

#[test]
fn given_range_at_top_of_port_space_when_built_then_saturates() {
    let range = PortRange::above(65_534, 10);

    assert_eq!(range.first(), 65_535);
    assert_eq!(range.last(), 65_535);
}
