use crate::discovery::port::{BindProbe, PortProbe, port_owner};
use crate::error::LifecycleError;

use common::ErrorLocation;
use models::Registry;

use std::ops::RangeInclusive;
use std::panic::Location;

use log::{debug, trace};

/// Ports handed out to project servers: everything above the dashboard port
/// up to `dashboard_port + span`, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    dashboard_port: u16,
    first: u16,
    last: u16,
}

impl PortRange {
    pub fn above(dashboard_port: u16, span: u16) -> Self {
        Self {
            dashboard_port,
            first: dashboard_port.saturating_add(1),
            last: dashboard_port.saturating_add(span),
        }
    }

    pub fn dashboard_port(&self) -> u16 {
        self.dashboard_port
    }

    pub fn first(&self) -> u16 {
        self.first
    }

    pub fn last(&self) -> u16 {
        self.last
    }

    pub fn contains(&self, port: u16) -> bool {
        self.ports().contains(&port)
    }

    pub fn ports(&self) -> RangeInclusive<u16> {
        self.first..=self.last
    }
}

/// Picks the lowest port that is neither recorded in the registry nor bound
/// by anyone else.
#[derive(Debug, Clone)]
pub struct PortAllocator<P = BindProbe> {
    range: PortRange,
    probe: P,
}

impl PortAllocator<BindProbe> {
    pub fn new(range: PortRange) -> Self {
        Self::with_probe(range, BindProbe)
    }
}

impl<P: PortProbe> PortAllocator<P> {
    pub fn with_probe(range: PortRange, probe: P) -> Self {
        Self { range, probe }
    }

    pub fn range(&self) -> PortRange {
        self.range
    }

    /// Lowest free port in the range.
    ///
    /// `registry` should already be swept so ports of dead servers can be
    /// reused. Call this with the registry lock held; the answer is only
    /// good until the lock is released.
    ///
    /// # Errors
    ///
    /// * `LifecycleError::PortExhausted` - every port is claimed or bound
    /// * `LifecycleError::Discovery` - the probe hit something other than "in use"
    #[track_caller]
    pub fn allocate(&self, registry: &Registry) -> Result<u16, LifecycleError> {
        let claimed = registry.claimed_ports();

        for port in self.range.ports() {
            if port == self.range.dashboard_port || claimed.contains(&port) {
                trace!("Port {port} is claimed in the registry");
                continue;
            }

            if self.probe.is_free(port)? {
                debug!("Allocated port {port}");
                return Ok(port);
            }

            match port_owner(port) {
                Ok(Some(owner)) => debug!("Port {port} is held outside the registry by {owner}"),
                _ => debug!("Port {port} is held outside the registry"),
            }
        }

        Err(LifecycleError::PortExhausted {
            first: self.range.first,
            last: self.range.last,
            location: ErrorLocation::from(Location::caller()),
        })
    }
}
