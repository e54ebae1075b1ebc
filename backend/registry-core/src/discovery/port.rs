use crate::BIND_ADDRESS;
use crate::discovery::process::{format_command, with_process};
use crate::error::DiscoveryError;

use common::ErrorLocation;

use std::io::ErrorKind;
use std::net::TcpListener;
use std::panic::Location;

use log::{debug, trace};
use netstat2::{
    AddressFamilyFlags, ProtocolFlags, ProtocolSocketInfo, SocketInfo, TcpState, get_sockets_info,
};
use serde::Serialize;

/// Answers whether a TCP port can be bound right now.
pub trait PortProbe {
    /// `Ok(false)` when the port is in use, `Err` for any other bind failure.
    fn is_free(&self, port: u16) -> Result<bool, DiscoveryError>;
}

/// Probes by binding a listener on the wildcard address and dropping it.
///
/// This is a point-in-time answer: another process may take the port before
/// the caller binds it.
#[derive(Debug, Clone, Copy, Default)]
pub struct BindProbe;

impl PortProbe for BindProbe {
    #[track_caller]
    fn is_free(&self, port: u16) -> Result<bool, DiscoveryError> {
        match TcpListener::bind((BIND_ADDRESS, port)) {
            Ok(listener) => {
                drop(listener);
                trace!("Port {port} is free");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::AddrInUse => {
                trace!("Port {port} is in use");
                Ok(false)
            }
            Err(e) => Err(DiscoveryError::Bind {
                port,
                location: ErrorLocation::from(Location::caller()),
                source: e,
            }),
        }
    }
}

impl<P: PortProbe + ?Sized> PortProbe for &P {
    fn is_free(&self, port: u16) -> Result<bool, DiscoveryError> {
        (**self).is_free(port)
    }
}

/// The process listening on a port, as reported by the OS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortOwner {
    pub pid: u32,
    pub name: String,
    pub command: String,
}

impl PortOwner {
    /// Whether the owner looks like another TodoTracker process.
    pub fn is_todotracker(&self, binary: &str) -> bool {
        self.name.contains(binary) || self.command.contains(binary)
    }
}

impl std::fmt::Display for PortOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (PID {})", self.name, self.pid)
    }
}

#[track_caller]
fn query_tcp_sockets() -> Result<Vec<SocketInfo>, DiscoveryError> {
    get_sockets_info(
        AddressFamilyFlags::IPV4 | AddressFamilyFlags::IPV6,
        ProtocolFlags::TCP,
    )
    .map_err(|e| DiscoveryError::NetworkQuery {
        message: format!("Failed to query network sockets: {e}"),
        location: ErrorLocation::from(Location::caller()),
        source: Box::new(e),
    })
}

/// Find the process listening on `port`, if any.
///
/// # Returns
///
/// * `Ok(Some(PortOwner))` - If a listening socket with a known owner exists
/// * `Ok(None)` - If nothing listens there or the owner already exited
/// * `Err(DiscoveryError)` - If the socket table cannot be read
#[track_caller]
pub fn port_owner(port: u16) -> Result<Option<PortOwner>, DiscoveryError> {
    let sockets = query_tcp_sockets()?;

    for s in sockets {
        if let ProtocolSocketInfo::Tcp(tcp) = s.protocol_socket_info
            && tcp.state == TcpState::Listen
            && tcp.local_port == port
            && let Some(&pid) = s.associated_pids.first()
        {
            trace!("Found process {pid} listening on port {port}");

            let data = with_process(pid, |p| {
                (p.name().to_string_lossy().to_string(), format_command(p))
            });

            if let Some((name, command)) = data {
                debug!("Port {port} is owned by {name} (PID: {pid})");
                return Ok(Some(PortOwner { pid, name, command }));
            }

            trace!("Process {pid} disappeared before we could read its info");
        }
    }

    debug!("No process found listening on port {port}");
    Ok(None)
}
