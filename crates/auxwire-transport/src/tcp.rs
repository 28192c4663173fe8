use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::AuxStream;

/// Connect to a controller listening on TCP (blocking).
pub fn connect(addr: impl ToSocketAddrs + std::fmt::Display) -> Result<AuxStream> {
    let stream = TcpStream::connect(&addr).map_err(|e| TransportError::Connect {
        addr: addr.to_string(),
        source: e,
    })?;
    debug!(%addr, "connected to controller");
    Ok(AuxStream::from_tcp(stream))
}

/// TCP listener that accepts controller-side connections.
///
/// Used by device simulators and tests; the host side normally only dials.
pub struct TcpDeviceListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpDeviceListener {
    /// Bind and listen on `addr`. Port `0` picks an ephemeral port.
    pub fn bind(addr: impl ToSocketAddrs + std::fmt::Display) -> Result<Self> {
        let listener = TcpListener::bind(&addr).map_err(|e| TransportError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;
        let local_addr = listener.local_addr().map_err(|e| TransportError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;

        info!(%local_addr, "listening for controller connections");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<AuxStream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer, "accepted connection");
        Ok(AuxStream::from_tcp(stream))
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "tcp"
    }
}
