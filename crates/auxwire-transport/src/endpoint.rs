use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Result, TransportError};
use crate::stream::AuxStream;

/// Address the controller firmware listens on over its USB-ethernet link.
pub const DEFAULT_TCP_ADDR: &str = "10.0.0.1:1338";

/// Where a controller can be reached.
///
/// Accepted forms:
/// - `tcp://host:port` or bare `host:port`
/// - `serial:///dev/ttyACM0` or a bare path starting with `/dev/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Tcp(String),
    Serial(PathBuf),
}

impl Endpoint {
    /// Open a blocking stream to this endpoint.
    pub fn open(&self) -> Result<AuxStream> {
        match self {
            Endpoint::Tcp(addr) => crate::tcp::connect(addr.as_str()),
            Endpoint::Serial(path) => crate::serial::open(path),
        }
    }

    /// Open a tokio stream to this endpoint.
    #[cfg(feature = "async")]
    pub async fn open_async(&self) -> Result<crate::async_stream::AsyncAuxStream> {
        crate::async_stream::AsyncAuxStream::open(self).await
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Endpoint::Tcp(DEFAULT_TCP_ADDR.to_string())
    }
}

impl FromStr for Endpoint {
    type Err = TransportError;

    fn from_str(input: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = input.trim();
        let invalid = |reason| TransportError::InvalidEndpoint {
            input: input.to_string(),
            reason,
        };

        if trimmed.is_empty() {
            return Err(invalid("endpoint must not be empty"));
        }

        if let Some(path) = trimmed.strip_prefix("serial://") {
            if path.is_empty() {
                return Err(invalid("serial endpoint needs a device path"));
            }
            return Ok(Endpoint::Serial(PathBuf::from(path)));
        }

        if trimmed.starts_with("/dev/") {
            return Ok(Endpoint::Serial(PathBuf::from(trimmed)));
        }

        let addr = trimmed.strip_prefix("tcp://").unwrap_or(trimmed);
        match addr.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() => {
                port.parse::<u16>()
                    .map_err(|_| invalid("tcp port must be a number between 0 and 65535"))?;
                Ok(Endpoint::Tcp(addr.to_string()))
            }
            _ => Err(invalid("expected host:port, tcp://host:port or serial://path")),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Tcp(addr) => write!(f, "tcp://{addr}"),
            Endpoint::Serial(path) => write!(f, "serial://{}", path.display()),
        }
    }
}
