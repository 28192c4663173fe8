use std::fs::File;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::Result;
use crate::serial::{wait_ready, Direction, Readiness, SerialState};

/// A connected controller link. Implements `Read` and `Write`.
///
/// This is the fundamental I/O type returned by transport operations.
/// TCP links wrap a `TcpStream`; serial links wrap the opened device node.
pub struct AuxStream {
    inner: AuxStreamInner,
}

enum AuxStreamInner {
    Tcp(TcpStream),
    Serial {
        file: File,
        path: PathBuf,
        state: Arc<SerialState>,
    },
}

impl Read for AuxStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            AuxStreamInner::Tcp(stream) => stream.read(buf),
            AuxStreamInner::Serial { file, state, .. } => {
                match wait_ready(file, state, Direction::Read)? {
                    Readiness::Ready => file.read(buf),
                    Readiness::Closed => Ok(0),
                }
            }
        }
    }
}

impl Write for AuxStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            AuxStreamInner::Tcp(stream) => stream.write(buf),
            AuxStreamInner::Serial { file, state, .. } => {
                match wait_ready(file, state, Direction::Write)? {
                    Readiness::Ready => file.write(buf),
                    Readiness::Closed => Err(io::Error::new(
                        io::ErrorKind::BrokenPipe,
                        "serial link shut down",
                    )),
                }
            }
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            AuxStreamInner::Tcp(stream) => stream.flush(),
            AuxStreamInner::Serial { file, .. } => file.flush(),
        }
    }
}

impl AuxStream {
    /// Wrap a connected TCP stream.
    ///
    /// Nagle is disabled: frames are small and latency-sensitive.
    pub fn from_tcp(stream: TcpStream) -> Self {
        if let Err(err) = stream.set_nodelay(true) {
            debug!(error = %err, "could not disable nagle");
        }
        Self {
            inner: AuxStreamInner::Tcp(stream),
        }
    }

    /// Wrap an opened serial device node.
    pub fn from_serial(file: File, path: impl Into<PathBuf>) -> Self {
        Self {
            inner: AuxStreamInner::Serial {
                file,
                path: path.into(),
                state: Arc::default(),
            },
        }
    }

    /// Set read timeout on the underlying stream.
    ///
    /// Applies to every clone of the link. An expired timeout surfaces as
    /// `WouldBlock` on both transports.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            AuxStreamInner::Tcp(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
            AuxStreamInner::Serial { state, .. } => {
                reject_zero(timeout)?;
                state.set_timeout(Direction::Read, timeout);
                Ok(())
            }
        }
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            AuxStreamInner::Tcp(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
            AuxStreamInner::Serial { state, .. } => {
                reject_zero(timeout)?;
                state.set_timeout(Direction::Write, timeout);
                Ok(())
            }
        }
    }

    /// Try to clone this stream (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            AuxStreamInner::Tcp(stream) => Ok(Self {
                inner: AuxStreamInner::Tcp(stream.try_clone()?),
            }),
            AuxStreamInner::Serial { file, path, state } => Ok(Self {
                inner: AuxStreamInner::Serial {
                    file: file.try_clone()?,
                    path: path.clone(),
                    state: Arc::clone(state),
                },
            }),
        }
    }

    /// Close both directions of the link.
    ///
    /// Any thread parked in `read` on a clone of this stream wakes up and
    /// observes end-of-stream; later writes fail. Serial device nodes have no
    /// half-close, so the clones share a flag that blocked reads poll for.
    /// The descriptor itself is released when the last clone is dropped.
    pub fn shutdown(&self) -> Result<()> {
        match &self.inner {
            AuxStreamInner::Tcp(stream) => match stream.shutdown(Shutdown::Both) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
                Err(err) => Err(err.into()),
            },
            AuxStreamInner::Serial { path, state, .. } => {
                debug!(?path, "serial link shut down");
                state.close();
                Ok(())
            }
        }
    }

    /// Human-readable description of the remote side.
    pub fn peer_label(&self) -> String {
        match &self.inner {
            AuxStreamInner::Tcp(stream) => stream
                .peer_addr()
                .map(|addr| format!("tcp://{addr}"))
                .unwrap_or_else(|_| "tcp://<unknown>".to_string()),
            AuxStreamInner::Serial { path, .. } => format!("serial://{}", path.display()),
        }
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        match &self.inner {
            AuxStreamInner::Tcp(_) => "tcp",
            AuxStreamInner::Serial { .. } => "serial",
        }
    }
}

fn reject_zero(timeout: Option<Duration>) -> io::Result<()> {
    if timeout == Some(Duration::ZERO) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "cannot set a 0 duration timeout",
        ));
    }
    Ok(())
}

impl std::fmt::Debug for AuxStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            AuxStreamInner::Tcp(_) => f.debug_struct("AuxStream").field("type", &"tcp").finish(),
            AuxStreamInner::Serial { path, .. } => f
                .debug_struct("AuxStream")
                .field("type", &"serial")
                .field("path", path)
                .finish(),
        }
    }
}
