use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::stream::AuxStream;

/// Longest a blocked serial read or write waits before re-checking whether
/// the link was shut down.
const SHUTDOWN_POLL: Duration = Duration::from_millis(50);

/// Open a serial device node (e.g. `/dev/ttyACM0`) for reading and writing.
///
/// Line settings (baud rate, parity, raw mode) are left as configured by the
/// OS or by `stty`; CDC-ACM gadgets ignore them anyway.
pub fn open(path: impl AsRef<Path>) -> Result<AuxStream> {
    let path = path.as_ref();
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|e| TransportError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;
    debug!(?path, "opened serial device");
    Ok(AuxStream::from_serial(file, path))
}

/// Timeouts and shutdown flag shared by every clone of one serial link.
///
/// Device nodes have no socket options, so reads and writes wait in `poll`
/// and consult this state instead.
#[derive(Debug, Default)]
pub(crate) struct SerialState {
    closed: AtomicBool,
    read_timeout: Mutex<Option<Duration>>,
    write_timeout: Mutex<Option<Duration>>,
}

impl SerialState {
    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn set_timeout(&self, direction: Direction, timeout: Option<Duration>) {
        *self.slot(direction).lock().unwrap_or_else(PoisonError::into_inner) = timeout;
    }

    fn timeout(&self, direction: Direction) -> Option<Duration> {
        *self.slot(direction).lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, direction: Direction) -> &Mutex<Option<Duration>> {
        match direction {
            Direction::Read => &self.read_timeout,
            Direction::Write => &self.write_timeout,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Read,
    Write,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Readiness {
    Ready,
    Closed,
}

/// Wait until `file` is ready for `direction` or the link is shut down.
///
/// An expired timeout is reported as `WouldBlock`, the same kind a TCP
/// socket returns for its read and write timeouts.
pub(crate) fn wait_ready(
    file: &File,
    state: &SerialState,
    direction: Direction,
) -> io::Result<Readiness> {
    let deadline = state.timeout(direction).map(|t| Instant::now() + t);
    loop {
        if state.is_closed() {
            return Ok(Readiness::Closed);
        }

        let wait = match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Err(io::Error::new(
                        io::ErrorKind::WouldBlock,
                        format!("serial {direction} timed out"),
                    ));
                }
                remaining.min(SHUTDOWN_POLL)
            }
            None => SHUTDOWN_POLL,
        };

        if poll_once(file, direction, wait)? {
            return Ok(if state.is_closed() {
                Readiness::Closed
            } else {
                Readiness::Ready
            });
        }
    }
}

#[cfg(unix)]
fn poll_once(file: &File, direction: Direction, wait: Duration) -> io::Result<bool> {
    use std::os::fd::AsRawFd;

    let events = match direction {
        Direction::Read => libc::POLLIN,
        Direction::Write => libc::POLLOUT,
    };
    let mut pfd = libc::pollfd {
        fd: file.as_raw_fd(),
        events,
        revents: 0,
    };
    let millis = libc::c_int::try_from(wait.as_millis().max(1)).unwrap_or(libc::c_int::MAX);

    // SAFETY: `pfd` is a single valid pollfd that outlives the call, and its
    // descriptor is owned by `file`.
    let rc = unsafe { libc::poll(&mut pfd, 1, millis) };
    if rc < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(false);
        }
        return Err(err);
    }
    // POLLHUP/POLLERR count as ready: the following read or write reports them.
    Ok(rc > 0)
}

#[cfg(not(unix))]
fn poll_once(_file: &File, _direction: Direction, _wait: Duration) -> io::Result<bool> {
    Ok(true)
}
