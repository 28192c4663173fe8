use std::io;

use auxwire_frame::{FrameError, MalformedReason};
use auxwire_proto::ProtoError;

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A received frame body is not valid COBS.
    #[error("malformed frame ({len} bytes): {reason} at offset {offset}")]
    MalformedFrame {
        len: usize,
        offset: usize,
        reason: MalformedReason,
    },

    /// A frame decoded cleanly but its payload is not a valid message.
    #[error("failed to parse {len}-byte payload: {source}")]
    ParseFailed {
        len: usize,
        #[source]
        source: ProtoError,
    },

    /// The input ended in the middle of a frame.
    #[error("stream ended inside a frame ({buffered} bytes buffered)")]
    TruncatedFrame { buffered: usize },

    /// A frame exceeds the configured maximum.
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// The input stream failed.
    #[error("read failed: {0}")]
    ReadFailed(#[source] io::Error),

    /// The output stream rejected a frame.
    #[error("write of {len}-byte payload failed: {source}")]
    WriteFailed {
        len: usize,
        #[source]
        source: io::Error,
    },

    /// The send half failed earlier and accepts no more messages.
    #[error("session closed")]
    Closed,

    /// A duty cycle that cannot be mapped onto the device range.
    #[error("invalid duty cycle {0}: expected a number in [0, 1]")]
    InvalidDuty(f64),

    /// An outbound message could not be serialized.
    #[error("failed to serialize message: {0}")]
    Serialize(#[source] ProtoError),

    /// Connection setup failed.
    #[error("transport error: {0}")]
    Transport(#[from] auxwire_transport::TransportError),
}

impl SessionError {
    /// Whether the error comes from the link itself rather than from
    /// message content or caller input.
    pub fn is_transport(&self) -> bool {
        !matches!(
            self,
            Self::ParseFailed { .. } | Self::InvalidDuty(_) | Self::Serialize(_)
        )
    }

    pub(crate) fn from_read(err: FrameError) -> Self {
        match err {
            FrameError::Malformed {
                len,
                offset,
                reason,
            } => Self::MalformedFrame {
                len,
                offset,
                reason,
            },
            FrameError::Truncated { buffered } => Self::TruncatedFrame { buffered },
            FrameError::TooLarge { size, max } => Self::FrameTooLarge { size, max },
            FrameError::Io(source) => Self::ReadFailed(source),
            FrameError::ConnectionClosed => {
                Self::ReadFailed(io::Error::from(io::ErrorKind::UnexpectedEof))
            }
        }
    }

    pub(crate) fn from_write(len: usize, err: FrameError) -> Self {
        match err {
            FrameError::TooLarge { size, max } => Self::FrameTooLarge { size, max },
            FrameError::Io(source) => Self::WriteFailed { len, source },
            FrameError::ConnectionClosed => Self::WriteFailed {
                len,
                source: io::Error::from(io::ErrorKind::WriteZero),
            },
            other => Self::WriteFailed {
                len,
                source: io::Error::other(other.to_string()),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
