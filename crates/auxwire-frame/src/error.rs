/// Why a frame body could not have been produced by the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MalformedReason {
    /// The encoder never emits an empty body.
    #[error("empty frame body")]
    Empty,

    /// A terminator byte appeared inside the body.
    #[error("unexpected terminator byte")]
    ZeroByte,

    /// A block length marker points past the end of the body.
    #[error("block code {code:#04x} runs past end of body")]
    BlockOverrun { code: u8 },

    /// An empty final block after a full block; the encoder never emits one.
    #[error("empty trailing block after a full block")]
    NonCanonical,
}

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame body is not valid COBS.
    #[error("malformed frame ({len} bytes): {reason} at offset {offset}")]
    Malformed {
        len: usize,
        offset: usize,
        reason: MalformedReason,
    },

    /// The stream ended after a partial frame with no terminator.
    #[error("stream ended mid-frame ({buffered} bytes buffered without terminator)")]
    Truncated { buffered: usize },

    /// More bytes than allowed arrived before a terminator, or an outbound
    /// payload would encode past the limit.
    #[error("frame too large ({size} bytes, max {max})")]
    TooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream accepted zero bytes of a frame write.
    #[error("connection closed (write accepted no bytes)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
