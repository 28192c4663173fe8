//! COBS message framing for controller links.
//!
//! This is the core layer of auxwire. Every message travels as:
//! - its payload, COBS-encoded so that it contains no `0x00` byte
//! - a single `0x00` terminator
//!
//! Receivers find frame boundaries with a byte scan for the terminator, so no
//! length prefix is needed. A body that fails to decode is reported to the
//! caller; nothing is skipped. No partial reads, no buffer management in
//! user code.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

pub use codec::{
    decode, decode_to_vec, encode, encode_frame, encode_to_vec, max_encoded_len, FrameConfig,
    DEFAULT_MAX_FRAME, TERMINATOR,
};
pub use error::{FrameError, MalformedReason, Result};
pub use reader::{FrameReader, Frames};
pub use writer::FrameWriter;

#[cfg(feature = "async")]
pub use async_codec::CobsCodec;
