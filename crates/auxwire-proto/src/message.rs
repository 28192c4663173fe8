use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;

use crate::error::{ProtoError, Result};

/// A value that travels as one frame payload.
///
/// `parse` is strict: the whole payload must be consumed by exactly one
/// value, otherwise the bytes are rejected.
pub trait Message: Sized {
    /// Short name used in error messages and logs.
    const KIND: &'static str;

    /// Serialize into a fresh payload.
    fn serialize(&self) -> Result<Vec<u8>>;

    /// Parse a complete payload.
    fn parse(bytes: &[u8]) -> Result<Self>;
}

pub(crate) fn to_payload<T: Serialize>(kind: &'static str, value: &T) -> Result<Vec<u8>> {
    postcard::to_allocvec(value).map_err(|source| ProtoError::Encode { kind, source })
}

pub(crate) fn from_payload<T: DeserializeOwned>(kind: &'static str, bytes: &[u8]) -> Result<T> {
    let (value, rest) =
        postcard::take_from_bytes::<T>(bytes).map_err(|source| ProtoError::Decode {
            kind,
            len: bytes.len(),
            source,
        })?;

    if !rest.is_empty() {
        trace!(kind, trailing = rest.len(), "rejecting trailing bytes");
        return Err(ProtoError::TrailingBytes {
            kind,
            len: bytes.len(),
            trailing: rest.len(),
        });
    }

    Ok(value)
}
