use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, MalformedReason, Result};

/// Frame delimiter. Never present in encoded output.
pub const TERMINATOR: u8 = 0x00;

/// Default maximum encoded frame size (terminator excluded): 64 KiB.
pub const DEFAULT_MAX_FRAME: usize = 64 * 1024;

/// Longest run of non-zero bytes a single block can carry.
const MAX_RUN: usize = 254;

/// Block code announcing a full run with no implied zero after it.
const FULL_BLOCK: u8 = 0xFF;

/// Upper bound on `encode` output length for a payload of `len` bytes.
///
/// One code byte per started block: at most `len / 254 + 1` of them.
pub const fn max_encoded_len(len: usize) -> usize {
    len + len / MAX_RUN + 1
}

/// COBS-encode `payload`, appending to `dst`.
///
/// The output never contains [`TERMINATOR`]. The terminator itself is not
/// appended; use [`encode_frame`] for a complete wire frame.
///
/// ```text
/// payload: 11 22 00 33
/// encoded: 03 11 22 02 33
///          ^code       ^code (implied zero between the blocks)
/// ```
pub fn encode(payload: &[u8], dst: &mut BytesMut) {
    dst.reserve(max_encoded_len(payload.len()));

    let mut code_at = dst.len();
    dst.put_u8(0);
    let mut code: u8 = 1;

    for (i, &byte) in payload.iter().enumerate() {
        if byte == TERMINATOR {
            dst[code_at] = code;
            code_at = dst.len();
            dst.put_u8(0);
            code = 1;
            continue;
        }

        dst.put_u8(byte);
        code += 1;

        if code == FULL_BLOCK {
            dst[code_at] = code;
            if i + 1 == payload.len() {
                return;
            }
            code_at = dst.len();
            dst.put_u8(0);
            code = 1;
        }
    }

    dst[code_at] = code;
}

/// COBS-encode `payload` and append the terminator.
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) {
    encode(payload, dst);
    dst.put_u8(TERMINATOR);
}

/// Convenience wrapper returning a fresh buffer.
pub fn encode_to_vec(payload: &[u8]) -> Vec<u8> {
    let mut dst = BytesMut::with_capacity(max_encoded_len(payload.len()));
    encode(payload, &mut dst);
    dst.to_vec()
}

/// Decode a COBS frame body (terminator already stripped), appending to `dst`.
///
/// On error nothing is appended to `dst`.
pub fn decode(body: &[u8], dst: &mut BytesMut) -> Result<()> {
    let start_len = dst.len();
    let result = decode_blocks(body, dst);
    if result.is_err() {
        dst.truncate(start_len);
    }
    result
}

fn decode_blocks(body: &[u8], dst: &mut BytesMut) -> Result<()> {
    let malformed = |offset, reason| FrameError::Malformed {
        len: body.len(),
        offset,
        reason,
    };

    if body.is_empty() {
        return Err(malformed(0, MalformedReason::Empty));
    }

    dst.reserve(body.len());
    let mut pos = 0usize;
    let mut after_full_block = false;

    while pos < body.len() {
        let code = body[pos];
        if code == TERMINATOR {
            return Err(malformed(pos, MalformedReason::ZeroByte));
        }
        // The encoder stops right after a full block that ends the payload.
        if code == 1 && after_full_block && pos + 1 == body.len() {
            return Err(malformed(pos, MalformedReason::NonCanonical));
        }
        after_full_block = code == FULL_BLOCK;

        let start = pos + 1;
        let end = start + usize::from(code) - 1;
        if end > body.len() {
            return Err(malformed(pos, MalformedReason::BlockOverrun { code }));
        }

        let run = &body[start..end];
        if let Some(zero) = run.iter().position(|&b| b == TERMINATOR) {
            return Err(malformed(start + zero, MalformedReason::ZeroByte));
        }

        dst.put_slice(run);
        pos = end;

        if code != FULL_BLOCK && pos < body.len() {
            dst.put_u8(0);
        }
    }

    Ok(())
}

/// Convenience wrapper returning a fresh buffer.
pub fn decode_to_vec(body: &[u8]) -> Result<Vec<u8>> {
    let mut dst = BytesMut::with_capacity(body.len());
    decode(body, &mut dst)?;
    Ok(dst.to_vec())
}

/// Configuration for frame readers and writers.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum encoded frame size in bytes, terminator excluded. Default: 64 KiB.
    pub max_frame_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
