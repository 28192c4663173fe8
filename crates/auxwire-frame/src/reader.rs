use std::io::{ErrorKind, Read};

use bytes::{Buf, Bytes, BytesMut};
use tracing::{debug, trace};

use crate::codec::{decode, FrameConfig, TERMINATOR};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024;
const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Reads terminator-delimited frames from any `Read` stream.
///
/// Handles partial reads internally: callers always get complete frames,
/// however the stream chunks its bytes.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    /// Prefix of `buf` already known to hold no terminator.
    scanned: usize,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            scanned: 0,
            config,
        }
    }

    /// Read the next encoded frame body, terminator stripped (blocking).
    ///
    /// Returns `Ok(None)` once the stream ends cleanly between frames.
    /// End of stream with a partial frame buffered is
    /// [`FrameError::Truncated`]. Empty bodies produced by back-to-back
    /// terminators are skipped.
    pub fn next_frame(&mut self) -> Result<Option<Bytes>> {
        loop {
            if let Some(body) = self.take_buffered_frame()? {
                return Ok(Some(body));
            }

            if self.buf.len() > self.config.max_frame_size {
                return Err(FrameError::TooLarge {
                    size: self.buf.len(),
                    max: self.config.max_frame_size,
                });
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                if self.buf.is_empty() {
                    debug!("end of stream");
                    return Ok(None);
                }
                return Err(FrameError::Truncated {
                    buffered: self.buf.len(),
                });
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Read and decode the next frame payload (blocking).
    pub fn read_payload(&mut self) -> Result<Option<Bytes>> {
        match self.next_frame()? {
            Some(body) => {
                let mut payload = BytesMut::with_capacity(body.len());
                decode(&body, &mut payload)?;
                Ok(Some(payload.freeze()))
            }
            None => Ok(None),
        }
    }

    /// Iterate over decoded payloads until end of stream or the first error.
    pub fn frames(&mut self) -> Frames<'_, T> {
        Frames {
            reader: self,
            done: false,
        }
    }

    fn take_buffered_frame(&mut self) -> Result<Option<Bytes>> {
        while let Some(offset) = self.buf[self.scanned..]
            .iter()
            .position(|&b| b == TERMINATOR)
        {
            let end = self.scanned + offset;
            let body = self.buf.split_to(end).freeze();
            self.buf.advance(1);
            self.scanned = 0;

            if body.is_empty() {
                trace!("skipping empty frame");
                continue;
            }

            if body.len() > self.config.max_frame_size {
                return Err(FrameError::TooLarge {
                    size: body.len(),
                    max: self.config.max_frame_size,
                });
            }

            trace!(len = body.len(), "frame boundary");
            return Ok(Some(body));
        }

        self.scanned = self.buf.len();
        Ok(None)
    }

    /// Bytes received but not yet returned as part of a frame.
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum frame size for subsequent reads.
    pub fn set_max_frame_size(&mut self, max_frame_size: usize) {
        self.config.max_frame_size = max_frame_size;
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<auxwire_transport::AuxStream> {
    /// Create a frame reader for `AuxStream` and apply read timeout from config.
    pub fn with_config_stream(
        inner: auxwire_transport::AuxStream,
        config: FrameConfig,
    ) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

pub(crate) fn transport_to_frame_error(err: auxwire_transport::TransportError) -> FrameError {
    match err {
        auxwire_transport::TransportError::Io(io)
        | auxwire_transport::TransportError::Accept(io) => FrameError::Io(io),
        auxwire_transport::TransportError::Bind { source, .. }
        | auxwire_transport::TransportError::Connect { source, .. }
        | auxwire_transport::TransportError::Open { source, .. } => FrameError::Io(source),
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}

/// Lazy sequence of decoded payloads; see [`FrameReader::frames`].
///
/// Yields at most one error, after which it is exhausted.
pub struct Frames<'a, T> {
    reader: &'a mut FrameReader<T>,
    done: bool,
}

impl<T: Read> Iterator for Frames<'_, T> {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_payload() {
            Ok(Some(payload)) => Some(Ok(payload)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl<T: Read> std::iter::FusedIterator for Frames<'_, T> {}
