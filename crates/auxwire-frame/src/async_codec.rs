//! `tokio_util::codec` adapter for COBS frames.
//!
//! Same rules as [`FrameReader`](crate::FrameReader): empty bodies are
//! skipped, oversized input fails with `TooLarge`, and end of stream with a
//! partial frame buffered fails with `Truncated`.

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::codec::{decode, encode_frame, max_encoded_len, FrameConfig, TERMINATOR};
use crate::error::FrameError;

/// Decodes terminator-delimited COBS frames into payloads and encodes
/// payloads into frames.
#[derive(Debug, Clone)]
pub struct CobsCodec {
    max_frame_size: usize,
    /// Prefix of the decode buffer already known to hold no terminator.
    scanned: usize,
}

impl CobsCodec {
    pub fn new() -> Self {
        Self::with_config(&FrameConfig::default())
    }

    pub fn with_config(config: &FrameConfig) -> Self {
        Self {
            max_frame_size: config.max_frame_size,
            scanned: 0,
        }
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl Default for CobsCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for CobsCodec {
    type Item = Bytes;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let Some(offset) = src[self.scanned..].iter().position(|&b| b == TERMINATOR) else {
                self.scanned = src.len();
                if src.len() > self.max_frame_size {
                    return Err(FrameError::TooLarge {
                        size: src.len(),
                        max: self.max_frame_size,
                    });
                }
                return Ok(None);
            };

            let end = self.scanned + offset;
            let body = src.split_to(end);
            src.advance(1);
            self.scanned = 0;

            if body.is_empty() {
                trace!("skipping empty frame");
                continue;
            }

            if body.len() > self.max_frame_size {
                return Err(FrameError::TooLarge {
                    size: body.len(),
                    max: self.max_frame_size,
                });
            }

            let mut payload = BytesMut::with_capacity(body.len());
            decode(&body, &mut payload)?;
            return Ok(Some(payload.freeze()));
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => Err(FrameError::Truncated {
                buffered: src.len(),
            }),
        }
    }
}

impl Encoder<&[u8]> for CobsCodec {
    type Error = FrameError;

    fn encode(&mut self, payload: &[u8], dst: &mut BytesMut) -> Result<(), Self::Error> {
        let worst_case = max_encoded_len(payload.len());
        if worst_case > self.max_frame_size {
            return Err(FrameError::TooLarge {
                size: worst_case,
                max: self.max_frame_size,
            });
        }
        dst.reserve(worst_case + 1);
        encode_frame(payload, dst);
        Ok(())
    }
}

impl Encoder<Bytes> for CobsCodec {
    type Error = FrameError;

    fn encode(&mut self, payload: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        Encoder::<&[u8]>::encode(self, payload.as_ref(), dst)
    }
}

impl Encoder<Vec<u8>> for CobsCodec {
    type Error = FrameError;

    fn encode(&mut self, payload: Vec<u8>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        Encoder::<&[u8]>::encode(self, payload.as_slice(), dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use tokio::io::AsyncWriteExt;
    use tokio_util::codec::{FramedRead, FramedWrite};

    #[test]
    fn decode_waits_for_terminator() {
        let mut codec = CobsCodec::new();
        let mut buf = BytesMut::from(&[0x03, b'h'][..]);

        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(&[b'i', TERMINATOR]);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().as_ref(), b"hi");
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_skips_empty_frames() {
        let mut codec = CobsCodec::new();
        let mut buf = BytesMut::from(&[TERMINATOR, TERMINATOR, 0x02, b'a', TERMINATOR][..]);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().as_ref(), b"a");
    }

    #[test]
    fn decode_eof_with_partial_frame_is_truncated() {
        let mut codec = CobsCodec::new();
        let mut buf = BytesMut::from(&[0x04, b'a', b'b'][..]);
        let err = codec.decode_eof(&mut buf).unwrap_err();
        assert!(matches!(err, FrameError::Truncated { buffered: 3 }));
    }

    #[test]
    fn decode_eof_clean() {
        let mut codec = CobsCodec::new();
        let mut buf = BytesMut::new();
        assert!(codec.decode_eof(&mut buf).unwrap().is_none());
    }

    #[test]
    fn decode_rejects_oversized_buffer() {
        let mut codec = CobsCodec::with_config(&FrameConfig {
            max_frame_size: 4,
            ..FrameConfig::default()
        });
        let mut buf = BytesMut::from(&[0x41u8; 8][..]);
        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, FrameError::TooLarge { size: 8, max: 4 }));
    }

    #[test]
    fn encode_rejects_oversized_payload() {
        let mut codec = CobsCodec::with_config(&FrameConfig {
            max_frame_size: 4,
            ..FrameConfig::default()
        });
        let mut dst = BytesMut::new();
        let err = Encoder::<&[u8]>::encode(&mut codec, b"too long", &mut dst).unwrap_err();
        assert!(matches!(err, FrameError::TooLarge { .. }));
        assert!(dst.is_empty());
    }

    #[tokio::test]
    async fn framed_round_trip_over_duplex() {
        let (client, server) = tokio::io::duplex(64);
        let mut sink = FramedWrite::new(client, CobsCodec::new());
        let mut stream = FramedRead::new(server, CobsCodec::new());

        let writer = tokio::spawn(async move {
            for payload in [&b"alpha"[..], b"\0", b"", b"omega"] {
                sink.send(Bytes::copy_from_slice(payload)).await.unwrap();
            }
        });

        let mut received = Vec::new();
        while let Some(frame) = stream.next().await {
            received.push(frame.unwrap());
        }
        writer.await.unwrap();

        assert_eq!(
            received,
            vec![
                Bytes::from_static(b"alpha"),
                Bytes::from_static(b"\0"),
                Bytes::new(),
                Bytes::from_static(b"omega"),
            ]
        );
    }

    #[tokio::test]
    async fn framed_read_reports_truncation() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut stream = FramedRead::new(server, CobsCodec::new());

        client.write_all(&[0x02, b'a', TERMINATOR, 0x05, b'x']).await.unwrap();
        drop(client);

        assert_eq!(stream.next().await.unwrap().unwrap().as_ref(), b"a");
        let err = stream.next().await.unwrap().unwrap_err();
        assert!(matches!(err, FrameError::Truncated { buffered: 2 }));
    }
}
