//! Tokio counterpart of [`Session`](crate::Session).
//!
//! The halves wrap `FramedRead`/`FramedWrite` with [`CobsCodec`], so the
//! framing rules are the same as in the blocking session.

use auxwire_frame::CobsCodec;
use auxwire_proto::Message;
use auxwire_transport::{AsyncAuxStream, Endpoint};
use bytes::Bytes;
use futures_core::Stream;
use futures_util::{stream, SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, warn};

use crate::error::{Result, SessionError};
use crate::session::SessionConfig;

/// Receive half of an async session.
pub struct AsyncSessionReceiver<R> {
    frames: FramedRead<R, CobsCodec>,
    ended: bool,
}

impl<R: AsyncRead + Unpin> AsyncSessionReceiver<R> {
    pub fn new(inner: R) -> Self {
        Self::with_config(inner, &SessionConfig::default())
    }

    pub fn with_config(inner: R, config: &SessionConfig) -> Self {
        Self {
            frames: FramedRead::new(inner, CobsCodec::with_config(&config.frame)),
            ended: false,
        }
    }

    /// Wait for the next message. `Ok(None)` means the input ended cleanly.
    pub async fn receive<M: Message>(&mut self) -> Result<Option<M>> {
        if self.ended {
            return Ok(None);
        }

        let result = match self.frames.next().await {
            None => Ok(None),
            Some(Err(err)) => Err(SessionError::from_read(err)),
            Some(Ok(payload)) => {
                debug!(len = payload.len(), kind = M::KIND, "frame received");
                M::parse(&payload)
                    .map(Some)
                    .map_err(|source| SessionError::ParseFailed {
                        len: payload.len(),
                        source,
                    })
            }
        };

        if !matches!(result, Ok(Some(_))) {
            self.ended = true;
        }
        result
    }

    /// Stream of messages until end of input or the first error.
    pub fn receive_all<M: Message>(&mut self) -> impl Stream<Item = Result<M>> + '_ {
        stream::try_unfold(self, |receiver| async move {
            let next = receiver.receive::<M>().await?;
            Ok::<_, SessionError>(next.map(|message| (message, receiver)))
        })
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn into_inner(self) -> R {
        self.frames.into_inner()
    }
}

/// Send half of an async session.
pub struct AsyncSessionSender<W> {
    frames: FramedWrite<W, CobsCodec>,
    closed: bool,
}

impl<W: AsyncWrite + Unpin> AsyncSessionSender<W> {
    pub fn new(inner: W) -> Self {
        Self::with_config(inner, &SessionConfig::default())
    }

    pub fn with_config(inner: W, config: &SessionConfig) -> Self {
        Self {
            frames: FramedWrite::new(inner, CobsCodec::with_config(&config.frame)),
            closed: false,
        }
    }

    /// Serialize, frame, write and flush one message.
    pub async fn send<M: Message>(&mut self, message: &M) -> Result<()> {
        if self.closed {
            return Err(SessionError::Closed);
        }

        let payload = Bytes::from(message.serialize().map_err(SessionError::Serialize)?);
        let len = payload.len();
        match self.frames.send(payload).await {
            Ok(()) => {
                debug!(len, kind = M::KIND, "frame sent");
                Ok(())
            }
            Err(err) => {
                let err = SessionError::from_write(len, err);
                if !matches!(err, SessionError::FrameTooLarge { .. }) {
                    warn!(error = %err, "session send failed, closing sender");
                    self.closed = true;
                }
                Err(err)
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn into_inner(self) -> W {
        self.frames.into_inner()
    }
}

/// A full-duplex async session.
pub struct AsyncSession<R, W> {
    receiver: AsyncSessionReceiver<R>,
    sender: AsyncSessionSender<W>,
}

impl<R: AsyncRead + Unpin, W: AsyncWrite + Unpin> AsyncSession<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self::with_config(input, output, &SessionConfig::default())
    }

    pub fn with_config(input: R, output: W, config: &SessionConfig) -> Self {
        Self {
            receiver: AsyncSessionReceiver::with_config(input, config),
            sender: AsyncSessionSender::with_config(output, config),
        }
    }

    pub async fn send<M: Message>(&mut self, message: &M) -> Result<()> {
        self.sender.send(message).await
    }

    pub async fn receive<M: Message>(&mut self) -> Result<Option<M>> {
        self.receiver.receive().await
    }

    pub fn receive_all<M: Message>(&mut self) -> impl Stream<Item = Result<M>> + '_ {
        self.receiver.receive_all()
    }

    pub fn is_ended(&self) -> bool {
        self.receiver.is_ended()
    }

    /// Separate the halves so each can move to its own task.
    pub fn split(self) -> (AsyncSessionSender<W>, AsyncSessionReceiver<R>) {
        (self.sender, self.receiver)
    }
}

impl<S: AsyncRead + AsyncWrite> AsyncSession<ReadHalf<S>, WriteHalf<S>> {
    /// Build a session over one bidirectional stream.
    pub fn from_stream(stream: S) -> Self {
        Self::from_stream_with_config(stream, &SessionConfig::default())
    }

    pub fn from_stream_with_config(stream: S, config: &SessionConfig) -> Self {
        let (input, output) = tokio::io::split(stream);
        Self::with_config(input, output, config)
    }
}

/// An async session over a controller link.
pub type AsyncStreamSession = AsyncSession<ReadHalf<AsyncAuxStream>, WriteHalf<AsyncAuxStream>>;

/// Connect to a controller endpoint from async code.
pub async fn connect_async(endpoint: &Endpoint) -> Result<AsyncStreamSession> {
    connect_async_with_config(endpoint, &SessionConfig::default()).await
}

pub async fn connect_async_with_config(
    endpoint: &Endpoint,
    config: &SessionConfig,
) -> Result<AsyncStreamSession> {
    let stream = AsyncAuxStream::open(endpoint).await?;
    info!(%endpoint, "async session connected");
    Ok(AsyncSession::from_stream_with_config(stream, config))
}
