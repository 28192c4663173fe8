use std::io::{Read, Write};
use std::marker::PhantomData;

use auxwire_frame::{FrameConfig, FrameReader, FrameWriter};
use auxwire_proto::Message;
use tracing::{debug, warn};

use crate::error::{Result, SessionError};

/// Session behavior configuration.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Frame limits and timeouts applied to both directions.
    pub frame: FrameConfig,
}

/// Receive half of a session.
///
/// Owns the partial-frame buffer. Once the input ends or an error is
/// reported the receiver is ended and every later `receive` returns
/// `Ok(None)`.
pub struct SessionReceiver<R> {
    reader: FrameReader<R>,
    ended: bool,
}

impl<R: Read> SessionReceiver<R> {
    pub fn new(inner: R) -> Self {
        Self::with_config(inner, &SessionConfig::default())
    }

    pub fn with_config(inner: R, config: &SessionConfig) -> Self {
        Self::from_reader(FrameReader::with_config(inner, config.frame.clone()))
    }

    pub(crate) fn from_reader(reader: FrameReader<R>) -> Self {
        Self {
            reader,
            ended: false,
        }
    }

    /// Block until the next message arrives.
    ///
    /// Returns `Ok(None)` when the input ended cleanly between frames.
    pub fn receive<M: Message>(&mut self) -> Result<Option<M>> {
        if self.ended {
            return Ok(None);
        }

        let result = self.next_message();
        match &result {
            Ok(Some(_)) => {}
            Ok(None) => {
                debug!("session input ended");
                self.ended = true;
            }
            Err(err) => {
                debug!(error = %err, "session receive failed");
                self.ended = true;
            }
        }
        result
    }

    fn next_message<M: Message>(&mut self) -> Result<Option<M>> {
        let Some(payload) = self
            .reader
            .read_payload()
            .map_err(SessionError::from_read)?
        else {
            return Ok(None);
        };

        debug!(len = payload.len(), kind = M::KIND, "frame received");
        M::parse(&payload)
            .map(Some)
            .map_err(|source| SessionError::ParseFailed {
                len: payload.len(),
                source,
            })
    }

    /// Lazily receive messages until end of stream or the first error.
    pub fn receive_all<M: Message>(&mut self) -> Messages<'_, R, M> {
        Messages {
            receiver: self,
            _message: PhantomData,
        }
    }

    /// Whether the input has ended or failed.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn get_ref(&self) -> &R {
        self.reader.get_ref()
    }

    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }
}

/// Send half of a session.
///
/// Owns the scratch encode buffer. A stream failure closes the sender for
/// good; later sends fail with [`SessionError::Closed`].
pub struct SessionSender<W> {
    writer: FrameWriter<W>,
    closed: bool,
}

impl<W: Write> SessionSender<W> {
    pub fn new(inner: W) -> Self {
        Self::with_config(inner, &SessionConfig::default())
    }

    pub fn with_config(inner: W, config: &SessionConfig) -> Self {
        Self::from_writer(FrameWriter::with_config(inner, config.frame.clone()))
    }

    pub(crate) fn from_writer(writer: FrameWriter<W>) -> Self {
        Self {
            writer,
            closed: false,
        }
    }

    /// Serialize, frame and write one message, then flush.
    pub fn send<M: Message>(&mut self, message: &M) -> Result<()> {
        if self.closed {
            return Err(SessionError::Closed);
        }

        let payload = message.serialize().map_err(SessionError::Serialize)?;
        match self.writer.send(&payload) {
            Ok(()) => {
                debug!(len = payload.len(), kind = M::KIND, "frame sent");
                Ok(())
            }
            Err(err) => {
                let err = SessionError::from_write(payload.len(), err);
                // An oversized message never reached the stream.
                if !matches!(err, SessionError::FrameTooLarge { .. }) {
                    warn!(error = %err, "session send failed, closing sender");
                    self.closed = true;
                }
                Err(err)
            }
        }
    }

    /// Whether an earlier write failure closed this sender.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn get_ref(&self) -> &W {
        self.writer.get_ref()
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

/// A full-duplex message session over one input and one output stream.
///
/// Use [`Session::split`] to drive each direction from its own thread.
pub struct Session<R, W> {
    receiver: SessionReceiver<R>,
    sender: SessionSender<W>,
}

impl<R: Read, W: Write> Session<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self::with_config(input, output, &SessionConfig::default())
    }

    pub fn with_config(input: R, output: W, config: &SessionConfig) -> Self {
        Self::from_parts(
            SessionReceiver::with_config(input, config),
            SessionSender::with_config(output, config),
        )
    }

    pub fn from_parts(receiver: SessionReceiver<R>, sender: SessionSender<W>) -> Self {
        Self { receiver, sender }
    }

    pub fn send<M: Message>(&mut self, message: &M) -> Result<()> {
        self.sender.send(message)
    }

    pub fn receive<M: Message>(&mut self) -> Result<Option<M>> {
        self.receiver.receive()
    }

    pub fn receive_all<M: Message>(&mut self) -> Messages<'_, R, M> {
        self.receiver.receive_all()
    }

    pub fn is_ended(&self) -> bool {
        self.receiver.is_ended()
    }

    pub fn sender(&self) -> &SessionSender<W> {
        &self.sender
    }

    pub fn receiver(&self) -> &SessionReceiver<R> {
        &self.receiver
    }

    /// Separate the halves so each can move to its own thread.
    pub fn split(self) -> (SessionSender<W>, SessionReceiver<R>) {
        (self.sender, self.receiver)
    }
}

/// Iterator returned by [`SessionReceiver::receive_all`].
///
/// Yields at most one error, after which it is exhausted.
pub struct Messages<'a, R, M> {
    receiver: &'a mut SessionReceiver<R>,
    _message: PhantomData<fn() -> M>,
}

impl<R: Read, M: Message> Iterator for Messages<'_, R, M> {
    type Item = Result<M>;

    fn next(&mut self) -> Option<Self::Item> {
        self.receiver.receive().transpose()
    }
}

impl<R: Read, M: Message> std::iter::FusedIterator for Messages<'_, R, M> {}
