use auxwire_frame::{FrameReader, FrameWriter};
use auxwire_transport::{AuxStream, Endpoint};
use tracing::info;

use crate::error::{Result, SessionError};
use crate::session::{Session, SessionConfig, SessionReceiver, SessionSender};

/// A blocking session over a controller link.
pub type StreamSession = Session<AuxStream, AuxStream>;

/// Connect to a controller endpoint.
pub fn connect(endpoint: &Endpoint) -> Result<StreamSession> {
    connect_with_config(endpoint, &SessionConfig::default())
}

/// Connect with explicit configuration.
pub fn connect_with_config(endpoint: &Endpoint, config: &SessionConfig) -> Result<StreamSession> {
    let stream = endpoint.open()?;
    info!(peer = %stream.peer_label(), "session connected");
    StreamSession::from_stream(stream, config)
}

impl Session<AuxStream, AuxStream> {
    /// Build a session over an open link.
    ///
    /// The stream is cloned so each direction owns an independent handle;
    /// a receiver blocked in `read` never stalls the sender.
    pub fn from_stream(stream: AuxStream, config: &SessionConfig) -> Result<Self> {
        let reader_stream = stream.try_clone()?;

        let reader = FrameReader::with_config_stream(reader_stream, config.frame.clone())
            .map_err(SessionError::from_read)?;
        let writer = FrameWriter::with_config_stream(stream, config.frame.clone())
            .map_err(|err| SessionError::from_write(0, err))?;

        Ok(Self::from_parts(
            SessionReceiver::from_reader(reader),
            SessionSender::from_writer(writer),
        ))
    }

    /// Handle that closes the link from any thread.
    pub fn shutdown_handle(&self) -> Result<ShutdownHandle> {
        ShutdownHandle::new(self.sender().get_ref())
    }
}

impl SessionSender<AuxStream> {
    pub fn shutdown_handle(&self) -> Result<ShutdownHandle> {
        ShutdownHandle::new(self.get_ref())
    }
}

impl SessionReceiver<AuxStream> {
    pub fn shutdown_handle(&self) -> Result<ShutdownHandle> {
        ShutdownHandle::new(self.get_ref())
    }
}

/// Closes a session's link in both directions.
///
/// A receiver blocked in `receive` wakes up with end of stream; later sends
/// fail. Works for TCP and serial links alike.
#[derive(Debug)]
pub struct ShutdownHandle {
    stream: AuxStream,
}

impl ShutdownHandle {
    fn new(stream: &AuxStream) -> Result<Self> {
        Ok(Self {
            stream: stream.try_clone()?,
        })
    }

    pub fn shutdown(&self) -> Result<()> {
        info!(peer = %self.stream.peer_label(), "session shutdown requested");
        self.stream.shutdown()?;
        Ok(())
    }

    pub fn peer_label(&self) -> String {
        self.stream.peer_label()
    }
}
