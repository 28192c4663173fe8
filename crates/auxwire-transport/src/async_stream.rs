use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tracing::debug;

use crate::endpoint::Endpoint;
use crate::error::{Result, TransportError};

/// Tokio counterpart of [`AuxStream`](crate::AuxStream).
#[derive(Debug)]
pub enum AsyncAuxStream {
    Tcp(tokio::net::TcpStream),
    Serial(tokio::fs::File),
}

impl AsyncAuxStream {
    /// Connect or open the given endpoint.
    pub async fn open(endpoint: &Endpoint) -> Result<Self> {
        match endpoint {
            Endpoint::Tcp(addr) => {
                let stream = tokio::net::TcpStream::connect(addr.as_str())
                    .await
                    .map_err(|e| TransportError::Connect {
                        addr: addr.clone(),
                        source: e,
                    })?;
                stream.set_nodelay(true)?;
                debug!(%addr, "connected to controller");
                Ok(Self::Tcp(stream))
            }
            Endpoint::Serial(path) => {
                let file = tokio::fs::OpenOptions::new()
                    .read(true)
                    .write(true)
                    .open(path)
                    .await
                    .map_err(|e| TransportError::Open {
                        path: path.clone(),
                        source: e,
                    })?;
                debug!(?path, "opened serial device");
                Ok(Self::Serial(file))
            }
        }
    }
}

impl AsyncRead for AsyncAuxStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Serial(file) => Pin::new(file).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for AsyncAuxStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Serial(file) => Pin::new(file).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_flush(cx),
            Self::Serial(file) => Pin::new(file).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Serial(file) => Pin::new(file).poll_shutdown(cx),
        }
    }
}
