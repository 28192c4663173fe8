//! Byte-stream transports for auxwire controller links.
//!
//! A controller is reached either over TCP (USB-ethernet gadget, bridge
//! boards) or through a serial device node (CDC-ACM). Both are exposed as an
//! [`AuxStream`] that implements `Read + Write` and can be cloned so that the
//! receive and send directions live on different threads.
//!
//! Connection setup stays deliberately thin: no retries, no baud-rate or TLS
//! configuration. Everything above this layer only sees bytes.

pub mod endpoint;
pub mod error;
pub mod serial;
pub mod stream;
pub mod tcp;

#[cfg(feature = "async")]
pub mod async_stream;

pub use endpoint::{Endpoint, DEFAULT_TCP_ADDR};
pub use error::{Result, TransportError};
pub use stream::AuxStream;
pub use tcp::TcpDeviceListener;

#[cfg(feature = "async")]
pub use async_stream::AsyncAuxStream;
