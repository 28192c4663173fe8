//! Full-duplex message sessions with an auxiliary controller.
//!
//! This is the "just works" layer. Open a link, send typed requests and
//! consume telemetry concurrently, each direction on its own thread (or
//! task, with the `async` feature).
//!
//! ```no_run
//! use auxwire_proto::Response;
//! use auxwire_session::{connect, Controller};
//! use auxwire_transport::Endpoint;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let endpoint: Endpoint = "tcp://10.0.0.1:1338".parse()?;
//! let (sender, mut receiver) = connect(&endpoint)?.split();
//!
//! let mut controller = Controller::new(sender);
//! controller.set_fan_duty(0.5)?;
//!
//! for response in receiver.receive_all::<Response>() {
//!     println!("{:?}", response?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod connector;
pub mod controller;
pub mod error;
pub mod listener;
pub mod session;

#[cfg(feature = "async")]
pub mod async_session;

pub use connector::{connect, connect_with_config, ShutdownHandle, StreamSession};
pub use controller::{
    clamp_duty, fan_duty, light_duty, CommandBuilder, Controller, RequestSink,
    FIRST_CORRELATION_ID,
};
pub use error::{Result, SessionError};
pub use listener::SessionListener;
pub use session::{Messages, Session, SessionConfig, SessionReceiver, SessionSender};

#[cfg(feature = "async")]
pub use async_session::{
    connect_async, connect_async_with_config, AsyncSession, AsyncSessionReceiver,
    AsyncSessionSender, AsyncStreamSession,
};
#[cfg(feature = "async")]
pub use controller::AsyncController;
