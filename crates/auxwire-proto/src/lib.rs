//! Messages exchanged between a host and an auxiliary controller.
//!
//! Requests flow host → controller, responses flow back. Both are plain
//! serde types serialized with postcard; framing is left to
//! `auxwire-frame`.

pub mod error;
pub mod message;
pub mod schema;

pub use error::{ProtoError, Result};
pub use message::Message;
pub use schema::{
    DeviceError, FanCommand, FanStatus, LightCommand, LightStatus, Request, RequestBody, Response,
    ResponseBody, TempCommand, TempReading,
};
