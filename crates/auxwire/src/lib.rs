//! Framed command and telemetry links to auxiliary controllers.
//!
//! auxwire talks to a small embedded controller (fan, light, temperature
//! and humidity sensor) over TCP or a serial device, one COBS frame per
//! message.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP and serial links, endpoint parsing
//! - [`frame`]: COBS framing with a zero terminator
//! - [`proto`]: request and response messages
//! - [`session`]: full-duplex sessions and the command facade (behind `session` feature)
//! - [`sim`]: an in-process stand-in for the controller (behind `session` feature)

/// Re-export transport types.
pub mod transport {
    pub use auxwire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use auxwire_frame::*;
}

/// Re-export message types.
pub mod proto {
    pub use auxwire_proto::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use auxwire_session::*;
}

#[cfg(feature = "session")]
pub mod sim;
