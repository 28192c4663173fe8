use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::{from_payload, to_payload, Message};

/// Command sent from the host.
///
/// `correlation_id` is chosen by the host and echoed back unchanged in the
/// matching [`Response`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Request {
    pub correlation_id: i32,
    pub body: RequestBody,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum RequestBody {
    Fan(FanCommand),
    Temp(TempCommand),
    Light(LightCommand),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanCommand {
    /// PWM duty, `0` off through `u16::MAX` full speed.
    Set { duty: u16 },
    Get,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TempCommand {
    Get,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum LightCommand {
    /// Duty as a fraction in `[0, 1]`.
    Set { duty: f32 },
    Get,
}

/// Telemetry or reply sent by the controller.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Response {
    pub correlation_id: i32,
    pub body: ResponseBody,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Fan(FanStatus),
    Temp(TempReading),
    Light(LightStatus),
    Error(DeviceError),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanStatus {
    pub duty: u16,
    /// Tachometer reading in revolutions per minute.
    pub rpm: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempReading {
    pub degrees_c: i32,
    /// Relative humidity in percent.
    pub humidity: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct LightStatus {
    pub duty: f32,
}

/// Failure reported by the controller for a specific request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DeviceError {
    pub message: String,
}

impl Message for Request {
    const KIND: &'static str = "request";

    fn serialize(&self) -> Result<Vec<u8>> {
        to_payload(Self::KIND, self)
    }

    fn parse(bytes: &[u8]) -> Result<Self> {
        from_payload(Self::KIND, bytes)
    }
}

impl Message for Response {
    const KIND: &'static str = "response";

    fn serialize(&self) -> Result<Vec<u8>> {
        to_payload(Self::KIND, self)
    }

    fn parse(bytes: &[u8]) -> Result<Self> {
        from_payload(Self::KIND, bytes)
    }
}

impl Request {
    pub fn new(correlation_id: i32, body: RequestBody) -> Self {
        Self {
            correlation_id,
            body,
        }
    }
}

impl Response {
    pub fn new(correlation_id: i32, body: ResponseBody) -> Self {
        Self {
            correlation_id,
            body,
        }
    }

    /// Whether the controller reported a failure.
    pub fn is_error(&self) -> bool {
        matches!(self.body, ResponseBody::Error(_))
    }
}

impl RequestBody {
    /// Device addressed by this command.
    pub fn device(&self) -> &'static str {
        match self {
            Self::Fan(_) => "fan",
            Self::Temp(_) => "temp",
            Self::Light(_) => "light",
        }
    }
}

impl ResponseBody {
    /// Device this response describes, or `"error"`.
    pub fn device(&self) -> &'static str {
        match self {
            Self::Fan(_) => "fan",
            Self::Temp(_) => "temp",
            Self::Light(_) => "light",
            Self::Error(_) => "error",
        }
    }
}
