//! In-process stand-in for the controller.
//!
//! Answers every request with the matching response and remembers the last
//! duty set for each output. Used by `auxwire simulate`, the examples and
//! integration tests.

use std::io::{Read, Write};

use auxwire_proto::{
    DeviceError, FanCommand, FanStatus, LightCommand, LightStatus, Request, RequestBody, Response,
    ResponseBody, TempReading,
};
use auxwire_session::{Result, Session};
use tracing::{debug, info};

/// Tachometer reading at full fan duty.
pub const FAN_MAX_RPM: i32 = 3000;

#[derive(Debug, Clone)]
pub struct SimulatedDevice {
    fan_duty: u16,
    light_duty: f32,
    degrees_c: i32,
    humidity: i32,
    handled: u64,
}

impl SimulatedDevice {
    pub fn new() -> Self {
        Self::with_climate(23, 45)
    }

    /// Device whose sensor always reports the given reading.
    pub fn with_climate(degrees_c: i32, humidity: i32) -> Self {
        Self {
            fan_duty: 0,
            light_duty: 0.0,
            degrees_c,
            humidity,
            handled: 0,
        }
    }

    /// Apply a request and build the reply.
    pub fn respond(&mut self, request: &Request) -> Response {
        self.handled += 1;
        let body = match request.body {
            RequestBody::Fan(FanCommand::Set { duty }) => {
                self.fan_duty = duty;
                ResponseBody::Fan(self.fan_status())
            }
            RequestBody::Fan(FanCommand::Get) => ResponseBody::Fan(self.fan_status()),
            RequestBody::Temp(_) => ResponseBody::Temp(TempReading {
                degrees_c: self.degrees_c,
                humidity: self.humidity,
            }),
            RequestBody::Light(LightCommand::Set { duty }) if (0.0..=1.0).contains(&duty) => {
                self.light_duty = duty;
                ResponseBody::Light(LightStatus { duty })
            }
            RequestBody::Light(LightCommand::Set { duty }) => ResponseBody::Error(DeviceError {
                message: format!("light duty {duty} outside 0..=1"),
            }),
            RequestBody::Light(LightCommand::Get) => ResponseBody::Light(LightStatus {
                duty: self.light_duty,
            }),
        };
        Response::new(request.correlation_id, body)
    }

    /// Answer requests on `session` until its input ends.
    ///
    /// Returns the number of requests answered on this session.
    pub fn serve<R: Read, W: Write>(&mut self, session: &mut Session<R, W>) -> Result<u64> {
        let mut answered = 0u64;
        while let Some(request) = session.receive::<Request>()? {
            debug!(
                id = request.correlation_id,
                device = request.body.device(),
                "simulated request"
            );
            let response = self.respond(&request);
            session.send(&response)?;
            answered += 1;
        }
        info!(answered, "simulated session ended");
        Ok(answered)
    }

    fn fan_status(&self) -> FanStatus {
        let rpm = i64::from(self.fan_duty) * i64::from(FAN_MAX_RPM) / i64::from(u16::MAX);
        FanStatus {
            duty: self.fan_duty,
            rpm: rpm as i32,
        }
    }

    /// Requests answered since creation, across all sessions.
    pub fn handled(&self) -> u64 {
        self.handled
    }
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use auxwire_frame::{encode_to_vec, TERMINATOR};
    use auxwire_proto::{Message, TempCommand};
    use auxwire_session::{CommandBuilder, SessionReceiver};

    use super::*;

    #[test]
    fn fan_state_persists() {
        let mut device = SimulatedDevice::new();
        let mut builder = CommandBuilder::new();

        let set = device.respond(&builder.set_fan_duty(0.5).unwrap());
        assert_eq!(set.correlation_id, 1);
        assert_eq!(
            set.body,
            ResponseBody::Fan(FanStatus {
                duty: 32768,
                rpm: 1500
            })
        );

        let get = device.respond(&builder.query_fan());
        assert_eq!(get.correlation_id, 2);
        assert_eq!(get.body, set.body);
    }

    #[test]
    fn out_of_range_light_duty_is_an_error_reply() {
        let mut device = SimulatedDevice::new();
        let reply = device.respond(&Request::new(
            4,
            RequestBody::Light(LightCommand::Set { duty: 1.5 }),
        ));
        assert!(reply.is_error());
        assert_eq!(reply.correlation_id, 4);
    }

    #[test]
    fn temperature_uses_configured_climate() {
        let mut device = SimulatedDevice::with_climate(-2, 80);
        let reply = device.respond(&Request::new(9, RequestBody::Temp(TempCommand::Get)));
        assert_eq!(
            reply.body,
            ResponseBody::Temp(TempReading {
                degrees_c: -2,
                humidity: 80
            })
        );
    }

    #[test]
    fn serve_answers_until_end_of_input() {
        let mut builder = CommandBuilder::new();
        let mut wire = Vec::new();
        for request in [builder.query_temperature(), builder.query_light()] {
            wire.extend(encode_to_vec(&request.serialize().unwrap()));
            wire.push(TERMINATOR);
        }

        let mut session = Session::new(Cursor::new(wire), Cursor::new(Vec::new()));
        let mut device = SimulatedDevice::new();
        assert_eq!(device.serve(&mut session).unwrap(), 2);
        assert_eq!(device.handled(), 2);

        let (sender, _) = session.split();
        let written = sender.into_inner().into_inner();
        let mut replies = SessionReceiver::new(Cursor::new(written));
        let ids: Vec<i32> = replies
            .receive_all::<Response>()
            .map(|r| r.unwrap().correlation_id)
            .collect();
        assert_eq!(ids, [1, 2]);
    }
}
