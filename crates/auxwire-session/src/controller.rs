//! Typed commands for a fan/light/sensor controller.
//!
//! [`Controller`] turns calls like `set_fan_duty(0.5)` into [`Request`]s
//! with fresh correlation ids and hands them to a [`RequestSink`]. Replies
//! arrive on the receive half of the session; match them by id.

use std::io::{Read, Write};

use auxwire_proto::{FanCommand, LightCommand, Request, RequestBody, TempCommand};
use tracing::debug;

use crate::error::{Result, SessionError};
use crate::session::{Session, SessionSender};

/// First correlation id handed out by a fresh [`CommandBuilder`].
pub const FIRST_CORRELATION_ID: i32 = 1;

/// Validate a duty fraction and clamp it to `[0, 1]`.
///
/// NaN is rejected; everything else, infinities included, is clamped.
pub fn clamp_duty(duty: f64) -> Result<f64> {
    if duty.is_nan() {
        return Err(SessionError::InvalidDuty(duty));
    }
    Ok(duty.clamp(0.0, 1.0))
}

/// Map a duty fraction onto the fan's 16-bit PWM range.
pub fn fan_duty(duty: f64) -> Result<u16> {
    let duty = clamp_duty(duty)?;
    Ok((duty * f64::from(u16::MAX)).round() as u16)
}

/// Map a duty fraction onto the light's wire representation.
pub fn light_duty(duty: f64) -> Result<f32> {
    Ok(clamp_duty(duty)? as f32)
}

/// Builds requests with increasing correlation ids.
///
/// Ids start at 1 and wrap back to 1 after `i32::MAX`, so they stay
/// positive.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    next_id: i32,
}

impl CommandBuilder {
    pub fn new() -> Self {
        Self::starting_at(FIRST_CORRELATION_ID)
    }

    pub fn starting_at(id: i32) -> Self {
        Self {
            next_id: id.max(FIRST_CORRELATION_ID),
        }
    }

    /// Id the next request will carry.
    pub fn peek_id(&self) -> i32 {
        self.next_id
    }

    fn take_id(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id = if id == i32::MAX {
            FIRST_CORRELATION_ID
        } else {
            id + 1
        };
        id
    }

    fn build(&mut self, body: RequestBody) -> Request {
        Request::new(self.take_id(), body)
    }

    pub fn set_fan_duty(&mut self, duty: f64) -> Result<Request> {
        let duty = fan_duty(duty)?;
        Ok(self.build(RequestBody::Fan(FanCommand::Set { duty })))
    }

    pub fn query_fan(&mut self) -> Request {
        self.build(RequestBody::Fan(FanCommand::Get))
    }

    pub fn query_temperature(&mut self) -> Request {
        self.build(RequestBody::Temp(TempCommand::Get))
    }

    pub fn set_light_duty(&mut self, duty: f64) -> Result<Request> {
        let duty = light_duty(duty)?;
        Ok(self.build(RequestBody::Light(LightCommand::Set { duty })))
    }

    pub fn query_light(&mut self) -> Request {
        self.build(RequestBody::Light(LightCommand::Get))
    }
}

impl Default for CommandBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Destination for outbound requests.
pub trait RequestSink {
    fn send_request(&mut self, request: &Request) -> Result<()>;
}

impl<W: Write> RequestSink for SessionSender<W> {
    fn send_request(&mut self, request: &Request) -> Result<()> {
        self.send(request)
    }
}

impl<R: Read, W: Write> RequestSink for Session<R, W> {
    fn send_request(&mut self, request: &Request) -> Result<()> {
        self.send(request)
    }
}

impl<T: RequestSink + ?Sized> RequestSink for &mut T {
    fn send_request(&mut self, request: &Request) -> Result<()> {
        (**self).send_request(request)
    }
}

/// High-level command API over a request sink.
///
/// Every method returns the correlation id of the request it sent.
pub struct Controller<S> {
    sink: S,
    builder: CommandBuilder,
}

impl<S: RequestSink> Controller<S> {
    pub fn new(sink: S) -> Self {
        Self::with_builder(sink, CommandBuilder::new())
    }

    pub fn with_builder(sink: S, builder: CommandBuilder) -> Self {
        Self { sink, builder }
    }

    /// Set fan speed as a fraction of full duty.
    pub fn set_fan_duty(&mut self, duty: f64) -> Result<i32> {
        let request = self.builder.set_fan_duty(duty)?;
        self.dispatch(request)
    }

    pub fn query_fan(&mut self) -> Result<i32> {
        let request = self.builder.query_fan();
        self.dispatch(request)
    }

    pub fn query_temperature(&mut self) -> Result<i32> {
        let request = self.builder.query_temperature();
        self.dispatch(request)
    }

    /// Set light brightness as a fraction of full duty.
    pub fn set_light_duty(&mut self, duty: f64) -> Result<i32> {
        let request = self.builder.set_light_duty(duty)?;
        self.dispatch(request)
    }

    pub fn query_light(&mut self) -> Result<i32> {
        let request = self.builder.query_light();
        self.dispatch(request)
    }

    fn dispatch(&mut self, request: Request) -> Result<i32> {
        debug!(
            id = request.correlation_id,
            device = request.body.device(),
            "dispatching request"
        );
        self.sink.send_request(&request)?;
        Ok(request.correlation_id)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_inner(self) -> S {
        self.sink
    }
}

#[cfg(feature = "async")]
pub use self::nonblocking::AsyncController;

#[cfg(feature = "async")]
mod nonblocking {
    use auxwire_proto::Request;
    use tokio::io::AsyncWrite;
    use tracing::debug;

    use super::CommandBuilder;
    use crate::async_session::AsyncSessionSender;
    use crate::error::Result;

    /// [`Controller`](super::Controller) counterpart over an async sender.
    pub struct AsyncController<W> {
        sender: AsyncSessionSender<W>,
        builder: CommandBuilder,
    }

    impl<W: AsyncWrite + Unpin> AsyncController<W> {
        pub fn new(sender: AsyncSessionSender<W>) -> Self {
            Self {
                sender,
                builder: CommandBuilder::new(),
            }
        }

        pub async fn set_fan_duty(&mut self, duty: f64) -> Result<i32> {
            let request = self.builder.set_fan_duty(duty)?;
            self.dispatch(request).await
        }

        pub async fn query_fan(&mut self) -> Result<i32> {
            let request = self.builder.query_fan();
            self.dispatch(request).await
        }

        pub async fn query_temperature(&mut self) -> Result<i32> {
            let request = self.builder.query_temperature();
            self.dispatch(request).await
        }

        pub async fn set_light_duty(&mut self, duty: f64) -> Result<i32> {
            let request = self.builder.set_light_duty(duty)?;
            self.dispatch(request).await
        }

        pub async fn query_light(&mut self) -> Result<i32> {
            let request = self.builder.query_light();
            self.dispatch(request).await
        }

        async fn dispatch(&mut self, request: Request) -> Result<i32> {
            debug!(
                id = request.correlation_id,
                device = request.body.device(),
                "dispatching request"
            );
            self.sender.send(&request).await?;
            Ok(request.correlation_id)
        }

        pub fn into_inner(self) -> AsyncSessionSender<W> {
            self.sender
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use auxwire_proto::Message;

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        sent: Vec<Request>,
    }

    impl RequestSink for RecordingSink {
        fn send_request(&mut self, request: &Request) -> Result<()> {
            self.sent.push(request.clone());
            Ok(())
        }
    }

    #[test]
    fn fan_duty_mapping() {
        assert_eq!(fan_duty(0.0).unwrap(), 0);
        assert_eq!(fan_duty(0.5).unwrap(), 32768);
        assert_eq!(fan_duty(1.0).unwrap(), 65535);
        assert_eq!(fan_duty(0.25).unwrap(), 16384);
    }

    #[test]
    fn out_of_range_duty_is_clamped() {
        assert_eq!(fan_duty(-0.2).unwrap(), 0);
        assert_eq!(fan_duty(1.7).unwrap(), 65535);
        assert_eq!(fan_duty(f64::INFINITY).unwrap(), 65535);
        assert_eq!(light_duty(2.0).unwrap(), 1.0);
        assert_eq!(light_duty(-1.0).unwrap(), 0.0);
    }

    #[test]
    fn nan_duty_is_rejected() {
        assert!(matches!(fan_duty(f64::NAN), Err(SessionError::InvalidDuty(d)) if d.is_nan()));
        assert!(light_duty(f64::NAN).is_err());
    }

    #[test]
    fn ids_increase_from_one() {
        let mut builder = CommandBuilder::new();
        assert_eq!(builder.query_fan().correlation_id, 1);
        assert_eq!(builder.query_light().correlation_id, 2);
        assert_eq!(builder.query_temperature().correlation_id, 3);
        assert_eq!(builder.peek_id(), 4);
    }

    #[test]
    fn ids_wrap_to_one() {
        let mut builder = CommandBuilder::starting_at(i32::MAX);
        assert_eq!(builder.query_fan().correlation_id, i32::MAX);
        assert_eq!(builder.query_fan().correlation_id, 1);
    }

    #[test]
    fn controller_builds_expected_requests() {
        let mut controller = Controller::new(RecordingSink::default());

        assert_eq!(controller.set_fan_duty(0.5).unwrap(), 1);
        assert_eq!(controller.query_fan().unwrap(), 2);
        assert_eq!(controller.query_temperature().unwrap(), 3);
        assert_eq!(controller.set_light_duty(0.75).unwrap(), 4);
        assert_eq!(controller.query_light().unwrap(), 5);

        let sent = &controller.sink().sent;
        assert_eq!(
            sent[0].body,
            RequestBody::Fan(FanCommand::Set { duty: 32768 })
        );
        assert_eq!(sent[1].body, RequestBody::Fan(FanCommand::Get));
        assert_eq!(sent[2].body, RequestBody::Temp(TempCommand::Get));
        assert_eq!(
            sent[3].body,
            RequestBody::Light(LightCommand::Set { duty: 0.75 })
        );
        assert_eq!(sent[4].body, RequestBody::Light(LightCommand::Get));
    }

    #[test]
    fn rejected_duty_consumes_no_id() {
        let mut controller = Controller::new(RecordingSink::default());

        assert!(controller.set_fan_duty(f64::NAN).is_err());
        assert!(controller.sink().sent.is_empty());
        assert_eq!(controller.query_fan().unwrap(), 1);
    }

    #[test]
    fn controller_over_session_sender_writes_frames() {
        let mut sender = SessionSender::new(Cursor::new(Vec::new()));
        {
            let mut controller = Controller::new(&mut sender);
            controller.set_fan_duty(1.0).unwrap();
        }

        let wire = sender.into_inner().into_inner();
        let body = &wire[..wire.len() - 1];
        let payload = auxwire_frame::decode_to_vec(body).unwrap();
        let request = Request::parse(&payload).unwrap();
        assert_eq!(request.correlation_id, 1);
        assert_eq!(
            request.body,
            RequestBody::Fan(FanCommand::Set { duty: 65535 })
        );
    }
}
