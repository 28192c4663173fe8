use auxwire_session::{Controller, SessionReceiver, SessionSender, StreamSession};
use auxwire_transport::AuxStream;
use tracing::info;

use crate::cmd::{open_session, parse_duration, wait_for_reply, DutyArgs, QueryArgs};
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_response, OutputFormat};

#[derive(Clone, Copy)]
enum Output {
    Fan,
    Light,
}

pub fn run_fan(args: DutyArgs, format: OutputFormat) -> CliResult<i32> {
    run_duty(Output::Fan, args, format)
}

pub fn run_light(args: DutyArgs, format: OutputFormat) -> CliResult<i32> {
    run_duty(Output::Light, args, format)
}

pub fn run_temp(args: QueryArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let (mut controller, mut receiver) = split(open_session(&args.target, Some(timeout))?);

    let id = controller
        .query_temperature()
        .map_err(|err| session_error("send failed", err))?;
    let reply = wait_for_reply(&mut receiver, id, timeout)?;
    print_response(&reply, format);
    Ok(SUCCESS)
}

fn run_duty(output: Output, args: DutyArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let (mut controller, mut receiver) = split(open_session(&args.target, Some(timeout))?);

    let (id, wait) = match (output, args.duty) {
        (Output::Fan, Some(duty)) => (controller.set_fan_duty(duty), args.wait),
        (Output::Light, Some(duty)) => (controller.set_light_duty(duty), args.wait),
        (Output::Fan, None) => (controller.query_fan(), true),
        (Output::Light, None) => (controller.query_light(), true),
    };
    let id = id.map_err(|err| session_error("send failed", err))?;
    info!(id, target = %args.target, "request sent");

    if wait {
        let reply = wait_for_reply(&mut receiver, id, timeout)?;
        print_response(&reply, format);
    }
    Ok(SUCCESS)
}

type Halves = (
    Controller<SessionSender<AuxStream>>,
    SessionReceiver<AuxStream>,
);

fn split(session: StreamSession) -> Halves {
    let (sender, receiver) = session.split();
    (Controller::new(sender), receiver)
}
