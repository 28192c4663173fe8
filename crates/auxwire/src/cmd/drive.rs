use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use auxwire_proto::Response;
use auxwire_session::{clamp_duty, Controller, RequestSink, SessionError};
use tracing::{info, warn};

use crate::cmd::{install_ctrlc_handler, open_session, parse_duration, DriveArgs};
use crate::exit::{session_error, CliError, CliResult, INTERNAL, SUCCESS, USAGE};
use crate::output::{print_response, OutputFormat};

/// Granularity at which the schedule notices Ctrl-C between steps.
const POLL_STEP: Duration = Duration::from_millis(50);

pub fn run(args: DriveArgs, format: OutputFormat) -> CliResult<i32> {
    let interval = parse_duration(&args.interval)?;
    for duty in &args.duty {
        clamp_duty(*duty).map_err(|err| CliError::new(USAGE, format!("--duty: {err}")))?;
    }

    let session = open_session(&args.target, None)?;
    let on_ctrlc = session
        .shutdown_handle()
        .map_err(|err| session_error("connect failed", err))?;
    let on_finish = session
        .shutdown_handle()
        .map_err(|err| session_error("connect failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone(), on_ctrlc)?;

    // Receive on this thread, send from a worker.
    let (sender, mut receiver) = session.split();
    let schedule = Schedule {
        duties: args.duty,
        interval,
        with_temp: args.with_temp,
    };
    let worker_running = running.clone();
    let producer = thread::spawn(move || {
        let mut controller = Controller::new(sender);
        let result = schedule.run(&mut controller, &worker_running);
        // Let the receive loop see end of stream once the schedule is done.
        let _ = on_finish.shutdown();
        result
    });

    let mut received = 0usize;
    let mut receive_error = None;
    for response in receiver.receive_all::<Response>() {
        match response {
            Ok(response) => {
                print_response(&response, format);
                received += 1;
            }
            Err(err) => {
                if running.load(Ordering::SeqCst) {
                    receive_error = Some(err);
                }
                break;
            }
        }
    }

    let sent = producer
        .join()
        .map_err(|_| CliError::new(INTERNAL, "schedule thread panicked"))?;
    let interrupted = !running.load(Ordering::SeqCst);

    if let Some(err) = receive_error {
        return Err(session_error("receive failed", err));
    }
    match sent {
        Ok(sent) => info!(sent, received, "schedule finished"),
        Err(_) if interrupted => info!(received, "schedule interrupted"),
        Err(err) => return Err(session_error("send failed", err)),
    }
    Ok(SUCCESS)
}

struct Schedule {
    duties: Vec<f64>,
    interval: Duration,
    with_temp: bool,
}

impl Schedule {
    /// Send every step, pausing `interval` after each. Returns requests sent.
    fn run<S: RequestSink>(
        &self,
        controller: &mut Controller<S>,
        running: &AtomicBool,
    ) -> Result<usize, SessionError> {
        let mut sent = 0usize;
        for duty in &self.duties {
            if !running.load(Ordering::SeqCst) {
                break;
            }
            let id = controller.set_fan_duty(*duty)?;
            sent += 1;
            info!(id, duty, "fan step");

            if self.with_temp {
                controller.query_temperature()?;
                sent += 1;
            }

            if !pause(self.interval, running) {
                warn!("schedule interrupted");
                break;
            }
        }
        Ok(sent)
    }
}

/// Sleep for `total`, returning early (false) once `running` clears.
fn pause(total: Duration, running: &AtomicBool) -> bool {
    let mut remaining = total;
    while !remaining.is_zero() {
        if !running.load(Ordering::SeqCst) {
            return false;
        }
        let step = remaining.min(POLL_STEP);
        thread::sleep(step);
        remaining -= step;
    }
    running.load(Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use auxwire_proto::{FanCommand, Request, RequestBody, TempCommand};

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        sent: Vec<Request>,
    }

    impl RequestSink for RecordingSink {
        fn send_request(&mut self, request: &Request) -> Result<(), SessionError> {
            self.sent.push(request.clone());
            Ok(())
        }
    }

    #[test]
    fn schedule_sends_every_step() {
        let schedule = Schedule {
            duties: vec![0.0, 0.5, 1.0],
            interval: Duration::from_millis(1),
            with_temp: true,
        };
        let mut controller = Controller::new(RecordingSink::default());
        let running = AtomicBool::new(true);

        assert_eq!(schedule.run(&mut controller, &running).unwrap(), 6);

        let bodies: Vec<RequestBody> = controller
            .into_inner()
            .sent
            .into_iter()
            .map(|r| r.body)
            .collect();
        assert_eq!(
            bodies,
            vec![
                RequestBody::Fan(FanCommand::Set { duty: 0 }),
                RequestBody::Temp(TempCommand::Get),
                RequestBody::Fan(FanCommand::Set { duty: 32768 }),
                RequestBody::Temp(TempCommand::Get),
                RequestBody::Fan(FanCommand::Set { duty: 65535 }),
                RequestBody::Temp(TempCommand::Get),
            ]
        );
    }

    #[test]
    fn schedule_stops_when_interrupted() {
        let schedule = Schedule {
            duties: vec![0.2, 0.4],
            interval: Duration::from_millis(1),
            with_temp: false,
        };
        let mut controller = Controller::new(RecordingSink::default());
        let running = AtomicBool::new(false);

        assert_eq!(schedule.run(&mut controller, &running).unwrap(), 0);
        assert!(controller.sink().sent.is_empty());
    }

    #[test]
    fn pause_returns_early() {
        let running = AtomicBool::new(false);
        assert!(!pause(Duration::from_secs(10), &running));
    }
}
