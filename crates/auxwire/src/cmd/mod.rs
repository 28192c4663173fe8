use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use auxwire_proto::Response;
use auxwire_session::{
    connect_with_config, SessionConfig, SessionError, SessionReceiver, ShutdownHandle,
    StreamSession,
};
use auxwire_transport::{AuxStream, Endpoint, DEFAULT_TCP_ADDR};
use clap::{Args, Subcommand};
use tracing::debug;

use crate::exit::{
    session_error, CliError, CliResult, FAILURE, INTERNAL, INTERRUPTED, TIMEOUT, USAGE,
};
use crate::output::OutputFormat;

pub mod device;
pub mod drive;
pub mod monitor;
pub mod simulate;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print every telemetry message until the link closes.
    Monitor(MonitorArgs),
    /// Set or query the fan.
    Fan(DutyArgs),
    /// Set or query the light.
    Light(DutyArgs),
    /// Query the temperature and humidity sensor.
    Temp(QueryArgs),
    /// Walk the fan through a duty schedule while printing telemetry.
    Drive(DriveArgs),
    /// Run a simulated controller that answers every request.
    Simulate(SimulateArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Monitor(args) => monitor::run(args, format),
        Command::Fan(args) => device::run_fan(args, format),
        Command::Light(args) => device::run_light(args, format),
        Command::Temp(args) => device::run_temp(args, format),
        Command::Drive(args) => drive::run(args, format),
        Command::Simulate(args) => simulate::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Controller endpoint (tcp://host:port, host:port, serial:///dev/tty..., /dev/tty...).
    #[arg(value_name = "ENDPOINT", env = "AUXWIRE_TARGET", default_value = DEFAULT_TCP_ADDR)]
    pub target: Endpoint,
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct DutyArgs {
    /// Controller endpoint.
    #[arg(value_name = "ENDPOINT", env = "AUXWIRE_TARGET", default_value = DEFAULT_TCP_ADDR)]
    pub target: Endpoint,
    /// Duty fraction in [0, 1]; out-of-range values are clamped. Omit to query.
    #[arg(long, allow_negative_numbers = true)]
    pub duty: Option<f64>,
    /// Wait for the controller's reply and print it (always on for queries).
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for the reply (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Controller endpoint.
    #[arg(value_name = "ENDPOINT", env = "AUXWIRE_TARGET", default_value = DEFAULT_TCP_ADDR)]
    pub target: Endpoint,
    /// Maximum time to wait for the reply (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct DriveArgs {
    /// Controller endpoint.
    #[arg(value_name = "ENDPOINT", env = "AUXWIRE_TARGET", default_value = DEFAULT_TCP_ADDR)]
    pub target: Endpoint,
    /// Fan duty schedule (comma-separated fractions).
    #[arg(long, value_delimiter = ',', required = true, allow_negative_numbers = true)]
    pub duty: Vec<f64>,
    /// Time between schedule steps (e.g. 1s, 250ms).
    #[arg(long, default_value = "1s")]
    pub interval: String,
    /// Also query the temperature at every step.
    #[arg(long)]
    pub with_temp: bool,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Address to listen on.
    #[arg(value_name = "ADDR", default_value = "127.0.0.1:1338")]
    pub bind: String,
    /// Exit after the first connection closes.
    #[arg(long)]
    pub once: bool,
    /// Temperature reported by the simulated sensor.
    #[arg(long, default_value = "23", allow_negative_numbers = true)]
    pub degrees_c: i32,
    /// Relative humidity reported by the simulated sensor.
    #[arg(long, default_value = "45")]
    pub humidity: i32,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

/// Connect to `target`, optionally bounding how long a receive may block.
pub(crate) fn open_session(
    target: &Endpoint,
    read_timeout: Option<Duration>,
) -> CliResult<StreamSession> {
    let mut config = SessionConfig::default();
    config.frame.read_timeout = read_timeout;
    connect_with_config(target, &config).map_err(|err| session_error("connect failed", err))
}

/// Source of inbound responses; lets reply matching run without a socket.
pub(crate) trait ResponseSource {
    /// Bound how long the next read may block.
    fn limit_wait(&mut self, remaining: Duration) -> Result<(), SessionError>;

    fn next_response(&mut self) -> Result<Option<Response>, SessionError>;
}

impl ResponseSource for SessionReceiver<AuxStream> {
    fn limit_wait(&mut self, remaining: Duration) -> Result<(), SessionError> {
        self.get_ref().set_read_timeout(Some(remaining))?;
        Ok(())
    }

    fn next_response(&mut self) -> Result<Option<Response>, SessionError> {
        self.receive()
    }
}

/// Read until the response carrying `id` arrives; other traffic is skipped.
///
/// `timeout` bounds the whole wait, not each read, so steady unrelated
/// telemetry cannot hold the caller forever.
pub(crate) fn wait_for_reply<S: ResponseSource>(
    source: &mut S,
    id: i32,
    timeout: Duration,
) -> CliResult<Response> {
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(CliError::new(
                TIMEOUT,
                format!("no reply to request {id} within {timeout:?}"),
            ));
        }
        source
            .limit_wait(remaining)
            .map_err(|err| session_error("receive failed", err))?;

        match source.next_response() {
            Ok(Some(response)) if response.correlation_id == id => return Ok(response),
            Ok(Some(other)) => {
                debug!(
                    id = other.correlation_id,
                    expected = id,
                    "skipping unrelated response"
                );
            }
            Ok(None) => {
                return Err(CliError::new(
                    FAILURE,
                    format!("link closed before reply to request {id}"),
                ))
            }
            Err(err) => return Err(session_error("receive failed", err)),
        }
    }
}

/// First Ctrl-C closes the link so blocked reads return; a second one exits.
pub(crate) fn install_ctrlc_handler(
    running: Arc<AtomicBool>,
    shutdown: ShutdownHandle,
) -> CliResult<()> {
    ctrlc::set_handler(move || {
        if !running.swap(false, Ordering::SeqCst) {
            std::process::exit(INTERRUPTED);
        }
        let _ = shutdown.shutdown();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
