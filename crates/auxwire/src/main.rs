mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "auxwire",
    version,
    about = "Command and monitor fan/light/sensor controllers over TCP or serial"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use auxwire_transport::Endpoint;

    use super::*;

    #[test]
    fn parses_fan_subcommand() {
        let cli = Cli::try_parse_from([
            "auxwire",
            "fan",
            "tcp://127.0.0.1:4000",
            "--duty",
            "0.5",
            "--wait",
        ])
        .expect("fan args should parse");

        match cli.command {
            Command::Fan(args) => {
                assert_eq!(args.target, Endpoint::Tcp("127.0.0.1:4000".to_string()));
                assert_eq!(args.duty, Some(0.5));
                assert!(args.wait);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn target_defaults_to_device_address() {
        let cli = Cli::try_parse_from(["auxwire", "temp"]).expect("temp args should parse");
        match cli.command {
            Command::Temp(args) => {
                let expected: Endpoint = auxwire_transport::DEFAULT_TCP_ADDR
                    .parse()
                    .expect("default should parse");
                // AUXWIRE_TARGET may be set in the environment running the tests.
                if std::env::var_os("AUXWIRE_TARGET").is_none() {
                    assert_eq!(args.target, expected);
                }
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_drive_schedule() {
        let cli = Cli::try_parse_from([
            "auxwire",
            "drive",
            "/dev/ttyACM0",
            "--duty",
            "0.1,0.5,1",
            "--interval",
            "250ms",
            "--with-temp",
        ])
        .expect("drive args should parse");

        match cli.command {
            Command::Drive(args) => {
                assert!(matches!(args.target, Endpoint::Serial(_)));
                assert_eq!(args.duty, vec![0.1, 0.5, 1.0]);
                assert!(args.with_temp);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_endpoint() {
        let err = Cli::try_parse_from(["auxwire", "monitor", "tcp://nohost"])
            .expect_err("missing port should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn drive_requires_schedule() {
        let err = Cli::try_parse_from(["auxwire", "drive", "127.0.0.1:1338"])
            .expect_err("missing --duty should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
