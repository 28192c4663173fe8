use std::io::IsTerminal;
use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use auxwire_proto::{Response, ResponseBody};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ResponseOutput<'a> {
    correlation_id: i32,
    device: &'static str,
    body: &'a ResponseBody,
    timestamp: String,
}

pub fn print_response(response: &Response, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ResponseOutput {
                correlation_id: response.correlation_id,
                device: response.body.device(),
                body: &response.body,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ID", "DEVICE", "READING"])
                .add_row(vec![
                    response.correlation_id.to_string(),
                    response.body.device().to_string(),
                    describe(&response.body),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "id={} device={} {}",
                response.correlation_id,
                response.body.device(),
                describe(&response.body)
            );
        }
    }
}

#[derive(Serialize)]
struct ListeningOutput {
    event: &'static str,
    addr: String,
}

pub fn print_listening(addr: SocketAddr, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ListeningOutput {
                event: "listening",
                addr: addr.to_string(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => println!("listening on {addr}"),
    }
}

/// One-line human description of a response body.
pub fn describe(body: &ResponseBody) -> String {
    match body {
        ResponseBody::Fan(status) => format!(
            "duty {}/{} ({:.1}%), {} rpm",
            status.duty,
            u16::MAX,
            f64::from(status.duty) * 100.0 / f64::from(u16::MAX),
            status.rpm
        ),
        ResponseBody::Temp(reading) => {
            format!("{} °C, {} %RH", reading.degrees_c, reading.humidity)
        }
        ResponseBody::Light(status) => format!(
            "duty {:.2} ({:.1}%)",
            status.duty,
            f64::from(status.duty) * 100.0
        ),
        ResponseBody::Error(err) => format!("error: {}", err.message),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
