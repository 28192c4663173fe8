use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use auxwire_proto::Response;
use tracing::info;

use crate::cmd::{install_ctrlc_handler, open_session, MonitorArgs};
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_response, OutputFormat};

pub fn run(args: MonitorArgs, format: OutputFormat) -> CliResult<i32> {
    let mut session = open_session(&args.target, None)?;

    let running = Arc::new(AtomicBool::new(true));
    let shutdown = session
        .shutdown_handle()
        .map_err(|err| session_error("connect failed", err))?;
    install_ctrlc_handler(running.clone(), shutdown)?;

    let mut printed = 0usize;
    for response in session.receive_all::<Response>() {
        let response = match response {
            Ok(response) => response,
            Err(_) if !running.load(Ordering::SeqCst) => break,
            Err(err) => return Err(session_error("receive failed", err)),
        };

        print_response(&response, format);
        printed = printed.saturating_add(1);

        if args.count.is_some_and(|count| printed >= count) {
            break;
        }
    }

    info!(printed, target = %args.target, "monitor finished");
    Ok(SUCCESS)
}
