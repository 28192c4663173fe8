use auxwire::sim::SimulatedDevice;
use auxwire_session::SessionListener;
use tracing::{info, warn};

use crate::cmd::SimulateArgs;
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_listening, OutputFormat};

pub fn run(args: SimulateArgs, format: OutputFormat) -> CliResult<i32> {
    let listener =
        SessionListener::bind(args.bind.as_str()).map_err(|err| session_error("bind failed", err))?;
    print_listening(listener.local_addr(), format);

    let mut device = SimulatedDevice::with_climate(args.degrees_c, args.humidity);

    loop {
        let mut session = listener
            .accept()
            .map_err(|err| session_error("accept failed", err))?;

        match device.serve(&mut session) {
            Ok(answered) => info!(answered, total = device.handled(), "connection closed"),
            // One misbehaving host must not take the simulator down.
            Err(err) => warn!(error = %err, "connection dropped"),
        }

        if args.once {
            return Ok(SUCCESS);
        }
    }
}
