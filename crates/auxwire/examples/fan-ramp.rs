//! Ramp the fan from off to full while printing every reply.
//!
//! Run against the simulator:
//!   cargo run --features cli -- simulate 127.0.0.1:1338
//!   cargo run --example fan-ramp -- tcp://127.0.0.1:1338

use std::thread;
use std::time::Duration;

use auxwire::proto::Response;
use auxwire::session::{connect, Controller};
use auxwire::transport::{Endpoint, DEFAULT_TCP_ADDR};

const STEPS: u32 = 10;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let target = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_TCP_ADDR.to_string());
    let endpoint: Endpoint = target.parse()?;

    let session = connect(&endpoint)?;
    let finished = session.shutdown_handle()?;
    let (sender, mut receiver) = session.split();

    let ramp = thread::spawn(move || -> Result<(), auxwire::session::SessionError> {
        let mut controller = Controller::new(sender);
        for step in 0..=STEPS {
            controller.set_fan_duty(f64::from(step) / f64::from(STEPS))?;
            thread::sleep(Duration::from_millis(250));
        }
        let _ = finished.shutdown();
        Ok(())
    });

    for response in receiver.receive_all::<Response>() {
        let response = response?;
        eprintln!("#{} {:?}", response.correlation_id, response.body);
    }

    ramp.join().map_err(|_| "ramp thread panicked")??;
    Ok(())
}
