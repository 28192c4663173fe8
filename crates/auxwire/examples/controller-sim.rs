//! Serve a simulated controller on a local port.
//!
//! Run with:
//!   cargo run --example controller-sim -- 127.0.0.1:1338
//!
//! Then point the CLI at it:
//!   cargo run --features cli -- fan tcp://127.0.0.1:1338 --duty 0.4 --wait

use auxwire::session::SessionListener;
use auxwire::sim::SimulatedDevice;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let bind = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:1338".to_string());

    let listener = SessionListener::bind(bind.as_str())?;
    eprintln!("Listening on {}", listener.local_addr());

    let mut device = SimulatedDevice::new();
    loop {
        let mut session = listener.accept()?;
        match device.serve(&mut session) {
            Ok(answered) => eprintln!(
                "Host disconnected after {answered} requests ({} total)",
                device.handled()
            ),
            Err(e) => eprintln!("Host dropped: {e}"),
        }
    }
}
