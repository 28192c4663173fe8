//! Async link: one task sends commands while the main task prints replies.
//!
//! Run against the simulator:
//!   cargo run --example controller-sim
//!   cargo run --example async-monitor --features async -- tcp://127.0.0.1:1338

use std::time::Duration;

use auxwire::proto::Response;
use auxwire::session::{connect_async, AsyncController};
use auxwire::transport::{Endpoint, DEFAULT_TCP_ADDR};
use futures_util::{pin_mut, TryStreamExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let target = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_TCP_ADDR.to_string());
    let endpoint: Endpoint = target.parse()?;

    let (sender, mut receiver) = connect_async(&endpoint).await?.split();

    let commands = tokio::spawn(async move {
        let mut controller = AsyncController::new(sender);
        let mut sent = 0usize;
        for duty in [0.0, 0.25, 0.5, 0.75, 1.0] {
            controller.set_light_duty(duty).await?;
            controller.query_temperature().await?;
            sent += 2;
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        Ok::<_, auxwire::session::SessionError>(sent)
    });

    let replies = receiver.receive_all::<Response>();
    pin_mut!(replies);
    let mut seen = 0usize;
    while let Some(response) = replies.try_next().await? {
        eprintln!("#{} {:?}", response.correlation_id, response.body);
        seen += 1;
        if seen == 10 {
            break;
        }
    }

    let sent = commands.await??;
    eprintln!("sent {sent} requests, printed {seen} replies");
    Ok(())
}
