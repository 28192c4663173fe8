use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::atomic::{AtomicU64, Ordering};

use auxwire_transport::TcpDeviceListener;
use tracing::info;

use crate::connector::StreamSession;
use crate::error::Result;
use crate::session::SessionConfig;

/// Accepts controller-side sessions over TCP.
///
/// Used to stand in for a device in tests and demos.
pub struct SessionListener {
    listener: TcpDeviceListener,
    config: SessionConfig,
    accepted: AtomicU64,
}

impl SessionListener {
    pub fn bind(addr: impl ToSocketAddrs + std::fmt::Display) -> Result<Self> {
        Ok(Self {
            listener: TcpDeviceListener::bind(addr)?,
            config: SessionConfig::default(),
            accepted: AtomicU64::new(0),
        })
    }

    /// Override session config for accepted connections.
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Block until the next connection arrives.
    pub fn accept(&self) -> Result<StreamSession> {
        let stream = self.listener.accept()?;
        let count = self.accepted.fetch_add(1, Ordering::Relaxed) + 1;
        info!(peer = %stream.peer_label(), count, "session accepted");
        StreamSession::from_stream(stream, &self.config)
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    /// Number of connections accepted so far.
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use auxwire_proto::{Request, RequestBody, Response, ResponseBody, TempCommand, TempReading};
    use auxwire_transport::Endpoint;

    use super::*;
    use crate::connector::connect;

    #[test]
    fn accept_and_exchange() {
        let listener = SessionListener::bind("127.0.0.1:0").expect("listener should bind");
        let endpoint = Endpoint::Tcp(listener.local_addr().to_string());

        let server = thread::spawn(move || {
            let mut session = listener.accept().expect("listener should accept");
            let request: Request = session
                .receive()
                .expect("receive should succeed")
                .expect("client should send a request");
            session
                .send(&Response::new(
                    request.correlation_id,
                    ResponseBody::Temp(TempReading {
                        degrees_c: 22,
                        humidity: 40,
                    }),
                ))
                .expect("reply should send");
            assert_eq!(listener.accepted(), 1);
        });

        let mut client = connect(&endpoint).expect("client should connect");
        client
            .send(&Request::new(77, RequestBody::Temp(TempCommand::Get)))
            .expect("request should send");
        let response: Response = client
            .receive()
            .expect("receive should succeed")
            .expect("server should reply");
        assert_eq!(response.correlation_id, 77);

        server.join().expect("server thread should finish");
        assert_eq!(client.receive::<Response>().expect("clean end"), None);
    }

    #[test]
    fn shutdown_unblocks_receiver() {
        let listener = SessionListener::bind("127.0.0.1:0").expect("listener should bind");
        let endpoint = Endpoint::Tcp(listener.local_addr().to_string());

        let server = thread::spawn(move || {
            let mut session = listener.accept().expect("listener should accept");
            // Hold the connection open without sending anything.
            let _ = session.receive::<Request>();
        });

        let client = connect(&endpoint).expect("client should connect");
        let handle = client.shutdown_handle().expect("handle should clone");
        let (_sender, mut receiver) = client.split();

        let reader = thread::spawn(move || receiver.receive::<Response>());
        thread::sleep(std::time::Duration::from_millis(50));
        handle.shutdown().expect("shutdown should succeed");

        let result = reader.join().expect("reader thread should finish");
        assert!(matches!(result, Ok(None)));
        server.join().expect("server thread should finish");
    }
}
