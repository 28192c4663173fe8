#![cfg(unix)]

//! Sessions over a FIFO opened read-write, which behaves like an idle tty:
//! reads block and never see end of stream on their own.

use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use auxwire_proto::{Response, ResponseBody, TempReading};
use auxwire_session::{connect, connect_with_config, SessionConfig, SessionError};
use auxwire_transport::Endpoint;

struct Fifo {
    dir: PathBuf,
    path: PathBuf,
}

impl Fifo {
    fn new(tag: &str) -> Self {
        let dir = std::env::temp_dir().join(format!(
            "auxwire-session-fifo-{tag}-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).expect("temp dir should be created");
        let path = dir.join("tty");
        let _ = std::fs::remove_file(&path);
        let c_path = CString::new(path.as_os_str().as_bytes()).expect("path has no NUL");
        // SAFETY: `c_path` is a valid NUL-terminated path.
        let rc = unsafe { libc::mkfifo(c_path.as_ptr(), 0o600) };
        assert_eq!(rc, 0, "mkfifo failed: {}", std::io::Error::last_os_error());
        Self { dir, path }
    }

    fn endpoint(&self) -> Endpoint {
        Endpoint::Serial(self.path.clone())
    }
}

impl Drop for Fifo {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

fn reading(id: i32) -> Response {
    Response::new(
        id,
        ResponseBody::Temp(TempReading {
            degrees_c: 19,
            humidity: 61,
        }),
    )
}

#[test]
fn frames_loop_back_through_device_node() {
    let fifo = Fifo::new("loop");
    let mut session = connect(&fifo.endpoint()).expect("serial session should open");

    session.send(&reading(7)).expect("send should succeed");
    let echoed: Response = session
        .receive()
        .expect("receive should succeed")
        .expect("frame should arrive");
    assert_eq!(echoed, reading(7));
}

#[test]
fn shutdown_ends_blocked_receive() {
    let fifo = Fifo::new("shutdown");
    let session = connect(&fifo.endpoint()).expect("serial session should open");
    let handle = session.shutdown_handle().expect("shutdown handle");
    let (sender, mut receiver) = session.split();

    let (done_tx, done_rx) = mpsc::channel();
    thread::spawn(move || {
        let result = receiver.receive::<Response>().map_err(|e| e.to_string());
        let _ = done_tx.send((result, receiver.is_ended()));
    });

    thread::sleep(Duration::from_millis(100));
    handle.shutdown().expect("shutdown should succeed");

    let (result, ended) = done_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("blocked receive should return after shutdown");
    assert_eq!(result, Ok(None));
    assert!(ended);

    let mut sender = sender;
    assert!(matches!(
        sender.send(&reading(1)),
        Err(SessionError::WriteFailed { .. })
    ));
}

#[test]
fn read_timeout_surfaces_as_read_failed() {
    let fifo = Fifo::new("timeout");
    let mut config = SessionConfig::default();
    config.frame.read_timeout = Some(Duration::from_millis(100));
    let mut session =
        connect_with_config(&fifo.endpoint(), &config).expect("serial session should open");

    let err = session.receive::<Response>().unwrap_err();
    assert!(
        matches!(&err, SessionError::ReadFailed(e) if e.kind() == std::io::ErrorKind::WouldBlock),
        "unexpected error: {err:?}"
    );
}
