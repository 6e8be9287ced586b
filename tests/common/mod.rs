#![allow(dead_code)]

use std::net::{TcpListener, TcpStream};
use std::os::fd::RawFd;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use edgeconn::{AcceptConfig, AccessLog, Connection, Interest, Reactor};

/// Reactor that remembers every re-arm request.
#[derive(Default)]
pub struct RecordingReactor {
	calls: Mutex<Vec<(RawFd, u64, Interest)>>,
}

impl RecordingReactor {
	pub fn calls(&self) -> Vec<(RawFd, u64, Interest)> {
		self.calls.lock().unwrap().clone()
	}
}

impl Reactor for RecordingReactor {
	fn re_arm(&self, fd: RawFd, token: u64, interest: Interest) -> std::io::Result<()> {
		self.calls.lock().unwrap().push((fd, token, interest));
		Ok(())
	}
}

#[derive(Debug, Default)]
pub struct LogState {
	pub bytes: i64,
	pub flushes: usize,
}

/// Access log whose state outlives the send item it is attached to.
#[derive(Clone, Default)]
pub struct SharedLog(pub Arc<Mutex<LogState>>);

impl SharedLog {
	pub fn bytes(&self) -> i64 {
		self.0.lock().unwrap().bytes
	}

	pub fn flushes(&self) -> usize {
		self.0.lock().unwrap().flushes
	}
}

impl AccessLog for SharedLog {
	fn add_bytes(&mut self, n: usize) {
		let mut state = self.0.lock().unwrap();
		if state.bytes >= 0 {
			state.bytes += n as i64;
		}
	}

	fn mark_failed(&mut self) {
		self.0.lock().unwrap().bytes = -1;
	}

	fn flush(&mut self) {
		self.0.lock().unwrap().flushes += 1;
	}
}

pub struct Pair {
	pub conn: Connection,
	pub client: TcpStream,
	pub reactor: Arc<RecordingReactor>,
}

/// Accepted server-side connection plus its blocking loopback client.
pub fn tcp_pair() -> Pair {
	tcp_pair_with(None)
}

pub fn tcp_pair_with(config: Option<AcceptConfig>) -> Pair {
	let listener = TcpListener::bind("127.0.0.1:0").unwrap();
	let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
	let reactor = Arc::new(RecordingReactor::default());

	let conn = match config {
		Some(config) => Connection::accept_with(&listener, reactor.clone(), &config),
		None => Connection::accept(&listener, reactor.clone()),
	}
	.expect("pending connection");

	Pair { conn, client, reactor }
}

/// Gives the loopback stack time to deliver a FIN or RST.
pub fn settle() {
	std::thread::sleep(Duration::from_millis(50));
}

pub fn temp_path(tag: &str) -> std::path::PathBuf {
	let unique = edgeconn::next_id();
	std::env::temp_dir().join(format!("edgeconn-{}-{}-{:x}", tag, std::process::id(), unique))
}
