//! Process-wide socket buffer sizes.
//!
//! The first connection's descriptor is asked for its SO_SNDBUF/SO_RCVBUF
//! once; every later connection reuses those numbers as its per-call I/O
//! chunk size. Initialization happens exactly once even when several
//! reactor threads accept their first connection at the same time.

use std::os::fd::AsRawFd;
use std::sync::OnceLock;

use super::options::{get_recv_buffer_size, get_send_buffer_size};

/// Fallback used when the kernel cannot be queried.
pub const DEFAULT_BUFFER_SIZE: usize = 128 * 1024;

static NEGOTIATED: OnceLock<BufferSizes> = OnceLock::new();

/// Send and receive chunk sizes shared by every connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSizes {
	pub send: usize,
	pub recv: usize,
}

impl Default for BufferSizes {
	fn default() -> Self {
		Self { send: DEFAULT_BUFFER_SIZE, recv: DEFAULT_BUFFER_SIZE }
	}
}

impl BufferSizes {
	/// Reads both sizes from `socket`, substituting the default for any
	/// query that fails or reports zero.
	pub fn query<S: AsRawFd>(socket: &S) -> Self {
		let send = match get_send_buffer_size(socket) {
			Ok(size) if size > 0 => size,
			Ok(_) => DEFAULT_BUFFER_SIZE,
			Err(e) => {
				tracing::debug!(error = %e, "using default send buffer size");
				DEFAULT_BUFFER_SIZE
			}
		};
		let recv = match get_recv_buffer_size(socket) {
			Ok(size) if size > 0 => size,
			Ok(_) => DEFAULT_BUFFER_SIZE,
			Err(e) => {
				tracing::debug!(error = %e, "using default receive buffer size");
				DEFAULT_BUFFER_SIZE
			}
		};
		Self { send, recv }
	}
}

/// Returns the process-wide sizes, querying `socket` if nobody has yet.
pub fn negotiate<S: AsRawFd>(socket: &S) -> BufferSizes {
	*NEGOTIATED.get_or_init(|| {
		let sizes = BufferSizes::query(socket);
		tracing::debug!(send = sizes.send, recv = sizes.recv, "negotiated socket buffer sizes");
		sizes
	})
}

/// Negotiated sizes, if a connection has negotiated them.
pub fn negotiated() -> Option<BufferSizes> {
	NEGOTIATED.get().copied()
}

/// Largest chunk a single `send()` syscall is offered.
pub fn send_buffer_size() -> usize {
	NEGOTIATED.get().map_or(DEFAULT_BUFFER_SIZE, |s| s.send)
}

/// Size of the region reserved for each `recv()` syscall.
pub fn recv_buffer_size() -> usize {
	NEGOTIATED.get().map_or(DEFAULT_BUFFER_SIZE, |s| s.recv)
}
