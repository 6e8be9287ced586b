use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::sync::Arc;

use tracing::{debug, error, trace, warn};

use crate::addr::PeerAddr;
use crate::error::{Disconnect, errno};
use crate::id::next_id;
use crate::reactor::{Interest, Reactor};
use crate::send::{SendItem, SendQueue};
use crate::socket::{self, AcceptConfig, RecvBuffer};

/// Why a `send()` loop stopped pushing bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
	/// The kernel send buffer is full.
	WouldBlock,
	/// The head item had nothing ready; it needs replenishing first.
	SourceNotReady,
	/// `send()` accepted zero bytes.
	ZeroWrite,
	/// ECONNRESET / EPIPE.
	Reset,
	/// Any other failure of the socket or the item's source.
	Failed,
}

/// Whether a connection must re-register for readiness after a send loop.
///
/// A loop that stopped on a full kernel buffer will get a fresh writable
/// edge once it drains. Any other stop gets no such edge, so with work still
/// queued the watch has to be re-armed or the connection stalls.
pub fn should_re_arm(stop: StopReason, queue_non_empty: bool) -> bool {
	stop != StopReason::WouldBlock && queue_non_empty
}

/// One non-blocking TCP (or Unix stream) connection driven by a reactor.
///
/// Owned by a single reactor thread; nothing in here locks.
pub struct Connection {
	fd: Option<OwnedFd>,
	id: u64,
	peer: PeerAddr,
	queue: SendQueue,
	reactor: Arc<dyn Reactor>,
}

impl Connection {
	/// Accepts one pending connection from `listener`.
	///
	/// Returns `None` when nothing is pending or the accept failed; the
	/// listener is left untouched either way.
	pub fn accept<L: AsRawFd>(listener: &L, reactor: Arc<dyn Reactor>) -> Option<Connection> {
		Self::accept_inner(listener, reactor, None)
	}

	/// Like `accept`, applying `config` to the new descriptor first.
	pub fn accept_with<L: AsRawFd>(listener: &L, reactor: Arc<dyn Reactor>,
								   config: &AcceptConfig) -> Option<Connection> {
		Self::accept_inner(listener, reactor, Some(config))
	}

	fn accept_inner<L: AsRawFd>(listener: &L, reactor: Arc<dyn Reactor>,
								config: Option<&AcceptConfig>) -> Option<Connection> {
		let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
		let mut len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;

		let fd = loop {
			let fd = unsafe {
				libc::accept4(
					listener.as_raw_fd(),
					&mut storage as *mut _ as *mut libc::sockaddr,
					&mut len,
					libc::SOCK_NONBLOCK | libc::SOCK_CLOEXEC,
				)
			};
			if fd >= 0 {
				break fd;
			}
			let err = errno();
			if err == libc::EINTR {
				continue;
			}
			if is_would_block(err) {
				return None;
			}
			if is_fd_exhaustion(err) {
				trace!(errno = err, "accept deferred");
				return None;
			}
			warn!(listener = listener.as_raw_fd(), errno = err, "failed accept");
			return None;
		};

		let fd = unsafe { OwnedFd::from_raw_fd(fd) };
		let peer = unsafe { PeerAddr::from_storage(&storage, len) };

		if let Some(config) = config {
			let is_unix = matches!(peer, PeerAddr::Unix(_));
			if let Err(e) = config.apply(&fd, is_unix) {
				warn!(fd = fd.as_raw_fd(), error = %e, "failed to apply accept options");
			}
		}

		Some(Self::from_fd(fd, peer, reactor))
	}

	/// Wraps an already-open, non-blocking descriptor.
	pub fn from_fd(fd: OwnedFd, peer: PeerAddr, reactor: Arc<dyn Reactor>) -> Connection {
		socket::negotiate(&fd);
		let id = next_id();
		debug!(id, fd = fd.as_raw_fd(), peer = %peer, "connection created");

		Connection {
			fd: Some(fd),
			id,
			peer,
			queue: SendQueue::new(),
			reactor,
		}
	}

	pub fn id(&self) -> u64 {
		self.id
	}

	pub fn peer_addr(&self) -> &PeerAddr {
		&self.peer
	}

	pub fn is_open(&self) -> bool {
		self.fd.is_some()
	}

	/// The descriptor, or `None` once closed.
	pub fn raw_fd(&self) -> Option<RawFd> {
		self.fd.as_ref().map(AsRawFd::as_raw_fd)
	}

	pub fn queue(&self) -> &SendQueue {
		&self.queue
	}

	/// Number of queued, not yet completed items.
	pub fn pending(&self) -> usize {
		self.queue.len()
	}

	/// Reads everything currently available into `buf`.
	///
	/// Returns `Ok` once the socket reports would-block; every byte read
	/// before that (or before a disconnect) has been committed to `buf`.
	pub fn recv<B: RecvBuffer + ?Sized>(&mut self, buf: &mut B) -> Result<(), Disconnect> {
		let fd = self.raw_fd().ok_or(Disconnect::NotOpen)?;
		let chunk = socket::recv_buffer_size();

		let err = loop {
			let region = buf.reserve(chunk);
			let len = unsafe {
				libc::recv(fd, region.as_mut_ptr() as *mut libc::c_void, region.len(), 0)
			};
			if len > 0 {
				buf.commit(len as usize);
				continue;
			}
			if len == 0 {
				break 0;
			}
			match errno() {
				libc::EINTR => continue,
				err => break err,
			}
		};

		match err {
			e if is_would_block(e) => Ok(()),
			0 => {
				debug!(id = self.id, errno = 0, "socket disconnected");
				Err(Disconnect::PeerClosed)
			}
			libc::ECONNRESET => {
				debug!(id = self.id, errno = err, "socket disconnected");
				Err(Disconnect::Reset { errno: err })
			}
			_ => {
				error!(id = self.id, errno = err, "failed recv");
				Err(Disconnect::System { op: "recv", errno: err })
			}
		}
	}

	/// Pushes as much of the head item as the socket takes.
	///
	/// Only the head item is touched. It is removed (and its access log
	/// flushed) when it is fully sent or when the send failed.
	pub fn send(&mut self) -> Result<(), Disconnect> {
		if self.queue.is_empty() {
			return Ok(());
		}
		let fd = self.raw_fd().ok_or(Disconnect::NotOpen)?;
		let chunk = socket::send_buffer_size();
		let id = self.id;

		let Some(item) = self.queue.front_mut() else {
			return Ok(());
		};

		let (stop, failure) = loop {
			let data = match item.take(chunk) {
				Ok(data) => data,
				Err(e) => break (StopReason::Failed, Some(Disconnect::Source(e))),
			};
			if data.is_empty() {
				break (StopReason::SourceNotReady, None);
			}

			let len = unsafe {
				libc::send(fd, data.as_ptr() as *const libc::c_void, data.len(), libc::MSG_NOSIGNAL)
			};
			if len > 0 {
				let sent = len as usize;
				item.advance(sent);
				item.record_sent(sent);
				continue;
			}
			if len == 0 {
				break (StopReason::ZeroWrite, None);
			}
			match errno() {
				libc::EINTR => continue,
				e if is_would_block(e) => break (StopReason::WouldBlock, None),
				e @ (libc::ECONNRESET | libc::EPIPE) => {
					break (StopReason::Reset, Some(Disconnect::Reset { errno: e }))
				}
				e => break (StopReason::Failed, Some(Disconnect::System { op: "send", errno: e })),
			}
		};

		if let Some(failure) = &failure {
			if failure.is_system_error() {
				error!(id, errno = failure.errno().unwrap_or(0), error = %failure, "failed send");
			} else {
				debug!(id, errno = failure.errno().unwrap_or(0), "socket disconnected");
			}
			item.mark_failed();
		}
		let finished = item.is_exhausted();

		if should_re_arm(stop, !self.queue.is_empty()) {
			self.re_arm(fd);
		}

		if finished || failure.is_some() {
			if let Some(done) = self.queue.pop() {
				done.finish();
			}
		}

		match failure {
			Some(failure) => Err(failure),
			None => Ok(()),
		}
	}

	fn re_arm(&self, fd: RawFd) {
		if let Err(e) = self.reactor.re_arm(fd, self.id, Interest::RE_ARM) {
			warn!(id = self.id, error = %e, "failed to re-arm readiness");
		}
	}

	/// Appends a prepared item to the send queue.
	pub fn enqueue(&mut self, item: SendItem) {
		self.queue.push(item);
	}

	/// Appends raw bytes as an in-memory item without an access log.
	pub fn enqueue_bytes(&mut self, data: impl Into<Vec<u8>>) {
		self.queue.push(SendItem::from_bytes(data));
	}

	/// Closes the descriptor. Calling it again does nothing.
	pub fn close(&mut self) {
		if let Some(fd) = self.fd.take() {
			debug!(id = self.id, fd = fd.as_raw_fd(), "connection closed");
			drop(fd);
		}
	}

	/// Puts a different descriptor under this connection.
	///
	/// An open descriptor still held here is closed first.
	pub fn rebind(&mut self, fd: OwnedFd) {
		self.close();
		debug!(id = self.id, fd = fd.as_raw_fd(), "connection rebound");
		self.fd = Some(fd);
	}
}

impl Drop for Connection {
	fn drop(&mut self) {
		self.close();
		// The queue drops its items here; their logs are never flushed.
	}
}

impl std::fmt::Debug for Connection {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Connection")
			.field("id", &self.id)
			.field("fd", &self.raw_fd())
			.field("peer", &self.peer)
			.field("pending", &self.queue.len())
			.finish()
	}
}

#[inline]
fn is_would_block(err: i32) -> bool {
	err == libc::EAGAIN || err == libc::EWOULDBLOCK
}

/// Accept failures that clear up on their own once descriptors or memory free up.
#[inline]
fn is_fd_exhaustion(err: i32) -> bool {
	matches!(err, libc::EMFILE | libc::ENFILE | libc::ENOBUFS | libc::ENOMEM)
}
