//! The seam between connections and the readiness loop.

use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use crate::error::{SocketError, errno};

/// Readiness interest mask, in epoll bit layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Interest(u32);

impl Interest {
	pub const READABLE: Interest = Interest(libc::EPOLLIN as u32);
	pub const WRITABLE: Interest = Interest(libc::EPOLLOUT as u32);
	pub const EDGE: Interest = Interest(libc::EPOLLET as u32);

	/// What a connection asks for when its send loop stops with work left.
	pub const RE_ARM: Interest = Interest(
		Self::READABLE.0 | Self::WRITABLE.0 | Self::EDGE.0
	);

	pub const fn bits(self) -> u32 {
		self.0
	}

	pub const fn from_bits(bits: u32) -> Self {
		Interest(bits)
	}

	pub const fn contains(self, other: Interest) -> bool {
		self.0 & other.0 == other.0
	}

	pub fn is_readable(self) -> bool {
		self.contains(Self::READABLE)
	}

	pub fn is_writable(self) -> bool {
		self.contains(Self::WRITABLE)
	}
}

impl std::ops::BitOr for Interest {
	type Output = Interest;

	fn bitor(self, rhs: Interest) -> Interest {
		Interest(self.0 | rhs.0)
	}
}

impl std::ops::BitOrAssign for Interest {
	fn bitor_assign(&mut self, rhs: Interest) {
		self.0 |= rhs.0;
	}
}

/// The readiness loop a connection belongs to.
///
/// Only `re_arm` is needed here: the connection calls it from its owning
/// thread whenever the edge-triggered watch could otherwise go stale.
/// Implementations must tolerate repeated calls with the same arguments.
pub trait Reactor: Send + Sync {
	/// Re-registers `fd` (identified by `token`) for `interest`.
	fn re_arm(&self, fd: RawFd, token: u64, interest: Interest) -> std::io::Result<()>;
}

/// Thin wrapper over an epoll instance.
///
/// The token given at registration comes back with each event; connections
/// use their identifier.
#[derive(Debug)]
pub struct Epoll {
	fd: OwnedFd,
}

impl Epoll {
	pub fn new() -> std::io::Result<Self> {
		let fd = unsafe { libc::epoll_create1(libc::EPOLL_CLOEXEC) };
		if fd == -1 {
			return Err(SocketError::PollCreate { errno: errno() }.into());
		}
		let fd = unsafe { OwnedFd::from_raw_fd(fd) };
		Ok(Self { fd })
	}

	pub fn add(&self, fd: RawFd, token: u64, interest: Interest) -> std::io::Result<()> {
		self.ctl(libc::EPOLL_CTL_ADD, "ADD", fd, token, interest)
	}

	pub fn modify(&self, fd: RawFd, token: u64, interest: Interest) -> std::io::Result<()> {
		self.ctl(libc::EPOLL_CTL_MOD, "MOD", fd, token, interest)
	}

	pub fn delete(&self, fd: RawFd) -> std::io::Result<()> {
		self.ctl(libc::EPOLL_CTL_DEL, "DEL", fd, 0, Interest::default())
	}

	/// Waits up to `timeout_ms` (-1 = forever) and fills `events`.
	///
	/// An interrupted wait reports zero events.
	pub fn wait(&self, events: &mut Events, timeout_ms: i32) -> std::io::Result<usize> {
		events.len = 0;
		let n = unsafe {
			libc::epoll_wait(
				self.fd.as_raw_fd(),
				events.buf.as_mut_ptr(),
				events.buf.len() as libc::c_int,
				timeout_ms,
			)
		};
		if n == -1 {
			let err = errno();
			if err == libc::EINTR {
				return Ok(0);
			}
			return Err(SocketError::PollWait { errno: err }.into());
		}
		events.len = n as usize;
		Ok(events.len)
	}

	fn ctl(&self, op: libc::c_int, name: &'static str, fd: RawFd, token: u64,
		   interest: Interest) -> std::io::Result<()> {
		let mut event: libc::epoll_event = unsafe { std::mem::zeroed() };
		event.events = interest.bits();
		event.data.u64 = token;

		let result = unsafe { libc::epoll_ctl(self.fd.as_raw_fd(), op, fd, &mut event) };
		if result == -1 {
			return Err(SocketError::PollControl { errno: errno(), op: name, fd }.into());
		}
		Ok(())
	}
}

impl Reactor for Epoll {
	fn re_arm(&self, fd: RawFd, token: u64, interest: Interest) -> std::io::Result<()> {
		self.modify(fd, token, interest)
	}
}

impl AsRawFd for Epoll {
	fn as_raw_fd(&self) -> RawFd {
		self.fd.as_raw_fd()
	}
}

/// Reusable buffer for `Epoll::wait`.
pub struct Events {
	buf: Vec<libc::epoll_event>,
	len: usize,
}

impl Events {
	pub fn with_capacity(capacity: usize) -> Self {
		let zeroed: libc::epoll_event = unsafe { std::mem::zeroed() };
		Self { buf: vec![zeroed; capacity.max(1)], len: 0 }
	}

	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// `(token, readiness)` pairs from the last wait.
	pub fn iter(&self) -> impl Iterator<Item = (u64, Interest)> + '_ {
		self.buf[..self.len].iter().map(|ev| {
			let token = unsafe { ev.data.u64 };
			let bits = ev.events;
			(token, Interest::from_bits(bits))
		})
	}
}

impl std::fmt::Debug for Events {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_list().entries(self.iter()).finish()
	}
}
