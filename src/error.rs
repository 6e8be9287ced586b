/// Socket option and poller setup errors.
#[derive(Debug, thiserror::Error)]
pub enum SocketError {
	#[error("setsockopt({option}) failed: {}", errno_to_str(*.errno))]
	SetOption { errno: i32, option: &'static str },

	#[error("getsockopt({option}) failed: {}", errno_to_str(*.errno))]
	GetOption { errno: i32, option: &'static str },

	#[error("epoll_create1() failed: {}", errno_to_str(*.errno))]
	PollCreate { errno: i32 },

	#[error("epoll_ctl({op}, fd={fd}) failed: {}", errno_to_str(*.errno))]
	PollControl { errno: i32, op: &'static str, fd: i32 },

	#[error("epoll_wait() failed: {}", errno_to_str(*.errno))]
	PollWait { errno: i32 },
}

/// Terminal outcome of `recv()` / `send()` on a connection.
///
/// Every variant means the same thing to the caller: the connection is done
/// and should be closed. The variants only differ for diagnosis.
#[derive(Debug, thiserror::Error)]
pub enum Disconnect {
	/// The peer performed an orderly shutdown (zero-length read).
	#[error("connection closed by peer")]
	PeerClosed,

	#[error("connection reset by peer: {}", errno_to_str(*.errno))]
	Reset { errno: i32 },

	/// Any other errno from the socket call.
	#[error("{op}() failed: {}", errno_to_str(*.errno))]
	System { op: &'static str, errno: i32 },

	/// The head send item could not produce its bytes.
	#[error("send source failed: {0}")]
	Source(#[source] std::io::Error),

	#[error("connection is not open")]
	NotOpen,
}

impl Disconnect {
	/// True for failures logged at error severity rather than debug.
	pub fn is_system_error(&self) -> bool {
		matches!(self, Disconnect::System { .. } | Disconnect::Source(_))
	}

	/// Numeric errno behind the disconnect, if there was one.
	pub fn errno(&self) -> Option<i32> {
		match self {
			Disconnect::Reset { errno } | Disconnect::System { errno, .. } => Some(*errno),
			Disconnect::Source(err) => err.raw_os_error(),
			Disconnect::PeerClosed | Disconnect::NotOpen => None,
		}
	}
}

/// Returns current errno value.
#[inline]
pub fn errno() -> i32 {
	unsafe { *libc::__errno_location() }
}

/// Converts errno to human-readable string.
fn errno_to_str(errno: i32) -> String {
	match errno {
		libc::EAGAIN => "resource temporarily unavailable".into(),
		libc::EBADF => "bad file descriptor".into(),
		libc::ECONNABORTED => "connection aborted".into(),
		libc::ECONNRESET => "connection reset by peer".into(),
		libc::EEXIST => "already registered".into(),
		libc::EINTR => "interrupted by signal".into(),
		libc::EINVAL => "invalid argument".into(),
		libc::EMFILE => "too many open files".into(),
		libc::ENFILE => "file table overflow".into(),
		libc::ENOBUFS => "no buffer space available".into(),
		libc::ENOENT => "not registered".into(),
		libc::ENOMEM => "out of memory".into(),
		libc::ENOTCONN => "not connected".into(),
		libc::ENOTSOCK => "not a socket".into(),
		libc::EPIPE => "broken pipe".into(),
		libc::ETIMEDOUT => "connection timed out".into(),
		_ => format!("errno {}", errno),
	}
}

/// Maps errno to std::io::ErrorKind.
fn errno_to_kind(errno: i32) -> std::io::ErrorKind {
	match errno {
		libc::EACCES | libc::EPERM => std::io::ErrorKind::PermissionDenied,
		libc::EAGAIN => std::io::ErrorKind::WouldBlock,
		libc::ECONNABORTED => std::io::ErrorKind::ConnectionAborted,
		libc::ECONNRESET => std::io::ErrorKind::ConnectionReset,
		libc::EEXIST => std::io::ErrorKind::AlreadyExists,
		libc::EINTR => std::io::ErrorKind::Interrupted,
		libc::EINVAL => std::io::ErrorKind::InvalidInput,
		libc::ENOENT => std::io::ErrorKind::NotFound,
		libc::ENOTCONN => std::io::ErrorKind::NotConnected,
		libc::EPIPE => std::io::ErrorKind::BrokenPipe,
		libc::ETIMEDOUT => std::io::ErrorKind::TimedOut,
		_ => std::io::ErrorKind::Other,
	}
}

impl From<SocketError> for std::io::Error {
	fn from(err: SocketError) -> Self {
		let errno = match &err {
			SocketError::SetOption { errno, .. } => *errno,
			SocketError::GetOption { errno, .. } => *errno,
			SocketError::PollCreate { errno } => *errno,
			SocketError::PollControl { errno, .. } => *errno,
			SocketError::PollWait { errno } => *errno,
		};
		std::io::Error::new(errno_to_kind(errno), err)
	}
}

impl From<Disconnect> for std::io::Error {
	fn from(err: Disconnect) -> Self {
		let kind = match &err {
			Disconnect::PeerClosed => std::io::ErrorKind::UnexpectedEof,
			Disconnect::Reset { errno } => errno_to_kind(*errno),
			Disconnect::System { errno, .. } => errno_to_kind(*errno),
			Disconnect::Source(source) => source.kind(),
			Disconnect::NotOpen => std::io::ErrorKind::NotConnected,
		};
		std::io::Error::new(kind, err)
	}
}
