use std::os::fd::AsRawFd;
use super::options::{
	set_keepalive, set_keepalive_count, set_keepalive_idle, set_keepalive_interval,
	set_linger, set_recv_buffer_size, set_send_buffer_size, set_tcp_nodelay,
};

// ============================================================================
// Per-connection socket options
// ============================================================================

/// Kernel buffer sizes to request on each accepted socket.
///
/// Unset fields leave the kernel default alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct BufferConfig {
	pub recv: Option<usize>,
	pub send: Option<usize>,
}

impl BufferConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn recv(mut self, size: usize) -> Self {
		self.recv = Some(size);
		self
	}

	pub fn send(mut self, size: usize) -> Self {
		self.send = Some(size);
		self
	}

	pub fn both(mut self, size: usize) -> Self {
		self.recv = Some(size);
		self.send = Some(size);
		self
	}

	fn apply<S: AsRawFd>(&self, socket: &S) -> std::io::Result<()> {
		if let Some(size) = self.recv {
			set_recv_buffer_size(socket, size)?;
		}
		if let Some(size) = self.send {
			set_send_buffer_size(socket, size)?;
		}
		Ok(())
	}
}

/// TCP options for accepted connections. Skipped for Unix peers.
#[derive(Debug, Clone, Copy)]
pub struct TcpConfig {
	pub nodelay: bool,
	pub keepalive: Option<KeepaliveConfig>,
	pub linger: Option<Option<u32>>,
}

impl Default for TcpConfig {
	fn default() -> Self {
		Self {
			nodelay: true,
			keepalive: None,
			linger: None,
		}
	}
}

impl TcpConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn nodelay(mut self, enable: bool) -> Self {
		self.nodelay = enable;
		self
	}

	pub fn keepalive(mut self, config: KeepaliveConfig) -> Self {
		self.keepalive = Some(config);
		self
	}

	pub fn linger(mut self, seconds: Option<u32>) -> Self {
		self.linger = Some(seconds);
		self
	}

	fn apply<S: AsRawFd>(&self, socket: &S) -> std::io::Result<()> {
		if self.nodelay {
			set_tcp_nodelay(socket, true)?;
		}
		if let Some(config) = self.keepalive {
			set_keepalive(socket, true)?;
			set_keepalive_idle(socket, config.idle_secs)?;
			set_keepalive_interval(socket, config.interval_secs)?;
			set_keepalive_count(socket, config.count)?;
		}
		if let Some(linger) = self.linger {
			set_linger(socket, linger)?;
		}
		Ok(())
	}
}

/// Keep-alive timing.
#[derive(Debug, Clone, Copy)]
pub struct KeepaliveConfig {
	pub idle_secs: u32,
	pub interval_secs: u32,
	pub count: u32,
}

impl Default for KeepaliveConfig {
	fn default() -> Self {
		Self {
			idle_secs: 60,
			interval_secs: 10,
			count: 5,
		}
	}
}

impl KeepaliveConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn idle(mut self, secs: u32) -> Self {
		self.idle_secs = secs;
		self
	}

	pub fn interval(mut self, secs: u32) -> Self {
		self.interval_secs = secs;
		self
	}

	pub fn count(mut self, count: u32) -> Self {
		self.count = count;
		self
	}
}

// ============================================================================
// Accept configuration
// ============================================================================

/// Options applied to every descriptor returned by `Connection::accept_with`.
///
/// # Example
/// ```ignore
/// use edgeconn::{AcceptConfig, BufferConfig, KeepaliveConfig, TcpConfig};
///
/// let config = AcceptConfig::new()
///     .buffers(BufferConfig::new().send(256 * 1024))
///     .tcp(TcpConfig::new()
///         .nodelay(true)
///         .keepalive(KeepaliveConfig::new().idle(60).interval(10).count(5)));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptConfig {
	pub buffers: BufferConfig,
	pub tcp: TcpConfig,
}

impl AcceptConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn buffers(mut self, config: BufferConfig) -> Self {
		self.buffers = config;
		self
	}

	pub fn tcp(mut self, config: TcpConfig) -> Self {
		self.tcp = config;
		self
	}

	pub(crate) fn apply<S: AsRawFd>(&self, socket: &S, is_unix: bool) -> std::io::Result<()> {
		self.buffers.apply(socket)?;
		if !is_unix {
			self.tcp.apply(socket)?;
		}
		Ok(())
	}
}
