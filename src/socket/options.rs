use std::os::fd::AsRawFd;
use crate::error::{SocketError, errno};

fn set_int<S: AsRawFd>(socket: &S, level: libc::c_int, name: libc::c_int, val: libc::c_int,
					   option: &'static str) -> std::io::Result<()> {
	let result = unsafe {
		libc::setsockopt(
			socket.as_raw_fd(),
			level,
			name,
			&val as *const _ as *const libc::c_void,
			std::mem::size_of::<libc::c_int>() as libc::socklen_t,
		)
	};
	if result == -1 {
		Err(SocketError::SetOption { errno: errno(), option }.into())
	} else {
		Ok(())
	}
}

fn get_int<S: AsRawFd>(socket: &S, level: libc::c_int, name: libc::c_int,
					   option: &'static str) -> std::io::Result<libc::c_int> {
	let mut val: libc::c_int = 0;
	let mut len = std::mem::size_of::<libc::c_int>() as libc::socklen_t;
	let result = unsafe {
		libc::getsockopt(
			socket.as_raw_fd(),
			level,
			name,
			&mut val as *mut _ as *mut libc::c_void,
			&mut len,
		)
	};
	if result == -1 {
		Err(SocketError::GetOption { errno: errno(), option }.into())
	} else {
		Ok(val)
	}
}

/// Reads the kernel send buffer size (SO_SNDBUF).
///
/// Linux reports the doubled value it actually allocated.
pub fn get_send_buffer_size<S: AsRawFd>(socket: &S) -> std::io::Result<usize> {
	let val = get_int(socket, libc::SOL_SOCKET, libc::SO_SNDBUF, "SO_SNDBUF")?;
	Ok(val.max(0) as usize)
}

/// Reads the kernel receive buffer size (SO_RCVBUF).
pub fn get_recv_buffer_size<S: AsRawFd>(socket: &S) -> std::io::Result<usize> {
	let val = get_int(socket, libc::SOL_SOCKET, libc::SO_RCVBUF, "SO_RCVBUF")?;
	Ok(val.max(0) as usize)
}

/// Sets send buffer size (SO_SNDBUF).
///
/// Controls how much outgoing data the kernel buffers before returning EAGAIN.
/// Kernel typically doubles this value internally.
pub fn set_send_buffer_size<S: AsRawFd>(socket: &S, size: usize) -> std::io::Result<()> {
	let size = size.min(libc::c_int::MAX as usize) as libc::c_int;
	set_int(socket, libc::SOL_SOCKET, libc::SO_SNDBUF, size, "SO_SNDBUF")
}

/// Sets receive buffer size (SO_RCVBUF).
///
/// For many concurrent connections be conservative: every socket pays for it.
pub fn set_recv_buffer_size<S: AsRawFd>(socket: &S, size: usize) -> std::io::Result<()> {
	let size = size.min(libc::c_int::MAX as usize) as libc::c_int;
	set_int(socket, libc::SOL_SOCKET, libc::SO_RCVBUF, size, "SO_RCVBUF")
}

/// Sets TCP_NODELAY (disables Nagle's algorithm).
pub fn set_tcp_nodelay<S: AsRawFd>(socket: &S, enable: bool) -> std::io::Result<()> {
	set_int(socket, libc::IPPROTO_TCP, libc::TCP_NODELAY, enable as libc::c_int, "TCP_NODELAY")
}

/// Enables TCP keep-alive probes (SO_KEEPALIVE).
pub fn set_keepalive<S: AsRawFd>(socket: &S, enable: bool) -> std::io::Result<()> {
	set_int(socket, libc::SOL_SOCKET, libc::SO_KEEPALIVE, enable as libc::c_int, "SO_KEEPALIVE")
}

/// Seconds of idle time before the first keep-alive probe (TCP_KEEPIDLE).
pub fn set_keepalive_idle<S: AsRawFd>(socket: &S, seconds: u32) -> std::io::Result<()> {
	set_int(socket, libc::IPPROTO_TCP, libc::TCP_KEEPIDLE, seconds as libc::c_int, "TCP_KEEPIDLE")
}

/// Seconds between unanswered keep-alive probes (TCP_KEEPINTVL).
pub fn set_keepalive_interval<S: AsRawFd>(socket: &S, seconds: u32) -> std::io::Result<()> {
	set_int(socket, libc::IPPROTO_TCP, libc::TCP_KEEPINTVL, seconds as libc::c_int, "TCP_KEEPINTVL")
}

/// Unanswered probes before the connection is dropped (TCP_KEEPCNT).
pub fn set_keepalive_count<S: AsRawFd>(socket: &S, count: u32) -> std::io::Result<()> {
	set_int(socket, libc::IPPROTO_TCP, libc::TCP_KEEPCNT, count as libc::c_int, "TCP_KEEPCNT")
}

/// Sets socket linger behavior (SO_LINGER).
///
/// - `None` — close returns immediately, kernel flushes in the background
/// - `Some(0)` — close sends RST and discards unsent data
/// - `Some(n)` — close waits up to n seconds for unsent data
pub fn set_linger<S: AsRawFd>(socket: &S, linger: Option<u32>) -> std::io::Result<()> {
	let mut val: libc::linger = unsafe { std::mem::zeroed() };
	if let Some(seconds) = linger {
		val.l_onoff = 1;
		val.l_linger = seconds as libc::c_int;
	}
	let result = unsafe {
		libc::setsockopt(
			socket.as_raw_fd(),
			libc::SOL_SOCKET,
			libc::SO_LINGER,
			&val as *const _ as *const libc::c_void,
			std::mem::size_of::<libc::linger>() as libc::socklen_t,
		)
	};
	if result == -1 {
		Err(SocketError::SetOption { errno: errno(), option: "SO_LINGER" }.into())
	} else {
		Ok(())
	}
}
