//! Peer addresses captured at accept time.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

/// Address of the remote end of a connection.
///
/// Decoded once from the `sockaddr_storage` filled in by `accept4()`
/// and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerAddr {
	/// TCP over IPv4 or IPv6.
	Inet(SocketAddr),
	/// Unix domain peer. `None` for unnamed sockets (e.g. `socketpair`).
	Unix(Option<PathBuf>),
	/// Family not recognised, or no address was reported.
	Unspecified,
}

impl PeerAddr {
	/// Decodes a raw socket address.
	///
	/// # Safety
	/// `storage` must have been filled by the kernel and `len` must be the
	/// length it reported.
	pub(crate) unsafe fn from_storage(storage: &libc::sockaddr_storage, len: libc::socklen_t) -> Self {
		let len = len as usize;
		let ptr = storage as *const libc::sockaddr_storage;

		match storage.ss_family as libc::c_int {
			libc::AF_INET if len >= std::mem::size_of::<libc::sockaddr_in>() => {
				let raw = unsafe { &*(ptr as *const libc::sockaddr_in) };
				let ip = Ipv4Addr::from(raw.sin_addr.s_addr.to_ne_bytes());
				PeerAddr::Inet(SocketAddr::V4(SocketAddrV4::new(ip, u16::from_be(raw.sin_port))))
			}
			libc::AF_INET6 if len >= std::mem::size_of::<libc::sockaddr_in6>() => {
				let raw = unsafe { &*(ptr as *const libc::sockaddr_in6) };
				let ip = Ipv6Addr::from(raw.sin6_addr.s6_addr);
				PeerAddr::Inet(SocketAddr::V6(SocketAddrV6::new(
					ip,
					u16::from_be(raw.sin6_port),
					u32::from_be(raw.sin6_flowinfo),
					raw.sin6_scope_id,
				)))
			}
			libc::AF_UNIX => {
				let raw = unsafe { &*(ptr as *const libc::sockaddr_un) };
				PeerAddr::Unix(unix_path(raw, len))
			}
			_ => PeerAddr::Unspecified,
		}
	}

	/// Returns the inet address, if this is a TCP peer.
	pub fn as_inet(&self) -> Option<SocketAddr> {
		match self {
			PeerAddr::Inet(addr) => Some(*addr),
			_ => None,
		}
	}
}

fn unix_path(raw: &libc::sockaddr_un, len: usize) -> Option<PathBuf> {
	let header = std::mem::size_of::<libc::sa_family_t>();
	if len <= header {
		return None;
	}
	let avail = (len - header).min(raw.sun_path.len());
	let bytes: Vec<u8> = raw.sun_path[..avail].iter().map(|&c| c as u8).collect();

	// Abstract names start with NUL and are not filesystem paths.
	if bytes.first() == Some(&0) {
		return None;
	}
	let end = bytes.iter().position(|&c| c == 0).unwrap_or(bytes.len());
	if end == 0 {
		return None;
	}
	Some(PathBuf::from(std::ffi::OsStr::from_bytes(&bytes[..end])))
}

impl std::fmt::Display for PeerAddr {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			PeerAddr::Inet(addr) => write!(f, "{}", addr),
			PeerAddr::Unix(Some(path)) => write!(f, "unix:{}", path.display()),
			PeerAddr::Unix(None) => f.write_str("unix:(unnamed)"),
			PeerAddr::Unspecified => f.write_str("-"),
		}
	}
}

impl From<SocketAddr> for PeerAddr {
	fn from(addr: SocketAddr) -> Self {
		PeerAddr::Inet(addr)
	}
}
