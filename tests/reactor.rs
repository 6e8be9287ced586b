mod common;

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::os::fd::AsRawFd;
use std::os::unix::net::UnixStream;
use std::sync::Arc;

use edgeconn::{Connection, Epoll, Events, Interest, Reactor, SendItem};

use common::temp_path;

#[test]
fn interest_masks_combine() {
	let both = Interest::READABLE | Interest::WRITABLE;
	assert!(both.is_readable());
	assert!(both.is_writable());
	assert!(!both.contains(Interest::EDGE));

	let mut mask = Interest::default();
	mask |= Interest::READABLE;
	mask |= Interest::WRITABLE;
	mask |= Interest::EDGE;
	assert_eq!(mask, Interest::RE_ARM);
	assert_eq!(Interest::from_bits(mask.bits()), Interest::RE_ARM);
}

#[test]
fn epoll_reports_readiness_with_token() {
	let (a, mut b) = UnixStream::pair().unwrap();
	a.set_nonblocking(true).unwrap();

	let epoll = Epoll::new().unwrap();
	epoll.add(a.as_raw_fd(), 77, Interest::READABLE | Interest::EDGE).unwrap();

	let mut events = Events::with_capacity(8);
	assert_eq!(epoll.wait(&mut events, 0).unwrap(), 0);
	assert!(events.is_empty());

	b.write_all(b"ping").unwrap();
	assert_eq!(epoll.wait(&mut events, 1000).unwrap(), 1);
	let (token, ready) = events.iter().next().unwrap();
	assert_eq!(token, 77);
	assert!(ready.is_readable());

	epoll.delete(a.as_raw_fd()).unwrap();
}

#[test]
fn re_arm_requires_prior_registration() {
	let (a, _b) = UnixStream::pair().unwrap();
	let epoll = Epoll::new().unwrap();

	let err = epoll.re_arm(a.as_raw_fd(), 1, Interest::RE_ARM).unwrap_err();
	assert_eq!(err.kind(), std::io::ErrorKind::NotFound);

	epoll.add(a.as_raw_fd(), 1, Interest::READABLE).unwrap();
	epoll.re_arm(a.as_raw_fd(), 1, Interest::RE_ARM).unwrap();
	// Idempotent.
	epoll.re_arm(a.as_raw_fd(), 1, Interest::RE_ARM).unwrap();
}

#[test]
fn re_arm_refreshes_the_writable_edge() {
	let listener = TcpListener::bind("127.0.0.1:0").unwrap();
	let mut client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
	let epoll = Arc::new(Epoll::new().unwrap());

	let mut conn = Connection::accept(&listener, epoll.clone()).unwrap();
	let fd = conn.raw_fd().unwrap();
	epoll.add(fd, conn.id(), Interest::RE_ARM).unwrap();

	// Consume the initial writable edge.
	let mut events = Events::with_capacity(8);
	assert_eq!(epoll.wait(&mut events, 1000).unwrap(), 1);
	assert_eq!(epoll.wait(&mut events, 0).unwrap(), 0);

	// A source that stalls mid-item makes the connection re-arm through epoll,
	// which reports the still-writable socket again.
	let path = temp_path("edge");
	std::fs::write(&path, b"abcdefgh").unwrap();
	conn.enqueue(SendItem::from_file(Vec::new(), &path, true).unwrap());
	std::fs::OpenOptions::new().write(true).open(&path).unwrap().set_len(2).unwrap();

	conn.send().unwrap();
	assert_eq!(conn.pending(), 1);

	assert_eq!(epoll.wait(&mut events, 1000).unwrap(), 1);
	let (token, ready) = events.iter().next().unwrap();
	assert_eq!(token, conn.id());
	assert!(ready.is_writable());

	let mut got = [0u8; 2];
	client.read_exact(&mut got).unwrap();
	assert_eq!(&got, b"ab");

	drop(conn);
	assert!(!path.exists());
}
