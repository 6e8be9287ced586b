mod common;

use std::io::Write;

use edgeconn::{AccessLog, AccessLogRecord, MemorySource, PeerAddr, SendItem, SendQueue, SendSource};
use tracing_test::traced_test;

use common::temp_path;

fn drain(item: &mut SendItem, chunk: usize) -> Vec<u8> {
	let mut out = Vec::new();
	while !item.is_exhausted() {
		let data = item.take(chunk).unwrap().to_vec();
		assert!(!data.is_empty(), "source stalled before exhaustion");
		item.advance(data.len());
		out.extend_from_slice(&data);
	}
	out
}

#[test]
fn memory_source_hands_out_bounded_chunks() {
	let mut source = SendSource::from(MemorySource::new(b"hello world".to_vec()));
	assert_eq!(source.take(5).unwrap(), b"hello");
	// take() does not move the cursor.
	assert_eq!(source.take(5).unwrap(), b"hello");

	source.advance(3);
	assert_eq!(source.position(), 3);
	assert_eq!(source.take(100).unwrap(), b"lo world");

	source.advance(8);
	assert!(source.is_exhausted());
	assert!(source.take(10).unwrap().is_empty());
}

#[test]
fn partial_advance_resumes_where_it_stopped() {
	let mut item = SendItem::from_bytes(b"abcdef".to_vec());
	let chunk = item.take(4).unwrap().to_vec();
	assert_eq!(chunk, b"abcd");
	item.advance(1);
	assert_eq!(item.position(), 1);
	assert_eq!(item.take(4).unwrap(), b"bcde");
	assert!(!item.is_exhausted());
}

#[test]
fn empty_memory_item_is_already_exhausted() {
	let mut item = SendItem::from_bytes(Vec::new());
	assert!(item.is_exhausted());
	assert!(item.take(16).unwrap().is_empty());
}

#[test]
fn file_source_sends_header_then_body() {
	let path = temp_path("body");
	std::fs::write(&path, b"0123456789").unwrap();

	let mut item = SendItem::from_file(b"HDR:".to_vec(), &path, false).unwrap();
	assert_eq!(item.source().len(), 14);
	assert_eq!(drain(&mut item, 3), b"HDR:0123456789");
	assert_eq!(item.position(), 14);

	drop(item);
	assert!(path.exists());
	std::fs::remove_file(&path).unwrap();
}

#[test]
fn file_source_removes_temporary_file_on_drop() {
	let path = temp_path("auto");
	std::fs::write(&path, b"payload").unwrap();

	let item = SendItem::from_file(Vec::new(), &path, true).unwrap();
	assert!(path.exists());
	drop(item);
	assert!(!path.exists());
}

#[test]
fn truncated_file_reports_not_ready_until_it_grows() {
	let path = temp_path("grow");
	std::fs::write(&path, b"abcdefgh").unwrap();

	let mut item = SendItem::from_file(Vec::new(), &path, true).unwrap();
	std::fs::OpenOptions::new().write(true).open(&path).unwrap().set_len(4).unwrap();

	assert_eq!(item.take(16).unwrap(), b"abcd");
	item.advance(4);
	assert!(item.take(16).unwrap().is_empty());
	assert!(!item.is_exhausted());

	std::fs::OpenOptions::new()
		.append(true)
		.open(&path)
		.unwrap()
		.write_all(b"efgh")
		.unwrap();

	assert_eq!(item.take(16).unwrap(), b"efgh");
	item.advance(4);
	assert!(item.is_exhausted());
	drop(item);
	assert!(!path.exists());
}

#[test]
fn missing_file_is_an_open_error() {
	let path = temp_path("missing");
	let err = SendItem::from_file(Vec::new(), &path, false).unwrap_err();
	assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}

#[test]
fn queue_is_first_in_first_out() {
	let mut queue = SendQueue::new();
	queue.push(SendItem::from_bytes(b"one".to_vec()));
	queue.push(SendItem::from_bytes(b"two".to_vec()));
	queue.push(SendItem::from_bytes(b"three".to_vec()));

	assert_eq!(queue.len(), 3);
	let lens: Vec<u64> = queue.iter().map(|item| item.source().len()).collect();
	assert_eq!(lens, vec![3, 3, 5]);
	assert_eq!(queue.front().map(|item| item.source().len()), Some(3));
}

#[test]
fn dropping_the_queue_removes_temporary_files() {
	let first = temp_path("q1");
	let second = temp_path("q2");
	std::fs::write(&first, b"1").unwrap();
	std::fs::write(&second, b"2").unwrap();

	let mut queue = SendQueue::new();
	queue.push(SendItem::from_file(Vec::new(), &first, true).unwrap());
	queue.push(SendItem::from_file(Vec::new(), &second, true).unwrap());
	drop(queue);

	assert!(!first.exists());
	assert!(!second.exists());
}

#[test]
fn record_counts_bytes_until_failed() {
	let mut record = AccessLogRecord::new(PeerAddr::Unspecified, "GET / HTTP/1.1", 200);
	record.add_bytes(10);
	record.add_bytes(5);
	assert_eq!(record.response_bytes(), 15);

	record.mark_failed();
	record.add_bytes(7);
	assert_eq!(record.response_bytes(), AccessLogRecord::FAILED);
	assert!(record.is_failed());
}

#[test]
#[traced_test]
fn record_flushes_once() {
	let peer = PeerAddr::Inet("10.0.0.7:4242".parse().unwrap());
	let mut record = AccessLogRecord::new(peer, "GET /index.html HTTP/1.1", 200);
	record.add_bytes(512);

	record.flush();
	record.flush();

	assert!(record.is_flushed());
	assert!(logs_contain("GET /index.html HTTP/1.1"));
	assert!(logs_contain("10.0.0.7:4242"));
	logs_assert(|lines: &[&str]| {
		match lines.iter().filter(|line| line.contains("response complete")).count() {
			1 => Ok(()),
			n => Err(format!("expected one access line, got {n}")),
		}
	});
}
