use std::path::Path;

use super::source::{FileSource, MemorySource, SendSource};
use crate::addr::PeerAddr;

/// Response-byte accounting for one queued payload.
///
/// Owned by the layer that built the response; the connection only feeds
/// it byte counts and tells it when the payload finished or failed.
pub trait AccessLog: Send {
	fn add_bytes(&mut self, n: usize);

	/// Overrides the byte count with the failure sentinel.
	fn mark_failed(&mut self);

	/// Writes the record. Called at most once per record.
	fn flush(&mut self);
}

/// Access log record written as one `tracing` event on target `access`.
#[derive(Debug, Clone)]
pub struct AccessLogRecord {
	peer: PeerAddr,
	request_line: String,
	status: u16,
	response_bytes: i64,
	flushed: bool,
}

impl AccessLogRecord {
	/// Sentinel stored in `response_bytes` once the send failed.
	pub const FAILED: i64 = -1;

	pub fn new(peer: PeerAddr, request_line: impl Into<String>, status: u16) -> Self {
		Self {
			peer,
			request_line: request_line.into(),
			status,
			response_bytes: 0,
			flushed: false,
		}
	}

	pub fn response_bytes(&self) -> i64 {
		self.response_bytes
	}

	pub fn is_failed(&self) -> bool {
		self.response_bytes == Self::FAILED
	}

	pub fn is_flushed(&self) -> bool {
		self.flushed
	}
}

impl AccessLog for AccessLogRecord {
	fn add_bytes(&mut self, n: usize) {
		if !self.is_failed() {
			self.response_bytes = self.response_bytes.saturating_add(n as i64);
		}
	}

	fn mark_failed(&mut self) {
		self.response_bytes = Self::FAILED;
	}

	fn flush(&mut self) {
		if self.flushed {
			return;
		}
		self.flushed = true;
		tracing::info!(
			target: "access",
			peer = %self.peer,
			request = %self.request_line,
			status = self.status,
			bytes = self.response_bytes,
			"response complete"
		);
	}
}

/// One queued outbound payload and its access log.
///
/// Dropping an item releases its source (a temporary file is removed) but
/// never flushes the log; only `finish` does that.
pub struct SendItem {
	source: SendSource,
	log: Option<Box<dyn AccessLog>>,
}

impl std::fmt::Debug for SendItem {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SendItem")
			.field("source", &self.source)
			.field("logged", &self.log.is_some())
			.finish()
	}
}

impl SendItem {
	pub fn new(source: impl Into<SendSource>) -> Self {
		Self { source: source.into(), log: None }
	}

	/// Raw bytes with no access log attached.
	pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
		Self::new(MemorySource::new(data))
	}

	/// `header` followed by the contents of `path`.
	pub fn from_file(header: impl Into<Vec<u8>>, path: impl AsRef<Path>, auto_remove: bool) -> std::io::Result<Self> {
		Ok(Self::new(FileSource::open(header, path, auto_remove)?))
	}

	pub fn with_log(mut self, log: impl AccessLog + 'static) -> Self {
		self.log = Some(Box::new(log));
		self
	}

	pub fn take(&mut self, max_len: usize) -> std::io::Result<&[u8]> {
		self.source.take(max_len)
	}

	pub fn advance(&mut self, n: usize) {
		self.source.advance(n);
	}

	pub fn is_exhausted(&self) -> bool {
		self.source.is_exhausted()
	}

	/// Bytes already handed to the socket.
	pub fn position(&self) -> u64 {
		self.source.position()
	}

	pub fn source(&self) -> &SendSource {
		&self.source
	}

	pub fn access_log(&mut self) -> Option<&mut (dyn AccessLog + 'static)> {
		self.log.as_deref_mut()
	}

	pub(crate) fn record_sent(&mut self, n: usize) {
		if let Some(log) = self.log.as_deref_mut() {
			log.add_bytes(n);
		}
	}

	pub(crate) fn mark_failed(&mut self) {
		if let Some(log) = self.log.as_deref_mut() {
			log.mark_failed();
		}
	}

	/// Flushes the access log and releases the item.
	pub(crate) fn finish(mut self) {
		if let Some(log) = self.log.as_deref_mut() {
			log.flush();
		}
	}
}

impl From<Vec<u8>> for SendItem {
	fn from(data: Vec<u8>) -> Self {
		Self::from_bytes(data)
	}
}

impl From<&[u8]> for SendItem {
	fn from(data: &[u8]) -> Self {
		Self::from_bytes(data)
	}
}
