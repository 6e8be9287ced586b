use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Where a queued payload gets its bytes from.
///
/// Both variants follow the same cursor contract:
/// - `take(max)` borrows up to `max` bytes starting at the cursor.
///   An empty slice means "nothing ready yet", which is not an error.
/// - `advance(n)` moves the cursor past `n` bytes of the last `take`.
/// - `is_exhausted()` is true once every byte has been advanced over.
#[derive(Debug)]
pub enum SendSource {
	Memory(MemorySource),
	File(FileSource),
}

impl SendSource {
	pub fn take(&mut self, max_len: usize) -> std::io::Result<&[u8]> {
		match self {
			SendSource::Memory(src) => Ok(src.take(max_len)),
			SendSource::File(src) => src.take(max_len),
		}
	}

	pub fn advance(&mut self, n: usize) {
		match self {
			SendSource::Memory(src) => src.advance(n),
			SendSource::File(src) => src.advance(n),
		}
	}

	pub fn is_exhausted(&self) -> bool {
		match self {
			SendSource::Memory(src) => src.is_exhausted(),
			SendSource::File(src) => src.is_exhausted(),
		}
	}

	/// Bytes advanced over so far.
	pub fn position(&self) -> u64 {
		match self {
			SendSource::Memory(src) => src.pos as u64,
			SendSource::File(src) => src.sent,
		}
	}

	/// Total bytes this source will produce.
	pub fn len(&self) -> u64 {
		match self {
			SendSource::Memory(src) => src.data.len() as u64,
			SendSource::File(src) => src.total,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl From<MemorySource> for SendSource {
	fn from(src: MemorySource) -> Self {
		SendSource::Memory(src)
	}
}

impl From<FileSource> for SendSource {
	fn from(src: FileSource) -> Self {
		SendSource::File(src)
	}
}

/// An owned byte buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
	data: Vec<u8>,
	pos: usize,
}

impl MemorySource {
	pub fn new(data: impl Into<Vec<u8>>) -> Self {
		Self { data: data.into(), pos: 0 }
	}

	fn take(&self, max_len: usize) -> &[u8] {
		let end = self.data.len().min(self.pos.saturating_add(max_len));
		&self.data[self.pos..end]
	}

	fn advance(&mut self, n: usize) {
		self.pos = self.data.len().min(self.pos + n);
	}

	fn is_exhausted(&self) -> bool {
		self.pos >= self.data.len()
	}
}

/// A header followed by the contents of a file.
///
/// The body length is fixed when the file is opened. The file is read in
/// chunks no larger than what `take` asks for. If the file hits EOF before
/// that length, `take` returns nothing ready until more data appears.
///
/// With `auto_remove` the file is unlinked when the source is dropped,
/// whether or not it was fully sent.
#[derive(Debug)]
pub struct FileSource {
	chunk: Vec<u8>,
	chunk_pos: usize,
	file: File,
	path: PathBuf,
	remaining: u64,
	total: u64,
	sent: u64,
	auto_remove: bool,
}

impl FileSource {
	/// Opens `path` and prepares `header` to be sent ahead of it.
	pub fn open(header: impl Into<Vec<u8>>, path: impl AsRef<Path>, auto_remove: bool) -> std::io::Result<Self> {
		let path = path.as_ref().to_path_buf();
		let file = File::open(&path)?;
		let body = file.metadata()?.len();
		let chunk = header.into();
		let total = chunk.len() as u64 + body;

		Ok(Self {
			chunk,
			chunk_pos: 0,
			file,
			path,
			remaining: body,
			total,
			sent: 0,
			auto_remove,
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn take(&mut self, max_len: usize) -> std::io::Result<&[u8]> {
		if self.chunk_pos >= self.chunk.len() && self.remaining > 0 {
			self.refill(max_len)?;
		}
		let end = self.chunk.len().min(self.chunk_pos.saturating_add(max_len));
		Ok(&self.chunk[self.chunk_pos..end])
	}

	fn refill(&mut self, max_len: usize) -> std::io::Result<()> {
		let want = (max_len as u64).min(self.remaining) as usize;
		self.chunk.resize(want, 0);
		self.chunk_pos = 0;

		let n = loop {
			match self.file.read(&mut self.chunk) {
				Ok(n) => break n,
				Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
				Err(e) => {
					self.chunk.clear();
					return Err(e);
				}
			}
		};
		self.chunk.truncate(n);
		self.remaining -= n as u64;
		Ok(())
	}

	fn advance(&mut self, n: usize) {
		let n = n.min(self.chunk.len() - self.chunk_pos);
		self.chunk_pos += n;
		self.sent += n as u64;
	}

	fn is_exhausted(&self) -> bool {
		self.remaining == 0 && self.chunk_pos >= self.chunk.len()
	}
}

impl Drop for FileSource {
	fn drop(&mut self) {
		if self.auto_remove {
			if let Err(e) = std::fs::remove_file(&self.path) {
				tracing::warn!(path = %self.path.display(), error = %e, "failed to remove temporary file");
			}
		}
	}
}
