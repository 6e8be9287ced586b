/// Destination for received bytes.
///
/// Implemented by whatever parses the stream. `recv()` asks for a writable
/// region, reads into it, then commits exactly the bytes the kernel wrote.
pub trait RecvBuffer {
	/// Returns a writable region of at least `n` bytes past the committed data.
	fn reserve(&mut self, n: usize) -> &mut [u8];

	/// Marks `n` bytes of the last reserved region as filled.
	fn commit(&mut self, n: usize);
}

/// Growable byte buffer with a read offset.
#[derive(Debug, Default)]
pub struct ReadBuffer {
	buf: Vec<u8>,
	start: usize,
	end: usize,
}

impl ReadBuffer {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_capacity(capacity: usize) -> Self {
		Self { buf: Vec::with_capacity(capacity), start: 0, end: 0 }
	}

	/// Committed bytes not yet consumed.
	pub fn data(&self) -> &[u8] {
		&self.buf[self.start..self.end]
	}

	pub fn len(&self) -> usize {
		self.end - self.start
	}

	pub fn is_empty(&self) -> bool {
		self.start == self.end
	}

	/// Drops `n` bytes from the front of the committed data.
	pub fn consume(&mut self, n: usize) {
		self.start = self.end.min(self.start + n);
		if self.start == self.end {
			self.start = 0;
			self.end = 0;
		}
	}

	pub fn clear(&mut self) {
		self.start = 0;
		self.end = 0;
	}
}

impl RecvBuffer for ReadBuffer {
	fn reserve(&mut self, n: usize) -> &mut [u8] {
		if self.start > 0 && self.buf.len() - self.end < n {
			self.buf.copy_within(self.start..self.end, 0);
			self.end -= self.start;
			self.start = 0;
		}
		if self.buf.len() < self.end + n {
			self.buf.resize(self.end + n, 0);
		}
		&mut self.buf[self.end..self.end + n]
	}

	fn commit(&mut self, n: usize) {
		self.end = self.buf.len().min(self.end + n);
	}
}
