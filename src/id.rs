//! Process-unique connection identifiers.
//!
//! An identifier is `(unix_seconds as u32) << 32 | sequence`. The sequence
//! comes from one atomic counter shared by every thread, so two connections
//! accepted in the same second on different reactor threads still differ.
//! The counter wraps silently at 2^32; uniqueness holds within one wrap
//! period of one process run. Not a security token.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static GLOBAL: IdGenerator = IdGenerator::new();

/// Atomic sequence source for connection identifiers.
#[derive(Debug)]
pub struct IdGenerator {
	counter: AtomicU32,
}

impl Default for IdGenerator {
	fn default() -> Self {
		Self::new()
	}
}

impl IdGenerator {
	/// Creates a generator whose first sequence number is 1.
	pub const fn new() -> Self {
		Self::starting_at(1)
	}

	/// Creates a generator whose next sequence number is `seq`.
	pub const fn starting_at(seq: u32) -> Self {
		Self { counter: AtomicU32::new(seq) }
	}

	/// Returns the next identifier, stamped with the current wall clock.
	pub fn next(&self) -> u64 {
		self.next_at(unix_seconds())
	}

	/// Returns the next identifier, stamped with `secs`.
	pub fn next_at(&self, secs: u64) -> u64 {
		let seq = self.counter.fetch_add(1, Ordering::SeqCst);
		compose(secs, seq)
	}
}

/// Returns the next process-wide connection identifier.
pub fn next_id() -> u64 {
	GLOBAL.next()
}

#[inline]
fn compose(secs: u64, seq: u32) -> u64 {
	((secs & 0xffff_ffff) << 32) | u64::from(seq)
}

fn unix_seconds() -> u64 {
	// A clock before the epoch only loses the time half; the sequence still differs.
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_secs())
		.unwrap_or(0)
}
