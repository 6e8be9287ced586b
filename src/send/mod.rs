//! Outbound payloads queued on a connection.

mod item;
mod queue;
mod source;

pub use self::item::{AccessLog, AccessLogRecord, SendItem};
pub use self::queue::SendQueue;
pub use self::source::{FileSource, MemorySource, SendSource};
