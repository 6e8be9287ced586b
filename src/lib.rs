mod addr;
mod connection;
mod error;
mod id;
mod reactor;
pub mod send;
pub mod socket;

pub use self::addr::PeerAddr;
pub use self::connection::{Connection, StopReason, should_re_arm};
pub use self::error::{Disconnect, SocketError, errno};
pub use self::id::{IdGenerator, next_id};
pub use self::reactor::{Epoll, Events, Interest, Reactor};
pub use self::send::{AccessLog, AccessLogRecord, FileSource, MemorySource, SendItem, SendQueue, SendSource};
pub use self::socket::{AcceptConfig, BufferConfig, BufferSizes, KeepaliveConfig, ReadBuffer, RecvBuffer,
					   TcpConfig, DEFAULT_BUFFER_SIZE,
					   recv_buffer_size, send_buffer_size};
