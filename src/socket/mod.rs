mod buffer;
mod config;
mod options;
mod recv_buffer;

pub use self::buffer::{BufferSizes, DEFAULT_BUFFER_SIZE, negotiate, negotiated,
					   recv_buffer_size, send_buffer_size};
pub use self::config::{AcceptConfig, BufferConfig, KeepaliveConfig, TcpConfig};
pub use self::options::{get_recv_buffer_size, get_send_buffer_size,
						set_recv_buffer_size, set_send_buffer_size, set_tcp_nodelay,
						set_keepalive, set_keepalive_idle, set_keepalive_interval,
						set_keepalive_count, set_linger};
pub use self::recv_buffer::{ReadBuffer, RecvBuffer};
