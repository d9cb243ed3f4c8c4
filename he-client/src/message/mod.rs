//! Notification channel
//!
//! ```text
//! JobChannel
//!   ├── Connect: WebSocket → send auth{ticket} (no ack)
//!   ├── Subscribe: jobs.<JobId> after each submission
//!   ├── Listener: the only reader; message{jobs.<id>} → JobTable::deposit
//!   └── Disconnect: listener stops, JobTable closed → waiters get ConnectionClosed
//! ```

pub mod channel;
pub mod jobs;
pub mod listener;
pub mod transport;

pub use channel::JobChannel;
pub use jobs::JobTable;
pub use transport::{MemoryPeer, MemoryTransport, Transport, WsTransport};
