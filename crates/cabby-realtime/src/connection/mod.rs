//! Connection tracking: per-socket handles, the shared pool, and the
//! manager that ties registration, fan-out and teardown together.

pub mod handle;
pub mod heartbeat;
pub mod manager;
pub mod pool;

pub use handle::{ConnectionHandle, ConnectionId, SendOutcome, SessionKind};
pub use manager::ConnectionManager;
pub use pool::ConnectionPool;
