//! Topic registry: the pub/sub map from topic keys to live subscribers.

pub mod registry;
pub mod subscription;
pub mod topic;
pub mod types;

pub use registry::TopicRegistry;
pub use types::TopicKey;
