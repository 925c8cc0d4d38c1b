//! Wire frame definitions for both client-facing channels.

pub mod types;

pub use types::{ChatFrame, ChatInbound, InboundFrame, NotificationSummary, OutboundFrame};
