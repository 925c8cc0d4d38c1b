//! Notification entity.

pub mod category;
pub mod model;

pub use category::NotificationCategory;
pub use model::{NewNotification, Notification};
