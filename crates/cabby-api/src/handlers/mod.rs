//! Request handlers, organized by domain.

pub mod chat;
pub mod health;
pub mod notification;
pub mod ride;
pub mod ws;
