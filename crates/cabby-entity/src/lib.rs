//! # cabby-entity
//!
//! Persisted domain models for Cabby: notifications, chat messages, and the
//! read-only ride/user entities the realtime core consumes.

pub mod chat;
pub mod notification;
pub mod ride;
pub mod user;
