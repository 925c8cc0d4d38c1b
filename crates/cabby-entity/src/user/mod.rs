//! User entity (consumed read-only by the realtime core).

pub mod model;
pub mod role;

pub use model::User;
pub use role::UserRole;
