//! Read-side repositories for the external entities the realtime core
//! consumes.

pub mod ride;
pub mod user;

pub use ride::{RideDirectory, RideRepository};
pub use user::{UserDirectory, UserRepository};
