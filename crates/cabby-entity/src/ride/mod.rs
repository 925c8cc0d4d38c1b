//! Ride entity (consumed read-only by the realtime core).

pub mod model;
pub mod status;

pub use model::{Ride, RideRole};
pub use status::RideStatus;
