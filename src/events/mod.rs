pub mod activity;
pub mod window;

pub use activity::{Event, EventPayload};
pub use window::{ExecutablePath, Observation};
