pub mod config;
pub mod error;
pub mod ids;
pub mod state_machine;
pub mod types;

pub use error::{Result, SchedulerError};
pub use ids::*;
