pub mod placement;
pub mod reconcile;
pub mod schedule;
