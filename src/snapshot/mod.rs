pub mod builder;
pub mod error;
pub mod reconcile;
pub mod snapshot_model;
