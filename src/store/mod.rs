pub mod adapter;
pub mod error;
pub mod file_store;
pub mod relay;
pub mod store;
