pub mod agent;
pub mod agent_model;
pub mod error;
pub mod scheduler;
