//! Port traits for the engine's external collaborators.

pub mod config_port;
pub mod execution_port;
pub mod market_data_port;
