//! Port traits for the engine's external collaborators.

pub mod config_port;
pub mod data_port;
pub mod strategy_port;
pub mod trade_log_port;
