//! Core domain types and the simulation engine.

pub mod bar;
pub mod signal;
pub mod execution;
pub mod position;
pub mod ledger;
pub mod risk;
pub mod accounting;
pub mod config;
pub mod summary;
pub mod backtest;
pub mod strategies;
pub mod error;
