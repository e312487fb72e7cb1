//! Built-in strategies and construction from configuration.

pub mod sma_crossover;

use super::error::AlgoTraderError;
use crate::ports::config_port::ConfigPort;
use crate::ports::strategy_port::StrategyPort;

pub use sma_crossover::SmaCrossover;

pub const SECTION: &str = "strategy";

/// Build the strategy named by `[strategy] type` (default `sma_crossover`).
pub fn build_strategy(config: &dyn ConfigPort) -> Result<Box<dyn StrategyPort>, AlgoTraderError> {
    let kind = config
        .get_string(SECTION, "type")
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_else(|| SmaCrossover::TYPE.to_string());

    match kind.as_str() {
        SmaCrossover::TYPE => Ok(Box::new(SmaCrossover::from_port(config)?)),
        other => Err(AlgoTraderError::invalid(
            SECTION,
            "type",
            format!("unknown strategy type '{other}'"),
        )),
    }
}
