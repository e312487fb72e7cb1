//! Strategy signal-generation port.

use crate::domain::bar::Bar;
use crate::domain::signal::Signal;

pub trait StrategyPort {
    fn name(&self) -> &str;

    /// Produce at most one signal for the last bar of `history`.
    ///
    /// `history` holds every bar up to and including the current one and
    /// nothing later.
    fn generate_signals(&mut self, history: &[Bar]) -> Option<Signal>;
}
