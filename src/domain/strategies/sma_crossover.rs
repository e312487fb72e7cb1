//! Simple moving average crossover.
//!
//! BUY when the short SMA crosses above the long SMA, SELL when it crosses
//! below. A cross is judged against the SMA pair from the previous call, so
//! the first evaluable bar never signals.

use super::SECTION;
use crate::domain::bar::Bar;
use crate::domain::error::AlgoTraderError;
use crate::domain::signal::Signal;
use crate::ports::config_port::ConfigPort;
use crate::ports::strategy_port::StrategyPort;

pub const CROSS_DOWN_REASON: &str = "SMA_CROSS_DOWN";

#[derive(Debug, Clone)]
pub struct SmaCrossover {
    name: String,
    short_window: usize,
    long_window: usize,
    stop_loss_percent: Option<f64>,
    target_percent: Option<f64>,
    prev: Option<(f64, f64)>,
}

impl SmaCrossover {
    pub const TYPE: &'static str = "sma_crossover";

    pub fn new(short_window: usize, long_window: usize) -> Result<Self, AlgoTraderError> {
        if short_window == 0 || long_window == 0 {
            return Err(AlgoTraderError::invalid(
                SECTION,
                "short_window",
                "SMA windows must be positive",
            ));
        }
        if short_window >= long_window {
            return Err(AlgoTraderError::invalid(
                SECTION,
                "short_window",
                "short_window must be less than long_window",
            ));
        }
        Ok(SmaCrossover {
            name: "SMA Crossover".to_string(),
            short_window,
            long_window,
            stop_loss_percent: None,
            target_percent: None,
            prev: None,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Percent levels attached to BUY signals, relative to the close.
    pub fn with_levels(
        mut self,
        stop_loss_percent: Option<f64>,
        target_percent: Option<f64>,
    ) -> Self {
        self.stop_loss_percent = stop_loss_percent.filter(|p| *p > 0.0);
        self.target_percent = target_percent.filter(|p| *p > 0.0);
        self
    }

    pub fn from_port(config: &dyn ConfigPort) -> Result<Self, AlgoTraderError> {
        let short = config.get_int(SECTION, "short_window", 20);
        let long = config.get_int(SECTION, "long_window", 50);
        let to_window = |v: i64, key: &str| {
            usize::try_from(v).map_err(|_| {
                AlgoTraderError::invalid(SECTION, key, "SMA windows must be positive")
            })
        };
        let strategy = SmaCrossover::new(
            to_window(short, "short_window")?,
            to_window(long, "long_window")?,
        )?
        .with_levels(
            config.get_optional_double(SECTION, "stop_loss_percent"),
            config.get_optional_double(SECTION, "target_percent"),
        );
        let name = config
            .get_string(SECTION, "name")
            .filter(|n| !n.trim().is_empty());
        Ok(match name {
            Some(name) => strategy.with_name(name.trim()),
            None => strategy,
        })
    }

    pub fn short_window(&self) -> usize {
        self.short_window
    }

    pub fn long_window(&self) -> usize {
        self.long_window
    }

    fn sma(bars: &[Bar], period: usize) -> f64 {
        let recent = &bars[bars.len() - period..];
        recent.iter().map(|b| b.close).sum::<f64>() / period as f64
    }

    fn buy_signal(&self, close: f64) -> Signal {
        let mut signal = Signal::buy().at(close);
        if let Some(pct) = self.stop_loss_percent {
            signal = signal.with_stop_loss(close * (1.0 - pct / 100.0));
        }
        if let Some(pct) = self.target_percent {
            signal = signal.with_target(close * (1.0 + pct / 100.0));
        }
        signal
    }
}

impl StrategyPort for SmaCrossover {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate_signals(&mut self, history: &[Bar]) -> Option<Signal> {
        if history.len() < self.long_window {
            return None;
        }
        let short = Self::sma(history, self.short_window);
        let long = Self::sma(history, self.long_window);
        let close = history[history.len() - 1].close;

        let signal = match self.prev {
            Some((prev_short, prev_long)) if prev_short <= prev_long && short > long => {
                Some(self.buy_signal(close))
            }
            Some((prev_short, prev_long)) if prev_short >= prev_long && short < long => {
                Some(Signal::sell().at(close).with_reason(CROSS_DOWN_REASON))
            }
            _ => None,
        };
        self.prev = Some((short, long));
        signal
    }
}
