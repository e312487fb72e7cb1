//! Open position and closed trade records.

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    Long,
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryType::Long => write!(f, "LONG"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    StopLossHit,
    TargetHit,
    /// Strategy SELL; carries the signal's reason or `STRATEGY_SELL_CLOSE`.
    Signal(String),
}

impl ExitReason {
    pub const DEFAULT_SIGNAL_REASON: &'static str = "STRATEGY_SELL_CLOSE";

    pub fn from_signal(reason: Option<&str>) -> Self {
        ExitReason::Signal(reason.unwrap_or(Self::DEFAULT_SIGNAL_REASON).to_string())
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::StopLossHit => write!(f, "STOP_LOSS_HIT"),
            ExitReason::TargetHit => write!(f, "TARGET_HIT"),
            ExitReason::Signal(reason) => write!(f, "{reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub qty: u32,
    pub avg_price: f64,
    pub entry_time: NaiveDateTime,
    pub stop_loss: Option<f64>,
    pub target: Option<f64>,
    pub entry_type: EntryType,
    pub num_entries: u32,
}

impl Position {
    pub fn open(
        symbol: &str,
        qty: u32,
        fill_price: f64,
        entry_time: NaiveDateTime,
        stop_loss: Option<f64>,
        target: Option<f64>,
    ) -> Self {
        Position {
            symbol: symbol.to_string(),
            qty,
            avg_price: fill_price,
            entry_time,
            stop_loss,
            target,
            entry_type: EntryType::Long,
            num_entries: 1,
        }
    }

    /// Pyramid another lot in. Levels supplied by the newest signal replace
    /// the current ones for the whole position.
    pub fn add_entry(
        &mut self,
        qty: u32,
        fill_price: f64,
        stop_loss: Option<f64>,
        target: Option<f64>,
    ) {
        let new_qty = self.qty + qty;
        self.avg_price =
            (self.avg_price * self.qty as f64 + fill_price * qty as f64) / new_qty as f64;
        self.qty = new_qty;
        self.num_entries += 1;
        if stop_loss.is_some() {
            self.stop_loss = stop_loss;
        }
        if target.is_some() {
            self.target = target;
        }
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.qty as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        (price - self.avg_price) * self.qty as f64
    }

    pub fn stop_loss_hit(&self, low: f64) -> bool {
        self.stop_loss.is_some_and(|sl| low <= sl)
    }

    pub fn target_hit(&self, high: f64) -> bool {
        self.target.is_some_and(|tp| high >= tp)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub symbol: String,
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub entry_price: f64,
    pub exit_price: f64,
    pub qty: u32,
    pub pnl: f64,
    pub entry_type: EntryType,
    pub exit_reason: ExitReason,
}
