//! Trade and summary logging sink port.

use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;

use crate::domain::error::AlgoTraderError;
use crate::domain::position::ExitReason;

pub const ORDER_TYPE_MARKET: &str = "MARKET";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillAction {
    Init,
    Buy,
    Sell,
}

impl fmt::Display for FillAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillAction::Init => write!(f, "INIT"),
            FillAction::Buy => write!(f, "BUY"),
            FillAction::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillStatus {
    Info,
    ExecutedBuy,
    ExecutedClose,
    StopLossHit,
    TargetHit,
    Rejected,
}

impl FillStatus {
    pub fn for_exit(reason: &ExitReason) -> Self {
        match reason {
            ExitReason::StopLossHit => FillStatus::StopLossHit,
            ExitReason::TargetHit => FillStatus::TargetHit,
            ExitReason::Signal(_) => FillStatus::ExecutedClose,
        }
    }
}

impl fmt::Display for FillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FillStatus::Info => "INFO",
            FillStatus::ExecutedBuy => "EXECUTED_BUY",
            FillStatus::ExecutedClose => "EXECUTED_CLOSE",
            FillStatus::StopLossHit => "STOP_LOSS_HIT",
            FillStatus::TargetHit => "TARGET_HIT",
            FillStatus::Rejected => "REJECTED",
        };
        write!(f, "{s}")
    }
}

/// One simulated fill, rejection or informational event.
#[derive(Debug, Clone, PartialEq)]
pub struct FillRecord {
    pub timestamp: NaiveDateTime,
    pub strategy: String,
    pub symbol: String,
    pub exchange: String,
    pub action: FillAction,
    pub qty: u32,
    pub price: f64,
    pub order_type: String,
    pub status: FillStatus,
    pub stop_loss: Option<f64>,
    pub target: Option<f64>,
    pub order_id: Option<String>,
    pub remarks: String,
}

/// End-of-run aggregate written once per backtest.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRecord {
    pub date: NaiveDate,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub capital_start: f64,
    pub capital_end: f64,
    pub trades_count: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
}

impl SummaryRecord {
    pub fn total_pnl(&self) -> f64 {
        self.realized_pnl + self.unrealized_pnl
    }
}

pub trait TradeLogPort {
    fn record_fill(&mut self, record: &FillRecord) -> Result<(), AlgoTraderError>;

    fn record_summary(&mut self, record: &SummaryRecord) -> Result<(), AlgoTraderError>;
}
