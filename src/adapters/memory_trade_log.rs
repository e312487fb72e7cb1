//! In-memory trade log, for tests and embedding callers.

use crate::domain::error::AlgoTraderError;
use crate::ports::trade_log_port::{FillRecord, FillStatus, SummaryRecord, TradeLogPort};

#[derive(Debug, Default)]
pub struct MemoryTradeLog {
    pub fills: Vec<FillRecord>,
    pub summaries: Vec<SummaryRecord>,
}

impl MemoryTradeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(&self, status: FillStatus) -> impl Iterator<Item = &FillRecord> {
        self.fills.iter().filter(move |f| f.status == status)
    }
}

impl TradeLogPort for MemoryTradeLog {
    fn record_fill(&mut self, record: &FillRecord) -> Result<(), AlgoTraderError> {
        self.fills.push(record.clone());
        Ok(())
    }

    fn record_summary(&mut self, record: &SummaryRecord) -> Result<(), AlgoTraderError> {
        self.summaries.push(record.clone());
        Ok(())
    }
}
