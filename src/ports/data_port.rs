//! Market data access port trait.

use crate::domain::bar::RawTable;
use crate::domain::error::AlgoTraderError;

pub trait DataPort {
    /// Untyped price table for `symbol`; validation happens in
    /// [`crate::domain::bar::BarSeries::from_table`].
    fn load_table(&self, symbol: &str) -> Result<RawTable, AlgoTraderError>;
}
