//! Single-instrument position state machine: FLAT -> LONG (optionally
//! pyramided) -> FLAT.

use chrono::NaiveDateTime;

use super::position::Position;
use super::signal::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionState {
    Flat,
    Long,
}

/// What a signal does to the ledger in its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// FLAT --BUY--> LONG
    Open,
    /// LONG --BUY--> LONG, adding a lot.
    Pyramid,
    /// LONG --SELL--> FLAT, closing the whole position.
    Close,
    /// LONG --BUY--> LONG with pyramiding off or the entry cap reached.
    HoldAtCap,
    /// FLAT --SELL--> FLAT; short entries are not simulated.
    IgnoreSell,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntryKind {
    Opened,
    Pyramided { entry_no: u32, avg_price: f64 },
}

#[derive(Debug, Clone)]
pub struct PositionLedger {
    symbol: String,
    position: Option<Position>,
    allow_pyramiding: bool,
    max_entries: u32,
}

impl PositionLedger {
    /// `max_pyramid_entries` is forced to 1 when pyramiding is disabled.
    pub fn new(symbol: &str, allow_pyramiding: bool, max_pyramid_entries: u32) -> Self {
        PositionLedger {
            symbol: symbol.to_string(),
            position: None,
            allow_pyramiding,
            max_entries: if allow_pyramiding {
                max_pyramid_entries.max(1)
            } else {
                1
            },
        }
    }

    pub fn state(&self) -> PositionState {
        match self.position {
            Some(_) => PositionState::Long,
            None => PositionState::Flat,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn max_entries(&self) -> u32 {
        self.max_entries
    }

    pub fn plan(&self, action: Action) -> Transition {
        match (action, &self.position) {
            (Action::Buy, None) => Transition::Open,
            (Action::Buy, Some(pos)) => {
                if self.allow_pyramiding && pos.num_entries < self.max_entries {
                    Transition::Pyramid
                } else {
                    Transition::HoldAtCap
                }
            }
            (Action::Sell, Some(_)) => Transition::Close,
            (Action::Sell, None) => Transition::IgnoreSell,
        }
    }

    /// Record a BUY fill: opens a position when flat, otherwise adds a lot.
    /// Callers consult [`PositionLedger::plan`] first.
    pub fn buy(
        &mut self,
        qty: u32,
        fill_price: f64,
        time: NaiveDateTime,
        stop_loss: Option<f64>,
        target: Option<f64>,
    ) -> EntryKind {
        match self.position.as_mut() {
            None => {
                self.position = Some(Position::open(
                    &self.symbol,
                    qty,
                    fill_price,
                    time,
                    stop_loss,
                    target,
                ));
                EntryKind::Opened
            }
            Some(pos) => {
                pos.add_entry(qty, fill_price, stop_loss, target);
                EntryKind::Pyramided {
                    entry_no: pos.num_entries,
                    avg_price: pos.avg_price,
                }
            }
        }
    }

    /// Remove and return the open position.
    pub fn close(&mut self) -> Option<Position> {
        self.position.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn starts_flat() {
        let ledger = PositionLedger::new("INFY", false, 1);
        assert_eq!(ledger.state(), PositionState::Flat);
        assert!(ledger.position().is_none());
    }

    #[test]
    fn flat_transitions() {
        let ledger = PositionLedger::new("INFY", true, 3);
        assert_eq!(ledger.plan(Action::Buy), Transition::Open);
        assert_eq!(ledger.plan(Action::Sell), Transition::IgnoreSell);
    }

    #[test]
    fn long_without_pyramiding_holds() {
        let mut ledger = PositionLedger::new("INFY", false, 5);
        assert_eq!(ledger.max_entries(), 1);
        ledger.buy(10, 100.0, ts(1), None, None);
        assert_eq!(ledger.state(), PositionState::Long);
        assert_eq!(ledger.plan(Action::Buy), Transition::HoldAtCap);
        assert_eq!(ledger.plan(Action::Sell), Transition::Close);
    }

    #[test]
    fn pyramiding_until_cap() {
        let mut ledger = PositionLedger::new("INFY", true, 2);
        assert_eq!(ledger.buy(10, 100.0, ts(1), None, None), EntryKind::Opened);
        assert_eq!(ledger.plan(Action::Buy), Transition::Pyramid);

        let kind = ledger.buy(10, 110.0, ts(2), None, None);
        assert_eq!(
            kind,
            EntryKind::Pyramided {
                entry_no: 2,
                avg_price: 105.0
            }
        );
        assert_eq!(ledger.plan(Action::Buy), Transition::HoldAtCap);

        let pos = ledger.position().unwrap();
        assert_eq!(pos.qty, 20);
        assert_eq!(pos.entry_time, ts(1));
    }

    #[test]
    fn close_returns_to_flat() {
        let mut ledger = PositionLedger::new("INFY", false, 1);
        ledger.buy(10, 100.0, ts(1), Some(98.0), None);
        let pos = ledger.close().unwrap();
        assert_eq!(pos.stop_loss, Some(98.0));
        assert!(ledger.is_flat());
        assert!(ledger.close().is_none());
    }
}
