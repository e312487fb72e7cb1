//! Fill simulation: slippage, brokerage and affordability checks.
//!
//! Everything here is a pure function of the configured percentages and the
//! inputs; no randomness and no state.

use super::signal::Action;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExecutionSimulator {
    pub slippage_pct: f64,
    pub brokerage_pct: f64,
}

impl ExecutionSimulator {
    pub fn new(slippage_pct: f64, brokerage_pct: f64) -> Self {
        ExecutionSimulator {
            slippage_pct,
            brokerage_pct,
        }
    }

    /// BUY fills worse by `slippage_pct` above, SELL fills below.
    pub fn apply_slippage(&self, price: f64, action: Action) -> f64 {
        match action {
            Action::Buy => price * (1.0 + self.slippage_pct / 100.0),
            Action::Sell => price * (1.0 - self.slippage_pct / 100.0),
        }
    }

    /// Brokerage fee: `notional * brokerage_pct / 100`.
    pub fn brokerage(&self, notional: f64) -> f64 {
        notional * self.brokerage_pct / 100.0
    }

    pub fn can_afford(&self, total_cost: f64, capital: f64) -> bool {
        capital >= total_cost
    }

    /// Price, notional and fee for filling `qty` at `reference_price`.
    pub fn quote(&self, reference_price: f64, qty: u32, action: Action) -> Quote {
        let price = self.apply_slippage(reference_price, action);
        let notional = price * qty as f64;
        Quote {
            price,
            notional,
            fee: self.brokerage(notional),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub price: f64,
    pub notional: f64,
    pub fee: f64,
}

impl Quote {
    pub fn total_cost(&self) -> f64 {
        self.notional + self.fee
    }

    pub fn net_proceeds(&self) -> f64 {
        self.notional - self.fee
    }
}
