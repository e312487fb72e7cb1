//! Trading signals produced by a strategy for the current bar.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Buy,
    Sell,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "BUY"),
            Action::Sell => write!(f, "SELL"),
        }
    }
}

/// A BUY or SELL request. `price` defaults to the bar close when absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub action: Action,
    pub price: Option<f64>,
    pub sl_price: Option<f64>,
    pub tp_price: Option<f64>,
    pub reason: Option<String>,
}

impl Signal {
    pub fn buy() -> Self {
        Signal {
            action: Action::Buy,
            price: None,
            sl_price: None,
            tp_price: None,
            reason: None,
        }
    }

    pub fn sell() -> Self {
        Signal {
            action: Action::Sell,
            ..Signal::buy()
        }
    }

    pub fn at(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_stop_loss(mut self, sl_price: f64) -> Self {
        self.sl_price = Some(sl_price);
        self
    }

    pub fn with_target(mut self, tp_price: f64) -> Self {
        self.tp_price = Some(tp_price);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Reference price for the fill: the signal's own price, else `close`.
    pub fn reference_price(&self, close: f64) -> f64 {
        self.price.unwrap_or(close)
    }
}
