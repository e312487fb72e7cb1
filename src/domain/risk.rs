//! Per-bar stop-loss / target monitoring for an open long position.
//!
//! Stop-loss is checked before target: when one bar's low breaches the stop
//! and its high breaches the target, the stop wins.

use super::bar::Bar;
use super::position::{ExitReason, Position};

/// A forced exit triggered by the bar, at the breached level (pre-slippage).
#[derive(Debug, Clone, PartialEq)]
pub struct RiskExit {
    pub trigger_price: f64,
    pub reason: ExitReason,
}

pub fn check_exit(position: &Position, bar: &Bar) -> Option<RiskExit> {
    if let Some(sl) = position.stop_loss.filter(|_| position.stop_loss_hit(bar.low)) {
        return Some(RiskExit {
            trigger_price: sl,
            reason: ExitReason::StopLossHit,
        });
    }
    if let Some(tp) = position.target.filter(|_| position.target_hit(bar.high)) {
        return Some(RiskExit {
            trigger_price: tp,
            reason: ExitReason::TargetHit,
        });
    }
    None
}
