//! Backtest engine and event loop.
//!
//! Bars are replayed strictly in timestamp order. On every bar the open
//! position (if any) is checked against its stop-loss and target first; a
//! forced exit ends that bar's iteration. Otherwise the strategy is shown
//! the history up to and including the bar and its signal is routed
//! through the position ledger's transition rules.

use tracing::{debug, info, warn};

use super::accounting::AccountingLedger;
use super::bar::{Bar, BarSeries};
use super::config::BacktestConfig;
use super::error::AlgoTraderError;
use super::execution::ExecutionSimulator;
use super::ledger::{EntryKind, PositionLedger, Transition};
use super::position::{ClosedTrade, EntryType, ExitReason};
use super::risk;
use super::signal::{Action, Signal};
use super::summary::{self, RunSummary};
use crate::ports::strategy_port::StrategyPort;
use crate::ports::trade_log_port::{
    FillAction, FillRecord, FillStatus, ORDER_TYPE_MARKET, TradeLogPort,
};

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub trades: Vec<ClosedTrade>,
    pub summary: RunSummary,
}

pub struct BacktestEngine<'a> {
    config: &'a BacktestConfig,
    series: &'a BarSeries,
    strategy: &'a mut dyn StrategyPort,
    sink: &'a mut dyn TradeLogPort,
    execution: ExecutionSimulator,
    positions: PositionLedger,
    accounts: AccountingLedger,
}

impl<'a> BacktestEngine<'a> {
    pub fn new(
        config: &'a BacktestConfig,
        series: &'a BarSeries,
        strategy: &'a mut dyn StrategyPort,
        sink: &'a mut dyn TradeLogPort,
    ) -> Result<Self, AlgoTraderError> {
        config.validate()?;
        if series.symbol() != config.symbol {
            return Err(AlgoTraderError::invalid(
                "backtest",
                "symbol",
                format!(
                    "configured symbol {} does not match series {}",
                    config.symbol,
                    series.symbol()
                ),
            ));
        }

        Ok(BacktestEngine {
            config,
            series,
            strategy,
            sink,
            execution: config.execution(),
            positions: PositionLedger::new(
                &config.symbol,
                config.allow_pyramiding,
                config.effective_max_entries(),
            ),
            accounts: AccountingLedger::new(config.initial_capital),
        })
    }

    pub fn run(mut self) -> Result<BacktestResult, AlgoTraderError> {
        let series = self.series;
        info!(
            strategy = self.strategy.name(),
            symbol = series.symbol(),
            bars = series.len(),
            capital = self.config.initial_capital,
            "starting backtest"
        );
        self.record_setup(&series.bars()[0])?;

        for (index, bar) in series.bars().iter().enumerate() {
            if self.check_risk(bar)? {
                continue;
            }
            if let Some(signal) = self.strategy.generate_signals(series.history(index)) {
                self.apply_signal(&signal, bar)?;
            }
        }

        let summary = RunSummary::compute(
            self.strategy.name(),
            series,
            &self.accounts,
            self.positions.position(),
        );
        if let Some(pos) = &summary.open_position {
            info!(
                qty = pos.qty,
                avg_price = pos.avg_price,
                last_close = summary.last_close,
                unrealized_pnl = summary.unrealized_pnl,
                "position still open at end of data"
            );
        }
        summary::emit(&summary, &mut *self.sink)?;
        info!(
            trades = summary.total_trades,
            realized_pnl = summary.realized_pnl,
            final_capital = summary.final_capital,
            "backtest complete"
        );

        Ok(BacktestResult {
            trades: self.accounts.into_trades(),
            summary,
        })
    }

    fn record_setup(&mut self, first: &Bar) -> Result<(), AlgoTraderError> {
        let record = FillRecord {
            timestamp: first.timestamp,
            strategy: self.strategy.name().to_string(),
            symbol: self.config.symbol.clone(),
            exchange: self.config.exchange.clone(),
            action: FillAction::Init,
            qty: 0,
            price: self.config.initial_capital,
            order_type: "-".to_string(),
            status: FillStatus::Info,
            stop_loss: None,
            target: None,
            order_id: None,
            remarks: format!(
                "Backtest initialized. Capital: {:.2}, Period: {} to {}",
                self.config.initial_capital,
                self.series.start_date(),
                self.series.end_date()
            ),
        };
        self.sink.record_fill(&record)
    }

    /// Returns true when the bar forced an exit.
    fn check_risk(&mut self, bar: &Bar) -> Result<bool, AlgoTraderError> {
        let exit = match self.positions.position() {
            Some(pos) => risk::check_exit(pos, bar),
            None => None,
        };
        let Some(exit) = exit else {
            return Ok(false);
        };

        info!(
            reason = %exit.reason,
            trigger = exit.trigger_price,
            time = %bar.timestamp,
            "risk exit"
        );
        self.close_position(exit.trigger_price, bar, exit.reason)?;
        Ok(true)
    }

    fn apply_signal(&mut self, signal: &Signal, bar: &Bar) -> Result<(), AlgoTraderError> {
        match self.positions.plan(signal.action) {
            Transition::Open | Transition::Pyramid => self.execute_buy(signal, bar),
            Transition::Close => {
                let reason = ExitReason::from_signal(signal.reason.as_deref());
                self.close_position(signal.reference_price(bar.close), bar, reason)
            }
            Transition::HoldAtCap => {
                debug!(time = %bar.timestamp, "BUY ignored, entry cap reached");
                Ok(())
            }
            Transition::IgnoreSell => {
                debug!(time = %bar.timestamp, "SELL ignored while flat");
                Ok(())
            }
        }
    }

    fn execute_buy(&mut self, signal: &Signal, bar: &Bar) -> Result<(), AlgoTraderError> {
        let qty = self.config.qty_per_trade;
        let quote = self
            .execution
            .quote(signal.reference_price(bar.close), qty, Action::Buy);
        let capital = self.accounts.current_capital();

        if !self.execution.can_afford(quote.total_cost(), capital) {
            warn!(
                required = quote.total_cost(),
                available = capital,
                time = %bar.timestamp,
                "BUY rejected, insufficient funds"
            );
            let remarks = format!(
                "Insufficient funds. Required: {:.2}, Available: {:.2}",
                quote.total_cost(),
                capital
            );
            return self.record(
                bar,
                FillAction::Buy,
                qty,
                quote.price,
                FillStatus::Rejected,
                (signal.sl_price, signal.tp_price),
                remarks,
            );
        }

        let (stop_loss, target) = if self.positions.is_flat() {
            (
                signal
                    .sl_price
                    .or_else(|| self.config.default_stop_loss(quote.price)),
                signal
                    .tp_price
                    .or_else(|| self.config.default_target(quote.price)),
            )
        } else {
            (signal.sl_price, signal.tp_price)
        };

        self.accounts.debit_entry(&quote);
        let kind = self
            .positions
            .buy(qty, quote.price, bar.timestamp, stop_loss, target);

        let remarks = match kind {
            EntryKind::Opened => format!("New {} position opened", EntryType::Long),
            EntryKind::Pyramided {
                entry_no,
                avg_price,
            } => format!(
                "Pyramid entry {entry_no}/{}. New avg price: {avg_price:.2}",
                self.positions.max_entries()
            ),
        };
        let levels = self
            .positions
            .position()
            .map(|p| (p.stop_loss, p.target))
            .unwrap_or((None, None));

        info!(
            qty,
            price = quote.price,
            fee = quote.fee,
            time = %bar.timestamp,
            "BUY filled"
        );
        self.record(
            bar,
            FillAction::Buy,
            qty,
            quote.price,
            FillStatus::ExecutedBuy,
            levels,
            remarks,
        )
    }

    fn close_position(
        &mut self,
        reference_price: f64,
        bar: &Bar,
        reason: ExitReason,
    ) -> Result<(), AlgoTraderError> {
        let Some(position) = self.positions.close() else {
            return Ok(());
        };
        let levels = (position.stop_loss, position.target);
        let quote = self
            .execution
            .quote(reference_price, position.qty, Action::Sell);
        let trade = self
            .accounts
            .settle_close(position, &quote, bar.timestamp, reason);

        info!(
            qty = trade.qty,
            price = trade.exit_price,
            pnl = trade.pnl,
            reason = %trade.exit_reason,
            time = %bar.timestamp,
            "position closed"
        );
        self.record(
            bar,
            FillAction::Sell,
            trade.qty,
            trade.exit_price,
            FillStatus::for_exit(&trade.exit_reason),
            levels,
            format!("{}. PnL: {:.2}", trade.exit_reason, trade.pnl),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn record(
        &mut self,
        bar: &Bar,
        action: FillAction,
        qty: u32,
        price: f64,
        status: FillStatus,
        (stop_loss, target): (Option<f64>, Option<f64>),
        remarks: String,
    ) -> Result<(), AlgoTraderError> {
        let record = FillRecord {
            timestamp: bar.timestamp,
            strategy: self.strategy.name().to_string(),
            symbol: self.config.symbol.clone(),
            exchange: self.config.exchange.clone(),
            action,
            qty,
            price,
            order_type: ORDER_TYPE_MARKET.to_string(),
            status,
            stop_loss,
            target,
            order_id: None,
            remarks,
        };
        self.sink.record_fill(&record)
    }
}

/// Build an engine and run it to completion.
pub fn run_backtest(
    config: &BacktestConfig,
    series: &BarSeries,
    strategy: &mut dyn StrategyPort,
    sink: &mut dyn TradeLogPort,
) -> Result<BacktestResult, AlgoTraderError> {
    BacktestEngine::new(config, series, strategy, sink)?.run()
}
