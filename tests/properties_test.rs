//! Property tests over random bar paths and signal scripts.

mod common;

use algotrader::adapters::memory_trade_log::MemoryTradeLog;
use algotrader::domain::backtest::{run_backtest, BacktestResult};
use algotrader::domain::bar::Bar;
use algotrader::domain::config::BacktestConfig;
use algotrader::domain::signal::Signal;
use algotrader::ports::trade_log_port::FillStatus;
use common::*;
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Run {
    candles: Vec<(f64, f64, f64)>,
    script: Vec<u8>,
    capital: f64,
    qty: u32,
    slippage: f64,
    brokerage: f64,
    pyramiding: bool,
    max_entries: u32,
}

fn runs() -> impl Strategy<Value = Run> {
    (5usize..60)
        .prop_flat_map(|n| {
            (
                prop::collection::vec((50.0f64..150.0, 0.0f64..6.0, 0.0f64..6.0), n),
                prop::collection::vec(0u8..6, n),
                300.0f64..5_000.0,
                1u32..20,
                0.0f64..0.5,
                0.0f64..1.0,
                any::<bool>(),
                1u32..4,
            )
        })
        .prop_map(
            |(candles, script, capital, qty, slippage, brokerage, pyramiding, max_entries)| Run {
                candles,
                script,
                capital,
                qty,
                slippage,
                brokerage,
                pyramiding,
                max_entries,
            },
        )
}

fn bars(run: &Run) -> Vec<Bar> {
    run.candles
        .iter()
        .enumerate()
        .map(|(i, &(close, up, down))| make_bar(i, close, close + up, close - down, close))
        .collect()
}

fn script(run: &Run) -> Vec<(usize, Signal)> {
    run.script
        .iter()
        .enumerate()
        .filter_map(|(i, &code)| {
            let close = run.candles[i].0;
            match code {
                3 => Some((i, Signal::buy())),
                4 => Some((
                    i,
                    Signal::buy()
                        .with_stop_loss(close * 0.97)
                        .with_target(close * 1.03),
                )),
                5 => Some((i, Signal::sell())),
                _ => None,
            }
        })
        .collect()
}

fn run_config(run: &Run) -> BacktestConfig {
    let mut cfg = config(run.capital);
    cfg.qty_per_trade = run.qty;
    cfg.slippage_percent = run.slippage;
    cfg.brokerage_percent = run.brokerage;
    cfg.allow_pyramiding = run.pyramiding;
    cfg.max_pyramid_entries = run.max_entries;
    cfg
}

fn execute(run: &Run) -> (BacktestResult, MemoryTradeLog) {
    let s = series(bars(run));
    let cfg = run_config(run);
    let mut strategy = ScriptedStrategy::new(script(run));
    let mut sink = MemoryTradeLog::new();
    let result = run_backtest(&cfg, &s, &mut strategy, &mut sink).unwrap();
    (result, sink)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn identical_inputs_identical_outputs(run in runs()) {
        let (first, first_sink) = execute(&run);
        let (second, second_sink) = execute(&run);
        prop_assert_eq!(&first.trades, &second.trades);
        prop_assert_eq!(&first.summary, &second.summary);
        prop_assert_eq!(&first_sink.fills, &second_sink.fills);
    }

    #[test]
    fn capital_is_conserved_without_brokerage(run in runs().prop_map(|r| Run { brokerage: 0.0, ..r })) {
        let (result, _) = execute(&run);
        let s = &result.summary;
        let realized: f64 = result.trades.iter().map(|t| t.pnl).sum();
        let expected = s.initial_capital + realized + s.unrealized_pnl;
        prop_assert!((s.final_capital - expected).abs() < 1e-6,
            "final {} expected {}", s.final_capital, expected);
    }

    #[test]
    fn capital_identity_with_brokerage(run in runs()) {
        let (result, _) = execute(&run);
        let s = &result.summary;
        let expected = s.initial_capital + s.realized_pnl + s.unrealized_pnl - s.entry_brokerage;
        prop_assert!((s.final_capital - expected).abs() < 1e-6);
    }

    #[test]
    fn entries_never_exceed_cap(run in runs()) {
        let (result, sink) = execute(&run);
        let cap = if run.pyramiding { run.max_entries } else { 1 };

        let mut entries = 0u32;
        for fill in &sink.fills {
            match fill.status {
                FillStatus::ExecutedBuy => {
                    entries += 1;
                    prop_assert!(entries <= cap);
                }
                FillStatus::ExecutedClose | FillStatus::StopLossHit | FillStatus::TargetHit => {
                    entries = 0;
                }
                _ => {}
            }
        }
        if let Some(pos) = &result.summary.open_position {
            prop_assert!(pos.num_entries <= cap);
        }
        for t in &result.trades {
            prop_assert_eq!(t.qty % run.qty, 0);
            prop_assert!(t.qty <= run.qty * cap);
        }
    }

    #[test]
    fn capital_never_negative_after_buy(run in runs()) {
        let (result, sink) = execute(&run);
        let fee = |notional: f64| notional * run.brokerage / 100.0;

        let mut cash = run.capital;
        for fill in &sink.fills {
            let notional = fill.price * fill.qty as f64;
            match fill.status {
                FillStatus::ExecutedBuy => {
                    cash -= notional + fee(notional);
                    prop_assert!(cash >= -1e-6, "cash went negative: {}", cash);
                }
                FillStatus::ExecutedClose | FillStatus::StopLossHit | FillStatus::TargetHit => {
                    cash += notional - fee(notional);
                }
                _ => {}
            }
        }
        prop_assert!((cash - result.summary.cash).abs() < 1e-6);
        prop_assert!(result.summary.cash >= 0.0);
    }

    #[test]
    fn win_loss_counts_partition_trades(run in runs()) {
        let (result, _) = execute(&run);
        let s = &result.summary;
        prop_assert_eq!(s.total_trades, result.trades.len());
        prop_assert_eq!(s.winning_trades + s.losing_trades, s.total_trades);
        let wins = result.trades.iter().filter(|t| t.pnl > 0.0).count();
        prop_assert_eq!(s.winning_trades, wins);
    }
}
