//! Backtest configuration: construction from a [`ConfigPort`] and
//! validation. Invalid values are fatal before any bar is processed.

use chrono::NaiveDate;

use super::error::AlgoTraderError;
use super::execution::ExecutionSimulator;
use crate::ports::config_port::ConfigPort;

pub const SECTION: &str = "backtest";
pub const DEFAULT_EXCHANGE: &str = "BACKTEST";
pub const DEFAULT_QTY_PER_TRADE: i64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub symbol: String,
    pub exchange: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub qty_per_trade: u32,
    pub stop_loss_percent: Option<f64>,
    pub target_percent: Option<f64>,
    pub brokerage_percent: f64,
    pub slippage_percent: f64,
    pub allow_pyramiding: bool,
    pub max_pyramid_entries: u32,
}

impl BacktestConfig {
    /// Config with library defaults for everything but the run identity.
    pub fn new(
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        initial_capital: f64,
    ) -> Self {
        BacktestConfig {
            symbol: symbol.to_string(),
            exchange: DEFAULT_EXCHANGE.to_string(),
            start_date,
            end_date,
            initial_capital,
            qty_per_trade: DEFAULT_QTY_PER_TRADE as u32,
            stop_loss_percent: None,
            target_percent: None,
            brokerage_percent: 0.0,
            slippage_percent: 0.0,
            allow_pyramiding: false,
            max_pyramid_entries: 1,
        }
    }

    pub fn from_port(config: &dyn ConfigPort) -> Result<Self, AlgoTraderError> {
        let symbol = config
            .get_string(SECTION, "symbol")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AlgoTraderError::missing(SECTION, "symbol"))?;
        let start_date = parse_date(config, "start_date")?;
        let end_date = parse_date(config, "end_date")?;

        let qty = config.get_int(SECTION, "qty_per_trade", DEFAULT_QTY_PER_TRADE);
        let qty_per_trade = positive_u32(qty, "qty_per_trade")?;
        let allow_pyramiding = config.get_bool(SECTION, "allow_pyramiding", false);
        let max_pyramid_entries = if allow_pyramiding {
            let entries = config.get_int(SECTION, "max_pyramid_entries", 1);
            positive_u32(entries, "max_pyramid_entries")?
        } else {
            1
        };

        let cfg = BacktestConfig {
            symbol: symbol.trim().to_string(),
            exchange: config
                .get_string(SECTION, "exchange")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_EXCHANGE.to_string()),
            start_date,
            end_date,
            initial_capital: config.get_double(SECTION, "initial_capital", 0.0),
            qty_per_trade,
            stop_loss_percent: config.get_optional_double(SECTION, "stop_loss_percent"),
            target_percent: config.get_optional_double(SECTION, "target_percent"),
            brokerage_percent: config.get_double(SECTION, "brokerage_percent", 0.0),
            slippage_percent: config.get_double(SECTION, "slippage_percent", 0.0),
            allow_pyramiding,
            max_pyramid_entries,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), AlgoTraderError> {
        if self.symbol.trim().is_empty() {
            return Err(AlgoTraderError::missing(SECTION, "symbol"));
        }
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(AlgoTraderError::invalid(
                SECTION,
                "initial_capital",
                "initial_capital must be positive",
            ));
        }
        if self.qty_per_trade == 0 {
            return Err(AlgoTraderError::invalid(
                SECTION,
                "qty_per_trade",
                "qty_per_trade must be positive",
            ));
        }
        if self.allow_pyramiding && self.max_pyramid_entries == 0 {
            return Err(AlgoTraderError::invalid(
                SECTION,
                "max_pyramid_entries",
                "max_pyramid_entries must be at least 1",
            ));
        }
        // The full pyramided position must fit the quantity type.
        if self
            .qty_per_trade
            .checked_mul(self.effective_max_entries())
            .is_none()
        {
            return Err(AlgoTraderError::invalid(
                SECTION,
                "qty_per_trade",
                format!(
                    "qty_per_trade * max_pyramid_entries exceeds {}",
                    u32::MAX
                ),
            ));
        }
        non_negative(self.brokerage_percent, "brokerage_percent")?;
        non_negative(self.slippage_percent, "slippage_percent")?;
        if self.slippage_percent >= 100.0 {
            return Err(AlgoTraderError::invalid(
                SECTION,
                "slippage_percent",
                "slippage_percent must be below 100",
            ));
        }
        if let Some(v) = self.stop_loss_percent {
            non_negative(v, "stop_loss_percent")?;
        }
        if let Some(v) = self.target_percent {
            non_negative(v, "target_percent")?;
        }
        if self.start_date > self.end_date {
            return Err(AlgoTraderError::invalid(
                SECTION,
                "start_date",
                "start_date must not be after end_date",
            ));
        }
        Ok(())
    }

    pub fn effective_max_entries(&self) -> u32 {
        if self.allow_pyramiding {
            self.max_pyramid_entries
        } else {
            1
        }
    }

    pub fn execution(&self) -> ExecutionSimulator {
        ExecutionSimulator::new(self.slippage_percent, self.brokerage_percent)
    }

    /// Stop-loss below `entry_price` by the configured percentage.
    pub fn default_stop_loss(&self, entry_price: f64) -> Option<f64> {
        self.stop_loss_percent
            .filter(|pct| *pct > 0.0)
            .map(|pct| entry_price * (1.0 - pct / 100.0))
    }

    /// Target above `entry_price` by the configured percentage.
    pub fn default_target(&self, entry_price: f64) -> Option<f64> {
        self.target_percent
            .filter(|pct| *pct > 0.0)
            .map(|pct| entry_price * (1.0 + pct / 100.0))
    }
}

fn parse_date(config: &dyn ConfigPort, key: &str) -> Result<NaiveDate, AlgoTraderError> {
    let raw = config
        .get_string(SECTION, key)
        .ok_or_else(|| AlgoTraderError::missing(SECTION, key))?;
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        AlgoTraderError::invalid(
            SECTION,
            key,
            format!("invalid {key} format, expected YYYY-MM-DD"),
        )
    })
}

fn positive_u32(value: i64, key: &str) -> Result<u32, AlgoTraderError> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| AlgoTraderError::invalid(SECTION, key, format!("{key} must be positive")))
}

fn non_negative(value: f64, key: &str) -> Result<(), AlgoTraderError> {
    if value < 0.0 || !value.is_finite() {
        return Err(AlgoTraderError::invalid(
            SECTION,
            key,
            format!("{key} must be non-negative"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    const FULL: &str = r#"
[backtest]
symbol = INFY
exchange = NSE
start_date = 2023-01-01
end_date = 2023-12-31
initial_capital = 100000
qty_per_trade = 25
stop_loss_percent = 2.0
target_percent = 4.0
brokerage_percent = 0.03
slippage_percent = 0.05
allow_pyramiding = true
max_pyramid_entries = 3
"#;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn from_port_reads_every_key() {
        let adapter = FileConfigAdapter::from_string(FULL).unwrap();
        let cfg = BacktestConfig::from_port(&adapter).unwrap();
        assert_eq!(cfg.symbol, "INFY");
        assert_eq!(cfg.exchange, "NSE");
        assert_eq!(cfg.start_date, d(2023, 1, 1));
        assert_eq!(cfg.end_date, d(2023, 12, 31));
        assert_eq!(cfg.initial_capital, 100_000.0);
        assert_eq!(cfg.qty_per_trade, 25);
        assert_eq!(cfg.stop_loss_percent, Some(2.0));
        assert_eq!(cfg.target_percent, Some(4.0));
        assert_eq!(cfg.brokerage_percent, 0.03);
        assert_eq!(cfg.slippage_percent, 0.05);
        assert!(cfg.allow_pyramiding);
        assert_eq!(cfg.effective_max_entries(), 3);
    }

    #[test]
    fn from_port_defaults() {
        let ini = "[backtest]\nsymbol = TCS\nstart_date = 2023-01-01\nend_date = 2023-02-01\ninitial_capital = 5000\n";
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        let cfg = BacktestConfig::from_port(&adapter).unwrap();
        assert_eq!(cfg.exchange, DEFAULT_EXCHANGE);
        assert_eq!(cfg.qty_per_trade, 10);
        assert_eq!(cfg.stop_loss_percent, None);
        assert_eq!(cfg.target_percent, None);
        assert_eq!(cfg.brokerage_percent, 0.0);
        assert_eq!(cfg.slippage_percent, 0.0);
        assert!(!cfg.allow_pyramiding);
        assert_eq!(cfg.effective_max_entries(), 1);
    }

    #[test]
    fn pyramid_cap_forced_to_one_when_disabled() {
        let mut cfg = BacktestConfig::new("X", d(2023, 1, 1), d(2023, 1, 2), 1000.0);
        cfg.max_pyramid_entries = 4;
        assert_eq!(cfg.effective_max_entries(), 1);
        cfg.allow_pyramiding = true;
        assert_eq!(cfg.effective_max_entries(), 4);
    }

    #[test]
    fn missing_symbol() {
        let ini = "[backtest]\nstart_date = 2023-01-01\nend_date = 2023-02-01\ninitial_capital = 5000\n";
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        let err = BacktestConfig::from_port(&adapter).unwrap_err();
        assert!(matches!(err, AlgoTraderError::ConfigMissing { key, .. } if key == "symbol"));
    }

    #[test]
    fn bad_date_format() {
        let ini = "[backtest]\nsymbol = X\nstart_date = 01/01/2023\nend_date = 2023-02-01\ninitial_capital = 5000\n";
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        let err = BacktestConfig::from_port(&adapter).unwrap_err();
        assert!(matches!(err, AlgoTraderError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn non_positive_quantity_rejected() {
        for qty in ["0", "-5"] {
            let ini = format!(
                "[backtest]\nsymbol = X\nstart_date = 2023-01-01\nend_date = 2023-02-01\ninitial_capital = 5000\nqty_per_trade = {qty}\n"
            );
            let adapter = FileConfigAdapter::from_string(&ini).unwrap();
            let err = BacktestConfig::from_port(&adapter).unwrap_err();
            assert!(
                matches!(err, AlgoTraderError::ConfigInvalid { ref key, .. } if key == "qty_per_trade")
            );
        }
    }

    #[test]
    fn validate_rejects_bad_values() {
        let base = BacktestConfig::new("X", d(2023, 1, 1), d(2023, 1, 2), 1000.0);
        assert!(base.validate().is_ok());

        let cfg = BacktestConfig {
            initial_capital: 0.0,
            ..base.clone()
        };
        assert!(cfg.validate().is_err());

        let cfg = BacktestConfig {
            slippage_percent: -0.1,
            ..base.clone()
        };
        assert!(cfg.validate().is_err());

        let cfg = BacktestConfig {
            stop_loss_percent: Some(-1.0),
            ..base.clone()
        };
        assert!(cfg.validate().is_err());

        let cfg = BacktestConfig {
            start_date: d(2023, 2, 1),
            ..base.clone()
        };
        assert!(cfg.validate().is_err());

        let cfg = BacktestConfig {
            max_pyramid_entries: 0,
            allow_pyramiding: true,
            ..base.clone()
        };
        assert!(cfg.validate().is_err());

        let cfg = BacktestConfig {
            initial_capital: f64::INFINITY,
            ..base
        };
        assert!(matches!(
            cfg.validate(),
            Err(AlgoTraderError::ConfigInvalid { ref key, .. }) if key == "initial_capital"
        ));
    }

    #[test]
    fn zero_pyramid_cap_ignored_when_pyramiding_disabled() {
        let base = BacktestConfig::new("X", d(2023, 1, 1), d(2023, 1, 2), 1000.0);
        let cfg = BacktestConfig {
            max_pyramid_entries: 0,
            ..base
        };
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.effective_max_entries(), 1);

        let ini = "[backtest]\nsymbol = X\nstart_date = 2023-01-01\nend_date = 2023-02-01\ninitial_capital = 5000\nmax_pyramid_entries = 0\n";
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        let cfg = BacktestConfig::from_port(&adapter).unwrap();
        assert_eq!(cfg.max_pyramid_entries, 1);
        assert_eq!(cfg.effective_max_entries(), 1);
    }

    #[test]
    fn pyramided_quantity_must_fit() {
        let mut cfg = BacktestConfig::new("X", d(2023, 1, 1), d(2023, 1, 2), 1e12);
        cfg.qty_per_trade = 3_000_000_000;
        assert!(cfg.validate().is_ok());

        cfg.allow_pyramiding = true;
        cfg.max_pyramid_entries = 2;
        let err = cfg.validate().unwrap_err();
        assert!(matches!(
            err,
            AlgoTraderError::ConfigInvalid { ref key, .. } if key == "qty_per_trade"
        ));

        cfg.qty_per_trade = u32::MAX / 2;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn slippage_must_stay_below_hundred() {
        let mut cfg = BacktestConfig::new("X", d(2023, 1, 1), d(2023, 1, 2), 1000.0);
        cfg.slippage_percent = 99.5;
        assert!(cfg.validate().is_ok());
        for pct in [100.0, 150.0] {
            cfg.slippage_percent = pct;
            let err = cfg.validate().unwrap_err();
            assert!(matches!(
                err,
                AlgoTraderError::ConfigInvalid { ref key, .. } if key == "slippage_percent"
            ));
        }
    }

    #[test]
    fn default_levels_from_percentages() {
        let mut cfg = BacktestConfig::new("X", d(2023, 1, 1), d(2023, 1, 2), 1000.0);
        assert_eq!(cfg.default_stop_loss(100.0), None);
        assert_eq!(cfg.default_target(100.0), None);

        cfg.stop_loss_percent = Some(2.0);
        cfg.target_percent = Some(5.0);
        assert!((cfg.default_stop_loss(100.0).unwrap() - 98.0).abs() < 1e-9);
        assert!((cfg.default_target(100.0).unwrap() - 105.0).abs() < 1e-9);
    }
}
