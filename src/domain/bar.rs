//! Price bars and the validated, time-ordered series the engine replays.
//!
//! [`BarSeries`] is built once from an untyped [`RawTable`] before a run
//! starts. Headers are normalised (`Date`/`date`/`time` become `timestamp`,
//! OHLCV names are lowercased), rows are sorted by timestamp, duplicate
//! timestamps keep their first occurrence, and only bars inside the
//! inclusive `[start_date, end_date]` window survive.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::error::AlgoTraderError;

const REQUIRED_PRICE_COLUMNS: [&str; 4] = ["open", "high", "low", "close"];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
}

/// Untyped tabular input: a header row plus string cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct BarSeries {
    symbol: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Validate a raw table and build the series for `[start_date, end_date]`.
    pub fn from_table(
        symbol: &str,
        table: &RawTable,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, AlgoTraderError> {
        if table.is_empty() {
            return Err(AlgoTraderError::data(format!(
                "source for {symbol} is empty"
            )));
        }

        let columns = ColumnIndex::resolve(&table.headers)?;
        let mut bars = Vec::with_capacity(table.rows.len());
        for (row_no, row) in table.rows.iter().enumerate() {
            bars.push(columns.parse_row(row, row_no + 1)?);
        }

        Self::from_bars(symbol, bars, start_date, end_date)
    }

    /// Build a series from already-typed bars, applying the same ordering,
    /// de-duplication and window rules as [`BarSeries::from_table`].
    pub fn from_bars(
        symbol: &str,
        mut bars: Vec<Bar>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, AlgoTraderError> {
        if bars.is_empty() {
            return Err(AlgoTraderError::data(format!(
                "source for {symbol} is empty"
            )));
        }

        bars.sort_by_key(|b| b.timestamp);
        bars.dedup_by_key(|b| b.timestamp);
        bars.retain(|b| {
            let day = b.timestamp.date();
            day >= start_date && day <= end_date
        });

        if bars.is_empty() {
            return Err(AlgoTraderError::data(format!(
                "no bars for {symbol} between {start_date} and {end_date}"
            )));
        }

        Ok(Self {
            symbol: symbol.to_string(),
            start_date,
            end_date,
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false for a constructed series; kept for slice-like ergonomics.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Bars up to and including `index`. Never exposes later bars.
    pub fn history(&self, index: usize) -> &[Bar] {
        &self.bars[..=index]
    }

    pub fn last(&self) -> &Bar {
        // A constructed series holds at least one bar.
        &self.bars[self.bars.len() - 1]
    }
}

/// Canonical column name for a raw header, if it is one we recognise.
pub fn normalize_column(header: &str) -> Option<&'static str> {
    match header.trim().to_lowercase().as_str() {
        "timestamp" | "date" | "time" | "datetime" => Some("timestamp"),
        "open" => Some("open"),
        "high" => Some("high"),
        "low" => Some("low"),
        "close" => Some("close"),
        "volume" => Some("volume"),
        _ => None,
    }
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

struct ColumnIndex {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl ColumnIndex {
    fn resolve(headers: &[String]) -> Result<Self, AlgoTraderError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| normalize_column(h) == Some(name))
        };

        let timestamp = find("timestamp").ok_or_else(|| {
            AlgoTraderError::data("missing required column: timestamp")
        })?;

        let missing: Vec<&str> = REQUIRED_PRICE_COLUMNS
            .iter()
            .copied()
            .filter(|&c| find(c).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(AlgoTraderError::data(format!(
                "missing required columns: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            timestamp,
            open: find("open").unwrap_or_default(),
            high: find("high").unwrap_or_default(),
            low: find("low").unwrap_or_default(),
            close: find("close").unwrap_or_default(),
            volume: find("volume"),
        })
    }

    fn parse_row(&self, row: &[String], row_no: usize) -> Result<Bar, AlgoTraderError> {
        let cell = |idx: usize| row.get(idx).map(|s| s.trim()).unwrap_or("");

        let raw_ts = cell(self.timestamp);
        let timestamp = parse_timestamp(raw_ts).ok_or_else(|| {
            AlgoTraderError::data(format!("unparsable timestamp '{raw_ts}' at row {row_no}"))
        })?;

        let price = |idx: usize, name: &str| -> Result<f64, AlgoTraderError> {
            cell(idx)
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    AlgoTraderError::data(format!(
                        "invalid {name} value '{}' at row {row_no}",
                        cell(idx)
                    ))
                })
        };

        let volume = match self.volume.map(|idx| cell(idx)) {
            Some(v) if !v.is_empty() => Some(v.parse::<f64>().map_err(|_| {
                AlgoTraderError::data(format!("invalid volume value '{v}' at row {row_no}"))
            })?),
            _ => None,
        };

        Ok(Bar {
            timestamp,
            open: price(self.open, "open")?,
            high: price(self.high, "high")?,
            low: price(self.low, "low")?,
            close: price(self.close, "close")?,
            volume,
        })
    }
}
