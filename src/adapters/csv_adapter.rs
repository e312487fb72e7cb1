//! CSV file data adapter.

use crate::domain::bar::RawTable;
use crate::domain::error::AlgoTraderError;
use crate::ports::data_port::DataPort;
use std::fs;
use std::path::{Path, PathBuf};

enum Source {
    /// `<dir>/<SYMBOL>.csv`
    Directory(PathBuf),
    File(PathBuf),
}

pub struct CsvAdapter {
    source: Source,
}

impl CsvAdapter {
    /// Look up `<base_path>/<symbol>.csv` per request.
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            source: Source::Directory(base_path),
        }
    }

    /// Always read `path`, whatever symbol is requested.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Self {
        Self {
            source: Source::File(path.as_ref().to_path_buf()),
        }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        match &self.source {
            Source::Directory(base) => base.join(format!("{symbol}.csv")),
            Source::File(path) => path.clone(),
        }
    }
}

impl DataPort for CsvAdapter {
    fn load_table(&self, symbol: &str) -> Result<RawTable, AlgoTraderError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| {
            AlgoTraderError::data(format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = rdr
            .headers()
            .map_err(|e| AlgoTraderError::data(format!("CSV header error: {e}")))?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record =
                result.map_err(|e| AlgoTraderError::data(format!("CSV parse error: {e}")))?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(RawTable::new(headers, rows))
    }
}
