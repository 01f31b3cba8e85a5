//! CSV signal file adapter.
//!
//! Layout: a `date` column (`%Y-%m-%d`) followed by one boolean column per
//! signal. Booleans accept `1/0`, `true/false` and `yes/no`. Rows are sorted by
//! date; duplicate dates and duplicate column names are rejected.

use crate::domain::error::StrategyError;
use crate::domain::rule_parser::is_valid_signal_name;
use crate::domain::signal::SignalSeries;
use crate::ports::data_port::SignalPort;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvSignalAdapter {
    path: PathBuf,
}

impl CsvSignalAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Parse CSV content directly.
    pub fn parse(content: &str) -> Result<SignalSeries, StrategyError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers = rdr.headers().map_err(|e| StrategyError::DataLoad {
            reason: format!("CSV header error: {}", e),
        })?;
        let mut headers = headers.iter();
        match headers.next() {
            Some(h) if h.eq_ignore_ascii_case("date") => {}
            _ => {
                return Err(StrategyError::DataLoad {
                    reason: "first column must be 'date'".into(),
                });
            }
        }
        let names: Vec<String> = headers.map(str::to_string).collect();
        let mut seen = BTreeSet::new();
        for name in &names {
            if !is_valid_signal_name(name) {
                return Err(StrategyError::DataLoad {
                    reason: format!("invalid signal column name '{}'", name),
                });
            }
            if !seen.insert(name.as_str()) {
                return Err(StrategyError::DataLoad {
                    reason: format!("duplicate signal column '{}'", name),
                });
            }
        }

        let mut rows: Vec<(NaiveDate, Vec<bool>)> = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| StrategyError::DataLoad {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(0).ok_or_else(|| StrategyError::DataLoad {
                reason: "missing date column".into(),
            })?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                StrategyError::DataLoad {
                    reason: format!("invalid date '{}': {}", date_str, e),
                }
            })?;

            let mut values = Vec::with_capacity(names.len());
            for (i, name) in names.iter().enumerate() {
                let raw = record.get(i + 1).ok_or_else(|| StrategyError::DataLoad {
                    reason: format!("missing value for '{}' on {}", name, date),
                })?;
                let value = parse_bool(raw).ok_or_else(|| StrategyError::DataLoad {
                    reason: format!("invalid value '{}' for '{}' on {}", raw, name, date),
                })?;
                values.push(value);
            }
            rows.push((date, values));
        }

        rows.sort_by_key(|(date, _)| *date);
        if let Some(pair) = rows.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(StrategyError::DataLoad {
                reason: format!("duplicate date {}", pair[0].0),
            });
        }

        let dates = rows.iter().map(|(date, _)| *date).collect();
        let mut series = SignalSeries::new(dates);
        for (i, name) in names.iter().enumerate() {
            let column = rows.iter().map(|(_, values)| values[i]).collect();
            series.insert_column(name, column)?;
        }
        Ok(series)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

impl SignalPort for CsvSignalAdapter {
    fn load_signals(&self) -> Result<SignalSeries, StrategyError> {
        let content = fs::read_to_string(&self.path).map_err(|e| StrategyError::DataLoad {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;
        let series = Self::parse(&content)?;
        debug!(
            path = %self.path.display(),
            bars = series.len(),
            signals = series.names().count(),
            "loaded signal file"
        );
        Ok(series)
    }
}
