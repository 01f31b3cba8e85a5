#![allow(dead_code)]

use chrono::NaiveDate;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use stratlogic::domain::error::StrategyError;
use stratlogic::domain::rule::{BooleanRule, FixedRule, Rule, SharedRule};
use stratlogic::domain::signal::SignalSeries;
use stratlogic::domain::strategy::BaseStrategy;
use stratlogic::domain::trading_record::TradingRecord;
use stratlogic::ports::data_port::SignalPort;

/// In-memory signal source.
pub struct MockSignalPort {
    pub columns: Vec<(String, Vec<bool>)>,
    pub bars: usize,
    pub error: Option<String>,
}

impl MockSignalPort {
    pub fn new(bars: usize) -> Self {
        Self {
            columns: Vec::new(),
            bars,
            error: None,
        }
    }

    pub fn with_column(mut self, name: &str, values: Vec<bool>) -> Self {
        self.columns.push((name.to_string(), values));
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl SignalPort for MockSignalPort {
    fn load_signals(&self) -> Result<SignalSeries, StrategyError> {
        if let Some(reason) = &self.error {
            return Err(StrategyError::DataLoad {
                reason: reason.clone(),
            });
        }
        let mut series = SignalSeries::new(dates(self.bars));
        for (name, values) in &self.columns {
            series.insert_column(name, values.clone())?;
        }
        Ok(series)
    }
}

/// Rule returning a fixed value and counting its evaluations.
#[derive(Debug)]
pub struct CountingRule {
    pub value: bool,
    calls: AtomicUsize,
}

impl CountingRule {
    pub fn new(value: bool) -> Arc<Self> {
        Arc::new(Self {
            value,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Rule for CountingRule {
    fn is_satisfied(&self, _index: usize, _record: Option<&dyn TradingRecord>) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.value
    }
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn dates(n: usize) -> Vec<NaiveDate> {
    let start = date(2024, 1, 1);
    (0..n)
        .map(|i| start + chrono::Days::new(i as u64))
        .collect()
}

pub fn fixed(indices: &[usize]) -> SharedRule {
    Arc::new(FixedRule::new(indices.iter().copied()))
}

pub fn constant_strategy(name: &str, entry: bool, exit: bool, unstable: usize) -> BaseStrategy {
    BaseStrategy::new(name, BooleanRule::shared(entry), BooleanRule::shared(exit))
        .with_unstable_period(unstable)
}
