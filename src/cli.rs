//! CLI definition and dispatch.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvSignalAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::error::StrategyError;
use crate::domain::signal::SignalSeries;
use crate::domain::strategy::{BaseStrategy, Strategy};
use crate::domain::strategy_config::{self, StrategyDefinition};
use crate::ports::data_port::SignalPort;

#[derive(Parser, Debug)]
#[command(name = "stratlogic", about = "Rule-based trading strategy evaluator")]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a strategy definition
    Validate {
        #[arg(short, long)]
        strategy: PathBuf,
        /// Also check that every referenced signal exists in this CSV file
        #[arg(long)]
        signals: Option<PathBuf>,
    },
    /// Print per-bar entry and exit recommendations as CSV
    Signals {
        /// Strategy file; repeat to combine several strategies left to right
        #[arg(short, long, required = true)]
        strategy: Vec<PathBuf>,
        #[arg(long)]
        signals: PathBuf,
        #[arg(long, value_enum, default_value_t = Combine::And)]
        combine: Combine,
        /// Swap entry and exit of the final strategy
        #[arg(long)]
        opposite: bool,
        /// Override the unstable period of the final strategy
        #[arg(long, allow_negative_numbers = true)]
        unstable_period: Option<i64>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combine {
    And,
    Or,
}

pub fn run(cli: Cli) -> ExitCode {
    init_tracing(cli.verbose);
    let result = match cli.command {
        Command::Validate { strategy, signals } => run_validate(&strategy, signals.as_deref()),
        Command::Signals {
            strategy,
            signals,
            combine,
            opposite,
            unstable_period,
        } => run_signals(&strategy, &signals, combine, opposite, unstable_period),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, StrategyError> {
    debug!(path = %path.display(), "loading strategy file");
    FileConfigAdapter::from_file(path).map_err(|e| StrategyError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

pub fn load_definition(path: &Path) -> Result<StrategyDefinition, StrategyError> {
    let adapter = load_config(path)?;
    strategy_config::load_definition(&adapter)
}

pub fn load_signals(path: &Path) -> Result<Arc<SignalSeries>, StrategyError> {
    let series = CsvSignalAdapter::new(path.to_path_buf()).load_signals()?;
    Ok(Arc::new(series))
}

/// Fold strategies left to right with the chosen combinator, then apply the
/// optional opposite and unstable period override.
pub fn compose(
    strategies: Vec<BaseStrategy>,
    combine: Combine,
    opposite: bool,
    unstable_period: Option<i64>,
) -> Result<BaseStrategy, StrategyError> {
    let mut iter = strategies.into_iter();
    let mut strategy = iter.next().ok_or_else(|| StrategyError::InvalidArgument {
        name: "strategy".to_string(),
        reason: "at least one strategy is required".to_string(),
    })?;
    for next in iter {
        strategy = match combine {
            Combine::And => strategy.and(&next),
            Combine::Or => strategy.or(&next),
        };
    }
    if opposite {
        strategy = strategy.opposite();
    }
    if let Some(period) = unstable_period {
        strategy.try_set_unstable_period(period)?;
    }
    Ok(strategy)
}

/// One CSV line per bar: `date,index,unstable,enter,exit`.
pub fn render_signals(strategy: &dyn Strategy, series: &SignalSeries) -> String {
    let mut out = String::from("date,index,unstable,enter,exit\n");
    for (index, date) in series.dates().iter().enumerate() {
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            date,
            index,
            u8::from(strategy.is_unstable_at(index)),
            u8::from(strategy.should_enter(index, None)),
            u8::from(strategy.should_exit(index, None)),
        ));
    }
    out
}

fn run_validate(strategy_path: &Path, signals_path: Option<&Path>) -> Result<(), StrategyError> {
    info!(path = %strategy_path.display(), "validating strategy");
    let definition = load_definition(strategy_path)?;

    println!("Name:            {}", definition.name);
    if let Some(hint) = &definition.hint {
        println!("Hint:            {}", hint);
    }
    println!("Unstable period: {}", definition.unstable_period);
    println!("Entry rule:      {}", definition.entry);
    println!("Exit rule:       {}", definition.exit);

    let signals = definition.signals();
    if !signals.is_empty() {
        println!("Signals:         {}", signals.join(", "));
    }

    if let Some(path) = signals_path {
        let series = load_signals(path)?;
        definition.build(&series)?;
        println!("All signals resolve against {} bars", series.len());
    }
    Ok(())
}

fn run_signals(
    strategy_paths: &[PathBuf],
    signals_path: &Path,
    combine: Combine,
    opposite: bool,
    unstable_period: Option<i64>,
) -> Result<(), StrategyError> {
    let series = load_signals(signals_path)?;
    let strategies = strategy_paths
        .iter()
        .map(|path| load_definition(path)?.build(&series))
        .collect::<Result<Vec<_>, _>>()?;
    let strategy = compose(strategies, combine, opposite, unstable_period)?;
    info!(
        strategy = strategy.name(),
        unstable_period = strategy.unstable_period(),
        bars = series.len(),
        "evaluating strategy"
    );
    print!("{}", render_signals(&strategy, &series));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rule::{BooleanRule, FixedRule};
    use chrono::NaiveDate;

    fn constant(name: &str, entry: bool, exit: bool, unstable: usize) -> BaseStrategy {
        BaseStrategy::new(name, BooleanRule::shared(entry), BooleanRule::shared(exit))
            .with_unstable_period(unstable)
    }

    #[test]
    fn cli_parses_signals_command() {
        let cli = Cli::try_parse_from([
            "stratlogic",
            "-v",
            "signals",
            "-s",
            "a.ini",
            "--strategy",
            "b.ini",
            "--signals",
            "data.csv",
            "--combine",
            "or",
            "--opposite",
            "--unstable-period",
            "-2",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Signals {
                strategy,
                combine,
                opposite,
                unstable_period,
                ..
            } => {
                assert_eq!(strategy.len(), 2);
                assert_eq!(combine, Combine::Or);
                assert!(opposite);
                assert_eq!(unstable_period, Some(-2));
            }
            other => panic!("expected Signals, got {other:?}"),
        }
    }

    #[test]
    fn cli_requires_a_strategy() {
        assert!(Cli::try_parse_from(["stratlogic", "signals", "--signals", "x.csv"]).is_err());
    }

    #[test]
    fn compose_folds_left() {
        let s = compose(
            vec![
                constant("A", true, false, 1),
                constant("B", true, true, 0),
                constant("C", false, true, 3),
            ],
            Combine::Or,
            false,
            None,
        )
        .unwrap();
        assert_eq!(s.name(), "((A) or (B)) or (C)");
        assert_eq!(s.unstable_period(), 3);
    }

    #[test]
    fn compose_opposite_and_override() {
        let s = compose(
            vec![constant("A", true, false, 4)],
            Combine::And,
            true,
            Some(0),
        )
        .unwrap();
        assert_eq!(s.name(), "opposite of (A)");
        assert_eq!(s.unstable_period(), 0);
        assert!(!s.should_enter(0, None));
        assert!(s.should_exit(0, None));
    }

    #[test]
    fn compose_rejects_negative_override() {
        let err = compose(vec![constant("A", true, true, 0)], Combine::And, false, Some(-1))
            .unwrap_err();
        assert!(matches!(err, StrategyError::InvalidArgument { .. }));
    }

    #[test]
    fn compose_requires_strategies() {
        assert!(compose(Vec::new(), Combine::And, false, None).is_err());
    }

    #[test]
    fn render_one_line_per_bar() {
        let dates = (1..=3)
            .map(|d| NaiveDate::from_ymd_opt(2024, 6, d).unwrap())
            .collect();
        let series = SignalSeries::new(dates);
        let strategy = BaseStrategy::new(
            "A",
            Arc::new(FixedRule::new([0, 2])),
            Arc::new(FixedRule::new([1])),
        )
        .with_unstable_period(1);

        let out = render_signals(&strategy, &series);
        assert_eq!(
            out,
            "date,index,unstable,enter,exit\n\
             2024-06-01,0,1,0,0\n\
             2024-06-02,1,0,0,1\n\
             2024-06-03,2,0,1,0\n"
        );
    }
}
