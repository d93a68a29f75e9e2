//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvSnapshotAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{BacktestConfig, BacktestEngine};
use crate::domain::cancel::CancellationToken;
use crate::domain::config_validation::{validate_backtest_config, validate_strategy_config};
use crate::domain::error::SimfolioError;
use crate::domain::metrics::BacktestResult;
use crate::domain::money::{Amount, parse_decimal};
use crate::domain::snapshot::PairKey;
use crate::domain::strategy::{BuyAndHold, Hold, Strategy};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::SnapshotPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "simfolio", about = "Event-driven portfolio backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest over a CSV price series
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        prices: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Increase log verbosity (-v info, -vv debug, -vvv trace)
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,
    },
    /// Validate a backtest configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            prices,
            output,
            verbose,
        } => run_backtest(&config, &prices, output.as_deref(), verbose),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, SimfolioError> {
    FileConfigAdapter::from_file(path).map_err(|e| SimfolioError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// `-v` flags win over `[backtest] log_level`; the default is `warn`.
pub fn resolve_log_level(verbose: u8, config: &dyn ConfigPort) -> String {
    match verbose {
        0 => config
            .get_string("backtest", "log_level")
            .map(|l| l.trim().to_lowercase())
            .unwrap_or_else(|| "warn".to_string()),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Installs the stderr subscriber. `RUST_LOG` overrides `level` when set.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Cancels `token` on Ctrl-C so an interrupted run stops before its next
/// snapshot. Returns false when a handler could not be installed.
pub fn install_interrupt_handler(token: &CancellationToken) -> bool {
    let handle = token.clone();
    match ctrlc::set_handler(move || {
        tracing::warn!("interrupt received, cancelling backtest");
        handle.cancel();
    }) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "failed to install Ctrl-C handler");
            false
        }
    }
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, SimfolioError> {
    let raw = adapter
        .get_string("backtest", "initial_cash")
        .ok_or_else(|| SimfolioError::ConfigMissing {
            section: "backtest".into(),
            key: "initial_cash".into(),
        })?;
    let initial_cash = parse_decimal(&raw)
        .and_then(Amount::new)
        .map_err(|e| SimfolioError::ConfigInvalid {
            section: "backtest".into(),
            key: "initial_cash".into(),
            reason: e.to_string(),
        })?;
    Ok(BacktestConfig { initial_cash })
}

pub fn build_strategy(adapter: &dyn ConfigPort) -> Result<Box<dyn Strategy>, SimfolioError> {
    let name = adapter
        .get_string("strategy", "name")
        .map(|n| n.trim().to_lowercase())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| SimfolioError::ConfigMissing {
            section: "strategy".into(),
            key: "name".into(),
        })?;

    match name.as_str() {
        "hold" => Ok(Box::new(Hold)),
        "buy_and_hold" => {
            let pair_str = adapter
                .get_string("strategy", "pair")
                .ok_or_else(|| SimfolioError::ConfigMissing {
                    section: "strategy".into(),
                    key: "pair".into(),
                })?;
            let pair: PairKey = pair_str.parse().map_err(|reason| SimfolioError::ConfigInvalid {
                section: "strategy".into(),
                key: "pair".into(),
                reason,
            })?;
            let allocation = adapter.get_decimal("strategy", "allocation", Decimal::ONE);
            Ok(Box::new(BuyAndHold::new(pair, allocation)))
        }
        other => Err(SimfolioError::ConfigInvalid {
            section: "strategy".into(),
            key: "name".into(),
            reason: format!("unknown strategy {other:?}"),
        }),
    }
}

/// Validate, build, load, run and optionally report. Returns the result so
/// callers can print or inspect it.
pub fn run_backtest_pipeline(
    config: &dyn ConfigPort,
    data_port: &dyn SnapshotPort,
    report: Option<(&dyn ReportPort, &Path)>,
    cancel: &CancellationToken,
) -> Result<BacktestResult, SimfolioError> {
    validate_backtest_config(config)?;
    validate_strategy_config(config)?;

    let bt_config = build_backtest_config(config)?;
    let strategy = build_strategy(config)?;
    let strategy_name = strategy.name().to_string();

    let snapshots = data_port.load_snapshots()?;
    tracing::info!(snapshots = snapshots.len(), "loaded market data");

    let mut engine = BacktestEngine::new(bt_config).with_strategy(strategy);
    let result = engine.run(cancel, &snapshots)?;

    if let Some((port, path)) = report {
        port.write(&result, &strategy_name, path)?;
        tracing::info!(path = %path.display(), "report written");
    }
    Ok(result)
}

pub fn format_summary(result: &BacktestResult) -> String {
    format!(
        "Snapshots:          {}\n\
         Initial value:      {}\n\
         Final value:        {}\n\
         Total return:       {}\n\
         Annualized return:  {}\n\
         Sharpe:             {}\n\
         Max drawdown:       {} ({})",
        result.snapshots_processed(),
        result.initial_value,
        result.final_value,
        result.total_return.round_dp(6),
        result
            .annualized_return
            .map(|a| a.round_dp(6).to_string())
            .unwrap_or_else(|| "out of range".to_string()),
        result.sharpe.round_dp(4),
        result.max_drawdown.round_dp(6),
        result.max_drawdown_amount,
    )
}

fn run_backtest(
    config_path: &Path,
    prices_path: &Path,
    output_path: Option<&Path>,
    verbose: u8,
) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    init_logging(&resolve_log_level(verbose, &adapter));
    tracing::info!(
        config = %config_path.display(),
        prices = %prices_path.display(),
        "loading backtest"
    );

    let data_port = CsvSnapshotAdapter::new(prices_path.to_path_buf());
    let reporter = CsvReportAdapter;
    let report = output_path.map(|p| (&reporter as &dyn ReportPort, p));

    let cancel = CancellationToken::new();
    install_interrupt_handler(&cancel);

    match run_backtest_pipeline(&adapter, &data_port, report, &cancel) {
        Ok(result) => {
            println!("{}", format_summary(&result));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let checks = validate_backtest_config(&adapter)
        .and_then(|_| validate_strategy_config(&adapter))
        .and_then(|_| build_strategy(&adapter));
    match checks {
        Ok(strategy) => {
            eprintln!("Strategy: {}", strategy.name());
            eprintln!("Config validated successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
