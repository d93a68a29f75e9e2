//! Domain error types.
//!
//! Each layer of the simulation reports its own failure kind; the engine wraps
//! them in [`BacktestError`] together with the snapshot index at which they
//! occurred so callers can tell which step broke.

use rust_decimal::Decimal;

/// Failures of the checked decimal arithmetic behind cash, amounts and prices.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("{kind} cannot be negative: {value}")]
    Negative { kind: &'static str, value: Decimal },

    #[error("division by zero")]
    DivisionByZero,

    #[error("decimal arithmetic overflow")]
    Overflow,

    #[error("invalid decimal {input:?}: {reason}")]
    Parse { input: String, reason: String },
}

/// A position (or the portfolio as a whole) could not be valued against a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValuationError {
    #[error("no price for {pair} in snapshot")]
    MissingPrice { pair: String },

    #[error("missing snapshot metadata {key:?}")]
    MissingMetadata { key: String },

    #[error("position {id} could not be valued: {reason}")]
    Position { id: String, reason: String },

    #[error("portfolio value is negative: {value}")]
    NegativePortfolioValue { value: Decimal },

    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Applying an [`Action`](super::action::Action) to a portfolio failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("position {id} already exists")]
    DuplicatePosition { id: String },

    #[error("position {id} not found")]
    PositionNotFound { id: String },

    #[error("cash adjustment failed: {0}")]
    Cash(#[from] MoneyError),

    #[error("batch sub-action {index} failed: {source}")]
    BatchFailed {
        index: usize,
        #[source]
        source: Box<ActionError>,
    },
}

impl ActionError {
    /// Index path through nested batches down to the failing leaf action.
    pub fn batch_path(&self) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = self;
        while let ActionError::BatchFailed { index, source } = current {
            path.push(*index);
            current = source.as_ref();
        }
        path
    }
}

/// A strategy could not decide on its actions for a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StrategyError {
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Valuation(#[from] ValuationError),

    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Statistics could not be derived from a completed value history.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatisticsError {
    #[error("insufficient history: have {points} value points, need at least 2")]
    InsufficientHistory { points: usize },

    #[error("initial portfolio value is zero")]
    ZeroInitialValue,

    #[error("degenerate time span of {span_ms} ms between first and last sample")]
    DegenerateTimeSpan { span_ms: i64 },

    #[error("{metric} is not representable as a decimal")]
    NotRepresentable { metric: &'static str },

    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Failure of a whole simulation run. No partial result accompanies any variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BacktestError {
    #[error("no strategy configured")]
    MissingStrategy,

    #[error("snapshot sequence is empty")]
    NoSnapshots,

    #[error("run cancelled before snapshot {index}")]
    Cancelled { index: usize },

    #[error("valuation failed at snapshot {index}: {source}")]
    Valuation {
        index: usize,
        #[source]
        source: ValuationError,
    },

    #[error("strategy failed at snapshot {index}: {source}")]
    Strategy {
        index: usize,
        #[source]
        source: StrategyError,
    },

    #[error("action {action} failed at snapshot {index}: {source}")]
    Action {
        index: usize,
        action: usize,
        #[source]
        source: ActionError,
    },

    #[error("statistics derivation failed: {0}")]
    Statistics(#[from] StatisticsError),
}

impl BacktestError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, BacktestError::Cancelled { .. })
    }
}

/// Top-level error type for simfolio.
#[derive(Debug, thiserror::Error)]
pub enum SimfolioError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Backtest(#[from] BacktestError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SimfolioError {
    /// Process exit status reported by the binary for this error.
    pub fn exit_status(&self) -> u8 {
        match self {
            SimfolioError::Io(_) => 1,
            SimfolioError::ConfigParse { .. }
            | SimfolioError::ConfigMissing { .. }
            | SimfolioError::ConfigInvalid { .. } => 2,
            SimfolioError::Data { .. } => 3,
            SimfolioError::Backtest(BacktestError::Cancelled { .. }) => 130,
            SimfolioError::Backtest(_) => 4,
            SimfolioError::Report { .. } => 5,
        }
    }
}

impl From<&SimfolioError> for std::process::ExitCode {
    fn from(err: &SimfolioError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
