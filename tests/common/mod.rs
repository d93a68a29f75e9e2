#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use simfolio::domain::error::{SimfolioError, ValuationError};
use simfolio::domain::metrics::BacktestResult;
use simfolio::domain::money::{Amount, Decimal, Price};
use simfolio::domain::position::{Position, PositionKind};
use simfolio::domain::snapshot::{MarketSnapshot, PairKey};
use simfolio::ports::data_port::SnapshotPort;
use simfolio::ports::report_port::ReportPort;
use std::cell::RefCell;
use std::path::{Path, PathBuf};

pub struct MockSnapshotPort {
    pub snapshots: Vec<MarketSnapshot>,
    pub error: Option<String>,
}

impl MockSnapshotPort {
    pub fn new(snapshots: Vec<MarketSnapshot>) -> Self {
        Self {
            snapshots,
            error: None,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            snapshots: Vec::new(),
            error: Some(reason.to_string()),
        }
    }
}

impl SnapshotPort for MockSnapshotPort {
    fn load_snapshots(&self) -> Result<Vec<MarketSnapshot>, SimfolioError> {
        match &self.error {
            Some(reason) => Err(SimfolioError::Data {
                reason: reason.clone(),
            }),
            None => Ok(self.snapshots.clone()),
        }
    }
}

/// Records every write instead of touching the filesystem.
#[derive(Default)]
pub struct RecordingReportPort {
    pub writes: RefCell<Vec<(String, PathBuf, usize)>>,
}

impl ReportPort for RecordingReportPort {
    fn write(
        &self,
        result: &BacktestResult,
        strategy_name: &str,
        output_path: &Path,
    ) -> Result<(), SimfolioError> {
        self.writes.borrow_mut().push((
            strategy_name.to_string(),
            output_path.to_path_buf(),
            result.snapshots_processed(),
        ));
        Ok(())
    }
}

/// A position worth the same amount whatever the market does.
#[derive(Debug)]
pub struct FixedValuePosition {
    pub id: String,
    pub worth: Amount,
}

impl FixedValuePosition {
    pub fn new(id: &str, worth: Decimal) -> Self {
        Self {
            id: id.to_string(),
            worth: Amount::new(worth).unwrap(),
        }
    }
}

impl Position for FixedValuePosition {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> PositionKind {
        PositionKind::Other("fixed".into())
    }

    fn value(&self, _snapshot: &MarketSnapshot) -> Result<Amount, ValuationError> {
        Ok(self.worth)
    }
}

pub fn eth() -> PairKey {
    PairKey::new("ETH", "USDC")
}

pub fn amount(v: Decimal) -> Amount {
    Amount::new(v).unwrap()
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// One ETH/USDC snapshot per day starting 2024-01-01.
pub fn daily_snapshots(prices: &[Decimal]) -> Vec<MarketSnapshot> {
    prices
        .iter()
        .enumerate()
        .map(|(i, p)| {
            MarketSnapshot::builder(start_time() + Duration::days(i as i64))
                .price(eth(), Price::new(*p).unwrap())
                .build()
        })
        .collect()
}

/// ETH/USDC snapshots at the given offsets (seconds) from 2024-01-01.
pub fn snapshots_at(offsets_secs: &[i64], prices: &[Decimal]) -> Vec<MarketSnapshot> {
    offsets_secs
        .iter()
        .zip(prices)
        .map(|(secs, p)| {
            MarketSnapshot::builder(start_time() + Duration::seconds(*secs))
                .price(eth(), Price::new(*p).unwrap())
                .build()
        })
        .collect()
}

pub fn flat_snapshots(count: usize) -> Vec<MarketSnapshot> {
    daily_snapshots(&vec![Decimal::ONE; count])
}

pub fn prices_csv(prices: &[&str]) -> String {
    let mut csv = String::from("timestamp,pair,price\n");
    for (i, p) in prices.iter().enumerate() {
        let day = start_time() + Duration::days(i as i64);
        csv.push_str(&format!("{},ETH/USDC,{}\n", day.format("%Y-%m-%d"), p));
    }
    csv
}
