//! CSV price-series adapter.
//!
//! Rows are `timestamp,pair,price` with any number of trailing `key=value`
//! metadata columns. Consecutive rows sharing a timestamp form one snapshot.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use crate::domain::error::SimfolioError;
use crate::domain::money::Price;
use crate::domain::snapshot::{MarketSnapshot, MetaValue, PairKey, SnapshotBuilder};
use crate::ports::data_port::SnapshotPort;

pub struct CsvSnapshotAdapter {
    path: PathBuf,
}

impl CsvSnapshotAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SnapshotPort for CsvSnapshotAdapter {
    fn load_snapshots(&self) -> Result<Vec<MarketSnapshot>, SimfolioError> {
        let file = File::open(&self.path).map_err(|e| SimfolioError::Data {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;
        parse_snapshots(file)
    }
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, SimfolioError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(ts.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ts| ts.and_utc())
        .ok_or_else(|| SimfolioError::Data {
            reason: format!("invalid timestamp {raw:?}"),
        })
}

/// Reads snapshots from CSV with a header row; rejects out-of-order timestamps.
pub fn parse_snapshots<R: Read>(reader: R) -> Result<Vec<MarketSnapshot>, SimfolioError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut snapshots = Vec::new();
    let mut current: Option<(DateTime<Utc>, SnapshotBuilder)> = None;

    for (line, result) in rdr.records().enumerate() {
        let row = line + 2;
        let record = result.map_err(|e| SimfolioError::Data {
            reason: format!("CSV parse error: {}", e),
        })?;

        let field = |idx: usize, name: &str| {
            record.get(idx).filter(|s| !s.is_empty()).ok_or_else(|| SimfolioError::Data {
                reason: format!("row {row}: missing {name} column"),
            })
        };

        let timestamp = parse_timestamp(field(0, "timestamp")?)?;
        let pair: PairKey = field(1, "pair")?
            .parse()
            .map_err(|reason| SimfolioError::Data {
                reason: format!("row {row}: {reason}"),
            })?;
        let price: Price = field(2, "price")?
            .parse()
            .map_err(|e| SimfolioError::Data {
                reason: format!("row {row}: invalid price: {e}"),
            })?;

        let mut builder = match current.take() {
            Some((ts, builder)) if ts == timestamp => builder,
            Some((ts, builder)) => {
                if timestamp < ts {
                    return Err(SimfolioError::Data {
                        reason: format!("row {row}: timestamp {timestamp} is before {ts}"),
                    });
                }
                snapshots.push(builder.build());
                MarketSnapshot::builder(timestamp)
            }
            None => MarketSnapshot::builder(timestamp),
        };

        if builder.has_price(&pair) {
            return Err(SimfolioError::Data {
                reason: format!("row {row}: duplicate price for {pair} at {timestamp}"),
            });
        }
        builder = builder.price(pair, price);
        for extra in record.iter().skip(3).filter(|s| !s.is_empty()) {
            let (key, value) = extra.split_once('=').ok_or_else(|| SimfolioError::Data {
                reason: format!("row {row}: metadata {extra:?} must be key=value"),
            })?;
            builder = builder.meta(key.trim(), MetaValue::parse(value));
        }
        current = Some((timestamp, builder));
    }

    if let Some((_, builder)) = current {
        snapshots.push(builder.build());
    }
    Ok(snapshots)
}
