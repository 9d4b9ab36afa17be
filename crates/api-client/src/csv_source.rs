use crate::error::ApiError;
use crate::period::Period;
use crate::source::{start_of_day, MarketDataSource};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use core_types::Kline;
use rust_decimal::Decimal;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, instrument};

/// Reads `<directory>/<SYMBOL>.csv` files exported from a charting tool or
/// a previous download.
#[derive(Debug, Clone)]
pub struct CsvSource {
    directory: PathBuf,
}

impl CsvSource {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

#[async_trait]
impl MarketDataSource for CsvSource {
    #[instrument(skip(self))]
    async fn fetch_history(&self, symbol: &str, period: Period) -> Result<Vec<Kline>, ApiError> {
        load_csv_for_period(&self.directory.join(format!("{symbol}.csv")), period)
    }
}

/// [`load_csv`] followed by a cut to the trailing `period`, measured back
/// from the file's last bar.
pub fn load_csv_for_period(path: &Path, period: Period) -> Result<Vec<Kline>, ApiError> {
    Ok(trim_to_period(load_csv(path)?, period))
}

/// Loads a `Date,Open,High,Low,Close[,Adj Close],Volume` file.
pub fn load_csv(path: &Path) -> Result<Vec<Kline>, ApiError> {
    let file = std::fs::File::open(path)?;
    let klines = read_csv(file)?;
    debug!(path = %path.display(), bars = klines.len(), "Loaded CSV history");
    Ok(klines)
}

/// Parses CSV price history from any reader.
///
/// Columns are matched by header name, case-insensitively, so their order
/// does not matter. Rows with an empty or `null` field are skipped. The result
/// is sorted by date.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<Kline>, ApiError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| ApiError::InvalidData(format!("missing column '{name}'")))
    };
    let date = column("date").or_else(|_| column("timestamp"))?;
    let cols = [column("open")?, column("high")?, column("low")?, column("close")?, column("volume")?];

    let mut klines = Vec::new();
    for record in reader.records() {
        let record = record?;
        let fields: Option<Vec<&str>> = cols
            .iter()
            .map(|i| record.get(*i).filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("null")))
            .collect();
        let (Some(raw_date), Some(fields)) = (record.get(date), fields) else {
            continue;
        };

        let values = fields
            .iter()
            .map(|v| parse_decimal(v))
            .collect::<Result<Vec<Decimal>, ApiError>>()?;
        klines.push(Kline {
            timestamp: parse_date(raw_date)?,
            open: values[0],
            high: values[1],
            low: values[2],
            close: values[3],
            volume: values[4],
        });
    }
    klines.sort_by_key(|k| k.timestamp);
    Ok(klines)
}

fn parse_decimal(value: &str) -> Result<Decimal, ApiError> {
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .map_err(|_| ApiError::InvalidData(format!("not a number: '{value}'")))
}

/// Accepts RFC 3339 timestamps and anything starting with `YYYY-MM-DD`.
fn parse_date(value: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(start_of_day(ts.with_timezone(&Utc)));
    }
    value
        .get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc())
        .ok_or_else(|| ApiError::InvalidData(format!("unrecognised date '{value}'")))
}

fn trim_to_period(klines: Vec<Kline>, period: Period) -> Vec<Kline> {
    let cutoff = match (period.days(), klines.last()) {
        (Some(days), Some(last)) => last.timestamp - Duration::days(days),
        _ => return klines,
    };
    klines.into_iter().filter(|k| k.timestamp >= cutoff).collect()
}
