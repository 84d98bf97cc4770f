//! CSV 数据加载
//!
//! 新闻文件至少包含 `headline`、`date`、`stock` 列；行情文件为 `<SYMBOL>.<ext>`，
//! 包含 `Date, Open, High, Low, Close, Volume` 列。多余的列会被忽略。

use crate::types::{ETLError, ETLResult, Headline, PriceBar};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::StringRecord;
use serde::Deserialize;
use std::path::Path;

/// 带时区偏移的时间格式
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%z",
];

/// 不带时区的时间格式，按 UTC 处理
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

#[derive(Debug, Deserialize)]
struct RawHeadline {
    headline: Option<String>,
    date: String,
    stock: String,
    #[serde(default)]
    publisher: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPriceBar {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "Volume")]
    volume: f64,
}

/// 解析混合格式的时间戳并统一为 UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.and_utc());
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    None
}

/// 解析行情日期
///
/// 带偏移的时间取当地日期，而不是换算到 UTC 之后的日期。
pub fn parse_trading_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local().date());
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.naive_local().date());
        }
    }

    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
}

/// 加载新闻 CSV
pub fn load_news(path: impl AsRef<Path>) -> ETLResult<Vec<Headline>> {
    let path = path.as_ref();
    let mut reader = open_csv(path)?;
    let headers = reader.headers()?.clone();

    let mut headlines = Vec::new();
    let mut record = StringRecord::new();

    while reader.read_record(&mut record)? {
        let line = line_of(&record);
        let raw: RawHeadline = record
            .deserialize(Some(&headers))
            .map_err(|e| parse_error(path, line, e.to_string()))?;

        let published_at = parse_timestamp(&raw.date).ok_or_else(|| {
            parse_error(path, line, format!("无法识别的时间格式: {:?}", raw.date))
        })?;

        headlines.push(Headline {
            text: raw.headline,
            published_at,
            symbol: raw.stock.trim().to_string(),
            publisher: raw.publisher,
            url: raw.url,
        });
    }

    tracing::info!("Loaded {} headlines from {}", headlines.len(), path.display());
    Ok(headlines)
}

/// 加载某个股票的行情，按日期升序返回
pub fn load_prices(
    symbol: &str,
    data_dir: impl AsRef<Path>,
    extension: &str,
) -> ETLResult<Vec<PriceBar>> {
    let path = data_dir
        .as_ref()
        .join(format!("{}.{}", symbol, extension));
    load_price_file(&path)
}

/// 加载单个行情文件，按日期升序返回
pub fn load_price_file(path: impl AsRef<Path>) -> ETLResult<Vec<PriceBar>> {
    let path = path.as_ref();
    let mut reader = open_csv(path)?;
    let headers = reader.headers()?.clone();

    let mut bars = Vec::new();
    let mut record = StringRecord::new();

    while reader.read_record(&mut record)? {
        let line = line_of(&record);
        let raw: RawPriceBar = record
            .deserialize(Some(&headers))
            .map_err(|e| parse_error(path, line, e.to_string()))?;

        let date = parse_trading_date(&raw.date).ok_or_else(|| {
            parse_error(path, line, format!("无法识别的日期格式: {:?}", raw.date))
        })?;

        bars.push(PriceBar {
            date,
            open: raw.open,
            high: raw.high,
            low: raw.low,
            close: raw.close,
            volume: raw.volume,
        });
    }

    // 稳定排序，同一天保留文件中的先后顺序
    bars.sort_by_key(|bar| bar.date);

    tracing::debug!("Loaded {} price bars from {}", bars.len(), path.display());
    Ok(bars)
}

fn open_csv(path: &Path) -> ETLResult<csv::Reader<std::fs::File>> {
    if !path.is_file() {
        return Err(ETLError::MissingFile(path.to_path_buf()));
    }

    Ok(csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_path(path)?)
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or_default()
}

fn parse_error(path: &Path, line: u64, reason: String) -> ETLError {
    ETLError::Parse {
        path: path.to_path_buf(),
        line,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_parse_mixed_timestamps() {
        let dt = parse_timestamp("2020-06-05 10:30:54-04:00").unwrap();
        assert_eq!((dt.day(), dt.hour(), dt.minute()), (5, 14, 30));

        // 跨日: 当地时间 22:00 -04:00 是 UTC 次日 02:00
        let dt = parse_timestamp("2020-06-05 22:00:00-04:00").unwrap();
        assert_eq!(dt.date_naive(), NaiveDate::from_ymd_opt(2020, 6, 6).unwrap());

        let dt = parse_timestamp("2020-05-22 00:00:00").unwrap();
        assert_eq!(dt.date_naive(), NaiveDate::from_ymd_opt(2020, 5, 22).unwrap());

        assert!(parse_timestamp("2011-04-27T21:01:48Z").is_some());
        assert!(parse_timestamp("2023-01-01").is_some());
        assert!(parse_timestamp("01/02/2023 11:00").is_some());
        assert!(parse_timestamp("not a date").is_none());
    }

    #[test]
    fn test_parse_trading_date_keeps_local_date() {
        let date = parse_trading_date("2020-06-05 22:00:00-04:00").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2020, 6, 5).unwrap());
        assert_eq!(
            parse_trading_date("2023-01-02").unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()
        );
    }

    #[test]
    fn test_load_news_structure() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "news.csv",
            ",headline,url,publisher,date,stock\n\
             0,Test Headline 1,http://a,Test Pub,2023-01-01 10:00:00,AAPL\n\
             1,,http://b,Test Pub,2023-01-02 11:00:00-04:00,GOOGL\n",
        );

        let news = load_news(&path).unwrap();

        assert_eq!(news.len(), 2);
        assert_eq!(news[0].text.as_deref(), Some("Test Headline 1"));
        assert_eq!(news[0].symbol, "AAPL");
        assert_eq!(news[0].publisher.as_deref(), Some("Test Pub"));
        assert_eq!(news[1].text, None);
        assert_eq!(news[1].published_at.hour(), 15);
    }

    #[test]
    fn test_load_news_bad_date() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "news.csv",
            "headline,date,stock,publisher\nok,2023-01-01,AAPL,P\nbad,yesterday,AAPL,P\n",
        );

        match load_news(&path).unwrap_err() {
            ETLError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_prices_sorted() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "AAPL.csv",
            "Date,Open,High,Low,Close,Adj Close,Volume\n\
             2023-01-03,153.0,157.0,152.0,155.0,155.0,1200000\n\
             2023-01-02,148.0,152.0,147.0,150.0,150.0,1000000\n",
        );

        let bars = load_prices("AAPL", dir.path(), "csv").unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2023, 1, 2).unwrap());
        assert_eq!(bars[0].close, 150.0);
        assert_eq!(bars[1].volume, 1_200_000.0);
    }

    #[test]
    fn test_missing_price_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_prices("MSFT", dir.path(), "csv").unwrap_err();
        match err {
            ETLError::MissingFile(path) => assert!(path.ends_with("MSFT.csv")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
