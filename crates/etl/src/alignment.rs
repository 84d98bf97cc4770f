//! 情感与行情的时间对齐

use crate::types::{AlignedRecord, DailySentiment, PriceBar};
use chrono::NaiveDate;
use std::collections::HashMap;

/// 日收益率 (close[t] - close[t-1]) / close[t-1]
///
/// 第一天没有收益率；前一天收盘价为 0 时同样没有。
pub fn daily_returns(bars: &[PriceBar]) -> Vec<Option<f64>> {
    let mut returns = Vec::with_capacity(bars.len());
    if bars.is_empty() {
        return returns;
    }

    returns.push(None);
    returns.extend(bars.windows(2).map(|w| {
        let prev = w[0].close;
        (prev != 0.0).then(|| (w[1].close - prev) / prev)
    }));

    returns
}

/// 按日期内连接
///
/// 收益率在连接之前基于完整行情序列计算。只保留两边都有的日期，按日期升序输出。
/// 行情中重复的日期以第一条为准。
pub fn align(daily: &[DailySentiment], bars: &[PriceBar]) -> Vec<AlignedRecord> {
    let returns = daily_returns(bars);

    let mut price_index: HashMap<NaiveDate, (f64, Option<f64>)> = HashMap::new();
    for (bar, ret) in bars.iter().zip(returns) {
        price_index.entry(bar.date).or_insert((bar.close, ret));
    }

    let mut aligned: Vec<AlignedRecord> = daily
        .iter()
        .filter_map(|d| {
            let &(close, daily_return) = price_index.get(&d.date)?;
            Some(AlignedRecord {
                date: d.date,
                symbol: d.symbol.clone(),
                mean_score: d.mean_score,
                std_score: d.std_score,
                article_count: d.article_count,
                close,
                daily_return,
            })
        })
        .collect();

    aligned.sort_by_key(|r| r.date);

    let dropped = daily.len() - aligned.len();
    if dropped > 0 {
        tracing::debug!(dropped, "Sentiment days without trading data were dropped");
    }
    tracing::info!(
        "Aligned {} sentiment days with {} price bars: {} records",
        daily.len(),
        bars.len(),
        aligned.len()
    );

    aligned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 3, day).unwrap()
    }

    fn bar(day: u32, close: f64) -> PriceBar {
        PriceBar {
            date: date(day),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000.0,
        }
    }

    fn sentiment(day: u32, mean: f64) -> DailySentiment {
        DailySentiment {
            date: date(day),
            symbol: Some("AAPL".to_string()),
            mean_score: mean,
            std_score: None,
            article_count: 1,
        }
    }

    #[test]
    fn test_daily_returns() {
        let returns = daily_returns(&[bar(1, 100.0), bar(2, 110.0), bar(3, 99.0)]);

        assert_eq!(returns.len(), 3);
        assert_eq!(returns[0], None);
        assert!((returns[1].unwrap() - 0.1).abs() < 1e-12);
        assert!((returns[2].unwrap() + 0.1).abs() < 1e-12);

        assert!(daily_returns(&[]).is_empty());
        assert_eq!(daily_returns(&[bar(1, 0.0), bar(2, 1.0)])[1], None);
    }

    #[test]
    fn test_inner_join_keeps_shared_dates() {
        // 情感: d1, d2, d3；行情: d2, d3, d4
        let daily = vec![sentiment(3, 0.3), sentiment(1, 0.1), sentiment(2, 0.2)];
        let bars = vec![bar(2, 100.0), bar(3, 105.0), bar(4, 102.0)];

        let aligned = align(&daily, &bars);

        let dates: Vec<NaiveDate> = aligned.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date(2), date(3)]);

        // 收益率在连接前计算: d2 是行情第一天
        assert_eq!(aligned[0].daily_return, None);
        assert!((aligned[1].daily_return.unwrap() - 0.05).abs() < 1e-12);
        assert_eq!(aligned[1].close, 105.0);
        assert_eq!(aligned[1].mean_score, 0.3);
    }

    #[test]
    fn test_returns_use_full_price_series() {
        // d2 没有新闻，但 d3 的收益率仍相对 d2 计算
        let daily = vec![sentiment(3, 0.3)];
        let bars = vec![bar(1, 100.0), bar(2, 200.0), bar(3, 220.0)];

        let aligned = align(&daily, &bars);
        assert_eq!(aligned.len(), 1);
        assert!((aligned[0].daily_return.unwrap() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_join_is_idempotent() {
        let daily = vec![sentiment(1, 0.1), sentiment(2, 0.2)];
        let bars = vec![bar(1, 100.0), bar(2, 101.0)];
        assert_eq!(align(&daily, &bars), align(&daily, &bars));
    }

    #[test]
    fn test_no_overlap() {
        let aligned = align(&[sentiment(1, 0.1)], &[bar(5, 100.0)]);
        assert!(aligned.is_empty());
    }
}
