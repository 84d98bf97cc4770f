//! 按日聚合情感

use crate::types::{DailySentiment, ScoredHeadline};
use chrono::NaiveDate;
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// 聚合结果保留的小数位
const DECIMALS: i32 = 4;

/// 按股票过滤
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolFilter {
    All,
    Only(String),
}

impl SymbolFilter {
    pub fn only(symbol: impl Into<String>) -> Self {
        SymbolFilter::Only(symbol.into())
    }

    fn matches(&self, symbol: &str) -> bool {
        match self {
            SymbolFilter::All => true,
            SymbolFilter::Only(s) => s == symbol,
        }
    }
}

/// 按 (日期, 股票) 分组，输出均值、样本标准差和条数
///
/// 输出按 (日期, 股票) 升序。
pub fn aggregate_daily(scored: &[ScoredHeadline], filter: &SymbolFilter) -> Vec<DailySentiment> {
    let mut groups: BTreeMap<(NaiveDate, &str), Vec<f64>> = BTreeMap::new();

    for item in scored
        .iter()
        .filter(|s| filter.matches(&s.headline.symbol))
    {
        groups
            .entry((item.headline.date(), item.headline.symbol.as_str()))
            .or_default()
            .push(item.score);
    }

    let daily: Vec<DailySentiment> = groups
        .into_iter()
        .map(|((date, symbol), scores)| summarize(date, Some(symbol.to_string()), &scores))
        .collect();

    tracing::info!(
        filter = ?filter,
        headlines = scored.len(),
        days = daily.len(),
        "Aggregated daily sentiment"
    );
    daily
}

/// 全市场按日聚合（所有股票合并）
pub fn aggregate_market_daily(scored: &[ScoredHeadline]) -> Vec<DailySentiment> {
    let mut groups: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();

    for item in scored {
        groups.entry(item.headline.date()).or_default().push(item.score);
    }

    groups
        .into_iter()
        .map(|(date, scores)| summarize(date, None, &scores))
        .collect()
}

fn summarize(date: NaiveDate, symbol: Option<String>, scores: &[f64]) -> DailySentiment {
    let mean = scores.iter().mean();
    // 样本标准差 (ddof = 1)，单条新闻时无定义
    let std = (scores.len() > 1).then(|| round(scores.iter().std_dev()));

    DailySentiment {
        date,
        symbol,
        mean_score: round(mean),
        std_score: std,
        article_count: scores.len(),
    }
}

fn round(value: f64) -> f64 {
    let factor = 10f64.powi(DECIMALS);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Headline;
    use chrono::{TimeZone, Utc};

    fn scored(symbol: &str, day: u32, hour: u32, score: f64) -> ScoredHeadline {
        ScoredHeadline {
            headline: Headline {
                text: Some(format!("{symbol} headline")),
                published_at: Utc.with_ymd_and_hms(2023, 1, day, hour, 0, 0).unwrap(),
                symbol: symbol.to_string(),
                publisher: None,
                url: None,
            },
            score,
        }
    }

    fn fixture() -> Vec<ScoredHeadline> {
        vec![
            scored("AAPL", 2, 9, 0.5),
            scored("AAPL", 2, 17, 0.1),
            scored("GOOGL", 2, 10, -0.3),
            scored("AAPL", 3, 12, 0.25),
            scored("AAPL", 2, 23, 0.0),
        ]
    }

    #[test]
    fn test_groups_by_date_and_symbol() {
        let daily = aggregate_daily(&fixture(), &SymbolFilter::All);

        assert_eq!(daily.len(), 3);
        assert_eq!(daily[0].symbol.as_deref(), Some("AAPL"));
        assert_eq!(daily[0].article_count, 3);
        assert!((daily[0].mean_score - 0.2).abs() < 1e-12);
        // std([0.5, 0.1, 0.0], ddof=1) = 0.264575...
        assert_eq!(daily[0].std_score, Some(0.2646));

        assert_eq!(daily[1].symbol.as_deref(), Some("GOOGL"));
        assert_eq!(daily[1].std_score, None);
    }

    #[test]
    fn test_symbol_filter() {
        let daily = aggregate_daily(&fixture(), &SymbolFilter::only("AAPL"));

        assert_eq!(daily.len(), 2);
        assert!(daily.iter().all(|d| d.symbol.as_deref() == Some("AAPL")));
        assert_eq!(daily[1].date, NaiveDate::from_ymd_opt(2023, 1, 3).unwrap());
        assert_eq!(daily[1].article_count, 1);
        assert_eq!(daily[1].std_score, None);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let headlines = fixture();
        let first = aggregate_daily(&headlines, &SymbolFilter::All);
        let second = aggregate_daily(&headlines, &SymbolFilter::All);
        assert_eq!(first, second);
    }

    #[test]
    fn test_market_daily() {
        let daily = aggregate_market_daily(&fixture());

        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].symbol, None);
        assert_eq!(daily[0].article_count, 4);
        assert!((daily[0].mean_score - 0.075).abs() < 1e-12);
    }

    #[test]
    fn test_rounding() {
        let daily = aggregate_daily(
            &[scored("AAPL", 4, 9, 0.123456), scored("AAPL", 4, 10, 0.0)],
            &SymbolFilter::All,
        );
        assert_eq!(daily[0].mean_score, 0.0617);
    }
}
