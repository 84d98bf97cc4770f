//! 核心类型定义

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use stats::StatsError;
use std::path::PathBuf;
use thiserror::Error;

pub type ETLResult<T> = Result<T, ETLError>;

#[derive(Debug, Error)]
pub enum ETLError {
    #[error("数据未加载: {0}")]
    DataNotLoaded(&'static str),

    #[error("文件不存在: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("解析失败 {}:{}: {}", .path.display(), .line, .reason)]
    Parse {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("CSV 解析失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON 解析失败: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("样本不足: 至少需要 {required} 个有效观测, 实际 {actual} 个")]
    InsufficientData { required: usize, actual: usize },

    #[error("统计错误: {0}")]
    Stats(StatsError),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StatsError> for ETLError {
    fn from(err: StatsError) -> Self {
        match err {
            StatsError::InsufficientData { required, actual } => {
                ETLError::InsufficientData { required, actual }
            }
            other => ETLError::Stats(other),
        }
    }
}

/// 新闻标题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    /// 标题文本；源文件为空时为 `None`
    pub text: Option<String>,
    /// 发布时间（统一为 UTC）
    pub published_at: DateTime<Utc>,
    /// 股票代码
    pub symbol: String,
    pub publisher: Option<String>,
    pub url: Option<String>,
}

impl Headline {
    /// UTC 日历日期
    pub fn date(&self) -> NaiveDate {
        self.published_at.date_naive()
    }
}

/// 日线行情
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// 情感分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive, // > 0.1
    Neutral,  // -0.1 ~ 0.1
    Negative, // < -0.1
}

impl SentimentLabel {
    pub const POSITIVE_THRESHOLD: f64 = 0.1;
    pub const NEGATIVE_THRESHOLD: f64 = -0.1;

    pub fn from_score(score: f64) -> Self {
        match score {
            s if s > Self::POSITIVE_THRESHOLD => SentimentLabel::Positive,
            s if s < Self::NEGATIVE_THRESHOLD => SentimentLabel::Negative,
            _ => SentimentLabel::Neutral,
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SentimentLabel::Positive => write!(f, "positive"),
            SentimentLabel::Neutral => write!(f, "neutral"),
            SentimentLabel::Negative => write!(f, "negative"),
        }
    }
}

/// 已打分的新闻标题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredHeadline {
    pub headline: Headline,
    /// 情感分数 [-1.0, 1.0]
    pub score: f64,
}

/// 按日聚合的情感
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySentiment {
    pub date: NaiveDate,
    /// 全市场聚合时为 `None`
    pub symbol: Option<String>,
    pub mean_score: f64,
    /// 样本标准差；当天只有一条新闻时为 `None`
    pub std_score: Option<f64>,
    pub article_count: usize,
}

/// 情感与行情按日期对齐后的记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedRecord {
    pub date: NaiveDate,
    pub symbol: Option<String>,
    pub mean_score: f64,
    pub std_score: Option<f64>,
    pub article_count: usize,
    pub close: f64,
    /// 日收益率；序列第一天没有
    pub daily_return: Option<f64>,
}

/// 闭区间日期范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// 管道配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// 新闻 CSV 路径
    pub news_path: PathBuf,
    /// 行情目录，文件名为 `<SYMBOL>.<ext>`
    pub price_dir: PathBuf,
    /// 行情文件扩展名
    pub price_extension: String,
    pub rsi_window: usize,
    pub sma_window: usize,
}

impl PipelineConfig {
    /// 从 JSON 文件读取配置，缺省字段使用默认值
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> ETLResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ETLError::MissingFile(path.to_path_buf()));
        }

        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// 某个股票的行情文件路径
    pub fn price_path(&self, symbol: &str) -> PathBuf {
        self.price_dir
            .join(format!("{}.{}", symbol, self.price_extension))
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            news_path: PathBuf::from("data/raw_analyst_ratings.csv"),
            price_dir: PathBuf::from("data/Data"),
            price_extension: "csv".to_string(),
            rsi_window: stats::DEFAULT_RSI_WINDOW,
            sma_window: stats::DEFAULT_SMA_WINDOW,
        }
    }
}
