//! # ETL - 新闻情绪与股价收益
//!
//! 用于财经新闻情绪与股票日收益相关性分析的批处理管道
//!
//! ## 功能
//!
//! - 加载新闻 CSV 与按股票划分的行情 CSV
//! - 新闻标题情感打分
//! - 按日聚合情感
//! - 与行情按日期对齐
//! - Pearson / Spearman 相关性报告与技术指标

pub mod types;
pub mod loader;
pub mod sentiment;
pub mod aggregation;
pub mod alignment;
pub mod pipeline;

pub use pipeline::{
    AnalysisReport, CorrelationSummary, DataQuality, PipelineBuilder, SentimentPipeline,
    TechnicalSnapshot,
};
pub use sentiment::{LexiconModel, PolarityModel, ScoredBatch, ScoringError, SentimentScorer};
pub use types::{
    AlignedRecord, DailySentiment, DateRange, ETLError, ETLResult, Headline, PipelineConfig,
    PriceBar, ScoredHeadline, SentimentLabel,
};
