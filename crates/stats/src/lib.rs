//! # Stats - 统计与技术指标
//!
//! 新闻情绪与股价收益的相关性分析所用的统计工具。
//!
//! ## 主要模块
//!
//! - `correlation`: Pearson / Spearman 相关系数与 p 值
//! - `describe`: 描述性统计
//! - `indicators`: 技术指标 (SMA、RSI) 与阈值信号

pub mod correlation;
pub mod describe;
pub mod indicators;
pub mod types;

pub use correlation::{drop_missing, pearson, spearman, MIN_OBSERVATIONS};
pub use describe::{describe, describe_optional};
pub use indicators::{rsi, sma, TechnicalAnalyzer, DEFAULT_RSI_WINDOW, DEFAULT_SMA_WINDOW};
pub use types::{CorrelationResult, RsiSignal, SeriesSummary, StatsError, StatsResult};
