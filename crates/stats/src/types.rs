//! 核心类型定义

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type StatsResult<T> = Result<T, StatsError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatsError {
    #[error("样本不足: 至少需要 {required} 个有效观测, 实际 {actual} 个")]
    InsufficientData { required: usize, actual: usize },

    #[error("序列长度不匹配: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("序列方差为零, 相关系数无定义")]
    ConstantInput,

    #[error("无效的窗口: {0}")]
    InvalidWindow(usize),

    #[error("分布错误: {0}")]
    Distribution(String),
}

/// 相关系数及其双侧 p 值
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    /// 相关系数 [-1.0, 1.0]
    pub coefficient: f64,
    /// 双侧 p 值
    pub p_value: f64,
    /// 实际参与计算的成对观测数
    pub observations: usize,
}

/// 描述性统计（count / mean / std / min / 四分位 / max）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub count: usize,
    pub mean: f64,
    /// 样本标准差 (ddof = 1)，单个样本时为 NaN
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// RSI 阈值信号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RsiSignal {
    /// 超卖 (RSI < 30)
    Oversold,
    /// 中性
    Neutral,
    /// 超买 (RSI > 70)
    Overbought,
}

impl RsiSignal {
    pub const OVERSOLD_LEVEL: f64 = 30.0;
    pub const OVERBOUGHT_LEVEL: f64 = 70.0;

    /// 从 RSI 值转换为信号
    ///
    /// RSI 先被截断到 [0, 100]，因此 +∞（无下跌）视为 100。
    /// NaN 没有信号。
    pub fn from_rsi(rsi: f64) -> Option<Self> {
        if rsi.is_nan() {
            return None;
        }

        let rsi = rsi.clamp(0.0, 100.0);
        let signal = match rsi {
            r if r < Self::OVERSOLD_LEVEL => RsiSignal::Oversold,
            r if r > Self::OVERBOUGHT_LEVEL => RsiSignal::Overbought,
            _ => RsiSignal::Neutral,
        };

        Some(signal)
    }
}

impl std::fmt::Display for RsiSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RsiSignal::Oversold => write!(f, "OVERSOLD"),
            RsiSignal::Neutral => write!(f, "NEUTRAL"),
            RsiSignal::Overbought => write!(f, "OVERBOUGHT"),
        }
    }
}
