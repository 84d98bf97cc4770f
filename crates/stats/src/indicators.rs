//! 技术指标模块
//!
//! 简单移动平均 (SMA)、相对强弱指数 (RSI) 以及基于 RSI 阈值的信号。
//! 指标序列与输入等长，窗口不足的位置为 `None`。

use crate::types::{RsiSignal, StatsError, StatsResult};
use std::collections::BTreeMap;

/// RSI 默认窗口
pub const DEFAULT_RSI_WINDOW: usize = 14;

/// SMA 默认窗口
pub const DEFAULT_SMA_WINDOW: usize = 20;

/// 尾随简单移动平均，前 `window - 1` 个值为 `None`
pub fn sma(series: &[f64], window: usize) -> StatsResult<Vec<Option<f64>>> {
    if window == 0 {
        return Err(StatsError::InvalidWindow(window));
    }

    let mut out = vec![None; series.len()];
    if series.len() < window {
        return Ok(out);
    }

    for (i, w) in series.windows(window).enumerate() {
        out[i + window - 1] = Some(w.iter().sum::<f64>() / window as f64);
    }

    Ok(out)
}

/// 相对强弱指数
///
/// 涨跌来自相邻收盘价的简单差分，涨幅和跌幅（取绝对值）分别做 `window` 期尾随均值。
/// RSI = 100 - 100 / (1 + avg_gain / avg_loss)。
///
/// - 前 `window` 个值为 `None`（第一个差分不存在）
/// - avg_loss 为 0 且 avg_gain > 0 时为 `f64::INFINITY`
/// - avg_gain 与 avg_loss 都为 0（横盘）时无定义，为 `None`
pub fn rsi(series: &[f64], window: usize) -> StatsResult<Vec<Option<f64>>> {
    if window == 0 {
        return Err(StatsError::InvalidWindow(window));
    }

    let mut out = vec![None; series.len()];
    if series.len() <= window {
        return Ok(out);
    }

    let deltas: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();

    for (i, w) in deltas.windows(window).enumerate() {
        let avg_gain = w.iter().map(|d| d.max(0.0)).sum::<f64>() / window as f64;
        let avg_loss = w.iter().map(|d| (-d).max(0.0)).sum::<f64>() / window as f64;

        // deltas[k] 对应 series[k + 1]
        out[i + window] = rsi_value(avg_gain, avg_loss);
    }

    Ok(out)
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        if avg_gain > 0.0 {
            return Some(f64::INFINITY);
        }
        return None;
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - (100.0 / (1.0 + rs)))
}

/// 技术分析器
///
/// 持有收盘价序列，按名称缓存已计算的指标（`SMA_20`、`RSI` 等）。
#[derive(Debug, Clone)]
pub struct TechnicalAnalyzer {
    closes: Vec<f64>,
    indicators: BTreeMap<String, Vec<Option<f64>>>,
}

impl TechnicalAnalyzer {
    pub const RSI_KEY: &'static str = "RSI";

    pub fn new(closes: Vec<f64>) -> Self {
        Self {
            closes,
            indicators: BTreeMap::new(),
        }
    }

    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    /// 计算并缓存 SMA
    pub fn calculate_sma(&mut self, window: usize) -> StatsResult<&[Option<f64>]> {
        let values = sma(&self.closes, window)?;
        let key = format!("SMA_{}", window);
        tracing::debug!(window, points = values.len(), "computed {}", key);

        self.indicators.insert(key.clone(), values);
        Ok(self.indicators[&key].as_slice())
    }

    /// 计算并缓存 RSI
    pub fn calculate_rsi(&mut self, window: usize) -> StatsResult<&[Option<f64>]> {
        let values = rsi(&self.closes, window)?;
        tracing::debug!(window, points = values.len(), "computed RSI");

        self.indicators.insert(Self::RSI_KEY.to_string(), values);
        Ok(self.indicators[Self::RSI_KEY].as_slice())
    }

    pub fn indicator(&self, name: &str) -> Option<&[Option<f64>]> {
        self.indicators.get(name).map(Vec::as_slice)
    }

    /// 最新的 RSI 值；未计算或最后一个值无定义时为 `None`
    pub fn latest_rsi(&self) -> Option<f64> {
        self.indicators
            .get(Self::RSI_KEY)
            .and_then(|values| values.last().copied().flatten())
    }

    /// 基于最新 RSI 的信号；RSI 尚未计算时没有信号
    pub fn rsi_signal(&self) -> Option<RsiSignal> {
        self.latest_rsi().and_then(RsiSignal::from_rsi)
    }
}
