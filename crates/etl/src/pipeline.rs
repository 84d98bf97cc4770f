//! 新闻情绪与收益率相关性分析管道
//!
//! 每个阶段都是独立的方法，输入上一阶段的输出、返回本阶段的结果，不在管道内部保存中间状态:
//!
//! 加载 -> 打分 -> 按日聚合 -> 对齐 -> 相关性 -> 报告
//!
//! `analyze` / `run` 只是按顺序依次调用这些阶段。

use crate::aggregation::{aggregate_daily, SymbolFilter};
use crate::alignment;
use crate::loader;
use crate::sentiment::{LexiconModel, PolarityModel, ScoredBatch, SentimentScorer};
use crate::types::{
    AlignedRecord, DailySentiment, DateRange, ETLError, ETLResult, Headline, PipelineConfig,
    PriceBar,
};
use serde::Serialize;
use stats::{CorrelationResult, RsiSignal, SeriesSummary, TechnicalAnalyzer};
use std::path::PathBuf;

/// 相关性汇总
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationSummary {
    pub pearson: CorrelationResult,
    pub spearman: CorrelationResult,
    /// 对齐后的记录数（剔除缺失值之前）
    pub sample_size: usize,
    pub date_range: DateRange,
}

/// 数据质量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataQuality {
    pub merged_records: usize,
    pub news_articles: usize,
    pub price_days: usize,
}

/// 分析报告
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub symbol: String,
    pub correlation_summary: CorrelationSummary,
    /// 对齐记录中日均情感的描述性统计
    pub sentiment_stats: Option<SeriesSummary>,
    /// 对齐记录中日收益率的描述性统计
    pub return_stats: Option<SeriesSummary>,
    pub data_quality: DataQuality,
    /// 打分失败（以 0.0 代替）的新闻条数
    pub scoring_failures: usize,
}

/// 技术指标快照（独立于相关性分析）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnicalSnapshot {
    pub sma_window: usize,
    pub sma_latest: Option<f64>,
    pub rsi_window: usize,
    pub rsi_latest: Option<f64>,
    pub rsi_signal: Option<RsiSignal>,
}

/// 分析管道
pub struct SentimentPipeline<M = LexiconModel> {
    config: PipelineConfig,
    scorer: SentimentScorer<M>,
}

impl SentimentPipeline<LexiconModel> {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            scorer: SentimentScorer::new(),
        }
    }
}

impl<M: PolarityModel> SentimentPipeline<M> {
    /// 使用自定义的极性模型
    pub fn with_scorer(config: PipelineConfig, scorer: SentimentScorer<M>) -> Self {
        Self { config, scorer }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn scorer(&self) -> &SentimentScorer<M> {
        &self.scorer
    }

    /// 加载配置中的新闻文件
    pub fn load_news(&self) -> ETLResult<Vec<Headline>> {
        loader::load_news(&self.config.news_path)
    }

    /// 加载某个股票的行情
    pub fn load_prices(&self, symbol: &str) -> ETLResult<Vec<PriceBar>> {
        loader::load_price_file(self.config.price_path(symbol))
    }

    /// 给每条新闻打分
    pub fn score(&self, news: &[Headline]) -> ETLResult<ScoredBatch> {
        if news.is_empty() {
            return Err(ETLError::DataNotLoaded("news"));
        }

        Ok(self.scorer.score_batch(news))
    }

    /// 某个股票的按日情感
    pub fn aggregate(&self, batch: &ScoredBatch, symbol: &str) -> Vec<DailySentiment> {
        aggregate_daily(&batch.scored, &SymbolFilter::only(symbol))
    }

    /// 与行情按日期对齐
    pub fn align(
        &self,
        daily: &[DailySentiment],
        bars: &[PriceBar],
    ) -> ETLResult<Vec<AlignedRecord>> {
        if bars.is_empty() {
            return Err(ETLError::DataNotLoaded("prices"));
        }

        Ok(alignment::align(daily, bars))
    }

    /// 计算 Pearson / Spearman 相关性
    ///
    /// 两种相关性各自剔除缺失值后计算，少于 2 个对齐记录时返回 `InsufficientData`。
    pub fn correlate(&self, aligned: &[AlignedRecord]) -> ETLResult<CorrelationSummary> {
        if aligned.len() < stats::MIN_OBSERVATIONS {
            return Err(ETLError::InsufficientData {
                required: stats::MIN_OBSERVATIONS,
                actual: aligned.len(),
            });
        }

        let scores: Vec<Option<f64>> = aligned.iter().map(|r| Some(r.mean_score)).collect();
        let returns: Vec<Option<f64>> = aligned.iter().map(|r| r.daily_return).collect();

        let pearson = {
            let (x, y) = stats::drop_missing(&scores, &returns)?;
            stats::pearson(&x, &y)?
        };

        let spearman = {
            let (x, y) = stats::drop_missing(&scores, &returns)?;
            stats::spearman(&x, &y)?
        };

        let date_range = date_range(aligned).ok_or(ETLError::InsufficientData {
            required: stats::MIN_OBSERVATIONS,
            actual: 0,
        })?;

        tracing::info!(
            pearson = pearson.coefficient,
            pearson_p = pearson.p_value,
            spearman = spearman.coefficient,
            spearman_p = spearman.p_value,
            sample_size = aligned.len(),
            "Correlation computed for {}",
            date_range
        );

        Ok(CorrelationSummary {
            pearson,
            spearman,
            sample_size: aligned.len(),
            date_range,
        })
    }

    /// 汇总报告
    pub fn report(
        &self,
        symbol: &str,
        news: &[Headline],
        bars: &[PriceBar],
        batch: &ScoredBatch,
        aligned: &[AlignedRecord],
        correlation_summary: CorrelationSummary,
    ) -> AnalysisReport {
        let scores: Vec<f64> = aligned.iter().map(|r| r.mean_score).collect();
        let returns: Vec<Option<f64>> = aligned.iter().map(|r| r.daily_return).collect();

        AnalysisReport {
            symbol: symbol.to_string(),
            correlation_summary,
            sentiment_stats: stats::describe(&scores),
            return_stats: stats::describe_optional(&returns),
            data_quality: DataQuality {
                merged_records: aligned.len(),
                news_articles: news.len(),
                price_days: bars.len(),
            },
            scoring_failures: batch.failures,
        }
    }

    /// 对内存中的数据依次执行所有阶段
    pub fn analyze(
        &self,
        symbol: &str,
        news: &[Headline],
        bars: &[PriceBar],
    ) -> ETLResult<AnalysisReport> {
        tracing::info!(
            "Running sentiment correlation for {} ({} headlines, {} price bars)",
            symbol,
            news.len(),
            bars.len()
        );

        let batch = self.score(news)?;
        let daily = self.aggregate(&batch, symbol);
        let aligned = self.align(&daily, bars)?;
        let summary = self.correlate(&aligned)?;

        Ok(self.report(symbol, news, bars, &batch, &aligned, summary))
    }

    /// 从配置的文件加载数据并执行完整分析
    pub fn run(&self, symbol: &str) -> ETLResult<AnalysisReport> {
        let news = self.load_news()?;
        let bars = self.load_prices(symbol)?;

        self.analyze(symbol, &news, &bars)
    }

    /// 基于收盘价的 SMA / RSI 及 RSI 信号
    pub fn technicals(&self, bars: &[PriceBar]) -> ETLResult<TechnicalSnapshot> {
        if bars.is_empty() {
            return Err(ETLError::DataNotLoaded("prices"));
        }

        let closes = bars.iter().map(|b| b.close).collect();
        let mut analyzer = TechnicalAnalyzer::new(closes);

        let sma_latest = analyzer
            .calculate_sma(self.config.sma_window)?
            .last()
            .copied()
            .flatten();
        analyzer.calculate_rsi(self.config.rsi_window)?;

        Ok(TechnicalSnapshot {
            sma_window: self.config.sma_window,
            sma_latest,
            rsi_window: self.config.rsi_window,
            rsi_latest: analyzer.latest_rsi(),
            rsi_signal: analyzer.rsi_signal(),
        })
    }
}

fn date_range(aligned: &[AlignedRecord]) -> Option<DateRange> {
    let start = aligned.iter().map(|r| r.date).min()?;
    let end = aligned.iter().map(|r| r.date).max()?;
    Some(DateRange { start, end })
}

/// 管道构建器
pub struct PipelineBuilder {
    config: PipelineConfig,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_news_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.news_path = path.into();
        self
    }

    pub fn with_price_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.price_dir = dir.into();
        self
    }

    pub fn with_price_extension(mut self, extension: impl Into<String>) -> Self {
        self.config.price_extension = extension.into();
        self
    }

    pub fn with_rsi_window(mut self, window: usize) -> Self {
        self.config.rsi_window = window;
        self
    }

    pub fn with_sma_window(mut self, window: usize) -> Self {
        self.config.sma_window = window;
        self
    }

    pub fn build(self) -> SentimentPipeline {
        SentimentPipeline::new(self.config)
    }

    pub fn build_with_model<M: PolarityModel>(self, model: M) -> SentimentPipeline<M> {
        SentimentPipeline::with_scorer(self.config, SentimentScorer::with_model(model))
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
