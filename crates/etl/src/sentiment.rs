//! 情感分析模块

use crate::types::{Headline, ScoredHeadline, SentimentLabel};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// 单条文本打分失败
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScoringError {
    #[error("模型返回非有限值: {0}")]
    NonFinite(f64),

    #[error("模型错误: {0}")]
    Model(String),
}

/// 极性模型: 文本 -> [-1.0, 1.0]
pub trait PolarityModel {
    fn polarity(&self, text: &str) -> Result<f64, ScoringError>;
}

/// 修饰词对后面多少个词内的情感词生效
const MODIFIER_REACH: usize = 3;

/// 否定词把极性乘以 -0.5
const NEGATION_FACTOR: f64 = -0.5;

/// 基于词典的极性模型
///
/// 分数为命中情感词极性的平均值。情感词前面 3 个词以内的程度副词
/// 按系数放大或缩小，否定词翻转并减半。没有命中时为 0.0。
pub struct LexiconModel {
    polarity_words: HashMap<String, f64>,
    intensifiers: HashMap<String, f64>,
    negations: HashSet<String>,
    token_pattern: Regex,
}

impl LexiconModel {
    pub fn new() -> Self {
        let mut model = Self {
            polarity_words: HashMap::new(),
            intensifiers: HashMap::new(),
            negations: HashSet::new(),
            token_pattern: Regex::new(r"[a-z]+(?:'[a-z]+)?").expect("static token pattern"),
        };

        model.initialize_dictionaries();
        model
    }

    fn initialize_dictionaries(&mut self) {
        // 正面词汇（财经新闻）
        let positive_words = [
            ("surge", 0.6),
            ("surges", 0.6),
            ("surged", 0.6),
            ("surging", 0.6),
            ("soar", 0.7),
            ("soars", 0.7),
            ("soared", 0.7),
            ("rally", 0.6),
            ("rallies", 0.6),
            ("rallied", 0.6),
            ("jump", 0.4),
            ("jumps", 0.4),
            ("jumped", 0.4),
            ("gain", 0.4),
            ("gains", 0.4),
            ("gained", 0.4),
            ("rise", 0.3),
            ("rises", 0.3),
            ("rose", 0.3),
            ("climb", 0.3),
            ("climbs", 0.3),
            ("beat", 0.5),
            ("beats", 0.5),
            ("upgrade", 0.5),
            ("upgrades", 0.5),
            ("upgraded", 0.5),
            ("outperform", 0.5),
            ("outperforms", 0.5),
            ("bullish", 0.7),
            ("profit", 0.4),
            ("profits", 0.4),
            ("profitable", 0.5),
            ("growth", 0.4),
            ("record", 0.3),
            ("high", 0.16),
            ("higher", 0.25),
            ("strong", 0.43),
            ("stronger", 0.5),
            ("positive", 0.23),
            ("good", 0.7),
            ("great", 0.8),
            ("best", 1.0),
            ("excellent", 1.0),
            ("success", 0.6),
            ("successful", 0.75),
            ("breakthrough", 0.6),
            ("buy", 0.2),
            ("top", 0.5),
            ("boost", 0.4),
            ("boosts", 0.4),
            ("win", 0.8),
            ("wins", 0.8),
            ("optimistic", 0.6),
            ("raises", 0.3),
            ("raised", 0.3),
        ];

        // 负面词汇
        let negative_words = [
            ("plunge", -0.7),
            ("plunges", -0.7),
            ("plunged", -0.7),
            ("crash", -0.8),
            ("crashes", -0.8),
            ("crashed", -0.8),
            ("tumble", -0.6),
            ("tumbles", -0.6),
            ("tumbled", -0.6),
            ("drop", -0.4),
            ("drops", -0.4),
            ("dropped", -0.4),
            ("fall", -0.4),
            ("falls", -0.4),
            ("fell", -0.4),
            ("slump", -0.6),
            ("slumps", -0.6),
            ("decline", -0.4),
            ("declines", -0.4),
            ("declined", -0.4),
            ("loss", -0.5),
            ("losses", -0.5),
            ("miss", -0.4),
            ("misses", -0.4),
            ("missed", -0.4),
            ("downgrade", -0.5),
            ("downgrades", -0.5),
            ("downgraded", -0.5),
            ("underperform", -0.5),
            ("bearish", -0.7),
            ("weak", -0.375),
            ("weaker", -0.45),
            ("low", -0.2),
            ("lower", -0.25),
            ("negative", -0.3),
            ("bad", -0.7),
            ("worst", -1.0),
            ("terrible", -1.0),
            ("fraud", -0.9),
            ("lawsuit", -0.5),
            ("risk", -0.2),
            ("concern", -0.3),
            ("concerns", -0.3),
            ("warning", -0.4),
            ("warns", -0.4),
            ("crisis", -0.7),
            ("panic", -0.7),
            ("fear", -0.5),
            ("fears", -0.5),
            ("sell", -0.2),
            ("cut", -0.3),
            ("cuts", -0.3),
            ("layoffs", -0.5),
            ("bankruptcy", -0.9),
            ("volatile", -0.2),
        ];

        let intensifiers = [
            ("very", 1.3),
            ("really", 1.3),
            ("extremely", 1.5),
            ("highly", 1.3),
            ("sharply", 1.4),
            ("significantly", 1.3),
            ("most", 1.2),
            ("slightly", 0.6),
            ("somewhat", 0.8),
        ];

        let negations = [
            "not", "no", "never", "without", "don't", "doesn't", "isn't", "won't", "can't",
            "didn't", "aren't", "wasn't",
        ];

        for (word, score) in positive_words.into_iter().chain(negative_words) {
            self.polarity_words.insert(word.to_string(), score);
        }

        for (word, factor) in intensifiers {
            self.intensifiers.insert(word.to_string(), factor);
        }

        self.negations = negations.iter().map(|w| w.to_string()).collect();
    }
}

impl PolarityModel for LexiconModel {
    fn polarity(&self, text: &str) -> Result<f64, ScoringError> {
        let text = text.to_lowercase();

        let mut matched = Vec::new();
        let mut intensity = 1.0;
        let mut negated = false;
        let mut since_modifier = 0usize;

        for token in self.token_pattern.find_iter(&text).map(|m| m.as_str()) {
            if self.negations.contains(token) {
                negated = true;
                since_modifier = 0;
                continue;
            }

            if let Some(&factor) = self.intensifiers.get(token) {
                intensity *= factor;
                since_modifier = 0;
                continue;
            }

            if let Some(&score) = self.polarity_words.get(token) {
                let mut value = score * intensity;
                if negated {
                    value *= NEGATION_FACTOR;
                }
                matched.push(value.clamp(-1.0, 1.0));

                intensity = 1.0;
                negated = false;
                since_modifier = 0;
                continue;
            }

            since_modifier += 1;
            if since_modifier >= MODIFIER_REACH {
                intensity = 1.0;
                negated = false;
            }
        }

        if matched.is_empty() {
            return Ok(0.0);
        }

        Ok(matched.iter().sum::<f64>() / matched.len() as f64)
    }
}

impl Default for LexiconModel {
    fn default() -> Self {
        Self::new()
    }
}

/// 批量打分结果
#[derive(Debug, Clone, Default)]
pub struct ScoredBatch {
    pub scored: Vec<ScoredHeadline>,
    /// 打分失败（以 0.0 代替）的条数
    pub failures: usize,
}

/// 情感打分器
///
/// 打分永远不会返回错误: 缺失文本为 0.0，模型失败记录日志后也以 0.0 代替。
pub struct SentimentScorer<M = LexiconModel> {
    model: M,
}

impl SentimentScorer<LexiconModel> {
    pub fn new() -> Self {
        Self {
            model: LexiconModel::new(),
        }
    }
}

impl Default for SentimentScorer<LexiconModel> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: PolarityModel> SentimentScorer<M> {
    pub fn with_model(model: M) -> Self {
        Self { model }
    }

    fn try_score(&self, text: Option<&str>) -> Result<f64, ScoringError> {
        let Some(text) = text else {
            return Ok(0.0);
        };

        let polarity = self.model.polarity(text)?;
        if !polarity.is_finite() {
            return Err(ScoringError::NonFinite(polarity));
        }

        Ok(polarity.clamp(-1.0, 1.0))
    }

    /// 单条文本的情感分数 [-1.0, 1.0]
    pub fn score(&self, text: Option<&str>) -> f64 {
        self.try_score(text).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Sentiment scoring failed, using 0.0");
            0.0
        })
    }

    /// 情感分类
    pub fn label(score: f64) -> SentimentLabel {
        SentimentLabel::from_score(score)
    }

    /// 批量打分，失败条数在本次运行结束时汇总记录
    pub fn score_batch(&self, headlines: &[Headline]) -> ScoredBatch {
        let mut failures = 0;

        let scored = headlines
            .iter()
            .map(|headline| {
                let score = match self.try_score(headline.text.as_deref()) {
                    Ok(score) => score,
                    Err(e) => {
                        failures += 1;
                        tracing::debug!(symbol = %headline.symbol, error = %e, "scoring failed");
                        0.0
                    }
                };

                ScoredHeadline {
                    headline: headline.clone(),
                    score,
                }
            })
            .collect();

        if failures > 0 {
            tracing::warn!(
                failures,
                total = headlines.len(),
                "Sentiment scoring failed for some headlines, substituted 0.0"
            );
        }
        tracing::info!("Scored {} headlines", headlines.len());

        ScoredBatch { scored, failures }
    }

    /// 平均情感
    pub fn average_sentiment(batch: &ScoredBatch) -> f64 {
        if batch.scored.is_empty() {
            return 0.0;
        }

        let sum: f64 = batch.scored.iter().map(|s| s.score).sum();
        sum / batch.scored.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    struct FailingModel;

    impl PolarityModel for FailingModel {
        fn polarity(&self, text: &str) -> Result<f64, ScoringError> {
            if text.contains("boom") {
                return Err(ScoringError::Model("tokenizer exploded".to_string()));
            }
            if text.contains("nan") {
                return Ok(f64::NAN);
            }
            Ok(0.5)
        }
    }

    fn headline(text: Option<&str>) -> Headline {
        Headline {
            text: text.map(str::to_string),
            published_at: Utc::now(),
            symbol: "AAPL".to_string(),
            publisher: None,
            url: None,
        }
    }

    #[test]
    fn test_positive_and_negative_headlines() {
        let scorer = SentimentScorer::new();

        let positive = scorer.score(Some("Apple stock surges to record high"));
        assert!(positive > 0.0, "Should be positive: {positive}");

        let negative = scorer.score(Some("Apple stock plunges on weak earnings"));
        assert!(negative < 0.0, "Should be negative: {negative}");
    }

    #[test]
    fn test_missing_and_empty_text() {
        let scorer = SentimentScorer::new();

        assert_eq!(scorer.score(None), 0.0);
        assert_eq!(scorer.score(Some("")), 0.0);
        assert_eq!(scorer.score(Some("123")), 0.0);
    }

    #[test]
    fn test_negation_and_intensifier() {
        let model = LexiconModel::new();

        let good = model.polarity("results were good").unwrap();
        let very_good = model.polarity("results were very good").unwrap();
        let not_good = model.polarity("results were not good").unwrap();

        assert!(very_good > good);
        assert!(not_good < 0.0);
        assert!((not_good - 0.7 * NEGATION_FACTOR).abs() < 1e-12);
    }

    #[test]
    fn test_scores_stay_in_range() {
        let scorer = SentimentScorer::new();
        let score = scorer.score(Some("extremely very really best excellent record"));
        assert!((-1.0..=1.0).contains(&score));
    }

    #[test]
    fn test_label() {
        assert_eq!(SentimentScorer::<LexiconModel>::label(0.5), SentimentLabel::Positive);
        assert_eq!(SentimentScorer::<LexiconModel>::label(0.1), SentimentLabel::Neutral);
        assert_eq!(SentimentScorer::<LexiconModel>::label(-0.5), SentimentLabel::Negative);
    }

    #[test]
    fn test_failures_are_recovered_and_counted() {
        let scorer = SentimentScorer::with_model(FailingModel);

        assert_eq!(scorer.score(Some("boom")), 0.0);
        assert_eq!(scorer.score(Some("nan")), 0.0);

        let headlines = vec![
            headline(Some("fine")),
            headline(Some("boom")),
            headline(None),
            headline(Some("nan")),
        ];
        let batch = scorer.score_batch(&headlines);

        assert_eq!(batch.failures, 2);
        let scores: Vec<f64> = batch.scored.iter().map(|s| s.score).collect();
        assert_eq!(scores, vec![0.5, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_average_sentiment() {
        let scorer = SentimentScorer::with_model(FailingModel);
        let batch = scorer.score_batch(&[headline(Some("a")), headline(None)]);
        assert!((SentimentScorer::<FailingModel>::average_sentiment(&batch) - 0.25).abs() < 1e-12);
        assert_eq!(
            SentimentScorer::<FailingModel>::average_sentiment(&ScoredBatch::default()),
            0.0
        );
    }
}
