//! 新闻情绪与股价相关性示例
//!
//! 用法: cargo run -p etl --example correlate -- [SYMBOL] [CONFIG.json]

use etl::{PipelineBuilder, PipelineConfig, SentimentLabel};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let symbol = args.next().unwrap_or_else(|| "AAPL".to_string());
    let config = match args.next() {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };

    println!("=== 新闻情绪相关性分析: {} ===\n", symbol);

    let pipeline = PipelineBuilder::new().with_config(config).build();

    // 1. 加载数据
    println!("1. 加载数据...");
    let news = pipeline.load_news()?;
    let bars = pipeline.load_prices(&symbol)?;
    println!("   新闻 {} 条, 行情 {} 天\n", news.len(), bars.len());

    // 2. 情感打分
    println!("2. 分析新闻情感...");
    let batch = pipeline.score(&news)?;

    let total = batch.scored.len().max(1) as f64;
    for label in [SentimentLabel::Positive, SentimentLabel::Neutral, SentimentLabel::Negative] {
        let count = batch
            .scored
            .iter()
            .filter(|s| SentimentLabel::from_score(s.score) == label)
            .count();
        println!("     {}: {} ({:.1}%)", label, count, count as f64 / total * 100.0);
    }
    println!();

    // 3. 按日聚合并对齐
    println!("3. 按日聚合并与行情对齐...");
    let daily = pipeline.aggregate(&batch, &symbol);
    let aligned = pipeline.align(&daily, &bars)?;
    println!("   情感 {} 天, 对齐后 {} 天\n", daily.len(), aligned.len());

    // 4. 相关性
    println!("4. 计算相关性...");
    let summary = pipeline.correlate(&aligned)?;
    println!("   区间: {}", summary.date_range);
    println!(
        "   Pearson:  r = {:.4}, p = {:.4} (n = {})",
        summary.pearson.coefficient, summary.pearson.p_value, summary.pearson.observations
    );
    println!(
        "   Spearman: r = {:.4}, p = {:.4} (n = {})\n",
        summary.spearman.coefficient, summary.spearman.p_value, summary.spearman.observations
    );

    let report = pipeline.report(&symbol, &news, &bars, &batch, &aligned, summary);

    // 5. 技术指标
    println!("5. 技术指标...");
    let technicals = pipeline.technicals(&bars)?;
    match technicals.sma_latest {
        Some(sma) => println!("   SMA_{}: {:.2}", technicals.sma_window, sma),
        None => println!("   SMA_{}: 数据不足", technicals.sma_window),
    }
    match technicals.rsi_signal {
        Some(signal) => println!("   RSI_{}: {:?} -> {}\n", technicals.rsi_window, technicals.rsi_latest, signal),
        None => println!("   RSI_{}: 无信号\n", technicals.rsi_window),
    }

    println!("=== 报告 ===");
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
