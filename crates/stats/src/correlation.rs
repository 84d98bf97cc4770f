//! 相关性分析模块
//!
//! Pearson 积差相关与 Spearman 秩相关，p 值采用双侧 t 检验（自由度 n - 2）。

use crate::types::{CorrelationResult, StatsError, StatsResult};
use ndarray::Array1;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// 计算相关系数所需的最少成对观测数
pub const MIN_OBSERVATIONS: usize = 2;

/// 剔除任一侧缺失（或非有限值）的观测对
///
/// 两个序列按下标配对，返回仍然成对的两个向量。
pub fn drop_missing(
    x: &[Option<f64>],
    y: &[Option<f64>],
) -> StatsResult<(Vec<f64>, Vec<f64>)> {
    if x.len() != y.len() {
        return Err(StatsError::LengthMismatch {
            expected: x.len(),
            actual: y.len(),
        });
    }

    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y.iter())
        .filter_map(|pair| match pair {
            (Some(a), Some(b)) if a.is_finite() && b.is_finite() => Some((*a, *b)),
            _ => None,
        })
        .unzip();

    Ok((xs, ys))
}

/// Pearson 相关系数和双侧 p 值
pub fn pearson(x: &[f64], y: &[f64]) -> StatsResult<CorrelationResult> {
    check_inputs(x, y)?;

    let x = Array1::from_vec(x.to_vec());
    let y = Array1::from_vec(y.to_vec());
    let n = x.len();

    let x_mean = x.mean().ok_or(StatsError::InsufficientData {
        required: MIN_OBSERVATIONS,
        actual: 0,
    })?;
    let y_mean = y.mean().ok_or(StatsError::InsufficientData {
        required: MIN_OBSERVATIONS,
        actual: 0,
    })?;

    let dx = &x - x_mean;
    let dy = &y - y_mean;

    let sxx = dx.dot(&dx);
    let syy = dy.dot(&dy);
    let sxy = dx.dot(&dy);

    if sxx <= 0.0 || syy <= 0.0 {
        return Err(StatsError::ConstantInput);
    }

    let r = (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0);
    let p_value = two_sided_p_value(r, n)?;

    Ok(CorrelationResult {
        coefficient: r,
        p_value,
        observations: n,
    })
}

/// Spearman 秩相关系数和双侧 p 值
///
/// 相同值取平均秩，然后对秩做 Pearson 相关。
pub fn spearman(x: &[f64], y: &[f64]) -> StatsResult<CorrelationResult> {
    check_inputs(x, y)?;

    let rank_x = rank(x);
    let rank_y = rank(y);

    pearson(&rank_x, &rank_y)
}

/// 平均秩（从 1 开始）
pub fn rank(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut indexed: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut ranks = vec![0.0; n];
    let mut i = 0;

    while i < n {
        let mut j = i;
        while j < n && indexed[j].1 == indexed[i].1 {
            j += 1;
        }

        // 第 i..j 个位置的平均秩
        let avg_rank = (i + j + 1) as f64 / 2.0;
        for item in &indexed[i..j] {
            ranks[item.0] = avg_rank;
        }

        i = j;
    }

    ranks
}

fn check_inputs(x: &[f64], y: &[f64]) -> StatsResult<()> {
    if x.len() != y.len() {
        return Err(StatsError::LengthMismatch {
            expected: x.len(),
            actual: y.len(),
        });
    }

    if x.len() < MIN_OBSERVATIONS {
        return Err(StatsError::InsufficientData {
            required: MIN_OBSERVATIONS,
            actual: x.len(),
        });
    }

    if is_constant(x) || is_constant(y) {
        return Err(StatsError::ConstantInput);
    }

    Ok(())
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// t = r * sqrt((n - 2) / (1 - r²))，服从自由度 n - 2 的 t 分布
fn two_sided_p_value(r: f64, n: usize) -> StatsResult<f64> {
    // 两个点总能连成一条直线，相关系数没有信息量
    if n <= MIN_OBSERVATIONS {
        return Ok(1.0);
    }

    let residual = 1.0 - r * r;
    if residual <= 0.0 {
        return Ok(0.0);
    }

    let df = (n - 2) as f64;
    let t = r * (df / residual).sqrt();

    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| StatsError::Distribution(e.to_string()))?;

    let p = 2.0 * (1.0 - dist.cdf(t.abs()));
    Ok(p.clamp(0.0, 1.0))
}
