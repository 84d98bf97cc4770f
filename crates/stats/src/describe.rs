//! 描述性统计

use crate::types::SeriesSummary;
use statrs::statistics::Statistics;

/// count / mean / std / min / 25% / 50% / 75% / max
///
/// 非有限值（缺失、NaN、∞）在统计前被剔除；全部被剔除时返回 `None`。
pub fn describe(values: &[f64]) -> Option<SeriesSummary> {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }

    finite.sort_by(|a, b| a.total_cmp(b));

    let mean = finite.iter().mean();
    let std = finite.iter().std_dev();

    Some(SeriesSummary {
        count: finite.len(),
        mean,
        std,
        min: finite[0],
        q25: quantile_sorted(&finite, 0.25),
        median: quantile_sorted(&finite, 0.5),
        q75: quantile_sorted(&finite, 0.75),
        max: finite[finite.len() - 1],
    })
}

/// 对缺失值友好的版本
pub fn describe_optional(values: &[Option<f64>]) -> Option<SeriesSummary> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    describe(&present)
}

/// 线性插值分位数，`sorted` 必须已升序
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;

    if lower == upper {
        return sorted[lower];
    }

    let weight = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_matches_linear_quantiles() {
        let summary = describe(&[4.0, 1.0, 3.0, 2.0]).unwrap();

        assert_eq!(summary.count, 4);
        assert!((summary.mean - 2.5).abs() < 1e-12);
        // 样本标准差 sqrt(5/3)
        assert!((summary.std - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(summary.min, 1.0);
        assert!((summary.q25 - 1.75).abs() < 1e-12);
        assert!((summary.median - 2.5).abs() < 1e-12);
        assert!((summary.q75 - 3.25).abs() < 1e-12);
        assert_eq!(summary.max, 4.0);
    }

    #[test]
    fn test_describe_skips_missing() {
        let summary = describe_optional(&[None, Some(0.02), Some(f64::NAN), Some(-0.01)]).unwrap();
        assert_eq!(summary.count, 2);
        assert!((summary.mean - 0.005).abs() < 1e-12);
    }

    #[test]
    fn test_describe_single_value_has_nan_std() {
        let summary = describe(&[0.3]).unwrap();
        assert_eq!(summary.count, 1);
        assert!(summary.std.is_nan());
        assert_eq!(summary.median, 0.3);
    }

    #[test]
    fn test_describe_empty() {
        assert!(describe(&[]).is_none());
        assert!(describe_optional(&[None, None]).is_none());
    }
}
