//! 二分类器的 ROC / PR 曲线.
//!
//! 约定与常见的机器学习工具箱一致:
//!
//! * 阈值取所有不同的得分, 降序排列.
//! * ROC 曲线前置阈值为 `+∞` 的 `(0, 0)` 点, 并丢弃共线的中间点.
//! * PR 曲线按召回率降序排列, 末尾追加 `(召回率 0, 精确率 1)`.
//! * 没有正例 (或没有负例) 时对应的比率为 NaN, 不会 panic.

use itertools::{izip, Itertools};
use serde::Serialize;

/// ROC 曲线.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RocCurve {
    /// 假阳性率, 单调不减.
    pub fpr: Vec<f64>,
    /// 真阳性率, 单调不减.
    pub tpr: Vec<f64>,
    /// 每个点对应的阈值 (得分 `>=` 阈值判为正例), 单调递减.
    pub thresholds: Vec<f64>,
}

/// 精确率-召回率曲线.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PrCurve {
    /// 精确率. 比 `thresholds` 多一个末尾的 1.
    pub precision: Vec<f64>,
    /// 召回率, 单调不增. 比 `thresholds` 多一个末尾的 0.
    pub recall: Vec<f64>,
    /// 阈值, 单调递增.
    pub thresholds: Vec<f64>,
}

/// 每个不同阈值处累计的 `(假阳性数, 真阳性数, 阈值)`, 阈值降序.
fn binary_clf_curve(y_true: &[bool], scores: &[f64]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    assert_eq!(y_true.len(), scores.len(), "标签与得分个数不一致");
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let (mut fps, mut tps, mut thresholds) = (Vec::new(), Vec::new(), Vec::new());
    let mut tp = 0usize;
    for (k, &i) in order.iter().enumerate() {
        tp += usize::from(y_true[i]);
        let last = k + 1 == order.len();
        if last || scores[order[k + 1]] != scores[i] {
            tps.push(tp as f64);
            fps.push((k + 1 - tp) as f64);
            thresholds.push(scores[i]);
        }
    }
    (fps, tps, thresholds)
}

/// `x / total`, `total` 为 0 时为 NaN.
fn rates(x: &[f64]) -> Vec<f64> {
    let total = x.last().copied().unwrap_or(0.0);
    if total > 0.0 {
        x.iter().map(|v| v / total).collect()
    } else {
        vec![f64::NAN; x.len()]
    }
}

/// 计算 ROC 曲线.
///
/// 如果 `y_true` 和 `scores` 长度不同, 则程序 panic.
pub fn roc_curve(y_true: &[bool], scores: &[f64]) -> RocCurve {
    let (fps, tps, thr) = binary_clf_curve(y_true, scores);

    // 只保留二阶差分不为 0 的拐点, 以及两个端点.
    let n = fps.len();
    let keep = |i: usize| {
        i == 0
            || i + 1 >= n
            || fps[i + 1] - 2.0 * fps[i] + fps[i - 1] != 0.0
            || tps[i + 1] - 2.0 * tps[i] + tps[i - 1] != 0.0
    };
    let kept: Vec<usize> = if n > 2 { (0..n).filter(|&i| keep(i)).collect() } else { (0..n).collect() };

    let mut f = vec![0.0];
    let mut t = vec![0.0];
    let mut thresholds = vec![f64::INFINITY];
    for i in kept {
        f.push(fps[i]);
        t.push(tps[i]);
        thresholds.push(thr[i]);
    }
    RocCurve {
        fpr: rates(&f),
        tpr: rates(&t),
        thresholds,
    }
}

/// 梯形法则求曲线下面积. `x` 必须单调 (不增或不减), 否则结果为 NaN.
pub fn auc(x: &[f64], y: &[f64]) -> f64 {
    assert_eq!(x.len(), y.len(), "坐标个数不一致");
    if x.len() < 2 {
        return f64::NAN;
    }
    let dx: Vec<f64> = x.iter().tuple_windows().map(|(a, b)| b - a).collect();
    let direction = if dx.iter().all(|d| *d >= 0.0) {
        1.0
    } else if dx.iter().all(|d| *d <= 0.0) {
        -1.0
    } else {
        return f64::NAN;
    };
    let area: f64 = izip!(&dx, y, y.iter().skip(1))
        .map(|(d, y0, y1)| d * (y0 + y1) * 0.5)
        .sum();
    direction * area
}

/// 计算精确率-召回率曲线.
///
/// 如果 `y_true` 和 `scores` 长度不同, 则程序 panic.
pub fn precision_recall_curve(y_true: &[bool], scores: &[f64]) -> PrCurve {
    let (fps, tps, thr) = binary_clf_curve(y_true, scores);
    let precision = tps.iter().zip(fps.iter()).map(|(t, f)| {
        let ps = t + f;
        if ps > 0.0 {
            t / ps
        } else {
            0.0
        }
    });
    let mut precision: Vec<f64> = precision.rev().collect();
    let mut recall: Vec<f64> = rates(&tps).into_iter().rev().collect();
    precision.push(1.0);
    recall.push(0.0);
    PrCurve {
        precision,
        recall,
        thresholds: thr.into_iter().rev().collect(),
    }
}

/// 平均精确率 `Σ (Rₙ − Rₙ₋₁) Pₙ`. 没有正例时为 NaN.
pub fn average_precision(y_true: &[bool], scores: &[f64]) -> f64 {
    average_precision_of(&precision_recall_curve(y_true, scores))
}

/// 由已有的 PR 曲线计算平均精确率.
pub fn average_precision_of(pr: &PrCurve) -> f64 {
    -pr.recall
        .windows(2)
        .zip(pr.precision.iter())
        .map(|(r, p)| (r[1] - r[0]) * p)
        .sum::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;

    const Y: [bool; 4] = [false, false, true, true];
    const S: [f64; 4] = [0.1, 0.4, 0.35, 0.8];

    fn close(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn test_roc_curve() {
        let roc = roc_curve(&Y, &S);
        assert_eq!(roc.fpr, vec![0.0, 0.0, 0.5, 0.5, 1.0]);
        assert_eq!(roc.tpr, vec![0.0, 0.5, 0.5, 1.0, 1.0]);
        assert_eq!(roc.thresholds[0], f64::INFINITY);
        assert_eq!(&roc.thresholds[1..], &[0.8, 0.4, 0.35, 0.1]);
        assert!((auc(&roc.fpr, &roc.tpr) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_roc_drops_collinear_points() {
        let roc = roc_curve(&[true, true, false, false], &[0.9, 0.8, 0.3, 0.2]);
        assert_eq!(roc.thresholds[1..], [0.9, 0.8, 0.2]);
        assert_eq!(roc.fpr, vec![0.0, 0.0, 0.0, 1.0]);
        assert_eq!(roc.tpr, vec![0.0, 0.5, 1.0, 1.0]);
        assert_eq!(auc(&roc.fpr, &roc.tpr), 1.0);
    }

    #[test]
    fn test_precision_recall() {
        let pr = precision_recall_curve(&Y, &S);
        assert!(close(&pr.precision, &[0.5, 2.0 / 3.0, 0.5, 1.0, 1.0]));
        assert_eq!(pr.recall, vec![1.0, 1.0, 0.5, 0.5, 0.0]);
        assert_eq!(pr.thresholds, vec![0.1, 0.35, 0.4, 0.8]);
        assert!((average_precision(&Y, &S) - 5.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_tied_scores_share_a_threshold() {
        let roc = roc_curve(&[true, false, true], &[0.5, 0.5, 0.5]);
        assert_eq!(roc.thresholds, vec![f64::INFINITY, 0.5]);
        assert_eq!(roc.fpr, vec![0.0, 1.0]);
        assert_eq!(roc.tpr, vec![0.0, 1.0]);
    }

    #[test]
    fn test_single_class_is_nan() {
        let roc = roc_curve(&[false, false], &[0.2, 0.7]);
        assert!(roc.tpr.iter().all(|v| v.is_nan()));
        assert!(auc(&roc.fpr, &roc.tpr).is_nan());
        assert!(average_precision(&[false, false], &[0.2, 0.7]).is_nan());

        let roc = roc_curve(&[true], &[0.3]);
        assert!(roc.fpr.iter().all(|v| v.is_nan()));
        assert!(auc(&[0.0, 1.0], &[1.0, 1.0]) == 1.0);
    }

    #[test]
    fn test_auc_direction() {
        assert_eq!(auc(&[1.0, 0.5, 0.0], &[1.0, 1.0, 1.0]), 1.0);
        assert!(auc(&[0.0, 1.0, 0.5], &[1.0, 1.0, 1.0]).is_nan());
    }
}
