use super::records::{PredictionRecord, TruthSet};
use crate::geometry::{Footprint, Polygon};
use ndarray::{Array2, ArrayView1};

/// 两个足迹的交并比. 两者都为空时为 0.
pub fn footprint_iou(a: &Footprint, b: &Footprint) -> f64 {
    let inter = a.intersection_area(b);
    let union = a.area() + b.area() - inter;
    if union == 0 {
        0.0
    } else {
        inter as f64 / union as f64
    }
}

/// 两个多边形足迹的交并比.
///
/// 满足对称性, `iou(A, A) = 1` (A 非空), 值域为 `[0, 1]`, 包围盒不相交时为 0.
#[inline]
pub fn polygon_iou(a: &Polygon, b: &Polygon) -> f64 {
    footprint_iou(&a.footprint(), &b.footprint())
}

/// 计算 IoU 矩阵和预测概率矩阵, 行为预测区域, 列为真值区域.
///
/// * `iou[(i, j)]`: 预测 `i` 与真值 `j` 的交并比.
/// * `pred[(i, j)]`: 预测 `i` 对真值 `j` 的类别给出的概率, 缺失时为 0.
pub fn generate_iou_pred_matrices(
    truth: &TruthSet,
    predictions: &[PredictionRecord],
) -> (Array2<f64>, Array2<f64>) {
    let shape = (predictions.len(), truth.regions.len());
    let truth_fp: Vec<Footprint> = truth.regions.iter().map(|r| r.polygon.footprint()).collect();

    let mut iou = Array2::zeros(shape);
    let mut pred = Array2::zeros(shape);
    for (i, p) in predictions.iter().enumerate() {
        let fp = p.polygon.footprint();
        for (j, (t, tfp)) in truth.regions.iter().zip(truth_fp.iter()).enumerate() {
            iou[(i, j)] = footprint_iou(&fp, tfp);
            pred[(i, j)] = p.label.prob_of(&t.label);
        }
    }
    (iou, pred)
}

/// 为每个预测选出匹配的真值区域.
///
/// 取 IoU 最大的一列 (并列时取序号最小者). 整行都为 0 时返回 `None`,
/// 表示该预测匹配到背景. 同一真值区域可以被多个预测匹配.
pub fn match_predictions(iou: &Array2<f64>) -> Vec<Option<usize>> {
    iou.rows().into_iter().map(best_match).collect()
}

fn best_match(row: ArrayView1<f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (j, &v) in row.iter().enumerate() {
        if v > 0.0 && best.map_or(true, |(_, b)| v > b) {
            best = Some((j, v));
        }
    }
    best.map(|(j, _)| j)
}
