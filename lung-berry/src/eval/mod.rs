//! IoU 匹配与逐类别评估.
//!
//! 流程:
//!
//! 1. [`generate_iou_pred_matrices`] 计算每个 (预测, 真值) 对的交并比;
//! 2. [`match_predictions`] 把每个预测贪心地匹配到 IoU 最大的真值区域,
//!    与任何真值都不相交的预测匹配到背景类别 [`BACKGROUND_CLASS`];
//! 3. 把匹配到的真值类别 one-hot 编码, 对每个类别独立计算 ROC 和 PR 曲线.
//!
//! 匹配允许多对一, 不做二分图匹配.

mod iou;
mod metrics;
mod records;

pub use iou::{footprint_iou, generate_iou_pred_matrices, match_predictions, polygon_iou};
pub use metrics::{
    auc, average_precision, average_precision_of, precision_recall_curve, roc_curve, PrCurve,
    RocCurve,
};
pub use records::{EvalData, PredictionLabel, PredictionRecord, TruthRegion, TruthSet};

use crate::consts::BACKGROUND_CLASS;
use serde::Serialize;
use std::collections::BTreeSet;

/// 单个类别的评估结果.
#[derive(Clone, Debug, Serialize)]
pub struct ClassMetrics {
    /// 类别名称.
    pub class: String,

    /// 匹配结果中属于该类别的预测个数.
    pub positives: usize,

    /// ROC 曲线.
    pub roc: RocCurve,

    /// ROC 曲线下面积.
    pub roc_auc: f64,

    /// PR 曲线.
    pub pr: PrCurve,

    /// 平均精确率.
    pub average_precision: f64,
}

/// 一次评估的全部结果.
#[derive(Clone, Debug, Serialize)]
pub struct EvalReport {
    /// 类别, 升序, 包含背景.
    pub categories: Vec<String>,

    /// 每个预测匹配到的真值区域序号, `None` 表示背景.
    pub matches: Vec<Option<usize>>,

    /// 每个类别的指标, 与 `categories` 顺序一致.
    pub classes: Vec<ClassMetrics>,
}

impl EvalReport {
    /// 匹配到某个真值区域的预测个数.
    pub fn matched_count(&self) -> usize {
        self.matches.iter().filter(|m| m.is_some()).count()
    }

    /// 匹配到背景的预测个数.
    pub fn background_count(&self) -> usize {
        self.matches.len() - self.matched_count()
    }

    /// 按名称查找类别的指标.
    pub fn class(&self, name: &str) -> Option<&ClassMetrics> {
        self.classes.iter().find(|c| c.class == name)
    }
}

/// 评估一组预测.
///
/// 类别为真值标签与背景的并集. 每个预测的概率向量按类别顺序读取, 缺失的类别记为 0.
pub fn evaluate(data: &EvalData) -> EvalReport {
    let categories: Vec<String> = data
        .truth
        .regions
        .iter()
        .map(|r| r.label.as_str())
        .chain(std::iter::once(BACKGROUND_CLASS))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();

    let (iou, _) = generate_iou_pred_matrices(&data.truth, &data.predictions);
    let matches = match_predictions(&iou);
    let truth_labels: Vec<&str> = matches
        .iter()
        .map(|m| match m {
            Some(j) => data.truth.regions[*j].label.as_str(),
            None => BACKGROUND_CLASS,
        })
        .collect();

    let classes = categories
        .iter()
        .map(|class| {
            let y: Vec<bool> = truth_labels.iter().map(|l| *l == class.as_str()).collect();
            let scores: Vec<f64> = data
                .predictions
                .iter()
                .map(|p| p.label.prob_of(class))
                .collect();
            let roc = roc_curve(&y, &scores);
            let pr = precision_recall_curve(&y, &scores);
            ClassMetrics {
                class: class.clone(),
                positives: y.iter().filter(|b| **b).count(),
                roc_auc: auc(&roc.fpr, &roc.tpr),
                average_precision: average_precision_of(&pr),
                roc,
                pr,
            }
        })
        .collect();

    let report = EvalReport {
        categories,
        matches,
        classes,
    };
    log::info!(
        "evaluated {} predictions against {} truth regions: {} matched, {} background",
        data.predictions.len(),
        data.truth.regions.len(),
        report.matched_count(),
        report.background_count()
    );
    report
}
