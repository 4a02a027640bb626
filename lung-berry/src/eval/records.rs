use crate::geometry::Polygon;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;

/// 一个真值区域.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TruthRegion {
    /// 结构名称.
    pub label: String,

    /// 区域边界.
    pub polygon: Polygon,
}

/// 一幅图像的全部真值区域.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TruthSet {
    /// 真值区域.
    pub regions: Vec<TruthRegion>,
}

/// 预测的类别概率, JSON 形式为 `{"prob": {"类别": p, ...}}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionLabel {
    /// 每个类别的预测概率. 缺失的类别视为 0.
    pub prob: BTreeMap<String, f64>,
}

impl PredictionLabel {
    /// 类别 `class` 的概率, 缺失时为 0.
    #[inline]
    pub fn prob_of(&self, class: &str) -> f64 {
        self.prob.get(class).copied().unwrap_or(0.0)
    }
}

/// 一个预测区域.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// 类别概率.
    pub label: PredictionLabel,

    /// 区域边界.
    pub polygon: Polygon,
}

/// 离线评估的输入: 真值与预测.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalData {
    /// 真值.
    pub truth: TruthSet,

    /// 预测.
    pub predictions: Vec<PredictionRecord>,
}

impl EvalData {
    /// 从 JSON 字符串解析.
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// 从 JSON 流解析.
    pub fn from_reader<R: Read>(r: R) -> serde_json::Result<Self> {
        serde_json::from_reader(r)
    }
}
