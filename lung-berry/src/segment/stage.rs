use serde::{Deserialize, Serialize};

/// 一个阈值化阶段. 各阶段相互独立, 都作用在完整图像上.
///
/// JSON 形式为 `{"type": "color" | "saturation", "args": {...}}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "args", rename_all = "lowercase")]
pub enum SegmentationStage {
    /// 按命名颜色的色相带阈值化.
    Color(ColorArgs),

    /// 按饱和度阈值化.
    Saturation(SaturationArgs),
}

/// 颜色阶段参数.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorArgs {
    /// 模糊核大小 `(宽, 高)`, 均为正奇数.
    pub blur_kernel: (u32, u32),

    /// 区域最小面积.
    pub min_size: usize,

    /// 区域最大面积. `None` 表示不限.
    #[serde(default)]
    pub max_size: Option<usize>,

    /// 目标颜色名称, 见 [`crate::color::NamedColor`].
    #[serde(default)]
    pub colors: Vec<String>,
}

/// 饱和度阶段参数.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaturationArgs {
    /// 模糊核大小 `(宽, 高)`, 均为正奇数.
    pub blur_kernel: (u32, u32),

    /// 区域最小面积.
    pub min_size: usize,

    /// 区域最大面积. `None` 表示不限.
    #[serde(default)]
    pub max_size: Option<usize>,

    /// 饱和度门限.
    #[serde(default)]
    pub cutoff: Cutoff,
}

/// 饱和度门限. 饱和度不低于门限的像素被视为前景.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cutoff {
    /// 固定门限.
    Fixed(u8),

    /// 对饱和度直方图使用 Otsu 方法, 但不低于
    /// [`crate::consts::hsv::SATURATION_CUTOFF_FLOOR`].
    #[default]
    Otsu,
}

impl SegmentationStage {
    /// 阶段名称, 用于日志.
    pub fn kind(&self) -> &'static str {
        match self {
            SegmentationStage::Color(_) => "color",
            SegmentationStage::Saturation(_) => "saturation",
        }
    }

    /// 模糊核大小 `(宽, 高)`.
    pub fn blur_kernel(&self) -> (u32, u32) {
        match self {
            SegmentationStage::Color(a) => a.blur_kernel,
            SegmentationStage::Saturation(a) => a.blur_kernel,
        }
    }

    /// 区域最小面积.
    pub fn min_size(&self) -> usize {
        match self {
            SegmentationStage::Color(a) => a.min_size,
            SegmentationStage::Saturation(a) => a.min_size,
        }
    }

    /// 区域最大面积.
    pub fn max_size(&self) -> Option<usize> {
        match self {
            SegmentationStage::Color(a) => a.max_size,
            SegmentationStage::Saturation(a) => a.max_size,
        }
    }

    /// 以 `filter_min_size` 和阶段自身的面积限制判断区域是否保留.
    #[inline]
    pub fn accepts(&self, area: usize, filter_min_size: usize) -> bool {
        area >= self.min_size().max(filter_min_size)
            && self.max_size().map_or(true, |max| area <= max)
    }
}

/// 有序的阶段列表. 序列化为 JSON 数组.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentationConfig {
    /// 所有阶段.
    pub stages: Vec<SegmentationStage>,
}

impl SegmentationConfig {
    /// 从 JSON 字符串解析.
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// 阶段个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// 是否没有阶段.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl From<Vec<SegmentationStage>> for SegmentationConfig {
    fn from(stages: Vec<SegmentationStage>) -> Self {
        Self { stages }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_verbatim() {
        let cfg = SegmentationConfig::from_json(
            r#"[
                {"type": "color", "args": {"blur_kernel": [15, 15], "min_size": 400,
                    "max_size": null, "colors": ["red", "green"]}},
                {"type": "saturation", "args": {"blur_kernel": [5, 3], "min_size": 100,
                    "max_size": 8000}},
                {"type": "saturation", "args": {"blur_kernel": [5, 5], "min_size": 1,
                    "max_size": null, "cutoff": {"fixed": 90}}}
            ]"#,
        )
        .unwrap();
        assert_eq!(cfg.len(), 3);
        assert_eq!(
            cfg.stages[0],
            SegmentationStage::Color(ColorArgs {
                blur_kernel: (15, 15),
                min_size: 400,
                max_size: None,
                colors: vec!["red".into(), "green".into()],
            })
        );
        assert_eq!(cfg.stages[1].blur_kernel(), (5, 3));
        assert_eq!(cfg.stages[1].max_size(), Some(8000));
        match &cfg.stages[1] {
            SegmentationStage::Saturation(a) => assert_eq!(a.cutoff, Cutoff::Otsu),
            _ => unreachable!(),
        }
        match &cfg.stages[2] {
            SegmentationStage::Saturation(a) => assert_eq!(a.cutoff, Cutoff::Fixed(90)),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_stage_accepts() {
        let s = SegmentationStage::Saturation(SaturationArgs {
            blur_kernel: (1, 1),
            min_size: 50,
            max_size: Some(200),
            cutoff: Cutoff::Otsu,
        });
        assert!(!s.accepts(60, 100));
        assert!(s.accepts(100, 100));
        assert!(s.accepts(50, 0));
        assert!(!s.accepts(201, 0));
        assert_eq!(s.kind(), "saturation");
    }

    #[test]
    fn test_config_serializes_back() {
        let cfg = SegmentationConfig::from(vec![SegmentationStage::Color(ColorArgs {
            blur_kernel: (3, 3),
            min_size: 10,
            max_size: None,
            colors: vec!["blue".into()],
        })]);
        let v: serde_json::Value = serde_json::to_value(&cfg).unwrap();
        assert_eq!(v[0]["type"], "color");
        assert_eq!(v[0]["args"]["blur_kernel"], serde_json::json!([3, 3]));
        assert_eq!(v[0]["args"]["colors"][0], "blue");
    }
}
