//! 探针与结构的对应关系, 以及由此生成分割配置.
//!
//! 对应关系由外部的本体查询得到, 在这里只是一个不可变的输入值.

use super::stage::{ColorArgs, Cutoff, SaturationArgs, SegmentationConfig, SegmentationStage};
use crate::consts::DEFAULT_SCALE_LADDER;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

/// 单个探针关联的结构.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureRelations {
    /// 探针标记的结构 "包含" 的部分.
    #[serde(default)]
    pub has_part: BTreeSet<String>,

    /// 包围探针标记结构的结构.
    #[serde(default)]
    pub surrounded_by: BTreeSet<String>,
}

impl StructureRelations {
    /// 两类关联结构的并集.
    pub fn all(&self) -> impl Iterator<Item = &String> {
        self.has_part.iter().chain(self.surrounded_by.iter())
    }
}

/// `{探针: {has_part: [...], surrounded_by: [...]}}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProbeStructureMap {
    probes: BTreeMap<String, StructureRelations>,
}

impl ProbeStructureMap {
    /// 从 JSON 字符串解析.
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// 从 JSON 流解析.
    pub fn from_reader<R: Read>(r: R) -> serde_json::Result<Self> {
        serde_json::from_reader(r)
    }

    /// 插入或替换一个探针的关联结构.
    pub fn insert(&mut self, probe: impl Into<String>, rel: StructureRelations) {
        self.probes.insert(probe.into(), rel);
    }

    /// 查询探针的关联结构.
    #[inline]
    pub fn get(&self, probe: &str) -> Option<&StructureRelations> {
        self.probes.get(probe)
    }

    /// 探针个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.probes.len()
    }

    /// 是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }
}

/// 一幅图像可用的结构标签: 图像中所有探针关联结构的并集, 升序且去重.
///
/// 标注中的标签编码 `n > 0` 指向该列表的第 `n - 1` 项. 没有出现在 `map` 中的探针不贡献标签.
pub fn structure_labels<'a, I>(probes: I, map: &ProbeStructureMap) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let set: BTreeSet<&String> = probes
        .into_iter()
        .filter_map(|p| map.get(p))
        .flat_map(|rel| rel.all())
        .collect();
    set.into_iter().cloned().collect()
}

/// 分割配置所用的两组颜色.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StageColorSets {
    /// `has_part` 非空的探针的颜色.
    pub has_part: BTreeSet<String>,

    /// 其余有对应关系的探针的颜色.
    pub residual: BTreeSet<String>,
}

impl StageColorSets {
    /// 由 `(探针, 颜色)` 对划分颜色. 没有对应关系的探针不贡献任何颜色.
    pub fn from_probes<'a, I>(probe_colors: I, map: &ProbeStructureMap) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut ans = Self::default();
        for (probe, color) in probe_colors {
            match map.get(probe) {
                None => log::debug!("probe `{probe}` has no structure relations, skipped"),
                Some(rel) if !rel.has_part.is_empty() => {
                    ans.has_part.insert(color.to_lowercase());
                }
                Some(_) => {
                    ans.residual.insert(color.to_lowercase());
                }
            }
        }
        ans
    }
}

/// 由颜色集合生成从粗到细的分割配置.
///
/// 每个尺度上有一个 `has_part` 颜色阶段; 最粗的尺度上有一个残余颜色阶段;
/// 最细的尺度上有一个饱和度阶段.
#[derive(Clone, Debug)]
pub struct ConfigBuilder {
    ladder: Vec<(u32, usize, Option<usize>)>,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            ladder: DEFAULT_SCALE_LADDER.to_vec(),
        }
    }
}

impl ConfigBuilder {
    /// 使用自定义尺度阶梯 `(核边长, 最小面积, 最大面积)`, 从粗到细排列.
    pub fn with_ladder(ladder: Vec<(u32, usize, Option<usize>)>) -> Self {
        Self { ladder }
    }

    /// 生成配置. 颜色集合为空时对应的阶段被省略.
    pub fn build(&self, colors: &StageColorSets) -> SegmentationConfig {
        let mut stages = Vec::with_capacity(self.ladder.len() + 2);
        if !colors.has_part.is_empty() {
            for &(k, min_size, max_size) in self.ladder.iter() {
                stages.push(SegmentationStage::Color(ColorArgs {
                    blur_kernel: (k, k),
                    min_size,
                    max_size,
                    colors: colors.has_part.iter().cloned().collect(),
                }));
            }
        }
        if let Some(&(k, min_size, max_size)) = self.ladder.first() {
            if !colors.residual.is_empty() {
                stages.push(SegmentationStage::Color(ColorArgs {
                    blur_kernel: (k, k),
                    min_size,
                    max_size,
                    colors: colors.residual.iter().cloned().collect(),
                }));
            }
        }
        if let Some(&(k, min_size, max_size)) = self.ladder.last() {
            stages.push(SegmentationStage::Saturation(SaturationArgs {
                blur_kernel: (k, k),
                min_size,
                max_size,
                cutoff: Cutoff::Otsu,
            }));
        }
        SegmentationConfig::from(stages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_map() -> ProbeStructureMap {
        ProbeStructureMap::from_json(
            r#"{
                "Acta2": {"has_part": ["smooth muscle", "bronchiole"], "surrounded_by": ["alveolus"]},
                "Sftpc": {"has_part": [], "surrounded_by": ["alveolus", "capillary"]},
                "Pecam1": {"surrounded_by": ["artery"]}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_structure_labels() {
        let map = sample_map();
        assert_eq!(
            structure_labels(["Acta2", "Sftpc", "Unknown"], &map),
            vec!["alveolus", "bronchiole", "capillary", "smooth muscle"]
        );
        assert!(structure_labels(["Unknown"], &map).is_empty());
    }

    #[test]
    fn test_color_sets_from_probes() {
        let map = sample_map();
        let sets = StageColorSets::from_probes(
            [("Acta2", "Red"), ("Sftpc", "green"), ("Pecam1", "blue"), ("Nope", "white")],
            &map,
        );
        assert_eq!(sets.has_part.iter().collect::<Vec<_>>(), ["red"]);
        assert_eq!(sets.residual.iter().collect::<Vec<_>>(), ["blue", "green"]);
    }

    #[test]
    fn test_config_builder_ladder() {
        let map = sample_map();
        let sets = StageColorSets::from_probes([("Acta2", "red"), ("Sftpc", "green")], &map);
        let cfg = ConfigBuilder::default().build(&sets);
        let kinds: Vec<_> = cfg.stages.iter().map(|s| s.kind()).collect();
        assert_eq!(kinds, ["color", "color", "color", "color", "saturation"]);
        assert_eq!(cfg.stages[0].blur_kernel(), (31, 31));
        assert_eq!(cfg.stages[3].blur_kernel(), (31, 31));
        assert_eq!(cfg.stages[4].blur_kernel(), (5, 5));

        let empty = ConfigBuilder::with_ladder(vec![(3, 10, None)]).build(&StageColorSets::default());
        assert_eq!(empty.len(), 1);
    }
}
