//! 多阶段候选区域生成.
//!
//! 配置中的每个阶段都独立作用在完整图像上:
//!
//! 1. 以阶段的核大小模糊 RGB 平面, 再转换为 HSV.
//! 2. (可选) 高斯差分增强信号平面 (颜色阶段为明度, 饱和度阶段为饱和度).
//! 3. 阈值化: 颜色阶段按色相带, 饱和度阶段按固定或 Otsu 门限.
//! 4. 对每个 8-连通前景区域提取外轮廓.
//! 5. 按面积过滤.
//!
//! 各阶段的结果直接拼接, 不去重. 可选的残差阶段最后运行, 见 [`ResidualParams`].

mod imp;
mod probe;
mod residual;
mod stage;
mod threshold;

pub use probe::{
    structure_labels, ConfigBuilder, ProbeStructureMap, StageColorSets, StructureRelations,
};
pub use residual::ResidualParams;
pub use stage::{ColorArgs, Cutoff, SaturationArgs, SegmentationConfig, SegmentationStage};
pub use threshold::otsu_threshold;

use crate::consts::DEFAULT_FILTER_MIN_SIZE;
use crate::geometry::{Rect, Region};
use crate::progress::ProgressReport;
use crate::MicroImage;
use imp::GeneratorImp;
use serde::{Deserialize, Serialize};

/// 候选区域生成的全部参数 (阶段配置除外).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateParams {
    /// 所有阶段共用的最小面积.
    pub filter_min_size: usize,

    /// 高斯差分的 sigma 倍数. `None` 或不大于 1 时不做增强.
    pub dog_factor: Option<f32>,

    /// 是否运行残差阶段.
    pub process_residual: bool,

    /// 残差阶段参数.
    pub residual: ResidualParams,
}

impl Default for GenerateParams {
    fn default() -> Self {
        Self {
            filter_min_size: DEFAULT_FILTER_MIN_SIZE,
            dog_factor: None,
            process_residual: false,
            residual: ResidualParams::default(),
        }
    }
}

/// 对整幅图像生成结构候选区域.
///
/// 返回的每个区域都满足 `area >= filter_min_size`. 没有任何区域通过过滤时返回空列表.
/// 每个阶段 (以及残差阶段) 结束后, `progress` 收到单调递增的完成比例.
pub fn generate_structure_candidates(
    image: &MicroImage,
    config: &SegmentationConfig,
    filter_min_size: usize,
    dog_factor: Option<f32>,
    process_residual: bool,
    progress: &mut dyn ProgressReport,
) -> Vec<Region> {
    let params = GenerateParams {
        filter_min_size,
        dog_factor,
        process_residual,
        ..Default::default()
    };
    generate_with(image, config, &params, progress)
}

/// 同 [`generate_structure_candidates`], 但以 [`GenerateParams`] 给出全部参数.
pub fn generate_with(
    image: &MicroImage,
    config: &SegmentationConfig,
    params: &GenerateParams,
    progress: &mut dyn ProgressReport,
) -> Vec<Region> {
    let ans = GeneratorImp::new(image, config, params).generate(progress);
    log::debug!("{} candidates generated from {} stages", ans.len(), config.len());
    ans
}

/// 在子矩形 `rect` 内生成候选区域, 只保留面积最大的一个 (并列时取先出现的),
/// 并平移回整幅图像的坐标系.
///
/// `rect` 会先被截断到图像范围内. 没有任何候选区域时返回 `None`.
pub fn generate_structure_candidates_in(
    image: &MicroImage,
    rect: Rect,
    config: &SegmentationConfig,
    params: &GenerateParams,
    progress: &mut dyn ProgressReport,
) -> Option<Region> {
    let rect = rect.clip_to(image.shape())?;
    let (origin, shape) = rect.to_window();
    let sub = image.crop(origin, shape);
    let candidates = generate_with(&sub, config, params, progress);
    let mut best: Option<Region> = None;
    for r in candidates {
        if best.as_ref().map_or(true, |b| r.area() > b.area()) {
            best = Some(r);
        }
    }
    best.map(|r| r.translate(rect.x, rect.y))
}
