//! 基于谱聚类的区域二分.
//!
//! 在区域足迹上构造像素强度图 (见 `graph`), 求归一化邻接矩阵的 Fiedler 嵌入,
//! 以一维 2-means 分成两簇, 再对每一簇提取一条外轮廓.
//!
//! 强度变化弱时结果接近按空间位置的均分, 真实边缘处的小权重会把图切开.
//! 若按强度切出的两簇互相嵌套 (例如亮核位于较暗的细胞内部), 改用单位权重的
//! 纯空间图再切一次.
//!
//! 二分只读取图像和区域, 不修改任何标注状态. 把原区域标记为删除并追加两个新区域
//! 是调用方的责任, 见 `annotation::RegionStore::apply_split`.

mod error;
mod graph;
mod spectral;

pub use error::SplitError;

use crate::consts::split::SPLIT_MIN_PIXELS;
use crate::eight::external_contours;
use crate::geometry::Region;
use crate::{BinaryMask, Connectivity, Idx2d, MicroImage};
use graph::{PixelGraph, Weighting};
use spectral::{fiedler_embedding, two_means};

/// 把 `region` 二分为两个区域.
///
/// 区域 A 是包含足迹第一个像素 (光栅顺序) 的那一簇. 每一簇只保留最大的 8-连通分量,
/// 其余碎片归入另一簇, 因此两个结果都是单个多边形, 足迹互不相交,
/// 并集在边界取整误差内覆盖原区域.
///
/// 按强度加权的图无法给出两个不相交的多边形时 (嵌套的两簇), 退回到单位权重的图.
///
/// # 错误
///
/// * 足迹在图像内的像素少于 [`SPLIT_MIN_PIXELS`]: [`SplitError::DegenerateRegion`].
/// * 两种权重都无法分出两个不相交的区域: [`SplitError::Inseparable`].
pub fn split_region(image: &MicroImage, region: &Region) -> Result<(Region, Region), SplitError> {
    let footprint = region.footprint();
    let graph = PixelGraph::build(image, &footprint, Weighting::Intensity);
    if graph.len() < SPLIT_MIN_PIXELS {
        return Err(SplitError::DegenerateRegion {
            pixels: graph.len(),
            min: SPLIT_MIN_PIXELS,
        });
    }

    let shape = footprint.mask().shape();
    let (a, b) = match bipartition(&graph, shape) {
        Some(ans) => ans,
        None => {
            log::debug!(
                "intensity cut of region of area {} is nested, cutting spatially",
                region.area()
            );
            let graph = PixelGraph::build(image, &footprint, Weighting::Uniform);
            bipartition(&graph, shape).ok_or(SplitError::Inseparable)?
        }
    };

    let bbox = footprint.bbox();
    log::debug!(
        "split region of area {} into {} + {}",
        region.area(),
        a.area(),
        b.area()
    );
    Ok((a.translate(bbox.x, bbox.y), b.translate(bbox.x, bbox.y)))
}

/// 在足迹局部坐标中二分 `graph`. 两簇无法表示为不相交的单个多边形时返回 `None`.
fn bipartition(graph: &PixelGraph, shape: Idx2d) -> Option<(Region, Region)> {
    let embedding = fiedler_embedding(graph);
    let labels = two_means(embedding.as_slice())?;

    let mut nodes = BinaryMask::new(shape);
    nodes.fill_batch(graph.positions().iter().copied(), true);
    let mut cluster_a = BinaryMask::new(shape);
    for (&pos, &label) in graph.positions().iter().zip(labels.iter()) {
        if label == labels[0] {
            cluster_a.set(pos, true);
        }
    }

    let a = largest_component(&cluster_a).and_then(|m| single_region(&m))?;
    // A 的外轮廓包住了 B 时, 剩余部分为空.
    let mut rest = nodes;
    let mut claimed = BinaryMask::new(shape);
    a.footprint().paint_into(&mut claimed);
    rest.subtract(&claimed);
    let b = largest_component(&rest).and_then(|m| single_region(&m))?;
    if a.footprint().intersection_area(&b.footprint()) > 0 {
        return None;
    }
    Some((a, b))
}

/// 最大的 8-连通分量 (并列时取先出现的). 没有前景时返回 `None`.
fn largest_component(mask: &BinaryMask) -> Option<BinaryMask> {
    let mut best: Option<Vec<_>> = None;
    for area in mask.foreground_areas(Connectivity::Eight) {
        if best.as_ref().map_or(true, |b| area.len() > b.len()) {
            best = Some(area);
        }
    }
    let mut ans = BinaryMask::new(mask.shape());
    ans.fill_batch(best?, true);
    Some(ans)
}

/// 单连通掩码的外轮廓区域.
fn single_region(mask: &BinaryMask) -> Option<Region> {
    external_contours(mask)
        .first()
        .and_then(|c| Region::from_contour(c))
}
