use crate::geometry::Footprint;
use crate::{Idx2d, MicroImage};
use nalgebra::{DMatrix, DVector};
use ndarray::Array2;

/// 区域足迹上的像素强度图.
///
/// 节点是足迹中位于图像内的像素 (按光栅顺序编号), 边连接 8-邻接的像素对,
/// 因此只在对角方向相连的足迹也是连通图.
pub(super) struct PixelGraph {
    /// 每个节点在足迹局部掩码中的位置.
    positions: Vec<Idx2d>,
    adjacency: Vec<Vec<(usize, f64)>>,
    degree: Vec<f64>,
}

/// 边权的计算方式.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum Weighting {
    /// `exp(-g / std(g))`, `g` 为两端明度之差的绝对值.
    /// 所有梯度都相同 (`std(g) = 0`) 时权重全为 1.
    Intensity,

    /// 权重全为 1, 只保留空间结构.
    Uniform,
}

impl PixelGraph {
    pub(super) fn build(image: &MicroImage, footprint: &Footprint, weighting: Weighting) -> Self {
        let bbox = footprint.bbox();
        let (img_h, img_w) = image.shape();
        let value = image.value();

        let inside = |(h, w): Idx2d| -> Option<Idx2d> {
            let y = usize::try_from(bbox.y + h as i32).ok()?;
            let x = usize::try_from(bbox.x + w as i32).ok()?;
            (y < img_h && x < img_w).then_some((y, x))
        };

        let local = footprint.mask();
        let mut index = Array2::<Option<usize>>::from_elem(local.shape(), None);
        let mut positions = Vec::with_capacity(local.count());
        let mut intensity = Vec::with_capacity(local.count());
        for pos in local.foreground_pos::<Vec<_>>() {
            if let Some(global) = inside(pos) {
                index[pos] = Some(positions.len());
                positions.push(pos);
                intensity.push(value[global] as f64);
            }
        }

        let mut edges = Vec::with_capacity(4 * positions.len());
        for (i, &(h, w)) in positions.iter().enumerate() {
            // 只看 "向前" 的四个邻居, 每条边恰好出现一次. `w = 0` 时左下方越界, `get` 返回 `None`.
            for next in [(h, w + 1), (h + 1, w.wrapping_sub(1)), (h + 1, w), (h + 1, w + 1)] {
                if let Some(Some(j)) = index.get(next) {
                    edges.push((i, *j, (intensity[i] - intensity[*j]).abs()));
                }
            }
        }

        let std = match weighting {
            Weighting::Intensity => gradient_std(edges.iter().map(|e| e.2)),
            Weighting::Uniform => 0.0,
        };
        let mut adjacency = vec![Vec::with_capacity(8); positions.len()];
        let mut degree = vec![0.0; positions.len()];
        let edges_len = edges.len();
        for (i, j, g) in edges {
            let weight = if std > 0.0 { (-g / std).exp() } else { 1.0 };
            adjacency[i].push((j, weight));
            adjacency[j].push((i, weight));
            degree[i] += weight;
            degree[j] += weight;
        }
        log::debug!(
            "pixel graph ({weighting:?}): {} nodes, {} edges, gradient std {std:.3}",
            positions.len(),
            edges_len
        );

        Self {
            positions,
            adjacency,
            degree,
        }
    }

    /// 节点个数.
    #[inline]
    pub(super) fn len(&self) -> usize {
        self.positions.len()
    }

    /// 节点在足迹局部掩码中的位置.
    #[inline]
    pub(super) fn positions(&self) -> &[Idx2d] {
        &self.positions
    }

    /// `D^{-1/2}` 的对角元. 孤立节点记为 0.
    pub(super) fn inv_sqrt_degree(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.len(),
            self.degree
                .iter()
                .map(|&d| if d > 0.0 { d.sqrt().recip() } else { 0.0 }),
        )
    }

    /// `M = D^{-1/2} W D^{-1/2}` 最大特征值 1 对应的单位特征向量 `√d / ‖√d‖`.
    pub(super) fn trivial_eigenvector(&self) -> DVector<f64> {
        let v = DVector::from_iterator(self.len(), self.degree.iter().map(|d| d.sqrt()));
        let norm = v.norm();
        if norm > 0.0 {
            v / norm
        } else {
            v
        }
    }

    /// 计算 `M x`.
    pub(super) fn apply_normalized(&self, inv_sqrt: &DVector<f64>, x: &DVector<f64>) -> DVector<f64> {
        DVector::from_fn(self.len(), |i, _| {
            let acc: f64 = self.adjacency[i]
                .iter()
                .map(|&(j, w)| w * inv_sqrt[j] * x[j])
                .sum();
            acc * inv_sqrt[i]
        })
    }

    /// 稠密形式的 `M`.
    pub(super) fn dense_normalized(&self, inv_sqrt: &DVector<f64>) -> DMatrix<f64> {
        let n = self.len();
        let mut m = DMatrix::zeros(n, n);
        for (i, row) in self.adjacency.iter().enumerate() {
            for &(j, w) in row {
                m[(i, j)] = w * inv_sqrt[i] * inv_sqrt[j];
            }
        }
        m
    }
}

/// 总体标准差. 没有样本时为 0.
fn gradient_std<I: Iterator<Item = f64> + Clone>(it: I) -> f64 {
    let n = it.clone().count();
    if n == 0 {
        return 0.0;
    }
    let mean = it.clone().sum::<f64>() / n as f64;
    let var = it.map(|g| (g - mean) * (g - mean)).sum::<f64>() / n as f64;
    var.sqrt()
}
