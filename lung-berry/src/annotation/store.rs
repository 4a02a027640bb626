use super::error::StoreError;
use super::label::LabelCode;
use crate::geometry::Region;
use crate::split::split_region;
use crate::MicroImage;
use serde::{Deserialize, Serialize};

/// 区域在 [`RegionStore`] 中的稳定编号. 区域从不被移除, 因此编号一直有效.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(usize);

impl RegionId {
    /// 以序号构造编号.
    #[inline]
    pub fn from_index(index: usize) -> RegionId {
        RegionId(index)
    }

    /// 编号对应的序号.
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

/// 一幅图像的候选区域及其标签.
///
/// 区域和标签是等长的并行序列, 所有修改操作都同时维护两者.
/// 删除只把标签置为 [`LabelCode::Deleted`], 不移除区域.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegionStore {
    regions: Vec<Region>,
    labels: Vec<LabelCode>,
}

impl RegionStore {
    /// 空的存储.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 以一组未标注的候选区域创建.
    pub fn from_candidates(candidates: Vec<Region>) -> Self {
        let labels = vec![LabelCode::Unlabeled; candidates.len()];
        Self {
            regions: candidates,
            labels,
        }
    }

    /// 以并行的区域与标签创建. 长度不同时返回 `None`.
    pub fn from_parts(regions: Vec<Region>, labels: Vec<LabelCode>) -> Option<Self> {
        (regions.len() == labels.len()).then_some(Self { regions, labels })
    }

    /// 区域总数 (包括已删除的).
    #[inline]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// 是否没有任何区域.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// 追加一个未标注区域.
    pub fn push(&mut self, region: Region) -> RegionId {
        self.regions.push(region);
        self.labels.push(LabelCode::Unlabeled);
        RegionId(self.regions.len() - 1)
    }

    /// 追加一组未标注区域, 返回它们的编号.
    pub fn extend<I: IntoIterator<Item = Region>>(&mut self, regions: I) -> Vec<RegionId> {
        regions.into_iter().map(|r| self.push(r)).collect()
    }

    /// 查询区域.
    #[inline]
    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id.0)
    }

    /// 查询标签.
    #[inline]
    pub fn label(&self, id: RegionId) -> Option<LabelCode> {
        self.labels.get(id.0).copied()
    }

    /// 所有区域, 与 [`Self::labels`] 一一对应.
    #[inline]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// 所有标签.
    #[inline]
    pub fn labels(&self) -> &[LabelCode] {
        &self.labels
    }

    /// 所有编号.
    pub fn ids(&self) -> impl ExactSizeIterator<Item = RegionId> {
        (0..self.len()).map(RegionId)
    }

    /// 迭代未删除的区域.
    pub fn live(&self) -> impl Iterator<Item = (RegionId, &Region, LabelCode)> {
        self.regions
            .iter()
            .zip(self.labels.iter())
            .enumerate()
            .filter(|(_, (_, l))| !l.is_deleted())
            .map(|(i, (r, l))| (RegionId(i), r, *l))
    }

    fn check(&self, id: RegionId) -> Result<(), StoreError> {
        match self.labels.get(id.0) {
            None => Err(StoreError::UnknownRegion(id)),
            Some(LabelCode::Deleted) => Err(StoreError::DeletedRegion(id)),
            Some(_) => Ok(()),
        }
    }

    /// 设置标签. 已删除的区域不能再设置.
    pub fn set_label(&mut self, id: RegionId, code: LabelCode) -> Result<(), StoreError> {
        self.check(id)?;
        self.labels[id.0] = code;
        Ok(())
    }

    /// 切换标签: 当前已是 `code` 时恢复为未标注, 否则设为 `code`. 返回新标签.
    pub fn toggle_label(&mut self, id: RegionId, code: LabelCode) -> Result<LabelCode, StoreError> {
        self.check(id)?;
        let next = if self.labels[id.0] == code {
            LabelCode::Unlabeled
        } else {
            code
        };
        self.labels[id.0] = next;
        Ok(next)
    }

    /// 删除区域 (标签置为 -1).
    pub fn delete(&mut self, id: RegionId) -> Result<(), StoreError> {
        self.check(id)?;
        self.labels[id.0] = LabelCode::Deleted;
        Ok(())
    }

    /// 记录一次二分的结果: 原区域标记为删除, 两个新区域作为未标注候选追加.
    pub fn apply_split(
        &mut self,
        id: RegionId,
        (a, b): (Region, Region),
    ) -> Result<(RegionId, RegionId), StoreError> {
        self.delete(id)?;
        Ok((self.push(a), self.push(b)))
    }

    /// 在 `image` 上二分区域 `id` 并记录结果. 二分失败时不修改任何状态.
    pub fn split(&mut self, image: &MicroImage, id: RegionId) -> Result<(RegionId, RegionId), StoreError> {
        self.check(id)?;
        let halves = split_region(image, &self.regions[id.0])?;
        self.apply_split(id, halves)
    }

    /// 拆分为区域和标签.
    #[inline]
    pub fn into_parts(self) -> (Vec<Region>, Vec<LabelCode>) {
        (self.regions, self.labels)
    }
}
