use super::iter::PosIter;
use crate::consts::gray::*;
use crate::eight::{neighbour4, neighbour8};
use crate::{Area2d, Areas2d, Idx2d};
use ndarray::iter::Iter;
use ndarray::{Array2, ArrayView2, Ix2};
use std::collections::VecDeque;
use std::ops::{Index, IndexMut};

/// 像素相邻规则.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Connectivity {
    /// 上下左右 4-相邻.
    Four,

    /// 包括对角线的 8-相邻.
    Eight,
}

/// 拥有所有权的二维二值掩码, 以 `(高, 宽)` 索引.
///
/// 前景像素值为 [`MASK_FOREGROUND`], 背景像素值为 [`MASK_BACKGROUND`].
/// 通过 `IndexMut` 直接写入其它值是调用方的责任, 读取时一切非零值都被视为前景.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryMask {
    data: Array2<u8>,
}

impl Index<Idx2d> for BinaryMask {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx2d> for BinaryMask {
    #[inline]
    fn index_mut(&mut self, index: Idx2d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl BinaryMask {
    /// 创建给定形状 `(高, 宽)` 的全背景掩码.
    #[inline]
    pub fn new(shape: Idx2d) -> Self {
        Self {
            data: Array2::from_elem(shape, MASK_BACKGROUND),
        }
    }

    /// 从任意 `u8` 数组创建掩码, 非零值被视为前景.
    pub fn from_array(data: Array2<u8>) -> Self {
        Self {
            data: data.mapv(|p| if is_foreground(p) { MASK_FOREGROUND } else { MASK_BACKGROUND }),
        }
    }

    /// 逐像素以谓词 `f` 创建掩码.
    pub fn from_fn(shape: Idx2d, mut f: impl FnMut(Idx2d) -> bool) -> Self {
        Self {
            data: Array2::from_shape_fn(shape, |pos| {
                if f(pos) {
                    MASK_FOREGROUND
                } else {
                    MASK_BACKGROUND
                }
            }),
        }
    }

    /// 获得底层数据的一份不可变 shallow copy.
    #[inline]
    pub fn array_view(&self) -> ArrayView2<u8> {
        self.data.view()
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array2<u8> {
        self.data
    }

    /// 获取可以迭代掩码像素的迭代器.
    #[inline]
    pub fn iter(&self) -> Iter<'_, u8, Ix2> {
        self.data.iter()
    }

    /// 掩码的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// 掩码的高.
    #[inline]
    pub fn height(&self) -> usize {
        self.shape().0
    }

    /// 掩码的宽.
    #[inline]
    pub fn width(&self) -> usize {
        self.shape().1
    }

    /// 掩码的像素个数.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 判断一个索引是否合法 (未越界).
    #[inline]
    pub fn check(&self, (h, w): Idx2d) -> bool {
        let (h_len, w_len) = self.shape();
        h < h_len && w < w_len
    }

    /// 获取给定位置的像素值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<&u8> {
        self.data.get(pos)
    }

    /// 给定位置是否为前景. 越界视为背景.
    #[inline]
    pub fn is_set(&self, pos: Idx2d) -> bool {
        matches!(self.get(pos), Some(&p) if is_foreground(p))
    }

    /// 将给定位置设为前景 (`true`) 或背景 (`false`).
    #[inline]
    pub fn set(&mut self, pos: Idx2d, on: bool) {
        self.data[pos] = if on { MASK_FOREGROUND } else { MASK_BACKGROUND };
    }

    /// 统计前景像素个数.
    #[inline]
    pub fn count(&self) -> usize {
        self.data.iter().filter(|p| is_foreground(**p)).count()
    }

    /// 该掩码是否为全背景?
    #[inline]
    pub fn is_background(&self) -> bool {
        self.data.iter().copied().all(is_background)
    }

    /// 以行优先规则, 获取能迭代掩码所有索引的迭代器.
    #[inline]
    pub fn pos_iter(&self) -> PosIter {
        PosIter::new(self.shape())
    }

    /// 以行优先规则, 获取所有前景像素的索引.
    pub fn foreground_pos<B: FromIterator<Idx2d>>(&self) -> B {
        self.data
            .indexed_iter()
            .filter_map(|(pos, &p)| is_foreground(p).then_some(pos))
            .collect()
    }

    /// 获得 `pos` 的邻域像素索引. 保证返回的索引都不越界.
    pub fn neighbour_positions(&self, pos: Idx2d, conn: Connectivity) -> Vec<Idx2d> {
        match conn {
            Connectivity::Four => neighbour4(pos).into_iter().filter(|p| self.check(*p)).collect(),
            Connectivity::Eight => neighbour8(pos).into_iter().filter(|p| self.check(*p)).collect(),
        }
    }

    /// 将 `it` 中的每个索引对应的像素设为前景 (`true`) 或背景 (`false`).
    pub fn fill_batch<I: IntoIterator<Item = Idx2d>>(&mut self, it: I, on: bool) {
        for pos in it.into_iter() {
            self.set(pos, on);
        }
    }

    /// 从 `self` 中去除 `other` 的前景. 两者形状必须一致.
    pub fn subtract(&mut self, other: &BinaryMask) {
        assert_eq!(self.shape(), other.shape(), "掩码形状不符");
        self.data.zip_mut_with(&other.data, |a, &b| {
            if is_foreground(b) {
                *a = MASK_BACKGROUND;
            }
        });
    }

    /// 按照 `conn` 相邻规则获取所有前景区域.
    #[inline]
    pub fn foreground_areas(&self, conn: Connectivity) -> Areas2d {
        self.areas_from_local(self.pos_iter(), conn, is_foreground)
    }

    /// 按照 `conn` 相邻规则获取所有背景区域.
    #[inline]
    pub fn background_areas(&self, conn: Connectivity) -> Areas2d {
        self.areas_from_local(self.pos_iter(), conn, is_background)
    }

    /// 按照 `conn` 相邻规则获取所有区域, 但区域的起点范围由 `it` 指定.
    /// 两个像素 `p1` 和 `p2` 属于同一个区域, 当且仅当存在一条从 `p1` 到 `p2`
    /// 的相邻路径, 且路径上的所有像素 (包括 `p1` 和 `p2`) 都满足谓词 `pred`.
    ///
    /// 区域按其第一个像素在 `it` 中出现的顺序排列, 区域内像素按 BFS 顺序排列.
    pub fn areas_from_local<I: IntoIterator<Item = Idx2d>>(
        &self,
        it: I,
        conn: Connectivity,
        pred: fn(u8) -> bool,
    ) -> Areas2d {
        let mut ans = Areas2d::with_capacity(1);
        let mut bfs_q = VecDeque::with_capacity(4);
        let mut visited = Array2::from_elem(self.shape(), false);

        for pos in it.into_iter() {
            if visited[pos] || !pred(self[pos]) {
                continue;
            }
            visited[pos] = true;
            bfs_q.push_back(pos);
            let mut this_area = Area2d::with_capacity(1);
            while let Some(cur) = bfs_q.pop_front() {
                this_area.push(cur);
                for next in self.neighbour_positions(cur, conn) {
                    if !visited[next] && pred(self[next]) {
                        visited[next] = true;
                        bfs_q.push_back(next);
                    }
                }
            }
            ans.push(this_area);
        }
        ans
    }

    /// 裁剪出以 `origin` 为左上角, 大小为 `shape` 的子掩码. 越界部分视为背景.
    pub fn crop(&self, (h0, w0): Idx2d, shape: Idx2d) -> BinaryMask {
        BinaryMask::from_fn(shape, |(h, w)| self.is_set((h0 + h, w0 + w)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from(rows: &[&str]) -> BinaryMask {
        let h = rows.len();
        let w = rows[0].len();
        BinaryMask::from_fn((h, w), |(i, j)| rows[i].as_bytes()[j] == b'#')
    }

    #[test]
    fn test_areas_connectivity() {
        let m = mask_from(&[
            "#...", //
            ".#..",
            "....",
            "..##",
        ]);
        assert_eq!(m.foreground_areas(Connectivity::Four).len(), 3);
        assert_eq!(m.foreground_areas(Connectivity::Eight).len(), 2);
        assert_eq!(m.count(), 4);
    }

    #[test]
    fn test_background_areas_and_holes() {
        let m = mask_from(&[
            "#####", //
            "#...#",
            "#####",
        ]);
        let bg = m.background_areas(Connectivity::Four);
        assert_eq!(bg.len(), 1);
        assert_eq!(bg[0].len(), 3);
        assert_eq!(bg[0], vec![(1, 1), (1, 2), (1, 3)]);
    }

    #[test]
    fn test_subtract_crop() {
        let mut a = mask_from(&["##..", "##.."]);
        let b = mask_from(&[".##.", "...."]);
        a.subtract(&b);
        assert_eq!(a.count(), 3);

        let c = a.crop((1, 1), (2, 2));
        assert_eq!(c.shape(), (2, 2));
        assert!(c.is_set((0, 0)));
        assert_eq!(c.count(), 1);
    }

    #[test]
    fn test_from_array_normalizes() {
        let m = BinaryMask::from_array(Array2::from_shape_vec((1, 3), vec![0, 7, 255]).unwrap());
        assert_eq!(m[(0, 1)], MASK_FOREGROUND);
        assert!(!m.is_set((0, 0)));
        assert!(!m.is_set((5, 5)));
    }
}
