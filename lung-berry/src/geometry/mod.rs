//! 多边形, 包围盒和区域.
//!
//! 坐标约定: 多边形顶点是 `(x, y)` = `(列, 行)` 的整数点, 即像素中心. 这与以
//! `(高, 宽)` 索引的 [`crate::Idx2d`] 顺序相反, 转换只发生在本模块中.

mod raster;

pub use raster::Footprint;

use crate::{Idx2d, Point2d};
use serde::{Deserialize, Serialize};

/// 整数包围盒. `(x, y)` 是左上角像素, `w` 和 `h` 以像素计, 包含两端.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    /// 左上角列坐标.
    pub x: i32,
    /// 左上角行坐标.
    pub y: i32,
    /// 宽度 (像素).
    pub w: i32,
    /// 高度 (像素).
    pub h: i32,
}

impl Rect {
    /// 创建包围盒.
    #[inline]
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// 以包含两端的角点 `(x0, y0)`, `(x1, y1)` 创建包围盒.
    #[inline]
    pub fn from_corners((x0, y0): Point2d, (x1, y1): Point2d) -> Self {
        Self::new(x0.min(x1), y0.min(y1), x0.abs_diff(x1) as i32 + 1, y0.abs_diff(y1) as i32 + 1)
    }

    /// 最右一列之后的列坐标 (不包含).
    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    /// 最下一行之后的行坐标 (不包含).
    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// 是否不包含任何像素.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// 像素个数.
    #[inline]
    pub fn area(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.w as usize * self.h as usize
        }
    }

    /// 是否包含点 `(x, y)`.
    #[inline]
    pub fn contains(&self, (x, y): Point2d) -> bool {
        self.x <= x && x < self.right() && self.y <= y && y < self.bottom()
    }

    /// 两者的交集. 不相交时返回 `None`.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let r = Rect::new(
            x,
            y,
            self.right().min(other.right()) - x,
            self.bottom().min(other.bottom()) - y,
        );
        (!r.is_empty()).then_some(r)
    }

    /// 截断到 `(高, 宽)` 大小的图像中. 完全在图像外时返回 `None`.
    pub fn clip_to(&self, (h, w): Idx2d) -> Option<Rect> {
        self.intersection(&Rect::new(0, 0, w as i32, h as i32))
    }

    /// 以 `(起点, 形状)` 的 `(高, 宽)` 索引形式表示. 要求包围盒位于非负坐标区域.
    #[inline]
    pub fn to_window(&self) -> (Idx2d, Idx2d) {
        debug_assert!(self.x >= 0 && self.y >= 0);
        (
            (self.y.max(0) as usize, self.x.max(0) as usize),
            (self.h.max(0) as usize, self.w.max(0) as usize),
        )
    }
}

/// 有序整数点序列构成的闭合多边形, 首尾隐式相连.
///
/// 序列化为 `[[x, y], ...]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon {
    points: Vec<Point2d>,
}

impl From<Vec<Point2d>> for Polygon {
    fn from(points: Vec<Point2d>) -> Self {
        Self { points }
    }
}

impl Polygon {
    /// 从顶点序列创建多边形.
    #[inline]
    pub fn new(points: Vec<Point2d>) -> Self {
        Self { points }
    }

    /// 从 [`crate::eight::trace_external_contour`] 给出的 `(高, 宽)` 轮廓像素序列创建多边形.
    ///
    /// 同方向的连续步长会被合并为一条边, 光栅化结果不变.
    pub fn from_contour(contour: &[Idx2d]) -> Self {
        let pts: Vec<Point2d> = contour.iter().map(|&(h, w)| (w as i32, h as i32)).collect();
        if pts.len() <= 2 {
            return Self { points: pts };
        }
        let n = pts.len();
        let step = |i: usize| {
            let (a, b) = (pts[i], pts[(i + 1) % n]);
            (b.0 - a.0, b.1 - a.1)
        };
        let points = (0..n)
            .filter(|&i| step((i + n - 1) % n) != step(i))
            .map(|i| pts[i])
            .collect::<Vec<_>>();
        // 所有步长都相同只可能出现在退化输入上, 此时保留原样.
        if points.is_empty() {
            Self { points: pts }
        } else {
            Self { points }
        }
    }

    /// 顶点序列.
    #[inline]
    pub fn points(&self) -> &[Point2d] {
        &self.points
    }

    /// 顶点个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 是否没有顶点.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 平移 `(dx, dy)`.
    pub fn translate(&self, dx: i32, dy: i32) -> Polygon {
        Polygon::new(self.points.iter().map(|&(x, y)| (x + dx, y + dy)).collect())
    }

    /// 顶点的包围盒. 空多边形返回 `None`.
    pub fn bbox(&self) -> Option<Rect> {
        let x0 = self.points.iter().map(|p| p.0).min()?;
        let x1 = self.points.iter().map(|p| p.0).max()?;
        let y0 = self.points.iter().map(|p| p.1).min()?;
        let y1 = self.points.iter().map(|p| p.1).max()?;
        Some(Rect::from_corners((x0, y0), (x1, y1)))
    }

    /// 光栅化得到的像素足迹.
    #[inline]
    pub fn footprint(&self) -> Footprint {
        Footprint::rasterize(self)
    }
}

/// 一个候选区域: 闭合多边形及其派生的足迹面积和包围盒.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Region {
    polygon: Polygon,
    area: usize,
    bbox: Rect,
}

impl Region {
    /// 从多边形创建区域. 空多边形返回 `None`.
    pub fn new(polygon: Polygon) -> Option<Self> {
        let footprint = polygon.footprint();
        let bbox = polygon.bbox()?;
        Some(Self {
            area: footprint.area(),
            polygon,
            bbox,
        })
    }

    /// 从轮廓像素序列创建区域.
    #[inline]
    pub fn from_contour(contour: &[Idx2d]) -> Option<Self> {
        Self::new(Polygon::from_contour(contour))
    }

    /// 区域的多边形.
    #[inline]
    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    /// 取出多边形.
    #[inline]
    pub fn into_polygon(self) -> Polygon {
        self.polygon
    }

    /// 足迹面积 (像素个数).
    #[inline]
    pub fn area(&self) -> usize {
        self.area
    }

    /// 包围盒.
    #[inline]
    pub fn bbox(&self) -> Rect {
        self.bbox
    }

    /// 平移 `(dx, dy)`. 面积不变.
    pub fn translate(&self, dx: i32, dy: i32) -> Region {
        Region {
            polygon: self.polygon.translate(dx, dy),
            area: self.area,
            bbox: Rect::new(self.bbox.x + dx, self.bbox.y + dy, self.bbox.w, self.bbox.h),
        }
    }

    /// 光栅化得到的像素足迹.
    #[inline]
    pub fn footprint(&self) -> Footprint {
        self.polygon.footprint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_intersection() {
        let a = Rect::new(0, 0, 4, 4);
        let b = Rect::new(2, 3, 5, 5);
        assert_eq!(a.intersection(&b), Some(Rect::new(2, 3, 2, 1)));
        assert_eq!(a.intersection(&Rect::new(4, 0, 1, 1)), None);
        assert!(a.contains((3, 3)));
        assert!(!a.contains((4, 3)));
        assert_eq!(b.clip_to((5, 5)), Some(Rect::new(2, 3, 3, 2)));
    }

    #[test]
    fn test_polygon_json_shape() {
        let p = Polygon::new(vec![(1, 2), (3, 4), (5, 6)]);
        let s = serde_json::to_string(&p).unwrap();
        assert_eq!(s, "[[1,2],[3,4],[5,6]]");
        let back: Polygon = serde_json::from_str(&s).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_polygon_from_contour_compresses() {
        // 3x3 正方形的轮廓.
        let contour = [(1, 1), (1, 2), (1, 3), (2, 3), (3, 3), (3, 2), (3, 1), (2, 1)];
        let p = Polygon::from_contour(&contour);
        assert_eq!(p.points(), &[(1, 1), (3, 1), (3, 3), (1, 3)]);
        let r = Region::new(p).unwrap();
        assert_eq!(r.area(), 9);
        assert_eq!(r.bbox(), Rect::new(1, 1, 3, 3));
    }

    #[test]
    fn test_region_translate() {
        let r = Region::new(Polygon::new(vec![(0, 0), (4, 0), (4, 2), (0, 2)])).unwrap();
        assert_eq!(r.area(), 15);
        let t = r.translate(10, 20);
        assert_eq!(t.area(), 15);
        assert_eq!(t.bbox(), Rect::new(10, 20, 5, 3));
        assert_eq!(t.footprint().area(), 15);
        assert!(Region::new(Polygon::default()).is_none());
    }
}
