//! 多边形光栅化.
//!
//! 足迹 = 中心严格位于多边形内部的像素 (奇偶扫描线规则, 半开边)
//! ∪ 所有边经过的像素 (Bresenham). 这样退化多边形 (单点, 线段) 也有非空足迹.

use super::{Polygon, Rect};
use crate::{BinaryMask, Point2d};

/// 多边形的像素足迹, 保存为其包围盒内的局部掩码.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Footprint {
    bbox: Rect,
    mask: BinaryMask,
}

impl Footprint {
    /// 光栅化多边形. 空多边形得到空足迹.
    pub fn rasterize(polygon: &Polygon) -> Self {
        let Some(bbox) = polygon.bbox() else {
            return Self {
                bbox: Rect::new(0, 0, 0, 0),
                mask: BinaryMask::new((0, 0)),
            };
        };
        let mut fp = Self {
            bbox,
            mask: BinaryMask::new((bbox.h as usize, bbox.w as usize)),
        };

        let pts = polygon.points();
        let n = pts.len();
        if n >= 3 {
            let mut crossings: Vec<f64> = Vec::with_capacity(4);
            for y in bbox.y..bbox.bottom() {
                crossings.clear();
                for i in 0..n {
                    let (a, b) = (pts[i], pts[(i + 1) % n]);
                    if (a.1 <= y && y < b.1) || (b.1 <= y && y < a.1) {
                        let t = (y - a.1) as f64 / (b.1 - a.1) as f64;
                        crossings.push(a.0 as f64 + t * (b.0 - a.0) as f64);
                    }
                }
                crossings.sort_unstable_by(f64::total_cmp);
                for pair in crossings.chunks_exact(2) {
                    let (lo, hi) = (pair[0].ceil() as i32, pair[1].floor() as i32);
                    for x in lo..=hi {
                        fp.set((x, y));
                    }
                }
            }
        }
        for i in 0..n {
            for p in bresenham(pts[i], pts[(i + 1) % n]) {
                fp.set(p);
            }
        }
        fp
    }

    #[inline]
    fn set(&mut self, (x, y): Point2d) {
        if self.bbox.contains((x, y)) {
            self.mask
                .set(((y - self.bbox.y) as usize, (x - self.bbox.x) as usize), true);
        }
    }

    /// 足迹的包围盒.
    #[inline]
    pub fn bbox(&self) -> Rect {
        self.bbox
    }

    /// 包围盒内的局部掩码, 形状为 `(bbox.h, bbox.w)`.
    #[inline]
    pub fn mask(&self) -> &BinaryMask {
        &self.mask
    }

    /// 足迹像素个数.
    #[inline]
    pub fn area(&self) -> usize {
        self.mask.count()
    }

    /// 点 `(x, y)` 是否属于足迹.
    #[inline]
    pub fn contains(&self, (x, y): Point2d) -> bool {
        self.bbox.contains((x, y))
            && self
                .mask
                .is_set(((y - self.bbox.y) as usize, (x - self.bbox.x) as usize))
    }

    /// 与另一足迹共有的像素个数.
    pub fn intersection_area(&self, other: &Footprint) -> usize {
        let Some(r) = self.bbox.intersection(&other.bbox) else {
            return 0;
        };
        let mut cnt = 0;
        for y in r.y..r.bottom() {
            for x in r.x..r.right() {
                if self.contains((x, y)) && other.contains((x, y)) {
                    cnt += 1;
                }
            }
        }
        cnt
    }

    /// 把足迹画到整幅图像的掩码上, 超出图像的部分被丢弃.
    pub fn paint_into(&self, mask: &mut BinaryMask) {
        let Some(r) = self.bbox.clip_to(mask.shape()) else {
            return;
        };
        for y in r.y..r.bottom() {
            for x in r.x..r.right() {
                if self.contains((x, y)) {
                    mask.set((y as usize, x as usize), true);
                }
            }
        }
    }
}

/// Bresenham 直线, 包含两个端点.
pub(crate) fn bresenham((x0, y0): Point2d, (x1, y1): Point2d) -> Vec<Point2d> {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x0, y0);
    let mut ans = Vec::with_capacity((dx - dy) as usize + 1);
    loop {
        ans.push((x, y));
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    ans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bresenham() {
        assert_eq!(bresenham((0, 0), (3, 0)), vec![(0, 0), (1, 0), (2, 0), (3, 0)]);
        assert_eq!(bresenham((2, 2), (0, 0)), vec![(2, 2), (1, 1), (0, 0)]);
        assert_eq!(bresenham((1, 1), (1, 1)), vec![(1, 1)]);
        assert_eq!(bresenham((0, 0), (4, 2)).len(), 5);
    }

    #[test]
    fn test_rasterize_degenerate() {
        assert_eq!(Polygon::new(vec![(5, 5)]).footprint().area(), 1);
        assert_eq!(Polygon::new(vec![(0, 0), (0, 4)]).footprint().area(), 5);
        assert_eq!(Polygon::default().footprint().area(), 0);
    }

    #[test]
    fn test_rasterize_triangle_and_diamond() {
        // 直角三角形: 每行 y 覆盖 x ∈ [0, y].
        let tri = Polygon::new(vec![(0, 0), (4, 4), (0, 4)]);
        assert_eq!(tri.footprint().area(), 1 + 2 + 3 + 4 + 5);

        let diamond = Polygon::new(vec![(2, 0), (4, 2), (2, 4), (0, 2)]);
        let fp = diamond.footprint();
        assert_eq!(fp.area(), 1 + 3 + 5 + 3 + 1);
        assert!(fp.contains((2, 2)));
        assert!(!fp.contains((0, 0)));
    }

    #[test]
    fn test_intersection_and_paint() {
        let a = Polygon::new(vec![(0, 0), (3, 0), (3, 3), (0, 3)]).footprint();
        let b = Polygon::new(vec![(2, 2), (5, 2), (5, 5), (2, 5)]).footprint();
        assert_eq!(a.intersection_area(&b), 4);
        assert_eq!(b.intersection_area(&a), 4);

        let mut m = BinaryMask::new((3, 3));
        b.paint_into(&mut m);
        assert_eq!(m.count(), 1);
        assert!(m.is_set((2, 2)));
    }
}
