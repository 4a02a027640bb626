//! 邻域相关的轮廓提取算法操作.

mod core;

pub use self::core::{external_contours, trace_external_contour};

use crate::Idx2d;

/// 获得 `(h, w)` 的 4-邻居索引. 不检查越界.
#[inline]
pub(crate) fn neighbour4((h, w): Idx2d) -> [Idx2d; 4] {
    [
        (h.wrapping_sub(1), w),
        (h.saturating_add(1), w),
        (h, w.wrapping_sub(1)),
        (h, w.saturating_add(1)),
    ]
}

/// 获得 `(h, w)` 的 8-邻居索引. 不检查越界.
#[inline]
pub(crate) fn neighbour8((h, w): Idx2d) -> [Idx2d; 8] {
    [
        (h.wrapping_sub(1), w.wrapping_sub(1)),
        (h.wrapping_sub(1), w),
        (h.wrapping_sub(1), w.saturating_add(1)),
        (h, w.wrapping_sub(1)),
        (h, w.saturating_add(1)),
        (h.saturating_add(1), w.wrapping_sub(1)),
        (h.saturating_add(1), w),
        (h.saturating_add(1), w.saturating_add(1)),
    ]
}

/// Moore 邻域的 8 个方向 `(dh, dw)`, 从正西开始按 (屏幕上的) 顺时针排列.
pub(crate) const MOORE_OFFSETS: [(isize, isize); 8] = [
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
];

/// 从 `(h, w)` 沿 Moore 方向 `dir` 走一步. 走出左上边界时返回 `None`.
#[inline]
pub(crate) fn moore_step((h, w): Idx2d, dir: usize) -> Option<Idx2d> {
    let (dh, dw) = MOORE_OFFSETS[dir % 8];
    Some((h.checked_add_signed(dh)?, w.checked_add_signed(dw)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moore_directions_round_trip() {
        let center = (5, 5);
        for dir in 0..8 {
            let p = moore_step(center, dir).unwrap();
            assert!(neighbour8(center).contains(&p));
            // 相邻方向的两个邻居互相 8-相邻.
            let q = moore_step(center, dir + 1).unwrap();
            assert!(neighbour8(p).contains(&q));
        }
        assert_eq!(moore_step((0, 3), 2), None);
    }
}
