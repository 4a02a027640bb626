use super::{moore_step, MOORE_OFFSETS};
use crate::{BinaryMask, Connectivity, Idx2d};

/// 从 `start` 出发, 以 Moore 邻域追踪 `start` 所在 8-连通前景区域的外轮廓.
/// 返回首尾相连 (首元素不在末尾重复) 的 8-相邻轮廓像素序列, 按屏幕顺时针排列.
///
/// `start` 必须是该区域按行优先顺序的第一个像素, 这样它的西侧邻居一定是背景.
/// 孤立像素的轮廓只包含它自己. 宽度为 1 的部分会被来回经过, 因此同一像素可能出现多次.
///
/// 停止准则 (Jacob): 再次从 `start` 走向第二个轮廓像素时停止,
/// 此时追踪状态与第一步完全相同.
pub fn trace_external_contour(mask: &BinaryMask, start: Idx2d) -> Vec<Idx2d> {
    debug_assert!(mask.is_set(start));
    debug_assert!(start.1 == 0 || !mask.is_set((start.0, start.1 - 1)));

    let mut ans = vec![start];
    let mut cur = start;
    // 回溯像素相对于 `cur` 的方向. 起点从正西进入.
    let mut back = 0usize;
    let mut second: Option<Idx2d> = None;

    loop {
        let found = (1..=8).map(|k| (back + k) % 8).find_map(|d| {
            moore_step(cur, d)
                .filter(|p| mask.is_set(*p))
                .map(|p| (d, p))
        });
        let Some((dir, next)) = found else {
            // 孤立像素.
            break;
        };

        if cur == start {
            match second {
                None => second = Some(next),
                Some(s) if s == next => break,
                _ => {}
            }
        }

        // 新的回溯像素是顺时针扫描中紧挨在 `next` 之前的那个邻居, 它一定与 `next` 8-相邻.
        back = backtrack_direction(cur, dir, next);
        cur = next;
        ans.push(cur);
    }

    // 最后一步回到了起点.
    if ans.len() > 1 && ans.last() == Some(&start) {
        ans.pop();
    }
    ans
}

/// 求 `cur` 在 `dir - 1` 方向上的邻居相对于 `next` 的 Moore 方向.
/// 该邻居可能落在图像左上边界之外, 因此用有符号坐标计算.
fn backtrack_direction(cur: Idx2d, dir: usize, next: Idx2d) -> usize {
    let (dh, dw) = MOORE_OFFSETS[(dir + 7) % 8];
    let rel = (
        cur.0 as isize + dh - next.0 as isize,
        cur.1 as isize + dw - next.1 as isize,
    );
    MOORE_OFFSETS.iter().position(|&o| o == rel).unwrap_or(0)
}

/// 提取掩码中每个 8-连通前景区域的外轮廓. 区域按其第一个像素的行优先顺序排列.
///
/// 内部空洞不产生轮廓.
pub fn external_contours(mask: &BinaryMask) -> Vec<Vec<Idx2d>> {
    mask.foreground_areas(Connectivity::Eight)
        .into_iter()
        .filter_map(|area| area.first().copied())
        .map(|start| trace_external_contour(mask, start))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from(rows: &[&str]) -> BinaryMask {
        BinaryMask::from_fn((rows.len(), rows[0].len()), |(i, j)| {
            rows[i].as_bytes()[j] == b'#'
        })
    }

    fn is_n8_neighbouring((a, b): Idx2d, (c, d): Idx2d) -> bool {
        matches!((a.abs_diff(c), b.abs_diff(d)), (1, 0) | (0, 1) | (1, 1))
    }

    #[test]
    fn test_trace_square() {
        let m = mask_from(&[
            ".....", //
            ".###.",
            ".###.",
            ".###.",
            ".....",
        ]);
        let c = trace_external_contour(&m, (1, 1));
        assert_eq!(
            c,
            vec![(1, 1), (1, 2), (1, 3), (2, 3), (3, 3), (3, 2), (3, 1), (2, 1)]
        );
    }

    #[test]
    fn test_trace_touching_border() {
        let m = mask_from(&[
            "##", //
            "##",
        ]);
        let c = trace_external_contour(&m, (0, 0));
        assert_eq!(c, vec![(0, 0), (0, 1), (1, 1), (1, 0)]);
    }

    #[test]
    fn test_trace_single_pixel_and_line() {
        let m = mask_from(&["...", ".#.", "..."]);
        assert_eq!(trace_external_contour(&m, (1, 1)), vec![(1, 1)]);

        let m = mask_from(&["###"]);
        assert_eq!(
            trace_external_contour(&m, (0, 0)),
            vec![(0, 0), (0, 1), (0, 2), (0, 1)]
        );
    }

    #[test]
    fn test_trace_closes_and_is_connected() {
        let m = mask_from(&[
            "..#.....", //
            ".###..#.",
            "#####.##",
            ".#.#####",
            ".#...#..",
        ]);
        let contours = external_contours(&m);
        assert_eq!(contours.len(), 1);
        let c = &contours[0];
        for pair in c.windows(2) {
            assert!(is_n8_neighbouring(pair[0], pair[1]));
        }
        assert!(is_n8_neighbouring(c[0], c[c.len() - 1]));
        assert!(c.iter().all(|p| m.is_set(*p)));
        for extreme in [(0, 2), (2, 0), (4, 1), (4, 5), (1, 6), (2, 7), (3, 7)] {
            assert!(c.contains(&extreme), "{extreme:?} 不在轮廓上");
        }
    }

    #[test]
    fn test_external_contours_multiple() {
        let m = mask_from(&[
            "##...", //
            "##...",
            "...#.",
            "....#",
        ]);
        let contours = external_contours(&m);
        assert_eq!(contours.len(), 2);
        assert_eq!(contours[0].len(), 4);
        assert_eq!(contours[1], vec![(2, 3), (3, 4)]);
    }
}
