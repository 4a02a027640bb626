use crate::Idx2d;

/// 行优先的矩形窗口索引迭代器.
///
/// 迭代 `[h0, h0 + h) × [w0, w0 + w)` 范围内的所有索引. 对整幅图像迭代时窗口原点为
/// `(0, 0)`. 手写该结构而不是用 `flat_map` 组合, 是因为后者的迭代器对象要大得多,
/// 而掩码操作会频繁构造它.
#[derive(Debug, Clone)]
pub struct PosIter {
    cur_h: usize,
    cur_w: usize,
    h0: usize,
    w0: usize,
    h_end: usize,
    w_end: usize,
}

impl PosIter {
    /// 迭代形状为 `(h, w)` 的整幅图像.
    #[inline]
    pub fn new(shape: Idx2d) -> Self {
        Self::window((0, 0), shape)
    }

    /// 迭代以 `(h0, w0)` 为左上角, 大小为 `(h, w)` 的窗口.
    #[inline]
    pub fn window((h0, w0): Idx2d, (h, w): Idx2d) -> Self {
        Self {
            cur_h: h0,
            cur_w: w0,
            h0,
            w0,
            h_end: h0 + h,
            w_end: w0 + w,
        }
    }
}

impl Iterator for PosIter {
    type Item = Idx2d;

    fn next(&mut self) -> Option<Self::Item> {
        if self.h_end == self.h0 || self.w_end == self.w0 || self.cur_h >= self.h_end {
            return None;
        }
        let ret_pos = (self.cur_h, self.cur_w);
        if self.cur_w + 1 == self.w_end {
            self.cur_w = self.w0;
            self.cur_h += 1;
        } else {
            self.cur_w += 1;
        }
        Some(ret_pos)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.h_end == self.h0 || self.w_end == self.w0 || self.cur_h >= self.h_end {
            return (0, Some(0));
        }
        let width = self.w_end - self.w0;
        let left = (self.h_end - self.cur_h) * width - (self.cur_w - self.w0);
        (left, Some(left))
    }
}

impl ExactSizeIterator for PosIter {}
