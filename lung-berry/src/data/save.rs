//! 图像的持久化存储.

use super::{BinaryMask, IntensityWindow, MicroImage};
use image::ImageResult;
use ndarray::Array2;
use std::path::Path;

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
///
/// `ImgWriteVis` trait 的意图是, 图像将以 "可视化友好" 的方式保存, 而不是 "as is"
/// 的方式. 对于 [`BinaryMask`], 前景为白色, 背景为黑色; 对于浮点平面,
/// 在保存时会用其最小值和最大值构成的窗口规范化.
pub trait ImgWriteVis {
    /// 按照一定的可视化规则将图片保存到 `path` 路径.
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

/// 按原样保存 RGB 平面.
impl ImgWriteVis for MicroImage {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        self.to_rgb_image().save(path)
    }
}

/// 前景为白色, 背景为黑色.
impl ImgWriteVis for BinaryMask {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        use crate::consts::gray::{BLACK, WHITE};
        let (height, width) = self.shape();
        let mut buf = image::GrayImage::new(width as u32, height as u32);
        for (h, w) in self.pos_iter() {
            let gray = if self.is_set((h, w)) { WHITE } else { BLACK };
            buf.put_pixel(w as u32, h as u32, image::Luma([gray]));
        }
        buf.save(path)
    }
}

/// 以 `[min, max]` 为窗口保存, 非有限值保存为黑色. 常量平面整体保存为黑色.
impl ImgWriteVis for Array2<f32> {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let (lo, hi) = self
            .iter()
            .filter(|v| v.is_finite())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let window = IntensityWindow::from_bounds(lo, hi);
        let (height, width) = self.dim();
        let mut buf = image::GrayImage::new(width as u32, height as u32);
        for ((h, w), &v) in self.indexed_iter() {
            let gray = window.and_then(|win| win.eval(v)).unwrap_or(0);
            buf.put_pixel(w as u32, h as u32, image::Luma([gray]));
        }
        buf.save(path)
    }
}
