use std::path::Path;

use image::{ImageResult, RgbImage};
use ndarray::{s, Array2, Array3, ArrayView2, ArrayView3, Axis};

use crate::Idx2d;

pub mod blur;
pub mod color;
mod iter;
mod mask;
mod save;
mod window;

pub use iter::PosIter;
pub use mask::{BinaryMask, Connectivity};
pub use save::ImgWriteVis;
pub use window::IntensityWindow;

cfg_if::cfg_if! {
    if #[cfg(feature = "plot")] {
        mod plot;

        pub use plot::ImgDisplay;
    }
}

/// RGB 图像平面中各通道的序号.
pub mod channel {
    /// 红.
    pub const R: usize = 0;
    /// 绿.
    pub const G: usize = 1;
    /// 蓝.
    pub const B: usize = 2;
    /// 色相.
    pub const H: usize = 0;
    /// 饱和度.
    pub const S: usize = 1;
    /// 明度.
    pub const V: usize = 2;
}

/// 一幅多通道荧光显微图像, 同时保存 RGB 和 HSV 两种表示, 形状均为 `(高, 宽, 3)`.
///
/// HSV 按照 OpenCV 的 8-bit 约定存储, 见 [`color`].
///
/// 图像创建后不可变. 所有校正操作都会返回一幅新的图像.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MicroImage {
    rgb: Array3<u8>,
    hsv: Array3<u8>,
}

impl MicroImage {
    /// 从 `(高, 宽, 3)` 的 RGB 数据创建图像, HSV 数据由其推导.
    ///
    /// 如果第三维不是 3, 则程序 panic.
    pub fn from_rgb(rgb: Array3<u8>) -> Self {
        assert_eq!(rgb.dim().2, 3, "RGB 图像必须有 3 个通道");
        let mut hsv = Array3::zeros(rgb.dim());
        for (src, mut dst) in rgb.lanes(Axis(2)).into_iter().zip(hsv.lanes_mut(Axis(2))) {
            let [h, s, v] = color::rgb_to_hsv(src[0], src[1], src[2]);
            dst[0] = h;
            dst[1] = s;
            dst[2] = v;
        }
        Self { rgb, hsv }
    }

    /// 从 `(高, 宽, 3)` 的 HSV 数据创建图像, RGB 数据由其推导.
    ///
    /// 如果第三维不是 3, 则程序 panic.
    pub fn from_hsv(hsv: Array3<u8>) -> Self {
        assert_eq!(hsv.dim().2, 3, "HSV 图像必须有 3 个通道");
        let mut rgb = Array3::zeros(hsv.dim());
        for (src, mut dst) in hsv.lanes(Axis(2)).into_iter().zip(rgb.lanes_mut(Axis(2))) {
            let [r, g, b] = color::hsv_to_rgb(src[0], src[1], src[2]);
            dst[0] = r;
            dst[1] = g;
            dst[2] = b;
        }
        Self { rgb, hsv }
    }

    /// 逐像素以 `f((高, 宽)) -> [r, g, b]` 创建图像. 主要用于合成测试图像.
    pub fn from_rgb_fn(shape: Idx2d, mut f: impl FnMut(Idx2d) -> [u8; 3]) -> Self {
        let (h, w) = shape;
        let mut rgb = Array3::zeros((h, w, 3));
        for pos in PosIter::new(shape) {
            let px = f(pos);
            for c in 0..3 {
                rgb[(pos.0, pos.1, c)] = px[c];
            }
        }
        Self::from_rgb(rgb)
    }

    /// 从 `image` crate 的 RGB 图像创建.
    pub fn from_rgb_image(img: &RgbImage) -> Self {
        let (w, h) = img.dimensions();
        Self::from_rgb_fn((h as usize, w as usize), |(y, x)| img.get_pixel(x as u32, y as u32).0)
    }

    /// 打开本地图像文件. 任何 `image` crate 支持的格式都会被转换为 8-bit RGB.
    pub fn open<P: AsRef<Path>>(path: P) -> ImageResult<Self> {
        let img = image::open(path.as_ref())?.to_rgb8();
        Ok(Self::from_rgb_image(&img))
    }

    /// 转换为 `image` crate 的 RGB 图像.
    pub fn to_rgb_image(&self) -> RgbImage {
        let (h, w) = self.shape();
        RgbImage::from_fn(w as u32, h as u32, |x, y| {
            let (y, x) = (y as usize, x as usize);
            image::Rgb([self.rgb[(y, x, 0)], self.rgb[(y, x, 1)], self.rgb[(y, x, 2)]])
        })
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        let (h, w, _) = self.rgb.dim();
        (h, w)
    }

    /// 图像的高.
    #[inline]
    pub fn height(&self) -> usize {
        self.shape().0
    }

    /// 图像的宽.
    #[inline]
    pub fn width(&self) -> usize {
        self.shape().1
    }

    /// 图像的像素个数.
    #[inline]
    pub fn size(&self) -> usize {
        let (h, w) = self.shape();
        h * w
    }

    /// 获得 RGB 数据的一份不可变 shallow copy.
    #[inline]
    pub fn rgb(&self) -> ArrayView3<'_, u8> {
        self.rgb.view()
    }

    /// 获得 HSV 数据的一份不可变 shallow copy.
    #[inline]
    pub fn hsv(&self) -> ArrayView3<'_, u8> {
        self.hsv.view()
    }

    /// 位于 `pos` 的 RGB 像素.
    #[inline]
    pub fn rgb_at(&self, (h, w): Idx2d) -> [u8; 3] {
        [self.rgb[(h, w, 0)], self.rgb[(h, w, 1)], self.rgb[(h, w, 2)]]
    }

    /// 位于 `pos` 的 HSV 像素.
    #[inline]
    pub fn hsv_at(&self, (h, w): Idx2d) -> [u8; 3] {
        [self.hsv[(h, w, 0)], self.hsv[(h, w, 1)], self.hsv[(h, w, 2)]]
    }

    /// 第 `c` 个 RGB 通道平面, 见 [`channel`].
    #[inline]
    pub fn rgb_plane(&self, c: usize) -> ArrayView2<'_, u8> {
        self.rgb.index_axis(Axis(2), c)
    }

    /// 色相平面.
    #[inline]
    pub fn hue(&self) -> ArrayView2<'_, u8> {
        self.hsv.index_axis(Axis(2), channel::H)
    }

    /// 饱和度平面.
    #[inline]
    pub fn saturation(&self) -> ArrayView2<'_, u8> {
        self.hsv.index_axis(Axis(2), channel::S)
    }

    /// 明度平面.
    #[inline]
    pub fn value(&self) -> ArrayView2<'_, u8> {
        self.hsv.index_axis(Axis(2), channel::V)
    }

    /// 以 `value` 替换明度平面, 色相和饱和度保持不变, RGB 重新推导.
    ///
    /// 如果形状不一致, 则程序 panic.
    pub fn with_value(&self, value: &Array2<u8>) -> MicroImage {
        assert_eq!(value.dim(), self.shape(), "明度平面形状不符");
        let mut hsv = self.hsv.clone();
        hsv.index_axis_mut(Axis(2), channel::V).assign(value);
        Self::from_hsv(hsv)
    }

    /// 以 `rgb` 替换 RGB 平面, HSV 重新推导.
    ///
    /// 如果形状不一致, 则程序 panic.
    pub fn with_rgb(&self, rgb: Array3<u8>) -> MicroImage {
        assert_eq!(rgb.dim(), self.rgb.dim(), "RGB 平面形状不符");
        Self::from_rgb(rgb)
    }

    /// 裁剪出以 `origin` 为左上角, 大小为 `shape` 的子图像.
    ///
    /// 窗口会被截断到图像范围内, 因此结果可能比 `shape` 小.
    pub fn crop(&self, (h0, w0): Idx2d, (h, w): Idx2d) -> MicroImage {
        let (img_h, img_w) = self.shape();
        let h_end = (h0 + h).min(img_h);
        let w_end = (w0 + w).min(img_w);
        let h0 = h0.min(h_end);
        let w0 = w0.min(w_end);
        Self {
            rgb: self.rgb.slice(s![h0..h_end, w0..w_end, ..]).to_owned(),
            hsv: self.hsv.slice(s![h0..h_end, w0..w_end, ..]).to_owned(),
        }
    }
}

/// 同一批次中的一组命名图像, 按名称升序排列.
///
/// 批次顺序决定参考图像的选择 (平局时取序号最小者), 因此排序在创建时完成.
#[derive(Debug, Clone, Default)]
pub struct ImageBatch {
    names: Vec<String>,
    images: Vec<MicroImage>,
}

impl ImageBatch {
    /// 从 `(名称, 图像)` 对创建批次. 结果按名称排序.
    pub fn new<I: IntoIterator<Item = (String, MicroImage)>>(items: I) -> Self {
        let mut items: Vec<_> = items.into_iter().collect();
        items.sort_by(|a, b| a.0.cmp(&b.0));
        let (names, images) = items.into_iter().unzip();
        Self { names, images }
    }

    /// 批次中的图像个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// 批次是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// 所有图像的名称.
    #[inline]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// 所有图像.
    #[inline]
    pub fn images(&self) -> &[MicroImage] {
        &self.images
    }

    /// 按顺序迭代 `(名称, 图像)`.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &MicroImage)> {
        self.names.iter().map(String::as_str).zip(self.images.iter())
    }

    /// 拆分为名称和图像.
    #[inline]
    pub fn into_parts(self) -> (Vec<String>, Vec<MicroImage>) {
        (self.names, self.images)
    }
}

/// 经过光照校正和批内颜色校正的图像批次.
///
/// 同时记录该批次选出的参考图像, 后续对同一批次的校正应显式复用它.
#[derive(Debug, Clone)]
pub struct CorrectedBatch {
    names: Vec<String>,
    images: Vec<MicroImage>,
    reference_index: usize,
}

impl CorrectedBatch {
    pub(crate) fn new(names: Vec<String>, images: Vec<MicroImage>, reference_index: usize) -> Self {
        debug_assert_eq!(names.len(), images.len());
        debug_assert!(reference_index < images.len());
        Self {
            names,
            images,
            reference_index,
        }
    }

    /// 参考图像在批次中的序号.
    #[inline]
    pub fn reference_index(&self) -> usize {
        self.reference_index
    }

    /// 参考图像的名称.
    #[inline]
    pub fn reference_name(&self) -> &str {
        &self.names[self.reference_index]
    }

    /// 批次中的图像个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// 批次是否为空. 校正后的批次至少有两幅图像, 因此总是 `false`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// 校正后的所有图像.
    #[inline]
    pub fn images(&self) -> &[MicroImage] {
        &self.images
    }

    /// 按名称获取校正后的图像.
    pub fn get(&self, name: &str) -> Option<&MicroImage> {
        self.names.iter().position(|n| n == name).map(|i| &self.images[i])
    }

    /// 按顺序迭代 `(名称, 校正后图像)`.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &MicroImage)> {
        self.names.iter().map(String::as_str).zip(self.images.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_micro_image_planes() {
        let img = MicroImage::from_rgb_fn((2, 3), |(h, w)| {
            if (h + w) % 2 == 0 {
                [255, 0, 0]
            } else {
                [0, 0, 255]
            }
        });
        assert_eq!(img.shape(), (2, 3));
        assert_eq!(img.hsv_at((0, 0)), [0, 255, 255]);
        assert_eq!(img.hsv_at((0, 1)), [120, 255, 255]);
        assert_eq!(img.value().iter().copied().min(), Some(255));
        assert_eq!(img.rgb_plane(channel::B)[(1, 0)], 255);
    }

    #[test]
    fn test_with_value_keeps_chroma() {
        let img = MicroImage::from_rgb_fn((1, 2), |_| [200, 100, 50]);
        let dim = img.with_value(&Array2::from_elem((1, 2), 100));
        assert_eq!(dim.hue(), img.hue());
        assert_eq!(dim.saturation(), img.saturation());
        assert_eq!(dim.value()[(0, 1)], 100);
        assert_eq!(dim.rgb_at((0, 0))[0], 100);
    }

    #[test]
    fn test_crop_is_clamped() {
        let img = MicroImage::from_rgb_fn((4, 5), |(h, w)| [h as u8, w as u8, 0]);
        let sub = img.crop((2, 3), (10, 10));
        assert_eq!(sub.shape(), (2, 2));
        assert_eq!(sub.rgb_at((0, 0)), [2, 3, 0]);
        assert_eq!(img.crop((9, 9), (2, 2)).size(), 0);
    }

    #[test]
    fn test_batch_sorted_by_name() {
        let px = |v| MicroImage::from_rgb_fn((1, 1), move |_| [v, v, v]);
        let batch = ImageBatch::new([
            ("b.png".to_string(), px(2)),
            ("a.png".to_string(), px(1)),
            ("c.png".to_string(), px(3)),
        ]);
        assert_eq!(batch.names(), ["a.png", "b.png", "c.png"]);
        assert_eq!(batch.images()[0].rgb_at((0, 0)), [1, 1, 1]);
    }
}
