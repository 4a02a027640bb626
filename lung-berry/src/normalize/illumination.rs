use crate::blur::{convolve_separable, kernel_from_sigma, Border};
use crate::consts::illumination::*;
use crate::{IntensityWindow, MicroImage};
use ndarray::Array2;

/// 光照不均匀校正.
///
/// 只处理明度 (V) 平面: 以大尺度高斯模糊估计缓变背景 `B`, 再计算
/// `V · mean(B) / B`, 四舍五入并截断回 `[0, 255]`. 色相和饱和度保持不变.
///
/// 背景估计的 sigma 为图像短边的 [`BACKGROUND_SIGMA_RATIO`] 倍 (不小于
/// [`BACKGROUND_MIN_SIGMA`]). 边界以点对称延拓, 因此线性光照梯度会被完全消除.
pub fn non_uniformity_correction(image: &MicroImage) -> MicroImage {
    if image.size() == 0 {
        return image.clone();
    }
    let v = image.value().mapv(|p| p as f32);
    let background = estimate_background(&v);
    let mean = background.mean().unwrap_or(BACKGROUND_FLOOR);

    const WINDOW: IntensityWindow = IntensityWindow::full_u8();
    let mut corrected = Array2::<u8>::zeros(v.dim());
    ndarray::Zip::from(&mut corrected)
        .and(&v)
        .and(&background)
        .for_each(|out, &v, &bg| {
            *out = WINDOW.eval_round(v * mean / bg).unwrap_or(0);
        });
    image.with_value(&corrected)
}

/// 估计缓变背景. 结果不小于 [`BACKGROUND_FLOOR`].
pub(super) fn estimate_background(v: &Array2<f32>) -> Array2<f32> {
    let (h, w) = v.dim();
    let sigma = (h.min(w) as f32 * BACKGROUND_SIGMA_RATIO).max(BACKGROUND_MIN_SIGMA);
    let k = kernel_from_sigma(sigma);
    let mut bg = convolve_separable(v.view(), &k, &k, Border::PointReflect);
    bg.mapv_inplace(|x| x.max(BACKGROUND_FLOOR));
    bg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coefficient_of_variation(img: &MicroImage) -> f64 {
        let v = img.value().mapv(|p| p as f64);
        let mean = v.mean().unwrap();
        let var = v.mapv(|x| (x - mean) * (x - mean)).mean().unwrap();
        var.sqrt() / mean
    }

    fn gray(v: f32) -> [u8; 3] {
        let v = v.round() as u8;
        [v, v, v]
    }

    #[test]
    fn test_flattens_linear_gradients() {
        let images = [
            MicroImage::from_rgb_fn((64, 64), |(_, w)| gray(60.0 + 2.0 * w as f32)),
            MicroImage::from_rgb_fn((64, 80), |(h, _)| gray(200.0 - 1.5 * h as f32)),
            MicroImage::from_rgb_fn((72, 64), |(h, w)| gray(40.0 + h as f32 + w as f32)),
        ];
        for img in images.iter() {
            assert!(coefficient_of_variation(img) > 0.1);
            let flat = non_uniformity_correction(img);
            assert_eq!(flat.shape(), img.shape());
            let cv = coefficient_of_variation(&flat);
            assert!(cv < 0.02, "cv = {cv}");
        }
    }

    #[test]
    fn test_chroma_untouched() {
        let img = MicroImage::from_rgb_fn((32, 32), |(h, w)| {
            let v = (80 + 3 * w) as u8;
            if (h / 8 + w / 8) % 2 == 0 {
                [v, v / 4, v / 4]
            } else {
                [v / 4, v, v / 2]
            }
        });
        let flat = non_uniformity_correction(&img);
        assert_eq!(flat.hue(), img.hue());
        assert_eq!(flat.saturation(), img.saturation());
    }

    #[test]
    fn test_uniform_image_is_identity() {
        let img = MicroImage::from_rgb_fn((20, 30), |_| [90, 140, 40]);
        assert_eq!(non_uniformity_correction(&img).value(), img.value());
    }
}
