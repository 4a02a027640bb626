use super::error::NormalizeError;
use super::reference::{rgb_histograms, ChannelHistograms};
use crate::consts::illumination::HISTOGRAM_BINS;
use crate::MicroImage;
use ndarray::{Array3, Axis};

/// 累积分布允许的浮点误差.
const CDF_EPS: f64 = 1e-12;

/// 以 `images[reference_index]` 为参考, 对整批图像做逐通道直方图匹配.
///
/// 参考图像原样返回. 其余图像的每个 RGB 通道都被映射到参考图像同一通道的分布上.
/// 结果与输入一一对应.
///
/// # 错误
///
/// * 图像少于 2 幅: [`NormalizeError::TooFewImages`].
/// * 参考序号越界: [`NormalizeError::ReferenceOutOfRange`].
///
/// 出错时不产生任何部分结果.
pub fn color_correction(
    images: &[MicroImage],
    reference_index: usize,
) -> Result<Vec<MicroImage>, NormalizeError> {
    if images.len() < 2 {
        return Err(NormalizeError::TooFewImages(images.len()));
    }
    if reference_index >= images.len() {
        return Err(NormalizeError::ReferenceOutOfRange(
            reference_index,
            images.len(),
        ));
    }

    let reference = rgb_histograms(&images[reference_index]);
    let ans = images
        .iter()
        .enumerate()
        .map(|(i, img)| {
            if i == reference_index {
                img.clone()
            } else {
                match_histograms(img, &reference)
            }
        })
        .collect();
    Ok(ans)
}

/// 把 `image` 的三通道分布映射到 `reference` 上.
pub(super) fn match_histograms(image: &MicroImage, reference: &ChannelHistograms) -> MicroImage {
    let source = rgb_histograms(image);
    let mut rgb: Array3<u8> = image.rgb().to_owned();
    for (c, mut plane) in rgb.axis_iter_mut(Axis(2)).enumerate() {
        let lut = matching_lut(&source[c], &reference[c]);
        plane.mapv_inplace(|p| lut[p as usize]);
    }
    image.with_rgb(rgb)
}

/// 查找表: `lut[v]` 是使 `cdf_ref[r] >= cdf_src[v]` 成立的最小 `r`.
fn matching_lut(source: &[f64], reference: &[f64]) -> [u8; HISTOGRAM_BINS] {
    let src_cdf = cumulative(source);
    let ref_cdf = cumulative(reference);
    let mut lut = [u8::MAX; HISTOGRAM_BINS];
    let mut r = 0;
    // 两条 CDF 都单调不减, 所以 r 只需向前推进.
    for (v, &target) in src_cdf.iter().enumerate() {
        while r < HISTOGRAM_BINS - 1 && ref_cdf[r] < target - CDF_EPS {
            r += 1;
        }
        lut[v] = r as u8;
    }
    lut
}

fn cumulative(hist: &[f64]) -> Vec<f64> {
    hist.iter()
        .scan(0.0, |acc, &x| {
            *acc += x;
            Some(*acc)
        })
        .collect()
}
