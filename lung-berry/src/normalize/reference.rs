use super::error::NormalizeError;
use crate::consts::illumination::HISTOGRAM_BINS;
use crate::MicroImage;
use ordered_float::OrderedFloat;

/// 一幅图像三个 RGB 通道的归一化直方图 (每个通道的和为 1).
pub(super) type ChannelHistograms = [Vec<f64>; 3];

/// 计算 RGB 三通道的归一化直方图. 空图像的直方图全为 0.
pub(super) fn rgb_histograms(image: &MicroImage) -> ChannelHistograms {
    let mut ans = [
        vec![0.0; HISTOGRAM_BINS],
        vec![0.0; HISTOGRAM_BINS],
        vec![0.0; HISTOGRAM_BINS],
    ];
    for (c, hist) in ans.iter_mut().enumerate() {
        for &p in image.rgb_plane(c).iter() {
            hist[p as usize] += 1.0;
        }
    }
    let size = image.size();
    if size > 0 {
        let inv = 1.0 / size as f64;
        ans.iter_mut()
            .flat_map(|h| h.iter_mut())
            .for_each(|x| *x *= inv);
    }
    ans
}

/// 选择批内颜色校正的参考图像.
///
/// 参考图像是三通道归一化直方图与批平均直方图的 L1 距离最小的那一幅.
/// 距离相同时取序号最小者, 因此对同一有序批次的结果是确定的.
///
/// 只有一幅图像时返回 `Ok(0)`. 批次为空时返回 [`NormalizeError::EmptyBatch`].
pub fn find_color_correction_reference(images: &[MicroImage]) -> Result<usize, NormalizeError> {
    if images.is_empty() {
        return Err(NormalizeError::EmptyBatch);
    }

    let hists: Vec<ChannelHistograms> = images.iter().map(rgb_histograms).collect();
    let n = hists.len() as f64;
    let mut mean = [
        vec![0.0; HISTOGRAM_BINS],
        vec![0.0; HISTOGRAM_BINS],
        vec![0.0; HISTOGRAM_BINS],
    ];
    for h in hists.iter() {
        for (m, c) in mean.iter_mut().zip(h.iter()) {
            m.iter_mut().zip(c.iter()).for_each(|(m, x)| *m += x / n);
        }
    }

    // 距离相同时 `min_by_key` 保留先出现的图像.
    let best = hists
        .iter()
        .map(|h| l1_distance(h, &mean))
        .enumerate()
        .inspect(|(i, d)| log::debug!("image #{i}: histogram distance to batch mean = {d:.6}"))
        .min_by_key(|&(_, d)| OrderedFloat(d))
        .map_or(0, |(i, _)| i);
    Ok(best)
}

fn l1_distance(a: &ChannelHistograms, b: &ChannelHistograms) -> f64 {
    a.iter()
        .zip(b.iter())
        .flat_map(|(x, y)| x.iter().zip(y.iter()))
        .map(|(x, y)| (x - y).abs())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(rgb: [u8; 3]) -> MicroImage {
        MicroImage::from_rgb_fn((8, 8), |_| rgb)
    }

    #[test]
    fn test_histograms_are_normalized() {
        let img = MicroImage::from_rgb_fn((4, 4), |(h, _)| if h < 2 { [10, 20, 30] } else { [10, 40, 30] });
        let [r, g, b] = rgb_histograms(&img);
        assert_eq!(r[10], 1.0);
        assert_eq!(g[20], 0.5);
        assert_eq!(g[40], 0.5);
        assert_eq!(b[30], 1.0);
        assert!((g.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_picks_the_middle_image() {
        // 半暗半亮的图像最接近批平均.
        let dark = flat([20, 20, 20]);
        let bright = flat([220, 220, 220]);
        let mixed = MicroImage::from_rgb_fn((8, 8), |(_, w)| if w < 4 { [20; 3] } else { [220; 3] });
        let batch = vec![dark, bright, mixed];
        assert_eq!(find_color_correction_reference(&batch), Ok(2));
    }

    #[test]
    fn test_deterministic_and_ties_to_lowest() {
        let batch = vec![flat([10, 10, 10]), flat([200, 200, 200])];
        assert_eq!(find_color_correction_reference(&batch), Ok(0));
        assert_eq!(find_color_correction_reference(&batch), Ok(0));

        let same = vec![flat([50, 60, 70]); 3];
        assert_eq!(find_color_correction_reference(&same), Ok(0));
    }

    #[test]
    fn test_empty_and_singleton() {
        assert_eq!(find_color_correction_reference(&[]), Err(NormalizeError::EmptyBatch));
        assert_eq!(find_color_correction_reference(&[flat([1, 2, 3])]), Ok(0));
    }
}
