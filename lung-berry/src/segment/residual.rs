use super::threshold::value_mask;
use crate::blur::gaussian_blur;
use crate::consts::residual::*;
use crate::{BinaryMask, MicroImage};
use serde::{Deserialize, Serialize};

/// 残差阶段参数.
///
/// 残差阶段在所有配置阶段之后运行: 模糊明度平面, 以低门限阈值化,
/// 扣除已被前面候选区域认领的像素 (向外扩张 `claim_margin`), 再在剩余部分中提取区域.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResidualParams {
    /// 模糊核大小 `(宽, 高)`.
    pub blur_kernel: (u32, u32),

    /// 明度门限.
    pub value_threshold: u8,

    /// 已认领区域的扩张像素数.
    pub claim_margin: usize,

    /// 区域最大面积.
    pub max_size: Option<usize>,
}

impl Default for ResidualParams {
    fn default() -> Self {
        Self {
            blur_kernel: RESIDUAL_BLUR_KERNEL,
            value_threshold: RESIDUAL_VALUE_THRESHOLD,
            claim_margin: RESIDUAL_CLAIM_MARGIN,
            max_size: None,
        }
    }
}

/// 计算残差掩码.
pub(crate) fn residual_mask(
    image: &MicroImage,
    claimed: &BinaryMask,
    params: &ResidualParams,
) -> BinaryMask {
    let v = image.value().mapv(|p| p as f32);
    let v = gaussian_blur(v.view(), params.blur_kernel);
    let mut mask = value_mask(v.view(), params.value_threshold);
    mask.subtract(&dilate(claimed, params.claim_margin));
    mask
}

/// 以 `(2r+1) × (2r+1)` 方形结构元素膨胀.
fn dilate(mask: &BinaryMask, r: usize) -> BinaryMask {
    if r == 0 {
        return mask.clone();
    }
    let (h, w) = mask.shape();
    let mut ans = BinaryMask::new((h, w));
    for (ph, pw) in mask.foreground_pos::<Vec<_>>() {
        for nh in ph.saturating_sub(r)..(ph + r + 1).min(h) {
            for nw in pw.saturating_sub(r)..(pw + r + 1).min(w) {
                ans.set((nh, nw), true);
            }
        }
    }
    ans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dilate() {
        let mut m = BinaryMask::new((5, 5));
        m.set((0, 0), true);
        m.set((4, 4), true);
        assert_eq!(dilate(&m, 1).count(), 8);
        assert_eq!(dilate(&m, 0), m);
    }

    #[test]
    fn test_residual_mask_excludes_claimed() {
        let img = MicroImage::from_rgb_fn((12, 12), |(_, w)| if w < 6 { [200; 3] } else { [0; 3] });
        let params = ResidualParams {
            blur_kernel: (1, 1),
            claim_margin: 1,
            ..Default::default()
        };
        let free = residual_mask(&img, &BinaryMask::new((12, 12)), &params);
        assert_eq!(free.count(), 72);

        let claimed = BinaryMask::from_fn((12, 12), |(h, w)| h < 3 && w < 6);
        let rest = residual_mask(&img, &claimed, &params);
        // 扩张后扣除前 4 行.
        assert_eq!(rest.count(), 72 - 4 * 6);
    }
}
