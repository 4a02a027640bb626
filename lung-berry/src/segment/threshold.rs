//! 各类阶段的阈值化.

use super::stage::Cutoff;
use crate::color::{rgb_to_hsv_f32, NamedColor};
use crate::consts::hsv::*;
use crate::consts::illumination::HISTOGRAM_BINS;
use crate::BinaryMask;
use ndarray::{Array2, ArrayView2, Zip};

/// 把 (模糊后的) 浮点 RGB 平面转换为浮点 HSV 平面.
pub fn hsv_planes(rgb: &[Array2<f32>; 3]) -> [Array2<f32>; 3] {
    let shape = rgb[0].dim();
    let mut ans = [(); 3].map(|_| Array2::<f32>::zeros(shape));
    let [h, s, v] = &mut ans;
    Zip::from(h)
        .and(s)
        .and(v)
        .and(&rgb[0])
        .and(&rgb[1])
        .and(&rgb[2])
        .for_each(|h, s, v, &r, &g, &b| {
            [*h, *s, *v] = rgb_to_hsv_f32(r, g, b);
        });
    ans
}

/// 属于 `colors` 中任一颜色的像素为前景. `colors` 为空时结果为全背景.
pub fn color_mask(hsv: &[Array2<f32>; 3], colors: &[NamedColor]) -> BinaryMask {
    let [h, s, v] = hsv;
    BinaryMask::from_fn(h.dim(), |pos| {
        let px = [h[pos], s[pos], v[pos]];
        colors.iter().any(|c| c.matches(px))
    })
}

/// Otsu 方法. 返回使类间方差最大的门限 `t`, 两类分别为 `<= t` 和 `> t`.
/// 常量平面返回其值.
pub fn otsu_threshold(plane: ArrayView2<f32>) -> u8 {
    let mut hist = [0u64; HISTOGRAM_BINS];
    for &v in plane.iter() {
        hist[v.round().clamp(0.0, 255.0) as usize] += 1;
    }
    let total: u64 = hist.iter().sum();
    if total == 0 {
        return 0;
    }
    let sum_all: f64 = hist.iter().enumerate().map(|(i, &c)| i as f64 * c as f64).sum();

    let mut best = (f64::NEG_INFINITY, 0u8);
    let mut w0 = 0u64;
    let mut sum0 = 0.0;
    for (t, &c) in hist.iter().enumerate() {
        w0 += c;
        sum0 += t as f64 * c as f64;
        let w1 = total - w0;
        if w0 == 0 {
            continue;
        }
        if w1 == 0 {
            break;
        }
        let m0 = sum0 / w0 as f64;
        let m1 = (sum_all - sum0) / w1 as f64;
        let between = w0 as f64 * w1 as f64 * (m0 - m1) * (m0 - m1);
        if between > best.0 {
            best = (between, t as u8);
        }
    }
    if best.0 == f64::NEG_INFINITY {
        // 只有一个灰度级.
        hist.iter().position(|&c| c > 0).unwrap_or(0) as u8
    } else {
        best.1
    }
}

/// 把门限规则换算成具体门限值.
pub fn resolve_cutoff(s: ArrayView2<f32>, cutoff: Cutoff) -> u8 {
    match cutoff {
        Cutoff::Fixed(c) => c,
        Cutoff::Otsu => otsu_threshold(s)
            .saturating_add(1)
            .max(SATURATION_CUTOFF_FLOOR),
    }
}

/// 饱和度不低于 `cutoff`, 且明度不低于 [`SATURATION_MIN_VALUE`] 的像素为前景.
pub fn saturation_mask(s: ArrayView2<f32>, v: ArrayView2<f32>, cutoff: u8) -> BinaryMask {
    BinaryMask::from_fn(s.dim(), |pos| {
        s[pos] >= cutoff as f32 && v[pos] >= SATURATION_MIN_VALUE as f32
    })
}

/// 值不低于 `threshold` 的像素为前景.
pub fn value_mask(v: ArrayView2<f32>, threshold: u8) -> BinaryMask {
    BinaryMask::from_fn(v.dim(), |pos| v[pos] >= threshold as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otsu_bimodal() {
        let plane = Array2::from_shape_fn((10, 10), |(h, _)| if h < 6 { 20.0 } else { 200.0 });
        let t = otsu_threshold(plane.view());
        assert!((20..200).contains(&t), "{t}");
        assert_eq!(otsu_threshold(Array2::from_elem((2, 2), 9.0).view()), 9);
    }

    #[test]
    fn test_otsu_cutoff_has_floor() {
        let plane = Array2::from_shape_fn((4, 4), |(h, _)| if h < 2 { 0.0 } else { 10.0 });
        assert_eq!(resolve_cutoff(plane.view(), Cutoff::Otsu), SATURATION_CUTOFF_FLOOR);
        assert_eq!(resolve_cutoff(plane.view(), Cutoff::Fixed(5)), 5);
    }

    #[test]
    fn test_color_mask() {
        let rgb = [
            Array2::from_shape_vec((1, 3), vec![230.0, 20.0, 250.0]).unwrap(),
            Array2::from_shape_vec((1, 3), vec![20.0, 220.0, 250.0]).unwrap(),
            Array2::from_shape_vec((1, 3), vec![20.0, 30.0, 245.0]).unwrap(),
        ];
        let hsv = hsv_planes(&rgb);
        let red = color_mask(&hsv, &[NamedColor::Red]);
        assert!(red.is_set((0, 0)));
        assert_eq!(red.count(), 1);
        let rg = color_mask(&hsv, &[NamedColor::Red, NamedColor::Green]);
        assert_eq!(rg.count(), 2);
        let white = color_mask(&hsv, &[NamedColor::White]);
        assert!(white.is_set((0, 2)));
        assert!(color_mask(&hsv, &[]).is_background());
    }
}
