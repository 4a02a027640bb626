//! 可分离高斯模糊.

use super::MicroImage;
use ndarray::{Array2, ArrayView2, Axis};

/// 由核边长推导高斯 sigma, 与 OpenCV 的规则一致: `σ = 0.3·((k−1)/2 − 1) + 0.8`.
#[inline]
pub fn sigma_for_kernel(k: u32) -> f32 {
    0.3 * ((k.max(1) as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// 边长为 `k` 的归一化一维高斯核. 偶数边长按 `k - 1` 处理.
pub fn kernel_from_size(k: u32) -> Vec<f32> {
    let radius = (k.max(1) as usize - 1) / 2;
    kernel(sigma_for_kernel(k), radius)
}

/// 以 `sigma` 构造归一化一维高斯核, 半径为 `ceil(3σ)`.
pub fn kernel_from_sigma(sigma: f32) -> Vec<f32> {
    let radius = (3.0 * sigma).ceil().max(1.0) as usize;
    kernel(sigma, radius)
}

fn kernel(sigma: f32, radius: usize) -> Vec<f32> {
    let denom = 2.0 * sigma * sigma;
    let mut ans: Vec<f32> = (0..=2 * radius)
        .map(|i| {
            let d = i as f32 - radius as f32;
            (-(d * d) / denom).exp()
        })
        .collect();
    let sum: f32 = ans.iter().sum();
    ans.iter_mut().for_each(|v| *v /= sum);
    ans
}

/// 边界处理方式.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Border {
    /// `gfedcb|abcdefgh|gfedcba`, 即 OpenCV 的 `BORDER_REFLECT_101`.
    Reflect101,

    /// 关于边界像素的点对称延拓: `f(−k) = 2f(0) − f(k)`. 线性斜坡在边界处保持线性.
    PointReflect,
}

/// 把越界下标 `i` 按 reflect-101 规则折回 `[0, n)`.
#[inline]
fn reflect101(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let period = 2 * (n as isize - 1);
    let m = i.rem_euclid(period);
    if m < n as isize {
        m as usize
    } else {
        (period - m) as usize
    }
}

/// 一维卷积. `out` 与 `src` 等长.
fn convolve_1d(src: &[f32], k: &[f32], border: Border, out: &mut [f32]) {
    let n = src.len();
    let r = (k.len() / 2) as isize;
    for (i, slot) in out.iter_mut().enumerate() {
        let mut acc = 0.0;
        for (j, &kv) in k.iter().enumerate() {
            let pos = i as isize + j as isize - r;
            let v = match border {
                Border::Reflect101 => src[reflect101(pos, n)],
                Border::PointReflect => {
                    if (0..n as isize).contains(&pos) {
                        src[pos as usize]
                    } else if pos < 0 {
                        2.0 * src[0] - src[reflect101(pos, n)]
                    } else {
                        2.0 * src[n - 1] - src[reflect101(pos, n)]
                    }
                }
            };
            acc += kv * v;
        }
        *slot = acc;
    }
}

/// 以水平核 `kx` 和垂直核 `ky` 对二维平面做可分离卷积.
pub fn convolve_separable(
    plane: ArrayView2<f32>,
    kx: &[f32],
    ky: &[f32],
    border: Border,
) -> Array2<f32> {
    let (h, w) = plane.dim();
    if h == 0 || w == 0 {
        return plane.to_owned();
    }
    let mut tmp = Array2::<f32>::zeros((h, w));
    let mut line = vec![0.0; w.max(h)];
    let mut out_line = vec![0.0; w.max(h)];
    for (src, mut dst) in plane.axis_iter(Axis(0)).zip(tmp.axis_iter_mut(Axis(0))) {
        line[..w].iter_mut().zip(src.iter()).for_each(|(a, b)| *a = *b);
        convolve_1d(&line[..w], kx, border, &mut out_line[..w]);
        dst.iter_mut().zip(out_line[..w].iter()).for_each(|(a, b)| *a = *b);
    }
    let mut ans = Array2::<f32>::zeros((h, w));
    for (src, mut dst) in tmp.axis_iter(Axis(1)).zip(ans.axis_iter_mut(Axis(1))) {
        line[..h].iter_mut().zip(src.iter()).for_each(|(a, b)| *a = *b);
        convolve_1d(&line[..h], ky, border, &mut out_line[..h]);
        dst.iter_mut().zip(out_line[..h].iter()).for_each(|(a, b)| *a = *b);
    }
    ans
}

/// 以 `(宽, 高)` 大小的核做 reflect-101 高斯模糊.
pub fn gaussian_blur(plane: ArrayView2<f32>, (kw, kh): (u32, u32)) -> Array2<f32> {
    convolve_separable(plane, &kernel_from_size(kw), &kernel_from_size(kh), Border::Reflect101)
}

/// 以给定的 `(σx, σy)` 做 reflect-101 高斯模糊.
pub fn gaussian_blur_sigma(plane: ArrayView2<f32>, (sx, sy): (f32, f32)) -> Array2<f32> {
    convolve_separable(plane, &kernel_from_sigma(sx), &kernel_from_sigma(sy), Border::Reflect101)
}

/// 把图像的三个 RGB 平面分别模糊, 返回浮点平面.
pub fn blur_rgb(image: &MicroImage, kernel: (u32, u32)) -> [Array2<f32>; 3] {
    [0, 1, 2].map(|c| gaussian_blur(image.rgb_plane(c).mapv(|v| v as f32).view(), kernel))
}

/// `P₁ + (P₁ − P₂)`, 截断到 `[0, 255]`. 用于增强边界对比度.
pub fn sharpen(p1: &Array2<f32>, p2: &Array2<f32>) -> Array2<f32> {
    let mut ans = p1.clone();
    ans.zip_mut_with(p2, |a, &b| *a = (2.0 * *a - b).clamp(0.0, 255.0));
    ans
}
