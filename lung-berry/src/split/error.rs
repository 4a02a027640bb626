//! 区域二分的错误.

use std::fmt::{Display, Formatter};

/// 单次二分请求的失败. 不影响其它区域.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitError {
    /// 区域在图像内的像素过少, 无法构造稳定的图.
    DegenerateRegion {
        /// 区域在图像内的足迹像素数.
        pixels: usize,
        /// 要求的最少像素数.
        min: usize,
    },

    /// 谱嵌入无法区分两个簇 (例如所有像素的嵌入值相同).
    Inseparable,
}

impl Display for SplitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitError::DegenerateRegion { pixels, min } => write!(
                f,
                "region has {pixels} pixels inside the image, at least {min} are needed"
            ),
            SplitError::Inseparable => write!(f, "region cannot be separated into two clusters"),
        }
    }
}

impl std::error::Error for SplitError {}
