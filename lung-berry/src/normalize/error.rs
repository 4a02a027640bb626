//! 运行时错误.

use std::fmt::{Display, Formatter};

/// 批内颜色校正的前置条件错误. 出错时不会修改任何图像.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// 批次为空, 无法选择参考图像.
    EmptyBatch,

    /// 图像不足以做批内颜色校正 (至少需要 2 幅). 参数为实际图像个数.
    TooFewImages(usize),

    /// 参考图像序号越界. 参数依次为序号和批次大小.
    ReferenceOutOfRange(usize, usize),
}

impl Display for NormalizeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NormalizeError::EmptyBatch => write!(f, "empty image batch"),
            NormalizeError::TooFewImages(n) => {
                write!(f, "color correction needs at least 2 images, got {n}")
            }
            NormalizeError::ReferenceOutOfRange(i, n) => {
                write!(f, "reference index {i} out of range for a batch of {n}")
            }
        }
    }
}

impl std::error::Error for NormalizeError {}
