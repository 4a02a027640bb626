//! 图像预处理: 光照不均匀校正与批内颜色校正.
//!
//! 典型用法是对整批图像调用一次 [`preprocess_batch`]. 也可以分步调用:
//!
//! 1. 对每幅图像调用 [`non_uniformity_correction`];
//! 2. 对校正后的批次调用 [`find_color_correction_reference`] 选出参考图像;
//! 3. 以同一个参考序号调用 [`color_correction`].
//!
//! 参考序号必须对整批只计算一次. 用批次的子集重新计算会破坏批内一致性.

mod batch;
mod error;
mod illumination;
mod matching;
mod reference;

pub use batch::preprocess_batch;
pub use error::NormalizeError;
pub use illumination::non_uniformity_correction;
pub use matching::color_correction;
pub use reference::find_color_correction_reference;
