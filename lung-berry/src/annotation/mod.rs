//! 标注状态与持久化.
//!
//! 每幅图像的候选区域和标签保存在 [`RegionStore`] 中, 以稳定的 [`RegionId`] 索引.
//! 一批图像的标注以 [`AnnotationSet`] 读写, 格式为
//! `{图像名称: {"candidates": [[[x, y], ...], ...], "labels": [整数, ...]}}`.

mod error;
mod label;
mod persist;
mod store;

pub use error::{PersistError, StoreError};
pub use label::{InvalidLabelCode, LabelCode};
pub use persist::{AnnotationSet, ImageAnnotation};
pub use store::{RegionId, RegionStore};
