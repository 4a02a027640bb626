//! 标注状态与持久化的错误.

use super::store::RegionId;
use crate::split::SplitError;
use std::fmt::{Display, Formatter};

/// [`super::RegionStore`] 操作错误. 出错时存储保持不变.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// 编号不存在.
    UnknownRegion(RegionId),

    /// 区域已被删除.
    DeletedRegion(RegionId),

    /// 区域二分失败.
    Split(SplitError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::UnknownRegion(id) => write!(f, "unknown region #{}", id.index()),
            StoreError::DeletedRegion(id) => write!(f, "region #{} has been deleted", id.index()),
            StoreError::Split(e) => write!(f, "split failed: {e}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Split(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SplitError> for StoreError {
    fn from(e: SplitError) -> Self {
        StoreError::Split(e)
    }
}

/// 标注文件读写错误.
#[derive(Debug)]
pub enum PersistError {
    /// 底层 I/O 错误.
    IoError(std::io::Error),

    /// JSON 格式错误.
    JsonError(serde_json::Error),

    /// 某幅图像的候选区域与标签个数不一致.
    Lockstep {
        /// 图像名称.
        image: String,
        /// 候选区域个数.
        candidates: usize,
        /// 标签个数.
        labels: usize,
    },

    /// 某个候选区域的多边形为空.
    EmptyPolygon {
        /// 图像名称.
        image: String,
        /// 区域序号.
        index: usize,
    },
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistError::IoError(e) => write!(f, "I/O error: {e}"),
            PersistError::JsonError(e) => write!(f, "malformed annotation file: {e}"),
            PersistError::Lockstep {
                image,
                candidates,
                labels,
            } => write!(
                f,
                "image {image}: {candidates} candidates but {labels} labels"
            ),
            PersistError::EmptyPolygon { image, index } => {
                write!(f, "image {image}: candidate #{index} has no points")
            }
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistError::IoError(e) => Some(e),
            PersistError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PersistError {
    fn from(e: std::io::Error) -> Self {
        PersistError::IoError(e)
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(e: serde_json::Error) -> Self {
        PersistError::JsonError(e)
    }
}
