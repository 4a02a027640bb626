use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::num::NonZeroU16;

/// 区域的标签编码.
///
/// 与整数编码一一对应: `0` 未标注, `-1` 已删除, `0 < n <= u16::MAX` 指向该图像
/// 有效结构标签 (升序) 的第 `n - 1` 项. 序列化为整数.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum LabelCode {
    /// 未标注的候选区域.
    #[default]
    Unlabeled,

    /// 已删除 (例如被二分后的原区域).
    Deleted,

    /// 结构标签.
    Structure(NonZeroU16),
}

/// 非法的整数标签编码 (小于 -1 或大于 `u16::MAX`).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InvalidLabelCode(pub i32);

impl Display for InvalidLabelCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid label code {}", self.0)
    }
}

impl std::error::Error for InvalidLabelCode {}

impl TryFrom<i32> for LabelCode {
    type Error = InvalidLabelCode;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(LabelCode::Unlabeled),
            -1 => Ok(LabelCode::Deleted),
            n => u16::try_from(n)
                .ok()
                .and_then(NonZeroU16::new)
                .map(LabelCode::Structure)
                .ok_or(InvalidLabelCode(n)),
        }
    }
}

impl From<LabelCode> for i32 {
    fn from(code: LabelCode) -> i32 {
        match code {
            LabelCode::Unlabeled => 0,
            LabelCode::Deleted => -1,
            LabelCode::Structure(n) => i32::from(n.get()),
        }
    }
}

impl LabelCode {
    /// 有效结构标签列表中第 `index` 项 (从 0 开始) 的编码. 超出编码范围时返回 `None`.
    #[inline]
    pub fn structure(index: usize) -> Option<LabelCode> {
        let n = u16::try_from(index.checked_add(1)?).ok()?;
        NonZeroU16::new(n).map(LabelCode::Structure)
    }

    /// 结构标签在有效结构标签列表中的序号.
    #[inline]
    pub fn structure_index(&self) -> Option<usize> {
        match *self {
            LabelCode::Structure(n) => Some(usize::from(n.get()) - 1),
            _ => None,
        }
    }

    /// 是否已删除.
    #[inline]
    pub fn is_deleted(&self) -> bool {
        matches!(self, LabelCode::Deleted)
    }

    /// 是否是结构标签.
    #[inline]
    pub fn is_structure(&self) -> bool {
        self.structure_index().is_some()
    }

    /// 在有效结构标签列表 `labels` 中查找名称.
    pub fn name<'a>(&self, labels: &'a [String]) -> Option<&'a str> {
        self.structure_index()
            .and_then(|i| labels.get(i))
            .map(String::as_str)
    }
}
