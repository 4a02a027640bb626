#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 为发育期肺组织的多通道荧光显微图像提供结构候选区域生成,
//! 区域二分和评估的基础算法.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 该 crate 只负责算法核心. 图像目录浏览, 远程图像服务, 本体 (ontology)
//!   查询和曲线绘制都由调用方负责, 本 crate 只规定它们交换的数据格式.
//! 2. 调用方违反参数约定 (如负数核大小, 形状不一致的图像) 时, 程序会直接 panic,
//!   而不会导致内存错误. As what Rust promises.
//! 3. 所有算法都是同步、单线程、无全局状态的. 调用方需要后台运行时,
//!   请使用 [`worker`] 模块提供的通道式交接.
//!
//! # 开发计划
//!
//! ### 光照不均匀校正与批内颜色校正 ✅
//!
//! 只修改 HSV 的明度 (V) 通道. 参考图像每批只选一次, 然后显式传给每次校正.
//!
//! 实现位于 `lung-berry/src/normalize`.
//!
//! ### 多阶段候选区域生成 ✅
//!
//! 各阶段 (颜色 / 饱和度) 互相独立, 结果取并集且不去重.
//! 可选的残差阶段负责捕获所有配置都没覆盖到的区域.
//!
//! 实现位于 `lung-berry/src/segment`.
//!
//! ### 8-邻域外轮廓追踪 ✅
//!
//! Moore 邻域追踪, 以 Jacob 停止准则结束.
//!
//! 实现位于 `lung-berry/src/eight`.
//!
//! ### 基于谱聚类的区域二分 ✅
//!
//! 像素强度图 + Lanczos 求 Fiedler 向量 + 一维 2-means.
//!
//! 实现位于 `lung-berry/src/split`.
//!
//! ### IoU 匹配与逐类别 ROC / PR 评估 ✅
//!
//! 实现位于 `lung-berry/src/eval`.
//!
//! ### 标注状态与持久化 ✅
//!
//! 区域与标签以稳定的 `RegionId` 并行存储, JSON 持久化.
//!
//! 实现位于 `lung-berry/src/annotation`.
//!
//! ### 小功能 ✅
//!
//! 1. 进度汇报接口, 回调出错不会中断流水线. ✅
//! 2. 后台任务交接, 同一时刻只允许一个任务. ✅
//! 3. 掩码 / 图像的可视化保存. ✅

/// 二维索引 `(高, 宽)`, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 图像平面上的整数点 `(x, y)`, 即 `(列, 行)`. 可以为负 (平移过程中).
pub type Point2d = (i32, i32);

type Area2d = Vec<Idx2d>;
type Areas2d = Vec<Area2d>;

/// 图像及掩码等基础数据结构.
mod data;

pub use data::{
    BinaryMask, Connectivity, CorrectedBatch, ImageBatch, ImgWriteVis, IntensityWindow,
    MicroImage,
};

pub use data::{blur, channel, color, PosIter};

#[cfg(feature = "plot")]
pub use data::ImgDisplay;

pub mod consts;

pub mod eight;

pub mod geometry;

pub mod normalize;

pub mod segment;

pub mod split;

pub mod eval;

pub mod annotation;

pub mod progress;

pub mod worker;

pub mod prelude;
