//! 通用常量.
//!
//! 所有可调的默认值都集中在这里, 算法实现中不出现魔数.

/// 单通道掩码颜色.
pub mod gray {
    /// 掩码中背景的像素值.
    pub const MASK_BACKGROUND: u8 = 0;

    /// 掩码中前景的像素值.
    pub const MASK_FOREGROUND: u8 = 255;

    /// 单通道黑色.
    pub const BLACK: u8 = 0b_0000_0000;

    /// 单通道暗灰色.
    pub const DARK_GRAY: u8 = 0b_0100_0000;

    /// 单通道灰色.
    pub const GRAY: u8 = 0b_1000_0000;

    /// 单通道白色.
    pub const WHITE: u8 = 0b_1111_1111;

    /// 像素是否是前景?
    #[inline]
    pub const fn is_foreground(p: u8) -> bool {
        p != MASK_BACKGROUND
    }

    /// 像素是否是背景?
    #[inline]
    pub const fn is_background(p: u8) -> bool {
        p == MASK_BACKGROUND
    }
}

/// HSV 颜色空间相关常量. 与 OpenCV 的 8-bit 约定一致:
/// H ∈ \[0, 180), S ∈ \[0, 255\], V ∈ \[0, 255\].
pub mod hsv {
    /// 色相的取值个数. 色相值 `h` 满足 `0 <= h < HUE_RANGE`.
    pub const HUE_RANGE: u8 = 180;

    /// 颜色阶段中, 像素至少需要的饱和度. 低于它的像素被视为无色.
    pub const COLOR_MIN_SATURATION: u8 = 48;

    /// 颜色阶段中, 像素至少需要的明度. 低于它的像素被视为背景.
    pub const COLOR_MIN_VALUE: u8 = 40;

    /// "白色" 允许的最大饱和度.
    pub const WHITE_MAX_SATURATION: u8 = 60;

    /// "白色" 要求的最小明度.
    pub const WHITE_MIN_VALUE: u8 = 170;

    /// 饱和度阶段中, 像素至少需要的明度.
    pub const SATURATION_MIN_VALUE: u8 = 24;

    /// 饱和度阶段使用自适应门限时, 门限的下限.
    pub const SATURATION_CUTOFF_FLOOR: u8 = 64;
}

/// 光照校正相关常量.
pub mod illumination {
    /// 背景估计的高斯 sigma 与图像短边之比.
    pub const BACKGROUND_SIGMA_RATIO: f32 = 0.125;

    /// 背景估计的最小 sigma (像素).
    pub const BACKGROUND_MIN_SIGMA: f32 = 4.0;

    /// 背景估计值的下限, 防止除以 0.
    pub const BACKGROUND_FLOOR: f32 = 1.0;

    /// 每个通道的直方图柱数.
    pub const HISTOGRAM_BINS: usize = 256;
}

/// 残差阶段的默认参数. 均为可调的默认值, 见 [`crate::segment::ResidualParams`].
pub mod residual {
    /// 残差阶段的模糊核大小.
    pub const RESIDUAL_BLUR_KERNEL: (u32, u32) = (15, 15);

    /// 残差阶段的明度门限 (低门限).
    pub const RESIDUAL_VALUE_THRESHOLD: u8 = 48;

    /// 已被认领的区域向外扩张的像素数. 扩张后再从残差中扣除,
    /// 防止已有区域的模糊光晕被当作新区域.
    pub const RESIDUAL_CLAIM_MARGIN: usize = 2;
}

/// 区域二分相关常量.
pub mod split {
    /// 可以被二分的区域至少需要的像素数.
    pub const SPLIT_MIN_PIXELS: usize = 50;

    /// 不超过该像素数的区域直接做稠密特征分解, 否则使用 Lanczos.
    pub const SPLIT_DENSE_MAX_PIXELS: usize = 256;

    /// 单轮 Lanczos 迭代的最大步数.
    pub const LANCZOS_MAX_STEPS: usize = 64;

    /// Lanczos 重启的最大次数.
    pub const LANCZOS_MAX_RESTARTS: usize = 12;

    /// Ritz 向量残差的收敛门限.
    pub const LANCZOS_TOLERANCE: f64 = 1e-8;

    /// 一维 2-means 的最大迭代次数.
    pub const KMEANS_MAX_ITERATIONS: usize = 100;
}

/// 候选区域生成的默认尺度阶梯: `(模糊核边长, 最小面积, 最大面积)`.
/// 从粗到细排列.
pub const DEFAULT_SCALE_LADDER: [(u32, usize, Option<usize>); 3] =
    [(31, 1600, None), (15, 400, Some(40_000)), (5, 100, Some(8_000))];

/// 候选区域的默认最小面积.
pub const DEFAULT_FILTER_MIN_SIZE: usize = 100;

/// 评估中 "背景" 类别的名称.
pub const BACKGROUND_CLASS: &str = "background";
