//! RGB / HSV 转换和命名颜色.
//!
//! HSV 采用 OpenCV 的 8-bit 约定: H ∈ \[0, 180) (即角度的一半), S 和 V ∈ \[0, 255\].

use crate::consts::hsv::*;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt::Formatter;

/// 将一个 RGB 像素转换为浮点 HSV 像素 (OpenCV 约定, 未取整).
///
/// 输入的每个分量应位于 \[0, 255\].
pub fn rgb_to_hsv_f32(r: f32, g: f32, b: f32) -> [f32; 3] {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = max - min;
    let s = if max > 0.0 { diff / max * 255.0 } else { 0.0 };
    let h = if diff <= f32::EPSILON {
        0.0
    } else if max == r {
        60.0 * (g - b) / diff
    } else if max == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    let h = if h < 0.0 { h + 360.0 } else { h };
    [h / 2.0, s, max]
}

/// 将一个 RGB 像素转换为 8-bit HSV 像素.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> [u8; 3] {
    let [h, s, v] = rgb_to_hsv_f32(r as f32, g as f32, b as f32);
    let h = h.round() as u32 % HUE_RANGE as u32;
    [h as u8, s.round().min(255.0) as u8, v as u8]
}

/// 将一个 8-bit HSV 像素转换为 RGB 像素.
pub fn hsv_to_rgb(h: u8, s: u8, v: u8) -> [u8; 3] {
    let v_f = v as f32;
    if s == 0 {
        return [v, v, v];
    }
    let s_f = s as f32 / 255.0;
    let h_deg = (h as f32 * 2.0) % 360.0;
    let sector = h_deg / 60.0;
    let i = sector.floor();
    let f = sector - i;
    let p = v_f * (1.0 - s_f);
    let q = v_f * (1.0 - s_f * f);
    let t = v_f * (1.0 - s_f * (1.0 - f));
    let (r, g, b) = match i as u32 {
        0 => (v_f, t, p),
        1 => (q, v_f, p),
        2 => (p, v_f, t),
        3 => (p, q, v_f),
        4 => (t, p, v_f),
        _ => (v_f, p, q),
    };
    [to_u8(r), to_u8(g), to_u8(b)]
}

#[inline]
fn to_u8(x: f32) -> u8 {
    x.round().clamp(0.0, 255.0) as u8
}

/// 闭区间色相带 `[lo, hi]`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HueBand {
    lo: u8,
    hi: u8,
}

impl HueBand {
    const fn new(lo: u8, hi: u8) -> Self {
        Self { lo, hi }
    }

    /// 色相 `h` 是否落在该色相带中. 浮点色相按 `[lo, hi + 1)` 判断.
    #[inline]
    pub fn contains(&self, h: f32) -> bool {
        (self.lo as f32..self.hi as f32 + 1.0).contains(&h)
    }
}

/// 配置中可以出现的颜色名称.
///
/// 荧光探针的成像颜色一般只有这几种. 配置中的颜色字符串通过
/// [`NamedColor::parse`] 解析, 无法识别的名称不贡献任何像素.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NamedColor {
    /// 红.
    Red,
    /// 橙.
    Orange,
    /// 黄.
    Yellow,
    /// 绿.
    Green,
    /// 青.
    Cyan,
    /// 蓝.
    Blue,
    /// 品红 (紫).
    Magenta,
    /// 白. 由低饱和度和高明度定义, 与色相无关.
    White,
}

static COLOR_TABLE: Lazy<HashMap<&'static str, NamedColor>> = Lazy::new(|| {
    use NamedColor::*;
    HashMap::from([
        ("red", Red),
        ("orange", Orange),
        ("yellow", Yellow),
        ("green", Green),
        ("cyan", Cyan),
        ("blue", Blue),
        ("magenta", Magenta),
        ("violet", Magenta),
        ("purple", Magenta),
        ("white", White),
        ("gray", White),
        ("grey", White),
    ])
});

impl NamedColor {
    /// 解析颜色名称, 大小写不敏感. 无法识别时返回 `None`.
    pub fn parse(name: &str) -> Option<Self> {
        COLOR_TABLE.get(name.trim().to_lowercase().as_str()).copied()
    }

    /// 该颜色占据的色相带. 红色横跨 0 度, 因此有两段. 白色没有色相带.
    pub fn hue_bands(&self) -> &'static [HueBand] {
        const RED: [HueBand; 2] = [HueBand::new(0, 8), HueBand::new(170, 179)];
        const ORANGE: [HueBand; 1] = [HueBand::new(9, 19)];
        const YELLOW: [HueBand; 1] = [HueBand::new(20, 34)];
        const GREEN: [HueBand; 1] = [HueBand::new(35, 84)];
        const CYAN: [HueBand; 1] = [HueBand::new(85, 99)];
        const BLUE: [HueBand; 1] = [HueBand::new(100, 129)];
        const MAGENTA: [HueBand; 1] = [HueBand::new(130, 169)];
        match self {
            NamedColor::Red => &RED,
            NamedColor::Orange => &ORANGE,
            NamedColor::Yellow => &YELLOW,
            NamedColor::Green => &GREEN,
            NamedColor::Cyan => &CYAN,
            NamedColor::Blue => &BLUE,
            NamedColor::Magenta => &MAGENTA,
            NamedColor::White => &[],
        }
    }

    /// 判断浮点 HSV 像素是否属于该颜色.
    pub fn matches(&self, [h, s, v]: [f32; 3]) -> bool {
        match self {
            NamedColor::White => {
                s <= WHITE_MAX_SATURATION as f32 && v >= WHITE_MIN_VALUE as f32
            }
            colored => {
                s >= COLOR_MIN_SATURATION as f32
                    && v >= COLOR_MIN_VALUE as f32
                    && colored.hue_bands().iter().any(|b| b.contains(h))
            }
        }
    }
}

impl std::fmt::Display for NamedColor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NamedColor::Red => "red",
            NamedColor::Orange => "orange",
            NamedColor::Yellow => "yellow",
            NamedColor::Green => "green",
            NamedColor::Cyan => "cyan",
            NamedColor::Blue => "blue",
            NamedColor::Magenta => "magenta",
            NamedColor::White => "white",
        };
        f.write_str(s)
    }
}

/// 将一组颜色名称解析为去重、有序的颜色列表. 无法识别的名称会被忽略并记录警告.
pub fn resolve_colors<'a, I: IntoIterator<Item = &'a str>>(names: I) -> Vec<NamedColor> {
    let mut ans: Vec<NamedColor> = names
        .into_iter()
        .filter_map(|name| {
            let c = NamedColor::parse(name);
            if c.is_none() {
                log::warn!("unknown color name `{name}` is ignored");
            }
            c
        })
        .collect();
    ans.sort_unstable();
    ans.dedup();
    ans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_colors_to_hsv() {
        assert_eq!(rgb_to_hsv(255, 0, 0), [0, 255, 255]);
        assert_eq!(rgb_to_hsv(0, 255, 0), [60, 255, 255]);
        assert_eq!(rgb_to_hsv(0, 0, 255), [120, 255, 255]);
        assert_eq!(rgb_to_hsv(0, 0, 0), [0, 0, 0]);
        assert_eq!(rgb_to_hsv(200, 200, 200), [0, 0, 200]);
    }

    #[test]
    fn test_hsv_to_rgb_primaries() {
        assert_eq!(hsv_to_rgb(0, 255, 255), [255, 0, 0]);
        assert_eq!(hsv_to_rgb(60, 255, 255), [0, 255, 0]);
        assert_eq!(hsv_to_rgb(120, 255, 255), [0, 0, 255]);
        assert_eq!(hsv_to_rgb(33, 0, 77), [77, 77, 77]);
    }

    #[test]
    fn test_named_color_parse() {
        assert_eq!(NamedColor::parse("Red"), Some(NamedColor::Red));
        assert_eq!(NamedColor::parse(" violet "), Some(NamedColor::Magenta));
        assert_eq!(NamedColor::parse("chartreuse"), None);
        assert_eq!(
            resolve_colors(["green", "red", "GREEN", "nope"]),
            vec![NamedColor::Red, NamedColor::Green]
        );
    }

    #[test]
    fn test_named_color_matches() {
        let red = rgb_to_hsv_f32(230.0, 20.0, 30.0);
        assert!(NamedColor::Red.matches(red));
        assert!(!NamedColor::Green.matches(red));

        // 暗红色明度不足.
        let dark_red = rgb_to_hsv_f32(30.0, 2.0, 2.0);
        assert!(!NamedColor::Red.matches(dark_red));

        let white = rgb_to_hsv_f32(240.0, 240.0, 235.0);
        assert!(NamedColor::White.matches(white));
        assert!(!NamedColor::Red.matches(white));
    }
}
