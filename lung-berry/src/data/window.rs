/// 强度窗口, 包含窗位 (level) 和窗宽 (width). 把任意浮点强度映射到 `u8` 灰度.
///
/// 该窗口是只读的. 若要修改窗口参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntensityWindow {
    level: f32,
    width: f32,
}

impl IntensityWindow {
    /// 构建强度窗口.
    ///
    /// `level` 和 `width` 必须在合理范围内, 否则返回 `None`.
    pub fn new(level: f32, width: f32) -> Option<IntensityWindow> {
        if level.is_finite() && width.is_finite() && 0.0 < width {
            Some(Self { level, width })
        } else {
            None
        }
    }

    /// 以上下界 `[lower, upper]` 构建强度窗口. 要求 `lower < upper`.
    #[inline]
    pub fn from_bounds(lower: f32, upper: f32) -> Option<IntensityWindow> {
        Self::new((lower + upper) / 2.0, upper - lower)
    }

    /// 覆盖完整 8-bit 范围 `[0, 255]` 的窗口. 窗内映射是恒等映射.
    #[inline]
    pub const fn full_u8() -> IntensityWindow {
        Self {
            level: 127.5,
            width: 255.0,
        }
    }

    /// 窗下限.
    #[inline]
    pub fn lower_bound(&self) -> f32 {
        self.level - self.width / 2.0
    }

    /// 窗上限.
    #[inline]
    pub fn upper_bound(&self) -> f32 {
        self.level + self.width / 2.0
    }

    /// 求在当前窗口设置下, 强度 `x` 对应的灰度值 (0 <= value <= 255), 向下取整.
    ///
    /// 如果 `x` 无意义 (如 inf, NaN), 则返回 `None`.
    pub fn eval(&self, x: f32) -> Option<u8> {
        self.eval_f32(x).map(|v| v as u8)
    }

    /// 同 [`IntensityWindow::eval`], 但四舍五入到最近的灰度值.
    pub fn eval_round(&self, x: f32) -> Option<u8> {
        self.eval_f32(x).map(|v| v.round() as u8)
    }

    /// 求在当前窗口设置下, 强度 `x` 对应的灰度分布点 (0.0 <= value <= 255.0).
    ///
    /// 如果 `x` 无意义 (如 inf, NaN), 则返回 `None`.
    pub fn eval_f32(&self, x: f32) -> Option<f32> {
        if !x.is_finite() {
            return None;
        }
        let lb = self.lower_bound();
        let ub = self.upper_bound();
        if x <= lb {
            Some(0.0)
        } else if x >= ub {
            Some(255.0)
        } else {
            // 255, not 256.
            Some((x - lb) / self.width * 255.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::IntensityWindow;

    fn float_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_intensity_window_invalid_input() {
        assert!(IntensityWindow::new(0.0, -1.0).is_none());
        assert!(IntensityWindow::new(0.0, 0.0).is_none());
        assert!(IntensityWindow::new(f32::NAN, 1.0).is_none());
        assert!(IntensityWindow::from_bounds(3.0, 3.0).is_none());
    }

    #[test]
    fn test_intensity_window_generic() {
        // [60, 100]
        let win = IntensityWindow::from_bounds(60.0, 100.0).unwrap();
        assert_eq!(win.eval(f32::NAN), None);
        assert_eq!(win.eval(f32::MIN), Some(0));
        assert_eq!(win.eval(f32::MAX), Some(255));
        assert_eq!(win.eval(60.0), Some(0));
        assert_eq!(win.eval(60.1), Some(0));
        assert_eq!(win.eval(80.0), Some((255.0 * 0.5) as u8));
        assert_eq!(win.eval_round(80.0), Some(128));
        assert!(float_eq(win.eval_f32(90.0).unwrap(), 255.0 * 0.75));
        assert_eq!(win.eval(99.999), Some(254));
        assert_eq!(win.eval(100.0), Some(255));
    }

    #[test]
    fn test_full_window_is_identity() {
        let win = IntensityWindow::full_u8();
        for v in 0..=255u8 {
            assert_eq!(win.eval_round(v as f32), Some(v));
        }
        assert_eq!(win.eval_round(-3.0), Some(0));
        assert_eq!(win.eval_round(300.0), Some(255));
    }
}
