/// 灰度窗口, 包含窗位 (window level) 和窗宽 (window width).
///
/// 用于把任意范围的体素值映射到 8-bit 灰度. 该窗口是只读的.
/// 若要修改窗口参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntensityWindow {
    level: f32,
    width: f32,
}

impl IntensityWindow {
    /// 构建窗口.
    ///
    /// `level` 必须是有限值, `width` 必须是正的有限值, 否则返回 `None`.
    pub fn new(level: f32, width: f32) -> Option<IntensityWindow> {
        if level.is_finite() && width.is_finite() && width > 0.0 {
            Some(Self { level, width })
        } else {
            None
        }
    }

    /// 以 `[lower, upper]` 构建窗口. `lower >= upper` 时返回 `None`.
    #[inline]
    pub fn from_bounds(lower: f32, upper: f32) -> Option<IntensityWindow> {
        if lower < upper {
            Self::new(lower + (upper - lower) / 2.0, upper - lower)
        } else {
            None
        }
    }

    /// 以 `values` 中有限值的最小值和最大值构建 (min-max) 窗口.
    ///
    /// 如果没有有限值, 或者所有有限值都相等, 则返回 `None`.
    pub fn from_values<I: IntoIterator<Item = f32>>(values: I) -> Option<IntensityWindow> {
        let (lo, hi) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        Self::from_bounds(lo, hi)
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

    /// 窗位.
    #[inline]
    pub fn level(&self) -> f32 {
        self.level
    }

    /// 窗宽.
    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    /// 求在当前窗口设置下, `v` 对应的灰度图像素整数值 (0 <= value <= 255).
    ///
    /// 如果 `v` 无意义 (如 inf, NaN), 则返回 `None`.
    pub fn eval(&self, v: f32) -> Option<u8> {
        self.eval_f32(v).map(|g| g as u8)
    }

    /// 求在当前窗口设置下, `v` 对应的灰度分布点 (0.0 <= value <= 255.0).
    ///
    /// 如果 `v` 无意义 (如 inf, NaN), 则返回 `None`.
    pub fn eval_f32(&self, v: f32) -> Option<f32> {
        if !v.is_finite() {
            return None;
        }
        let lb = self.lower_bound();
        if v <= lb {
            Some(0.0)
        } else if v >= self.upper_bound() {
            Some(255.0)
        } else {
            // 255, not 256.
            Some((v - lb) / self.width() * 255.0)
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
    fn test_window_invalid_input() {
        assert!(IntensityWindow::new(0.0, -1.0).is_none());
        assert!(IntensityWindow::new(0.0, 0.0).is_none());
        assert!(IntensityWindow::new(f32::NAN, 10.0).is_none());
        assert!(IntensityWindow::from_bounds(5.0, 5.0).is_none());
        assert!(IntensityWindow::from_values([3.0, 3.0, f32::NAN]).is_none());
        assert!(IntensityWindow::from_values(std::iter::empty()).is_none());
    }

    #[test]
    fn test_window_min_max() {
        let wnd = IntensityWindow::from_values([50.0, 1000.0, 300.0, f32::INFINITY]).unwrap();
        assert!(float_eq(wnd.lower_bound(), 50.0));
        assert!(float_eq(wnd.upper_bound(), 1000.0));
        assert_eq!(wnd.eval(50.0), Some(0));
        assert_eq!(wnd.eval(1000.0), Some(255));
        assert_eq!(wnd.eval(f32::NAN), None);
    }

    #[test]
    fn test_window_generic() {
        // [60, 100]
        let wnd = IntensityWindow::new(80.0, 40.0).unwrap();
        assert_eq!(wnd.eval(f32::MIN), Some(0));
        assert_eq!(wnd.eval(f32::MAX), Some(255));

        assert_eq!(wnd.eval(60.0), Some(0));
        assert!(wnd.eval_f32(60.1).unwrap() > 0.0);

        assert_eq!(wnd.eval(70.0).unwrap(), (255.0 * 0.25) as u8);
        assert!(float_eq(wnd.eval_f32(80.0).unwrap(), 255.0 * 0.5));

        assert_eq!(wnd.eval(99.999), Some(254));
        assert_eq!(wnd.eval(100.0).unwrap(), u8::MAX);
    }
}
