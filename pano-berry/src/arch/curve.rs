use super::ArchSource;
use crate::fitting::Polynomial;
use crate::{Idx2dF, PanoError, PanoResult, VoxelSpacing};
use ndarray::arr1;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 某一级方法拟合出的原始结果: 有序采样点和二次多项式系数 (低次在前).
#[derive(Clone, Debug, PartialEq)]
pub struct ArchFit {
    /// 按 `x` 升序的 `(x, y)` 点.
    pub points: Vec<Idx2dF>,

    /// `[c0, c1, c2]`, 即 `y = c0 + c1 * x + c2 * x^2`.
    pub coefficients: [f64; 3],
}

impl ArchFit {
    /// 在 `[x0, x1]` 上等距采样 `n` 个点, `y` 截断到 `[0, rows - 1]`.
    pub(crate) fn sample(poly: &Polynomial<f64>, x0: f64, x1: f64, n: usize, rows: usize) -> Self {
        let max_y = rows.saturating_sub(1) as f64;
        let points = poly
            .sample(x0, x1, n)
            .into_iter()
            .map(|(x, y)| (x, y.clamp(0.0, max_y)))
            .collect();
        let c = poly.coefficients();
        Self {
            points,
            coefficients: [c[0], c[1], c[2]],
        }
    }
}

/// 牙弓曲线.
///
/// 点位于切片像素坐标系, `x` 为列, `y` 为行. 构建成功的曲线保证:
///
/// 1. 至少两个点, 且所有坐标都是有限值;
/// 2. `x` 单调不减, 即曲线是 `x` 的单值函数.
///
/// 系数按次数从低到高排列: `[c0, c1, c2]` 表示 `y = c0 + c1 * x + c2 * x^2`.
///
/// # 注意
///
/// 反序列化不会检查上述不变量. 外部传入的曲线在投影前会再次由
/// [`ArchCurve::validate`] 检查.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ArchCurve {
    points: Vec<Idx2dF>,
    coefficients: [f64; 3],
    slice_index: usize,
    thickness_mm: f64,
    source: ArchSource,
}

impl ArchCurve {
    /// 构建曲线并检查不变量.
    pub fn new(
        points: Vec<Idx2dF>,
        coefficients: [f64; 3],
        slice_index: usize,
        thickness_mm: f64,
        source: ArchSource,
    ) -> PanoResult<Self> {
        let ans = Self {
            points,
            coefficients,
            slice_index,
            thickness_mm,
            source,
        };
        ans.validate()?;
        Ok(ans)
    }

    #[inline]
    pub(crate) fn from_fit(
        fit: ArchFit,
        slice_index: usize,
        thickness_mm: f64,
        source: ArchSource,
    ) -> Self {
        let ans = Self {
            points: fit.points,
            coefficients: fit.coefficients,
            slice_index,
            thickness_mm,
            source,
        };
        debug_assert!(ans.validate().is_ok());
        ans
    }

    /// 检查不变量.
    pub fn validate(&self) -> PanoResult<()> {
        if self.points.len() < 2 {
            return Err(PanoError::invalid_curve(format!(
                "at least 2 points are required, got {}",
                self.points.len()
            )));
        }
        if let Some(i) = self
            .points
            .iter()
            .position(|(x, y)| !x.is_finite() || !y.is_finite())
        {
            return Err(PanoError::invalid_curve(format!("point #{i} is not finite")));
        }
        if let Some(i) = self.points.windows(2).position(|w| w[1].0 < w[0].0) {
            return Err(PanoError::invalid_curve(format!(
                "x decreases between point #{i} and #{}",
                i + 1
            )));
        }
        if !self.thickness_mm.is_finite() || self.thickness_mm < 0.0 {
            return Err(PanoError::invalid_curve(format!(
                "invalid thickness {} mm",
                self.thickness_mm
            )));
        }
        Ok(())
    }

    /// 按 `x` 升序的 `(x, y)` 点.
    #[inline]
    pub fn points(&self) -> &[Idx2dF] {
        &self.points
    }

    /// 点数.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 构建成功的曲线总是非空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 二次多项式系数, 低次在前.
    #[inline]
    pub fn coefficients(&self) -> [f64; 3] {
        self.coefficients
    }

    /// 以系数构建的多项式.
    pub fn polynomial(&self) -> Polynomial<f64> {
        Polynomial::new(arr1(&self.coefficients))
    }

    /// 曲线所在的水平切片.
    #[inline]
    pub fn slice_index(&self) -> usize {
        self.slice_index
    }

    /// 投影厚度, 以毫米为单位.
    #[inline]
    pub fn thickness_mm(&self) -> f64 {
        self.thickness_mm
    }

    /// 产生该曲线的方法.
    #[inline]
    pub fn source(&self) -> ArchSource {
        self.source
    }

    /// 是否是降级方法的结果?
    #[inline]
    pub fn is_fallback(&self) -> bool {
        self.source.is_fallback()
    }

    /// 把曲线点换算为毫米单位的世界坐标 `(x * col_mm, y * row_mm, slice * slice_mm)`.
    pub fn world_coords(&self, spacing: &VoxelSpacing) -> Vec<[f64; 3]> {
        let z = self.slice_index as f64 * spacing.slice_mm();
        self.points
            .iter()
            .map(|&(x, y)| [x * spacing.col_mm(), y * spacing.row_mm(), z])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve(points: Vec<Idx2dF>) -> PanoResult<ArchCurve> {
        ArchCurve::new(points, [1.0, 0.0, 0.0], 3, 12.5, ArchSource::Centroid)
    }

    #[test]
    fn test_invariants() {
        assert!(curve(vec![(0.0, 1.0)]).is_err());
        assert!(curve(vec![(0.0, 1.0), (f64::NAN, 2.0)]).is_err());
        assert!(curve(vec![(2.0, 1.0), (1.0, 1.0)]).is_err());
        // 相同的 x 是允许的 (单列切片).
        assert!(curve(vec![(0.0, 1.0), (0.0, 1.0)]).is_ok());

        let c = curve(vec![(0.0, 1.0), (4.0, 1.0)]).unwrap();
        assert_eq!(c.len(), 2);
        assert!(c.is_fallback());
        assert_eq!(c.polynomial().eval(7.0), 1.0);
    }

    #[test]
    fn test_world_coords() {
        let c = curve(vec![(2.0, 4.0), (10.0, 6.0)]).unwrap();
        let spacing = VoxelSpacing::new(0.5, 0.25, 2.0).unwrap();
        assert_eq!(
            c.world_coords(&spacing),
            vec![[0.5, 2.0, 6.0], [2.5, 3.0, 6.0]]
        );
    }

    #[test]
    fn test_fit_sample_clamps() {
        // y = x^2
        let poly = Polynomial::new(arr1(&[0.0, 0.0, 1.0]));
        let fit = ArchFit::sample(&poly, 0.0, 10.0, 11, 50);
        assert_eq!(fit.points.len(), 11);
        assert_eq!(fit.points[5], (5.0, 25.0));
        assert_eq!(fit.points[10], (10.0, 49.0));
        assert_eq!(fit.coefficients, [0.0, 0.0, 1.0]);
    }
}
