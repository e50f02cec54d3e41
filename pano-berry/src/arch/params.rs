use crate::consts::{arch::*, panoramic::SLAB_HALF_HEIGHT};
use crate::morph::Thinning;
use crate::{PanoError, PanoResult, ScanSlice};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 牙弓曲线提取参数. 默认值见 [`crate::consts::arch`].
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ArchParams {
    /// 自适应阈值 `mean + k * std` 中的 `k`.
    pub threshold_sigma: f64,

    /// 8-邻域膨胀次数.
    pub dilation_iterations: u32,

    /// 高斯平滑的标准差.
    pub smoothing_sigma: f32,

    /// 平滑后重新二值化的阈值, 位于 `(0, 1)`.
    pub smoothing_cutoff: f32,

    /// 细化的最大迭代次数.
    pub max_thinning_iterations: u32,

    /// 细化后剩余像素的下限.
    pub min_skeleton_pixels: usize,

    /// 拟合所需的最少列数.
    pub min_columns: usize,

    /// 骨架法向两侧外推的宽度 (占切片宽度的比例).
    pub extrapolation: f64,

    /// 输出曲线的点数, 至少为 2.
    pub curve_points: usize,

    /// 质心法中一列至少需要的亮像素个数.
    pub centroid_min_column_pixels: usize,

    /// 质心法大约采样的列数.
    pub centroid_sample_columns: usize,

    /// 默认 U 形曲线的横向区间 (占切片宽度的比例).
    pub synthetic_span: (f64, f64),

    /// 默认 U 形曲线顶点的纵向位置 (占切片高度的比例).
    pub synthetic_apex_y: f64,

    /// 默认 U 形曲线的曲率.
    pub synthetic_curvature: f64,

    /// 换算 [`crate::ArchCurve::thickness_mm`] 所用的切片个数.
    pub slab_samples: usize,
}

impl Default for ArchParams {
    fn default() -> Self {
        Self {
            threshold_sigma: THRESHOLD_SIGMA,
            dilation_iterations: DILATION_ITERATIONS,
            smoothing_sigma: SMOOTHING_SIGMA,
            smoothing_cutoff: SMOOTHING_CUTOFF,
            max_thinning_iterations: MAX_THINNING_ITERATIONS,
            min_skeleton_pixels: MIN_SKELETON_PIXELS,
            min_columns: MIN_COLUMNS,
            extrapolation: EXTRAPOLATION,
            curve_points: CURVE_POINTS,
            centroid_min_column_pixels: CENTROID_MIN_COLUMN_PIXELS,
            centroid_sample_columns: CENTROID_SAMPLE_COLUMNS,
            synthetic_span: SYNTHETIC_SPAN,
            synthetic_apex_y: SYNTHETIC_APEX_Y,
            synthetic_curvature: SYNTHETIC_CURVATURE,
            slab_samples: SLAB_HALF_HEIGHT,
        }
    }
}

impl ArchParams {
    /// 检查参数是否有意义.
    pub fn validate(&self) -> PanoResult<()> {
        fn ensure(ok: bool, what: &str) -> PanoResult<()> {
            if ok {
                Ok(())
            } else {
                Err(PanoError::invalid_params(what))
            }
        }

        ensure(self.threshold_sigma.is_finite(), "threshold_sigma must be finite")?;
        ensure(
            self.smoothing_sigma.is_finite() && self.smoothing_sigma > 0.0,
            "smoothing_sigma must be positive",
        )?;
        ensure(
            self.smoothing_cutoff > 0.0 && self.smoothing_cutoff < 1.0,
            "smoothing_cutoff must lie in (0, 1)",
        )?;
        // 三个点才能确定二次曲线.
        ensure(self.min_columns >= 3, "min_columns must be at least 3")?;
        ensure(
            self.extrapolation.is_finite() && self.extrapolation >= 0.0,
            "extrapolation must be non-negative",
        )?;
        ensure(self.curve_points >= 2, "curve_points must be at least 2")?;
        ensure(
            self.centroid_sample_columns > 0,
            "centroid_sample_columns must be positive",
        )?;
        let (lo, hi) = self.synthetic_span;
        ensure(
            (0.0..=1.0).contains(&lo) && (0.0..=1.0).contains(&hi) && lo < hi,
            "synthetic_span must be an increasing range inside [0, 1]",
        )?;
        ensure(
            self.synthetic_apex_y.is_finite() && self.synthetic_curvature.is_finite(),
            "synthetic curve parameters must be finite",
        )?;
        ensure(self.slab_samples > 0, "slab_samples must be positive")
    }

    /// `slice` 的自适应阈值 `mean + threshold_sigma * std`.
    #[inline]
    pub fn threshold_of(&self, slice: &ScanSlice<'_>) -> f64 {
        slice.mean() + self.threshold_sigma * slice.std()
    }

    #[inline]
    pub(crate) fn thinning(&self) -> Thinning {
        Thinning {
            max_iterations: self.max_thinning_iterations,
            min_pixels: self.min_skeleton_pixels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ArchParams;

    #[test]
    fn test_default_is_valid() {
        let p = ArchParams::default();
        assert!(p.validate().is_ok());
        assert_eq!(p.curve_points, 100);
        assert_eq!(p.slab_samples, 25);
        assert_eq!(p.thinning().max_iterations, 50);
    }

    #[test]
    fn test_invalid_params() {
        let bad = [
            ArchParams {
                curve_points: 1,
                ..Default::default()
            },
            ArchParams {
                smoothing_cutoff: 1.0,
                ..Default::default()
            },
            ArchParams {
                synthetic_span: (0.85, 0.15),
                ..Default::default()
            },
            ArchParams {
                extrapolation: -0.1,
                ..Default::default()
            },
            ArchParams {
                min_columns: 2,
                ..Default::default()
            },
            ArchParams {
                slab_samples: 0,
                ..Default::default()
            },
            ArchParams {
                threshold_sigma: f64::NAN,
                ..Default::default()
            },
            ArchParams {
                smoothing_sigma: 0.0,
                ..Default::default()
            },
            ArchParams {
                smoothing_sigma: -2.0,
                ..Default::default()
            },
            ArchParams {
                centroid_sample_columns: 0,
                ..Default::default()
            },
            ArchParams {
                curve_points: 0,
                ..Default::default()
            },
            ArchParams {
                synthetic_apex_y: f64::INFINITY,
                ..Default::default()
            },
            ArchParams {
                synthetic_curvature: f64::NAN,
                ..Default::default()
            },
        ];
        for p in bad {
            let err = p.validate().unwrap_err();
            assert!(err.to_string().starts_with("invalid parameters"));
        }
    }
}
