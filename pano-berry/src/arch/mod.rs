//! 牙弓曲线检测.
//!
//! 检测分为三级, 依次降级:
//!
//! 1. [`ArchSource::Skeleton`]: 阈值, 膨胀, 平滑, 细化, 按列取点, 二次拟合;
//! 2. [`ArchSource::Centroid`]: 按列求亮像素的加权质心后二次拟合;
//! 3. [`ArchSource::Synthetic`]: 与数据无关的默认 U 形曲线.
//!
//! 前两级在数据不足时返回 `None`, 由下一级接手. 第三级总是成功.

mod curve;
mod extract;
mod params;
mod select;

pub use curve::{ArchCurve, ArchFit};
pub use extract::{extract_arch, extract_arch_with};
pub(crate) use extract::run_tiers;
pub use params::ArchParams;
pub use select::{bright_count, candidate_range, select_slice};

use crate::pipeline::{Checkpoint, Stage};
use crate::{PanoError, ScanSlice};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 牙弓曲线的来源, 即实际生效的检测方法.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ArchSource {
    /// 骨架法.
    Skeleton,

    /// 质心法.
    Centroid,

    /// 默认 U 形曲线.
    Synthetic,
}

impl ArchSource {
    /// 按尝试顺序排列的全部方法.
    pub const TIERS: [ArchSource; 3] = [
        ArchSource::Skeleton,
        ArchSource::Centroid,
        ArchSource::Synthetic,
    ];

    /// 小写名称.
    pub const fn name(&self) -> &'static str {
        match self {
            ArchSource::Skeleton => "skeleton",
            ArchSource::Centroid => "centroid",
            ArchSource::Synthetic => "synthetic",
        }
    }

    /// 是否是降级方法?
    #[inline]
    pub fn is_fallback(&self) -> bool {
        !matches!(self, ArchSource::Skeleton)
    }

    /// 该方法至少需要多少个有效列才能拟合. 默认曲线不需要数据, 返回 `None`.
    pub fn min_columns(&self, params: &ArchParams) -> Option<usize> {
        match self {
            ArchSource::Skeleton | ArchSource::Centroid => Some(params.min_columns),
            ArchSource::Synthetic => None,
        }
    }

    /// 该方法的第一个阶段.
    pub fn first_stage(&self) -> Stage {
        match self {
            ArchSource::Skeleton => Stage::Threshold,
            ArchSource::Centroid => Stage::Centroid,
            ArchSource::Synthetic => Stage::Synthetic,
        }
    }

    /// 单独执行这一级方法.
    ///
    /// # 返回值
    ///
    /// 数据不足或拟合失败时为 `Ok(None)`; `params` 非法或 `cp` 要求中止时为 `Err`.
    /// [`ArchSource::Synthetic`] 只可能返回 `Ok(Some(_))` 或 `Err`.
    pub fn attempt<C>(
        &self,
        slice: ScanSlice<'_>,
        params: &ArchParams,
        cp: &C,
    ) -> Result<Option<ArchFit>, C::Error>
    where
        C: Checkpoint,
        C::Error: From<PanoError>,
    {
        params.validate()?;
        self.run(slice, params, cp)
    }

    /// 调用方保证 `params` 已通过检查.
    fn run<C: Checkpoint>(
        &self,
        slice: ScanSlice<'_>,
        params: &ArchParams,
        cp: &C,
    ) -> Result<Option<ArchFit>, C::Error> {
        match self {
            ArchSource::Skeleton => extract::skeleton_fit(slice, params, cp),
            ArchSource::Centroid => extract::centroid_fit(slice, params, cp),
            ArchSource::Synthetic => {
                cp.check(Stage::Synthetic)?;
                Ok(Some(extract::synthetic_fit(slice, params)))
            }
        }
    }
}

impl fmt::Display for ArchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::CancelToken;
    use crate::OwnedScanSlice;
    use ndarray::Array2;

    #[test]
    fn test_tier_order() {
        assert_eq!(ArchSource::TIERS[0], ArchSource::Skeleton);
        assert!(ArchSource::TIERS.iter().skip(1).all(|t| t.is_fallback()));
        let p = ArchParams::default();
        assert_eq!(ArchSource::Centroid.min_columns(&p), Some(5));
        assert_eq!(ArchSource::Synthetic.min_columns(&p), None);
        assert_eq!(ArchSource::Skeleton.to_string(), "skeleton");
    }

    #[test]
    fn test_attempt_independently() {
        let s = OwnedScanSlice::from_array(Array2::zeros((32, 32))).unwrap();
        let params = ArchParams::default();
        let token = CancelToken::new();
        for tier in [ArchSource::Skeleton, ArchSource::Centroid] {
            assert!(matches!(tier.attempt(s.as_immutable(), &params, &token), Ok(None)));
        }
        let fit = ArchSource::Synthetic
            .attempt(s.as_immutable(), &params, &token)
            .unwrap()
            .unwrap();
        assert_eq!(fit.points.len(), 100);
    }

    #[test]
    fn test_attempt_rejects_invalid_params() {
        let s = OwnedScanSlice::from_array(Array2::zeros((32, 32))).unwrap();
        let params = ArchParams {
            centroid_sample_columns: 0,
            ..Default::default()
        };
        for tier in ArchSource::TIERS {
            let err = tier
                .attempt(s.as_immutable(), &params, &CancelToken::new())
                .unwrap_err();
            assert!(matches!(err, PanoError::InvalidParams(_)));
        }
    }

    #[test]
    fn test_attempt_cancelled() {
        let s = OwnedScanSlice::from_array(Array2::zeros((8, 8))).unwrap();
        let token = CancelToken::new();
        token.cancel();
        for tier in ArchSource::TIERS {
            let err = tier
                .attempt(s.as_immutable(), &ArchParams::default(), &token)
                .unwrap_err();
            assert!(matches!(err, PanoError::Cancelled(stage) if stage == tier.first_stage()));
        }
    }
}
