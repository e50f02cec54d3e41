//! 阶段之间的取消检查.

use crate::PanoError;
use std::convert::Infallible;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 流水线阶段. 取消检查只发生在阶段之间, 不会打断阶段内部的计算.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// 切片选择.
    SelectSlice,
    /// 自适应阈值.
    Threshold,
    /// 膨胀.
    Dilate,
    /// 高斯平滑.
    Smooth,
    /// 迭代腐蚀细化.
    Skeletonize,
    /// 按列提取有序点.
    ExtractPoints,
    /// 多项式拟合.
    FitCurve,
    /// 质心法.
    Centroid,
    /// 默认 U 形曲线.
    Synthetic,
    /// 全景投影.
    Project,
}

impl Stage {
    /// 小写蛇形名称, 用于日志和错误信息.
    pub const fn name(&self) -> &'static str {
        match self {
            Stage::SelectSlice => "select_slice",
            Stage::Threshold => "threshold",
            Stage::Dilate => "dilate",
            Stage::Smooth => "smooth",
            Stage::Skeletonize => "skeletonize",
            Stage::ExtractPoints => "extract_points",
            Stage::FitCurve => "fit_curve",
            Stage::Centroid => "centroid",
            Stage::Synthetic => "synthetic",
            Stage::Project => "project",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 在每个阶段开始之前被调用.
///
/// 返回 `Err` 时流水线立即停止, 并把错误原样交给调用方.
pub trait Checkpoint {
    /// 中止时的错误类型.
    type Error;

    /// 即将进入 `stage`.
    fn check(&self, stage: Stage) -> Result<(), Self::Error>;
}

impl<C: Checkpoint + ?Sized> Checkpoint for &C {
    type Error = C::Error;

    #[inline]
    fn check(&self, stage: Stage) -> Result<(), Self::Error> {
        (**self).check(stage)
    }
}

/// 从不中止. 错误类型不可构造, 因此使用它的调用一定成功.
#[derive(Copy, Clone, Debug, Default)]
pub struct Uninterrupted;

impl Checkpoint for Uninterrupted {
    type Error = Infallible;

    #[inline]
    fn check(&self, _stage: Stage) -> Result<(), Infallible> {
        Ok(())
    }
}

/// 协作式取消标志. 克隆得到的句柄共享同一个标志.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// 新的, 尚未取消的标志.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求取消. 正在进行的阶段会先完成.
    #[inline]
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// 是否已请求取消?
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Checkpoint for CancelToken {
    type Error = PanoError;

    fn check(&self, stage: Stage) -> Result<(), PanoError> {
        if self.is_cancelled() {
            log::debug!("cancelled before stage `{stage}`");
            Err(PanoError::Cancelled(stage))
        } else {
            Ok(())
        }
    }
}
