//! 运行时错误.

use crate::pipeline::Stage;
use std::convert::Infallible;
use thiserror::Error;

/// 本 crate 通用的 `Result`.
pub type PanoResult<T> = Result<T, PanoError>;

/// 检测 / 重建过程中不可恢复的错误.
///
/// 检测质量不足 (骨架列数不足, 质心列数不足, 拟合失败) **不是** 错误,
/// 它们由降级策略在内部消化, 参见 [`crate::arch::ArchSource`].
#[derive(Debug, Error)]
pub enum PanoError {
    /// 体数据某一维度为 0.
    #[error("volume has an empty dimension: rows={rows}, cols={cols}, depth={depth}")]
    EmptyVolume {
        /// 行数 (切片高).
        rows: usize,
        /// 列数 (切片宽).
        cols: usize,
        /// 切片个数.
        depth: usize,
    },

    /// 体素间距非法 (非正数或非有限值).
    #[error("invalid voxel spacing: {0:?}")]
    InvalidSpacing([f64; 3]),

    /// 输入的牙弓曲线不满足不变量.
    #[error("invalid arch curve: {0}")]
    InvalidCurve(String),

    /// 参数非法.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// 调用方在 `stage` 之前取消了本次调用.
    #[error("cancelled before stage `{0}`")]
    Cancelled(Stage),

    /// nifti 文件读取失败.
    #[error("nifti: {0}")]
    Nifti(#[from] nifti::NiftiError),

    /// npy 文件读取失败.
    #[error("npy: {0}")]
    Npy(#[from] ndarray_npy::ReadNpyError),

    /// 图像编码 / 保存失败.
    #[error("image: {0}")]
    Image(#[from] image::ImageError),

    /// 底层 I/O 错误.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl PanoError {
    /// 构建 [`PanoError::InvalidCurve`].
    #[inline]
    pub fn invalid_curve(details: impl Into<String>) -> Self {
        Self::InvalidCurve(details.into())
    }

    /// 构建 [`PanoError::InvalidParams`].
    #[inline]
    pub fn invalid_params(details: impl Into<String>) -> Self {
        Self::InvalidParams(details.into())
    }

    /// 是否是因取消而产生的错误?
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

impl From<Infallible> for PanoError {
    #[inline]
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PanoError::EmptyVolume {
            rows: 64,
            cols: 0,
            depth: 3,
        };
        assert!(err.to_string().contains("cols=0"));

        let err = PanoError::invalid_curve("only 1 point");
        assert!(err.to_string().contains("only 1 point"));

        let err = PanoError::Cancelled(Stage::Dilate);
        assert!(err.is_cancelled());
        assert!(err.to_string().contains("dilate"));
    }
}
