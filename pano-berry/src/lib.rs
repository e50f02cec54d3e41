#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 从 CBCT 体数据中自动定位牙弓曲线, 并沿该曲线重采样得到全景
//! (曲面断层, orthopantomogram 风格) 图像.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 每次调用只处理一个牙弓 (上颌或下颌), 且假设牙弓是单条开口的 U 形曲线.
//! 2. 检测失败不会报错, 而是逐级降级 (骨架法 -> 质心法 -> 默认 U 形曲线),
//!   调用方可通过 [`ArchCurve::source`] 得知实际采用的是哪一级.
//! 3. 只有真正无法继续的输入 (空体数据, 非法间距, 非法参数) 才会返回 `Err`.
//!
//! # 开发计划
//!
//! ### 切片选择 ✅
//!
//! 在体数据中间三分之一的范围内, 以每张切片自身 90 百分位为阈值统计亮像素,
//! 选出亮像素最多的水平切片.
//!
//! 实现位于 `pano-berry/src/arch/select.rs`.
//!
//! ### 二维二值形态学 ✅
//!
//! 8-邻域膨胀, 腐蚀, 高斯平滑后重新二值化, 以及 "腐蚀到稳定" 的细化.
//!
//! 实现位于 `pano-berry/src/morph`.
//!
//! ### 最小二乘多项式拟合 ✅
//!
//! 基于 `nalgebra` 的 SVD 求解, 秩不足时拟合失败而不是 panic.
//!
//! 实现位于 `pano-berry/src/fitting`.
//!
//! ### 牙弓曲线三级提取 ✅
//!
//! 骨架法, 质心法, 默认 U 形曲线. 每一级都可以单独调用和测试.
//!
//! 实现位于 `pano-berry/src/arch`.
//!
//! ### 全景投影与编码 ✅
//!
//! 沿曲线逐点取深度方向的体素列, 拼成全景栅格; 再以 min-max 窗口规范化到
//! 8-bit 灰度并编码为 PNG.
//!
//! 实现位于 `pano-berry/src/panoramic`.
//!
//! ### 流水线, 取消与进度 ✅
//!
//! 各阶段之间检查取消标志, 并向观察者报告当前阶段.
//!
//! 实现位于 `pano-berry/src/pipeline`.
//!
//! ### 横截面 (cross-section) 图像 ⌛️
//!
//! 沿曲线法向截取的二维截面. 目前尚未实现.

/// 二维索引 `(h, w)`, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引 `(z, h, w)`, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 高精度二维点. 在牙弓曲线中按 `(x, y)` 即 `(列, 行)` 解释.
pub type Idx2dF = (f64, f64);

/// CBCT 体数据与切片.
mod data;

pub use data::{
    CbctVolume, ImgWriteVis, IntensityWindow, OwnedScanSlice, ScanSlice, VoxelSpacing,
};

pub mod arch;

pub mod consts;

pub mod dataset;

mod error;

pub use error::{PanoError, PanoResult};

pub mod fitting;

pub mod morph;

pub mod panoramic;

pub mod pipeline;

pub mod prelude;

pub use arch::{ArchCurve, ArchParams, ArchSource};
pub use panoramic::{NormalizedRaster, PanoramicImage, PanoramicParams};
pub use pipeline::{detect_arch, generate_panoramic, PanoramicPipeline};
