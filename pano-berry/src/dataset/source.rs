//! 按序列标识加载体数据.

use super::FilenameBuilder;
use crate::{CbctVolume, PanoResult, VoxelSpacing};
use std::path::{Path, PathBuf};

/// 体数据来源. 给定序列标识, 返回完整加载的体数据.
///
/// 实现方负责 I/O, 失败时返回 `Err`; 调用方不会重试.
pub trait VolumeSource {
    /// 加载 `series` 对应的体数据.
    fn load_volume(&self, series: &str) -> PanoResult<CbctVolume>;
}

impl<S: VolumeSource + ?Sized> VolumeSource for &S {
    #[inline]
    fn load_volume(&self, series: &str) -> PanoResult<CbctVolume> {
        (**self).load_volume(series)
    }
}

fn default_nifti_name(series: &str) -> String {
    format!("{series}.nii")
}

fn default_npy_name(series: &str) -> String {
    format!("{series}.npy")
}

/// 目录下的 nifti (`.nii` 或 `.nii.gz`) 文件. 间距取自文件头.
#[derive(Debug, Clone)]
pub struct NiftiSource {
    dir: PathBuf,
    builder: FilenameBuilder,
}

impl NiftiSource {
    /// 文件名默认为 `{series}.nii`.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self::with_builder(dir, default_nifti_name)
    }

    /// 以自定义文件名构造器创建.
    pub fn with_builder<P: AsRef<Path>>(dir: P, builder: FilenameBuilder) -> Self {
        Self {
            dir: dir.as_ref().to_owned(),
            builder,
        }
    }

    /// `series` 对应的文件路径.
    #[inline]
    pub fn path_of(&self, series: &str) -> PathBuf {
        self.dir.join((self.builder)(series))
    }
}

impl VolumeSource for NiftiSource {
    fn load_volume(&self, series: &str) -> PanoResult<CbctVolume> {
        let path = self.path_of(series);
        log::debug!("loading nifti volume {}", path.display());
        CbctVolume::open_nifti(path)
    }
}

/// 目录下的 npy 文件, 保存 `[row, col, depth]` 布局的 `f32` 数组.
///
/// npy 不携带间距信息, 所有文件共用创建时给出的 `spacing`.
#[derive(Debug, Clone)]
pub struct NpySource {
    dir: PathBuf,
    builder: FilenameBuilder,
    spacing: VoxelSpacing,
}

impl NpySource {
    /// 文件名默认为 `{series}.npy`.
    pub fn new<P: AsRef<Path>>(dir: P, spacing: VoxelSpacing) -> Self {
        Self::with_builder(dir, spacing, default_npy_name)
    }

    /// 以自定义文件名构造器创建.
    pub fn with_builder<P: AsRef<Path>>(
        dir: P,
        spacing: VoxelSpacing,
        builder: FilenameBuilder,
    ) -> Self {
        Self {
            dir: dir.as_ref().to_owned(),
            builder,
            spacing,
        }
    }

    /// `series` 对应的文件路径.
    #[inline]
    pub fn path_of(&self, series: &str) -> PathBuf {
        self.dir.join((self.builder)(series))
    }
}

impl VolumeSource for NpySource {
    fn load_volume(&self, series: &str) -> PanoResult<CbctVolume> {
        let path = self.path_of(series);
        log::debug!("loading npy volume {}", path.display());
        CbctVolume::open_npy(path, self.spacing)
    }
}
