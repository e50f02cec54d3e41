//! 对 `pano-berry::dataset` 的更一层封装. 提供更直接的数据集加载器.

use pano_berry::dataset::generic::{volume_loader, VolumeLoader};
use pano_berry::dataset::{self, NiftiSource};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// 获取 CBCT 扫描目录.
///
/// 1. 若环境变量 `$PANO_SCAN_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/cbct`.
pub fn scan_dir_from_env_or_home() -> Option<PathBuf> {
    match env::var_os("PANO_SCAN_DIR") {
        Some(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => dataset::home_dataset_dir_with(["cbct"]),
    }
}

/// 目录下全部 nifti 文件的文件名, 按字典序排列.
pub fn nifti_series<P: AsRef<Path>>(dir: P) -> io::Result<Vec<String>> {
    let mut ans: Vec<String> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.ends_with(".nii") || name.ends_with(".nii.gz"))
        .collect();
    ans.sort_unstable();
    Ok(ans)
}

fn as_is(name: &str) -> String {
    name.to_owned()
}

/// 以文件名为序列标识的 nifti 来源.
#[inline]
pub fn nifti_source<P: AsRef<Path>>(dir: P) -> NiftiSource {
    NiftiSource::with_builder(dir, as_is)
}

/// 加载 `dir` 下 `series` 对应的体数据.
pub fn scan_loader<P: AsRef<Path>>(dir: P, series: Vec<String>) -> VolumeLoader<NiftiSource> {
    volume_loader(nifti_source(dir), series)
}
