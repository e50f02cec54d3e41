//! 数据集操作.

use std::path::{Path, PathBuf};

pub mod generic;
mod source;

pub use source::{NiftiSource, NpySource, VolumeSource};

/// 文件名构造器. 接受序列标识, 获得文件名.
pub type FilenameBuilder = fn(&str) -> String;

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    Some(ans)
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = home_dataset_dir()?;
    ans.extend(it);
    Some(ans)
}
