//! 消融实验依赖的通用组件.

use std::env;
use std::path::PathBuf;

pub mod loader;

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线.
#[inline]
pub fn sep() {
    println!("{SEP}");
}

/// 获得可并行核心数.
pub fn cpus() -> usize {
    std::thread::available_parallelism().map_or_else(|_| num_cpus::get(), usize::from)
}

/// 全景图输出目录. 仅当环境变量 `$PANO_OUT_DIR` 非空时返回.
pub fn out_dir_from_env() -> Option<PathBuf> {
    env::var_os("PANO_OUT_DIR")
        .filter(|d| !d.is_empty())
        .map(PathBuf::from)
}
