//! 通用 CBCT 体数据加载器.
//!
//! 提供迭代器风格的数据集获取模式.

use super::VolumeSource;
use crate::{CbctVolume, PanoResult};

/// 从指定的序列标识与数据来源创建加载器.
///
/// 加载是惰性的: 每次迭代才读取一个文件, 读取失败时该项为 `Err`, 不影响后续项.
pub fn volume_loader<S, I, T>(source: S, series: I) -> VolumeLoader<S>
where
    S: VolumeSource,
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let mut series: Vec<String> = series.into_iter().map(Into::into).collect();
    series.reverse();

    VolumeLoader {
        source,
        series_rev: series,
    }
}

/// 3D CBCT 体数据加载器.
#[derive(Debug)]
pub struct VolumeLoader<S> {
    source: S,
    series_rev: Vec<String>,
}

impl<S: VolumeSource> Iterator for VolumeLoader<S> {
    type Item = (String, PanoResult<CbctVolume>);

    fn next(&mut self) -> Option<Self::Item> {
        let series = self.series_rev.pop()?;
        let data = self.source.load_volume(&series);
        Some((series, data))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.series_rev.len(), Some(self.series_rev.len()))
    }
}

impl<S: VolumeSource> ExactSizeIterator for VolumeLoader<S> {
    #[inline]
    fn len(&self) -> usize {
        self.series_rev.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PanoError, VoxelSpacing};
    use ndarray::Array3;

    /// 只认识 "ok" 的内存来源.
    struct Memory;

    impl VolumeSource for Memory {
        fn load_volume(&self, series: &str) -> PanoResult<CbctVolume> {
            if series == "ok" {
                CbctVolume::new(Array3::zeros((2, 2, 2)), VoxelSpacing::unit())
            } else {
                Err(PanoError::invalid_params(format!("unknown series {series}")))
            }
        }
    }

    #[test]
    fn test_loader_order_and_errors() {
        let mut loader = volume_loader(Memory, ["ok", "bad", "ok"]);
        assert_eq!(loader.len(), 3);

        let (name, vol) = loader.next().unwrap();
        assert_eq!(name, "ok");
        assert_eq!(vol.unwrap().shape(), (2, 2, 2));

        let (name, vol) = loader.next().unwrap();
        assert_eq!(name, "bad");
        assert!(vol.is_err());

        assert!(loader.next().unwrap().1.is_ok());
        assert!(loader.next().is_none());
        assert_eq!(loader.len(), 0);
    }
}
