//! 图像的持久化存储.

use crate::{IntensityWindow, OwnedScanSlice, ScanSlice};
use image::{GrayImage, ImageResult, Luma};
use std::path::Path;

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
///
/// 图像不会按原样保存: 体素值会先经过 min-max 窗口规范化到 8-bit 灰度,
/// 二值图则映射为黑白两色.
pub trait ImgWriteVis {
    /// 按照一定的可视化规则将图片保存到 `path` 路径.
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

/// 以 min-max 窗口将切片转换为 8-bit 灰度图. 常数切片会被转换为全黑.
pub(crate) fn scan_to_gray(slice: &ScanSlice<'_>) -> GrayImage {
    let (height, width) = slice.shape();
    let window = IntensityWindow::from_values(slice.iter().copied());
    let mut buf = GrayImage::new(width as u32, height as u32);
    for ((h, w), &v) in slice.indexed_iter() {
        let gray = window.and_then(|wnd| wnd.eval(v)).unwrap_or(u8::MIN);
        buf.put_pixel(w as u32, h as u32, Luma([gray]));
    }
    buf
}

impl ImgWriteVis for ScanSlice<'_> {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        scan_to_gray(self).save(path)
    }
}

impl ImgWriteVis for OwnedScanSlice {
    #[inline]
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        self.as_immutable().save(path)
    }
}
