//! 全景图像的规范化与编码.

use super::PanoramicImage;
use crate::{ImgWriteVis, IntensityWindow, PanoResult};
use image::{DynamicImage, GrayImage, ImageOutputFormat, ImageResult, Luma};
use std::io::Cursor;
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 规范化到 8-bit 灰度的栅格, 行优先存储.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NormalizedRaster {
    /// 宽.
    pub width: u32,
    /// 高.
    pub height: u32,
    /// `height * width` 个像素.
    pub pixels: Vec<u8>,
}

impl PanoramicImage {
    /// 覆盖全部有限体素值的 min-max 窗口. 常数图像返回 `None`.
    pub fn window(&self) -> Option<IntensityWindow> {
        IntensityWindow::from_values(self.data().iter().copied())
    }

    /// 以 min-max 窗口规范化后的灰度图. 常数图像全部为 0.
    pub fn to_gray_image(&self) -> GrayImage {
        let window = self.window();
        let data = self.data();
        GrayImage::from_fn(self.width() as u32, self.height() as u32, |x, y| {
            let v = data[(y as usize, x as usize)];
            Luma([window.and_then(|wnd| wnd.eval(v)).unwrap_or(u8::MIN)])
        })
    }

    /// 规范化后的栅格.
    pub fn normalized(&self) -> NormalizedRaster {
        let img = self.to_gray_image();
        NormalizedRaster {
            width: img.width(),
            height: img.height(),
            pixels: img.into_raw(),
        }
    }

    /// 编码为内存中的 PNG.
    pub fn encode_png(&self) -> PanoResult<Vec<u8>> {
        let mut bytes: Vec<u8> = Vec::new();
        DynamicImage::ImageLuma8(self.to_gray_image())
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)?;
        Ok(bytes)
    }
}

impl ImgWriteVis for PanoramicImage {
    #[inline]
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        self.to_gray_image().save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::ArchSource;
    use ndarray::{arr2, Array2};

    fn image(data: Array2<f32>) -> PanoramicImage {
        PanoramicImage {
            data,
            source: ArchSource::Skeleton,
        }
    }

    #[test]
    fn test_normalized_min_max() {
        let img = image(arr2(&[[50.0, 1000.0], [525.0, 50.0], [50.0, 2000.0]]));
        let raster = img.normalized();
        assert_eq!((raster.width, raster.height), (2, 3));
        assert_eq!(raster.pixels.len(), 6);
        assert_eq!(raster.pixels[0], 0);
        assert_eq!(raster.pixels[5], 255);
        // (525 - 50) / 1950 * 255 = 62.1...
        assert_eq!(raster.pixels[2], 62);
    }

    #[test]
    fn test_constant_raster_is_black() {
        let img = image(Array2::from_elem((4, 3), 7.0));
        assert!(img.window().is_none());
        assert!(img.normalized().pixels.iter().all(|&p| p == 0));
    }

    #[test]
    fn test_encode_png() {
        let img = image(Array2::from_shape_fn((20, 30), |(h, w)| (h * w) as f32));
        let bytes = img.encode_png().unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&bytes).unwrap().into_luma8();
        assert_eq!(decoded.dimensions(), (30, 20));
        assert_eq!(decoded.into_raw(), img.normalized().pixels);
    }
}
