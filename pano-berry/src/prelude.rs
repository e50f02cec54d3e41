//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx2dF, Idx3d};

pub use crate::data::slice::{ImgWriteVis, OwnedScanSlice, ScanSlice};
pub use crate::data::window::IntensityWindow;
pub use crate::data::{CbctVolume, VoxelSpacing};

pub use crate::arch::{extract_arch, select_slice, ArchCurve, ArchParams, ArchSource};
pub use crate::panoramic::{NormalizedRaster, PanoramicImage, PanoramicParams};
pub use crate::pipeline::{
    detect_arch, generate_panoramic, CancelToken, PanoramicPipeline, Stage,
};

pub use crate::dataset::{self, home_dataset_dir_with, NiftiSource, NpySource, VolumeSource};

pub use crate::{PanoError, PanoResult};
