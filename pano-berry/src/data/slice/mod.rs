//! CBCT 水平切片对象的操作.

mod core;
mod iter;
mod save;

pub use core::{OwnedScanSlice, ScanSlice};

pub(crate) use iter::PosIter;

pub use save::ImgWriteVis;
