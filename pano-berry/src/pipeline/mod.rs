//! 完整流水线: 切片选择, 牙弓曲线提取, 全景投影.
//!
//! 一次调用在当前线程上同步执行, 不做任何 I/O. 多个调用可以共享同一个
//! [`CbctVolume`] 并行执行, 无需加锁.

mod checkpoint;

pub use checkpoint::{CancelToken, Checkpoint, Stage, Uninterrupted};

use crate::arch::{self, ArchCurve, ArchParams};
use crate::panoramic::{PanoramicImage, PanoramicParams};
use crate::{CbctVolume, PanoError, PanoResult};

/// 阶段观察者.
pub type StageObserver = Box<dyn Fn(Stage) + Send + Sync>;

/// 以默认参数检测牙弓曲线. 不会失败.
///
/// 选出最可能包含牙弓的切片, 再逐级降级地提取曲线. 调用方可以通过
/// [`ArchCurve::source`] 得知实际采用的方法.
pub fn detect_arch(volume: &CbctVolume) -> ArchCurve {
    // 默认参数总是合法的.
    match run_detection(volume, &ArchParams::default(), &Uninterrupted) {
        Ok(curve) => curve,
        Err(never) => match never {},
    }
}

/// 同 [`detect_arch`], 但使用给定参数, 并在每个阶段之前询问 `cp`.
///
/// # 返回值
///
/// `params` 非法或 `cp` 要求中止时返回 `Err`.
pub fn detect_arch_with<C>(
    volume: &CbctVolume,
    params: &ArchParams,
    cp: &C,
) -> Result<ArchCurve, C::Error>
where
    C: Checkpoint,
    C::Error: From<PanoError>,
{
    params.validate()?;
    run_detection(volume, params, cp)
}

fn run_detection<C: Checkpoint>(
    volume: &CbctVolume,
    params: &ArchParams,
    cp: &C,
) -> Result<ArchCurve, C::Error> {
    cp.check(Stage::SelectSlice)?;
    let index = arch::select_slice(volume);
    let thickness_mm = volume.spacing().slice_mm() * params.slab_samples as f64;
    arch::run_tiers(volume.slice_at(index), index, thickness_mm, params, cp)
}

/// 生成全景图像. 投影半高为 `thickness` 个切片.
///
/// `curve` 为 `None` 时先调用 [`detect_arch`], 否则沿给定曲线投影.
/// 两种情况下都以曲线所在切片为中心.
///
/// # 返回值
///
/// `thickness` 为 0 或 `curve` 不满足不变量时返回 `Err`.
pub fn generate_panoramic(
    volume: &CbctVolume,
    curve: Option<&ArchCurve>,
    thickness: usize,
) -> PanoResult<PanoramicImage> {
    let panoramic = PanoramicParams::with_thickness(thickness);
    panoramic.validate()?;
    match curve {
        Some(curve) => PanoramicImage::project(volume, curve, &panoramic, curve.slice_index()),
        None => {
            let curve = detect_arch(volume);
            PanoramicImage::project(volume, &curve, &panoramic, curve.slice_index())
        }
    }
}

/// 可配置的流水线.
///
/// 持有参数, 取消标志和可选的阶段观察者. 本身只读, 可在多个线程间共享.
///
/// ```no_run
/// use pano_berry::pipeline::{CancelToken, PanoramicPipeline};
/// # fn load() -> pano_berry::CbctVolume { unimplemented!() }
///
/// let token = CancelToken::new();
/// let pipeline = PanoramicPipeline::default()
///     .with_cancel_token(token.clone())
///     .with_observer(|stage| log::info!("entering {stage}"));
/// let (curve, image) = pipeline.generate_panoramic(&load(), None).unwrap();
/// assert_eq!(image.width(), curve.len());
/// ```
#[derive(Default)]
pub struct PanoramicPipeline {
    /// 牙弓曲线提取参数.
    pub arch: ArchParams,

    /// 投影参数.
    pub panoramic: PanoramicParams,

    cancel: CancelToken,
    observer: Option<StageObserver>,
}

impl PanoramicPipeline {
    /// 以给定参数创建.
    pub fn new(arch: ArchParams, panoramic: PanoramicParams) -> Self {
        Self {
            arch,
            panoramic,
            ..Default::default()
        }
    }

    /// 使用调用方持有的取消标志.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// 每个阶段开始前调用 `observer`.
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(Stage) + Send + Sync + 'static,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    /// 取消标志的句柄.
    #[inline]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// 检查全部参数.
    pub fn validate(&self) -> PanoResult<()> {
        self.arch.validate()?;
        self.panoramic.validate()
    }

    /// 检测牙弓曲线. 参数非法或被取消时返回 `Err`.
    pub fn detect_arch(&self, volume: &CbctVolume) -> PanoResult<ArchCurve> {
        detect_arch_with(volume, &self.arch, &self.watch())
    }

    /// 生成全景图像, 同时返回所沿的曲线.
    ///
    /// `curve` 为 `None` 时先检测曲线.
    pub fn generate_panoramic(
        &self,
        volume: &CbctVolume,
        curve: Option<&ArchCurve>,
    ) -> PanoResult<(ArchCurve, PanoramicImage)> {
        self.validate()?;
        let watch = self.watch();
        let curve = match curve {
            Some(curve) => {
                curve.validate()?;
                curve.clone()
            }
            None => detect_arch_with(volume, &self.arch, &watch)?,
        };
        watch.check(Stage::Project)?;
        let image = PanoramicImage::project(volume, &curve, &self.panoramic, curve.slice_index())?;
        Ok((curve, image))
    }

    fn watch(&self) -> Watch<'_> {
        Watch {
            cancel: &self.cancel,
            observer: self.observer.as_deref(),
        }
    }
}

/// 先检查取消, 再通知观察者.
struct Watch<'a> {
    cancel: &'a CancelToken,
    observer: Option<&'a (dyn Fn(Stage) + Send + Sync)>,
}

impl Checkpoint for Watch<'_> {
    type Error = PanoError;

    fn check(&self, stage: Stage) -> PanoResult<()> {
        self.cancel.check(stage)?;
        if let Some(observer) = self.observer {
            observer(stage);
        }
        Ok(())
    }
}
