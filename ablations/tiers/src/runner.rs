//! 程序运行函数.

use crate::profile::Profile;
use crate::result::AblationResult;
use pano_berry::prelude::*;
use std::path::Path;
use std::thread;
use utils::loader;

/// 处理一组扫描.
fn run_chunk(dir: &Path, series: Vec<String>, out_dir: Option<&Path>) -> Profile {
    let pipeline = PanoramicPipeline::default();
    let mut profile = Profile::new();

    for (name, volume) in loader::scan_loader(dir, series) {
        let volume = match volume {
            Ok(v) => v,
            Err(e) => {
                log::error!("cannot load `{name}`: {e}");
                profile.count_failed();
                continue;
            }
        };

        profile.work_start();
        let (curve, image) = match pipeline.generate_panoramic(&volume, None) {
            Ok(ans) => ans,
            Err(e) => {
                log::error!("`{name}`: {e}");
                profile.count_failed();
                continue;
            }
        };
        profile.work_done(curve.source());

        if curve.is_fallback() {
            log::warn!("`{name}`: arch from {} tier", curve.source());
        }
        if let Some(out) = out_dir {
            let path = out.join(format!("{name}.png"));
            if let Err(e) = image.save(&path) {
                log::error!("cannot save {}: {e}", path.display());
            }
        }
    }
    profile.finish()
}

/// 实际运行.
pub fn run() -> AblationResult {
    let dir = loader::scan_dir_from_env_or_home().expect("Cannot locate home directory");
    assert!(dir.is_dir(), "{} is not a directory", dir.display());
    let series = loader::nifti_series(&dir).expect("Cannot list scan directory");
    assert!(!series.is_empty(), "No nifti file in {}", dir.display());

    let out_dir = utils::out_dir_from_env();
    if let Some(out) = out_dir.as_deref() {
        std::fs::create_dir_all(out).expect("Cannot create output directory");
    }

    let total = series.len();
    let workers = utils::cpus().min(total);
    let chunk = total.div_ceil(workers);

    println!("Running ablation studies on {total} scans with {workers} threads...");
    let profile = thread::scope(|s| {
        let (dir, out_dir) = (dir.as_path(), out_dir.as_deref());
        let handles: Vec<_> = series
            .chunks(chunk)
            .map(|c| c.to_vec())
            .map(|c| s.spawn(move || run_chunk(dir, c, out_dir)))
            .collect();

        handles
            .into_iter()
            .map(|th| th.join().expect("Thread joining error"))
            .reduce(Profile::merge)
            .unwrap_or_default()
    });

    AblationResult::new(total, profile)
}
