//! 实验结果.

use crate::profile::Profile;
use pano_berry::ArchSource;
use std::io::{self, Write};

/// 将 `p` 的结果写进 `w` 中.
fn describe_into<W: Write>(total: usize, p: &Profile, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    #[inline]
    fn f64_to_display(f: Option<f64>) -> String {
        match f {
            Some(f) => format!("{f:.6}"),
            None => "/".to_string(),
        }
    }

    writeln!(w, "Scans: {total}")?;
    writeln!(w, "{S4}Failed: {}", p.failed())?;
    writeln!(w, "{S4}Processed: {}", p.processed())?;
    for tier in ArchSource::TIERS {
        writeln!(w, "{S4}{S4}{tier}: {}", p.tier_count(tier))?;
    }
    writeln!(w, "{S4}Fallback rate: {}", f64_to_display(p.fallback_rate()))?;
    writeln!(w, "{S4}Effective total time: {} us", p.work_time_us())?;
    writeln!(
        w,
        "{S4}Effective average time: {} us",
        f64_to_display(p.avg_work_time_us())
    )?;
    writeln!(w, "{S4}Total machine time: {} us", p.real_time_us())?;
    let t = p.most_time_consuming().map(|d| d.as_micros() as f64);
    write!(w, "{S4}Most time-consuming scan costs {} us", f64_to_display(t))?;
    Ok(())
}

/// 消融实验最终结果.
pub struct AblationResult {
    total: usize,
    profile: Profile,
}

impl AblationResult {
    pub fn new(total: usize, profile: Profile) -> Self {
        Self { total, profile }
    }

    /// 分析运行结果.
    pub fn analyze(&self) {
        utils::sep();
        let mut buf = Vec::with_capacity(512);
        describe_into(self.total, &self.profile, &mut buf).expect("Writing to memory buffer");
        println!("{}", String::from_utf8_lossy(&buf));
        utils::sep();
    }
}
