//! 统计数据集上三级牙弓曲线检测各自的生效次数和耗时.

mod profile;
mod result;
mod runner;

fn main() {
    simple_logger::init_with_level(log::Level::Warn).unwrap();
    runner::run().analyze();
}
