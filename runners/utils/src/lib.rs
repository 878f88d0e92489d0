//! 批处理程序依赖的通用组件.

use log::LevelFilter;
use simple_logger::SimpleLogger;

pub mod loader;

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线.
#[inline]
pub fn sep_to<W: std::io::Write>(mut w: W) -> std::io::Result<()> {
    writeln!(&mut w, "{SEP}")
}

/// 安装日志后端. 默认级别为 `info`, 可由 `$RUST_LOG` 覆盖.
///
/// 重复安装时静默忽略.
pub fn init_logger() {
    let _ = SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init();
}
