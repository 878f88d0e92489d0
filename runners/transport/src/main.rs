//! CTB 运输批处理.
//!
//! ```text
//! transport [project.json]          # 处理全部动物与左右侧
//! transport --init [project.json]   # 仅创建目录结构与颜色条
//! ```

mod project;
mod report;
mod runner;

use anyhow::Context;
use project::Project;
use utils::loader;

fn main() -> anyhow::Result<()> {
    utils::init_logger();

    let mut args = std::env::args().skip(1);
    let mut first = args.next();
    let init = first.as_deref() == Some("--init");
    if init {
        first = args.next();
    }

    let path = loader::project_file_from_arg_env_or_home(first)
        .context("Cannot locate project file: pass it as an argument or set $CTB_PROJECT")?;
    let project = Project::open(&path)?;

    if init {
        return runner::init(&project);
    }

    let result = runner::run(&project)?;
    result.analyze()?;
    let csv = result.save(project.output_dir())?;
    log::info!("Report written to `{}`", csv.display());
    Ok(())
}
