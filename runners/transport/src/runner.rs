//! 程序运行函数.

use anyhow::Context;
use ctb_berry::dataset::scaffold;
use ctb_berry::heatmap::ImgWriteRaw;
use ctb_berry::pipeline::Pipeline;
use ctb_berry::Side;

use crate::project::{Animal, Project};
use crate::report::{SideSummary, TransportResult};

/// 处理一只动物的一侧, 保存热图.
fn run_one(project: &Project, animal: &Animal, side: Side, key: &str) -> anyhow::Result<SideSummary> {
    let pipeline = Pipeline::new(project.pipeline_config(animal, side))?;
    let report = if project.parallel() {
        pipeline.par_run()?
    } else {
        pipeline.run()?
    };

    let path = project.output_dir().join(format!("{key}.png"));
    report
        .heatmap
        .colorize(project.colormap(), pipeline.config().mask_color())
        .save(&path)
        .with_context(|| format!("Cannot save heatmap `{}`", path.display()))?;
    if project.save_raw() {
        let raw = project.output_dir().join(format!("{key}_raw.png"));
        report
            .heatmap
            .save_raw(&raw)
            .with_context(|| format!("Cannot save heatmap `{}`", raw.display()))?;
    }
    log::info!("`{key}`: heatmap saved to `{}`", path.display());
    Ok(SideSummary::from(&report))
}

/// 实际运行. 单个单元失败不会中断整个批次.
pub fn run(project: &Project) -> anyhow::Result<TransportResult> {
    std::fs::create_dir_all(project.output_dir())
        .with_context(|| format!("Cannot create `{}`", project.output_dir().display()))?;

    let mut result = TransportResult::default();
    for animal in project.animals() {
        for &side in project.sides() {
            let key = format!("{}_{side}", animal.id);
            log::info!("Processing `{key}`...");
            let outcome = run_one(project, animal, side, &key);
            if let Err(e) = &outcome {
                log::error!("`{key}` failed: {e:#}");
            }
            result.push(key, outcome);
        }
    }
    Ok(result)
}

/// 创建项目目录结构与颜色条.
pub fn init(project: &Project) -> anyhow::Result<()> {
    let ids = project.animals().iter().map(|a| a.id.as_str());
    scaffold(project.root(), ids, project.colormap())?;
    log::info!("Project scaffolded under `{}`", project.root().display());
    Ok(())
}
