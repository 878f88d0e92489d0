//! 项目描述文件.
//!
//! ```json
//! {
//!     "animals": [{ "id": "35" }, { "id": "36", "image_dir": "raw/36", "roi_dir": "roi/36" }],
//!     "sides": ["left", "right"],
//!     "background": { "mode": "table", "path": "background.csv" },
//!     "output_dir": "out",
//!     "resolution": 0.6154,
//!     "colormap": "plasma"
//! }
//! ```
//!
//! 相对路径以项目文件所在目录为基准. 动物未给出目录时使用
//! `{项目目录}/{id}/{id} tif` 与 `{项目目录}/{id}/{id} roi`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use ctb_berry::background::BackgroundMode;
use ctb_berry::dataset::{animal_dirs, RoiNaming};
use ctb_berry::heatmap::Colormap;
use ctb_berry::pipeline::PipelineConfig;
use ctb_berry::{Channel, Side};
use image::Rgb;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
enum BackgroundEntry {
    Table { path: PathBuf },
    Roi,
}

#[derive(Debug, Deserialize)]
struct AnimalEntry {
    id: String,
    image_dir: Option<PathBuf>,
    roi_dir: Option<PathBuf>,
}

fn default_sides() -> Vec<String> {
    vec!["left".to_string(), "right".to_string()]
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct ProjectFile {
    animals: Vec<AnimalEntry>,
    #[serde(default = "default_sides")]
    sides: Vec<String>,
    background: BackgroundEntry,
    output_dir: Option<PathBuf>,
    strip_width: Option<usize>,
    resolution: Option<f64>,
    strip_microns: Option<f64>,
    threshold: Option<f64>,
    correction: Option<f64>,
    channel: Option<String>,
    #[serde(default)]
    colormap: Colormap,
    mask_color: Option<[u8; 3]>,
    roi_suffix: Option<String>,
    #[serde(default = "default_true")]
    parallel: bool,
    #[serde(default)]
    save_raw: bool,
}

/// 一只动物的数据目录.
#[derive(Clone, Debug)]
pub struct Animal {
    pub id: String,
    pub image_dir: PathBuf,
    pub roi_dir: PathBuf,
}

/// 解析后的项目.
#[derive(Debug)]
pub struct Project {
    root: PathBuf,
    animals: Vec<Animal>,
    sides: Vec<Side>,
    background: BackgroundMode,
    output_dir: PathBuf,
    file: ProjectFile,
    channel: Channel,
}

fn parse_channel(s: &str) -> anyhow::Result<Channel> {
    Ok(match s.trim().to_ascii_lowercase().as_str() {
        "red" | "r" => Channel::Red,
        "green" | "g" => Channel::Green,
        "blue" | "b" => Channel::Blue,
        other => bail!("Unknown channel `{other}`"),
    })
}

impl Project {
    /// 读取 `path` 处的项目文件.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read project file `{}`", path.display()))?;
        let root = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_json(&text, root)
            .with_context(|| format!("Invalid project file `{}`", path.display()))
    }

    /// 以 `root` 为基准目录解析项目描述.
    pub fn from_json(text: &str, root: &Path) -> anyhow::Result<Self> {
        let file: ProjectFile = serde_json::from_str(text)?;
        let resolve = |p: &Path| root.join(p);

        let animals = file
            .animals
            .iter()
            .map(|a| {
                let (tif, roi) = animal_dirs(root, &a.id);
                Animal {
                    id: a.id.clone(),
                    image_dir: a.image_dir.as_deref().map_or(tif, resolve),
                    roi_dir: a.roi_dir.as_deref().map_or(roi, resolve),
                }
            })
            .collect();
        let sides = file
            .sides
            .iter()
            .map(|s| s.parse::<Side>())
            .collect::<Result<Vec<_>, _>>()?;
        let background = match &file.background {
            BackgroundEntry::Table { path } => BackgroundMode::Table(resolve(path)),
            BackgroundEntry::Roi => BackgroundMode::Roi,
        };
        let output_dir = file
            .output_dir
            .as_deref()
            .map_or_else(|| root.join("output"), resolve);
        let channel = file
            .channel
            .as_deref()
            .map(parse_channel)
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            root: root.to_owned(),
            animals,
            sides,
            background,
            output_dir,
            file,
            channel,
        })
    }

    /// 项目根目录.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn animals(&self) -> &[Animal] {
        &self.animals
    }

    pub fn sides(&self) -> &[Side] {
        &self.sides
    }

    /// 热图与报告的输出目录.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn colormap(&self) -> Colormap {
        self.file.colormap
    }

    /// 是否并行处理切片.
    pub fn parallel(&self) -> bool {
        self.file.parallel
    }

    /// 是否额外保存未着色的热图.
    pub fn save_raw(&self) -> bool {
        self.file.save_raw
    }

    /// 为 `animal` 的 `side` 一侧生成流水线配置. 未给出的数值参数使用默认值.
    pub fn pipeline_config(&self, animal: &Animal, side: Side) -> PipelineConfig {
        let f = &self.file;
        let mut c = PipelineConfig::new(
            animal.image_dir.clone(),
            animal.roi_dir.clone(),
            self.background.clone(),
            side,
        )
        .with_channel(self.channel);
        if let Some(v) = f.strip_width {
            c = c.with_strip_width(v);
        }
        if let Some(v) = f.resolution {
            c = c.with_resolution(v);
        }
        if let Some(v) = f.strip_microns {
            c = c.with_strip_microns(v);
        }
        if let Some(v) = f.threshold {
            c = c.with_threshold(v);
        }
        if let Some(v) = f.correction {
            c = c.with_correction(v);
        }
        if let Some(rgb) = f.mask_color {
            c = c.with_mask_color(Rgb(rgb));
        }
        if let Some(s) = &f.roi_suffix {
            c = c.with_naming(RoiNaming::with_suffix(s.as_str()));
        }
        c
    }
}
