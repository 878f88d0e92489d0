//! 单只动物单侧的批处理流水线.
//!
//! 对每张切片依次执行: 读取图像与 ROI, 获取背景阈值, 光栅化, 分箱计算密度,
//! 构建条带图像. 全部切片处理完毕后合成热图并计算运输百分比.
//!
//! 切片级别的错误按 [`ErrorKind`] 处置:
//!
//! - [`ErrorKind::Integrity`]: 跳过该切片, 记录警告;
//! - [`ErrorKind::Configuration`]: 该切片失败, 记录错误, 其余切片照常处理;
//! - [`ErrorKind::DegenerateInput`]: 整个单元终止并返回该错误.

use std::path::{Path, PathBuf};

use image::Rgb;

use crate::background::{BackgroundMode, BackgroundSource, SectionContext};
use crate::consts::{
    BACKGROUND_CORRECTION, DEFAULT_RESOLUTION, DEFAULT_STRIP_WIDTH, STRIP_MICRONS,
    TRANSPORT_THRESHOLD,
};
use crate::dataset::{discover_sections, RoiNaming, SectionFile};
use crate::error::{ErrorKind, TraceError, TraceResult};
use crate::heatmap::{Heatmap, HeatmapBuilder, TransportTally};
use crate::roi::PolygonRoi;
use crate::strip::{bin_width, StripBinner, StripImage, StripProfile};
use crate::{Channel, SectionImage, Side};

/// 流水线配置.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    image_dir: PathBuf,
    roi_dir: PathBuf,
    background: BackgroundMode,
    side: Side,
    strip_width: usize,
    resolution: f64,
    strip_microns: f64,
    threshold: f64,
    correction: f64,
    channel: Channel,
    naming: RoiNaming,
    mask_color: Rgb<u8>,
}

impl PipelineConfig {
    /// 以默认的数值参数创建配置.
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(
        image_dir: P,
        roi_dir: Q,
        background: BackgroundMode,
        side: Side,
    ) -> Self {
        Self {
            image_dir: image_dir.into(),
            roi_dir: roi_dir.into(),
            background,
            side,
            strip_width: DEFAULT_STRIP_WIDTH,
            resolution: DEFAULT_RESOLUTION,
            strip_microns: STRIP_MICRONS,
            threshold: TRANSPORT_THRESHOLD,
            correction: BACKGROUND_CORRECTION,
            channel: Channel::default(),
            naming: RoiNaming::default(),
            mask_color: Rgb([0, 0, 0]),
        }
    }

    /// 设置热图中每张切片条带的像素宽度.
    #[inline]
    pub fn with_strip_width(mut self, strip_width: usize) -> Self {
        self.strip_width = strip_width;
        self
    }

    /// 设置分辨率 (像素每微米).
    #[inline]
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// 设置单个条带的物理宽度 (微米).
    #[inline]
    pub fn with_strip_microns(mut self, strip_microns: f64) -> Self {
        self.strip_microns = strip_microns;
        self
    }

    /// 设置运输阈值.
    #[inline]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// 设置计算模式下的背景校正系数.
    #[inline]
    pub fn with_correction(mut self, correction: f64) -> Self {
        self.correction = correction;
        self
    }

    /// 设置彩色图像的取样通道.
    #[inline]
    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = channel;
        self
    }

    /// 设置 ROI 命名约定.
    #[inline]
    pub fn with_naming(mut self, naming: RoiNaming) -> Self {
        self.naming = naming;
        self
    }

    /// 设置热图补齐区域的颜色.
    #[inline]
    pub fn with_mask_color(mut self, mask_color: Rgb<u8>) -> Self {
        self.mask_color = mask_color;
        self
    }

    /// 切片图像目录.
    #[inline]
    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    /// ROI 目录.
    #[inline]
    pub fn roi_dir(&self) -> &Path {
        &self.roi_dir
    }

    /// 背景模式.
    #[inline]
    pub fn background(&self) -> &BackgroundMode {
        &self.background
    }

    /// 左右侧.
    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    /// 条带图像宽度.
    #[inline]
    pub fn strip_width(&self) -> usize {
        self.strip_width
    }

    /// 运输阈值.
    #[inline]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// 取样通道.
    #[inline]
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// ROI 命名约定.
    #[inline]
    pub fn naming(&self) -> &RoiNaming {
        &self.naming
    }

    /// 热图补齐区域的颜色.
    #[inline]
    pub fn mask_color(&self) -> Rgb<u8> {
        self.mask_color
    }

    /// 分箱宽度 `ceil(strip_microns * resolution)`.
    #[inline]
    pub fn bin_width(&self) -> TraceResult<usize> {
        bin_width(self.strip_microns, self.resolution)
    }

    /// 检查全部数值参数. 不合法时返回 [`TraceError::InvalidParameter`].
    pub fn validate(&self) -> TraceResult<()> {
        TraceError::check_param("strip_width", self.strip_width as f64, |v| v >= 1.0)?;
        TraceError::check_param("threshold", self.threshold, |v| (0.0..=1.0).contains(&v))?;
        TraceError::check_param("correction", self.correction, |v| v > 0.0)?;
        self.bin_width()?;
        Ok(())
    }
}

/// 一张切片成功处理后的产物.
#[derive(Clone, Debug)]
pub struct SectionStrip {
    /// 切片文件.
    pub file: SectionFile,

    /// 使用的背景阈值.
    pub background: f64,

    /// 条带密度序列.
    pub profile: StripProfile,

    /// 条带图像.
    pub strip: StripImage,
}

/// 成功处理的切片摘要.
#[derive(Clone, Debug, PartialEq)]
pub struct SectionSummary {
    /// 图像文件名.
    pub name: String,

    /// 背景阈值.
    pub background: f64,

    /// 条带个数.
    pub num_bins: usize,

    /// 达标条带个数.
    pub num_pass: usize,
}

/// 被跳过或失败的切片.
#[derive(Debug)]
pub struct SectionIssue {
    /// 图像文件名.
    pub name: String,

    /// 导致问题的错误.
    pub error: TraceError,
}

/// 单只动物单侧的运行结果.
#[derive(Debug)]
pub struct SideReport {
    /// 左右侧.
    pub side: Side,

    /// 合成的热图与掩膜.
    pub heatmap: Heatmap,

    /// 条带计数.
    pub tally: TransportTally,

    /// 运输百分比, 保留一位小数.
    pub transport: f64,

    /// 成功处理的切片, 按切片顺序排列.
    pub processed: Vec<SectionSummary>,

    /// 因文件缺失或损坏而跳过的切片.
    pub skipped: Vec<SectionIssue>,

    /// 因配置错误 (如背景值表缺行) 而失败的切片.
    pub failed: Vec<SectionIssue>,
}

/// 单只动物单侧的流水线.
pub struct Pipeline {
    config: PipelineConfig,
    binner: StripBinner,
    source: Box<dyn BackgroundSource>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("binner", &self.binner)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// 检查配置并准备背景来源. 查表模式会在这里读入整张表.
    pub fn new(config: PipelineConfig) -> TraceResult<Self> {
        config.validate()?;
        let source = config
            .background
            .build(&config.roi_dir, &config.naming, config.correction)?;
        Self::with_source(config, source)
    }

    /// 使用自定义背景来源.
    pub fn with_source(config: PipelineConfig, source: Box<dyn BackgroundSource>) -> TraceResult<Self> {
        config.validate()?;
        let width = config.bin_width()?;
        let binner = StripBinner::new(width).ok_or(TraceError::InvalidParameter {
            name: "bin_width",
            value: width as f64,
        })?;
        log::debug!("Bin width: {width} px");
        Ok(Self {
            config,
            binner,
            source,
        })
    }

    /// 获取配置.
    #[inline]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 处理单张切片.
    pub fn process_section(&self, file: &SectionFile) -> TraceResult<SectionStrip> {
        let cfg = &self.config;
        let image = SectionImage::open(file.path(), cfg.channel)?;
        let roi_path = cfg.roi_dir.join(cfg.naming.section_roi(file.stem(), cfg.side));
        let roi = PolygonRoi::open(roi_path)?;

        let ctx = SectionContext {
            name: file.name(),
            stem: file.stem(),
            side: cfg.side,
            image: &image,
        };
        let background = self.source.background(&ctx)?;

        let pixels = roi.rasterize()?;
        let profile = self
            .binner
            .profile(&pixels, &image, background, cfg.threshold)?;
        let strip = StripImage::build(&profile, cfg.strip_width, cfg.side)?;
        log::debug!(
            "`{}`: background {background:.3}, {} pixels, {}/{} bins passed",
            file.name(),
            pixels.len(),
            profile.num_pass(),
            profile.num_bins()
        );
        Ok(SectionStrip {
            file: file.clone(),
            background,
            profile,
            strip,
        })
    }

    /// 列出图像目录下的全部切片并按顺序处理.
    pub fn run(&self) -> TraceResult<SideReport> {
        let files = discover_sections(&self.config.image_dir)?;
        self.run_sections(&files)
    }

    /// 按给定顺序依次处理 `files`.
    pub fn run_sections(&self, files: &[SectionFile]) -> TraceResult<SideReport> {
        self.fold(files.iter().map(|f| self.process_section(f)), files)
    }

    /// 将逐切片结果按顺序汇总为 [`SideReport`].
    fn fold<I>(&self, outcomes: I, files: &[SectionFile]) -> TraceResult<SideReport>
    where
        I: IntoIterator<Item = TraceResult<SectionStrip>>,
    {
        let side = self.config.side;
        let mut builder = HeatmapBuilder::new();
        let mut tally = TransportTally::default();
        let mut processed = Vec::new();
        let mut skipped = Vec::new();
        let mut failed = Vec::new();

        for (file, outcome) in files.iter().zip(outcomes) {
            let name = file.name().to_string();
            let error = match outcome {
                Ok(s) => {
                    log::info!(
                        "[{side}] `{name}`: {}/{} bins passed",
                        s.profile.num_pass(),
                        s.profile.num_bins()
                    );
                    tally.add_profile(&s.profile);
                    processed.push(SectionSummary {
                        name,
                        background: s.background,
                        num_bins: s.profile.num_bins(),
                        num_pass: s.profile.num_pass(),
                    });
                    builder.push(s.strip);
                    continue;
                }
                Err(e) => e,
            };
            match error.kind() {
                ErrorKind::Integrity => {
                    log::warn!("[{side}] Skipping `{name}`: {error}");
                    skipped.push(SectionIssue { name, error });
                }
                ErrorKind::Configuration => {
                    log::error!("[{side}] `{name}` failed: {error}");
                    failed.push(SectionIssue { name, error });
                }
                ErrorKind::DegenerateInput => {
                    log::error!("[{side}] Degenerate input in `{name}`: {error}");
                    return Err(error);
                }
            }
        }

        let transport = tally.percent()?;
        let heatmap = builder.finish()?;
        log::info!(
            "[{side}] Transport {transport:.1}% ({} processed, {} skipped, {} failed)",
            processed.len(),
            skipped.len(),
            failed.len()
        );
        Ok(SideReport {
            side,
            heatmap,
            tally,
            transport,
            processed,
            skipped,
            failed,
        })
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
    }
}

/// 并发操作部分
#[cfg(feature = "rayon")]
impl Pipeline {
    /// 借助 `rayon`, 并行地处理图像目录下的全部切片.
    pub fn par_run(&self) -> TraceResult<SideReport> {
        let files = discover_sections(&self.config.image_dir)?;
        self.par_run_sections(&files)
    }

    /// 借助 `rayon`, 并行地处理 `files`. 合成前恢复切片顺序, 结果与 [`Pipeline::run_sections`] 相同.
    pub fn par_run_sections(&self, files: &[SectionFile]) -> TraceResult<SideReport> {
        let outcomes: Vec<_> = files
            .par_iter()
            .map(|f| self.process_section(f))
            .collect();
        self.fold(outcomes, files)
    }
}
