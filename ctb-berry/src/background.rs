//! 背景荧光阈值.
//!
//! 两种来源, 每次运行只选择一次:
//!
//! 1. [`BackgroundTable`]: 手动标定后导出的表格, 按文件名与左右侧查值.
//! 2. [`RoiBackground`]: 背景 ROI 内像素强度的平均值乘以校正系数.
//!
//! 两者都不会在缺少数据时回退到任何默认值.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::dataset::RoiNaming;
use crate::error::{TraceError, TraceResult};
use crate::roi::PolygonRoi;
use crate::{SectionImage, Side};

/// 查询背景值时可见的切片信息.
#[derive(Copy, Clone, Debug)]
pub struct SectionContext<'a> {
    /// 图像文件名 (含扩展名).
    pub name: &'a str,

    /// 图像文件名主干 (不含扩展名).
    pub stem: &'a str,

    /// 左右侧.
    pub side: Side,

    /// 切片图像.
    pub image: &'a SectionImage,
}

/// 背景阈值来源. 返回值与图像强度同一量纲.
pub trait BackgroundSource: Send + Sync {
    /// 获取 `ctx` 所描述切片的背景阈值.
    fn background(&self, ctx: &SectionContext<'_>) -> TraceResult<f64>;
}

/// 背景模式. 在流水线入口处被转换为一个 [`BackgroundSource`].
#[derive(Clone, Debug, PartialEq)]
pub enum BackgroundMode {
    /// 查表模式. 参数为 CSV 表路径.
    Table(PathBuf),

    /// 计算模式. 背景 ROI 位于 ROI 目录下, 按 [`RoiNaming::background_roi`] 命名.
    Roi,
}

impl BackgroundMode {
    /// 构造背景来源. 查表模式会在这里一次性读入整张表.
    pub fn build(
        &self,
        roi_dir: &Path,
        naming: &RoiNaming,
        correction: f64,
    ) -> TraceResult<Box<dyn BackgroundSource>> {
        Ok(match self {
            BackgroundMode::Table(path) => Box::new(BackgroundTable::open(path)?),
            BackgroundMode::Roi => Box::new(RoiBackground::new(roi_dir, naming.clone(), correction)?),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TableRow {
    #[serde(rename = "Filename")]
    filename: String,

    #[serde(rename = "Left BG")]
    left: f64,

    #[serde(rename = "Right BG")]
    right: f64,
}

/// 背景值表. 每行对应一张切片图像, 左右侧各一列.
///
/// CSV 表头必须包含 `Filename`, `Left BG`, `Right BG`; 其它列被忽略.
#[derive(Clone, Debug, Default)]
pub struct BackgroundTable {
    rows: HashMap<String, (f64, f64)>,
}

impl BackgroundTable {
    /// 读取 `path` 处的 CSV 表.
    pub fn open<P: AsRef<Path>>(path: P) -> TraceResult<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| TraceError::BackgroundTable {
            path: path.to_owned(),
            source: e.into(),
        })?;
        Self::from_reader(file).map_err(|source| TraceError::BackgroundTable {
            path: path.to_owned(),
            source,
        })
    }

    /// 从任意 CSV 数据源读取.
    pub fn from_reader<R: Read>(r: R) -> Result<Self, csv::Error> {
        let mut rows = HashMap::new();
        for row in csv::Reader::from_reader(r).deserialize::<TableRow>() {
            let TableRow {
                filename,
                left,
                right,
            } = row?;
            let key = filename.trim().to_string();
            if rows.insert(key, (left, right)).is_some() {
                log::warn!("Duplicated background row for `{}`, keeping the last one", filename.trim());
            }
        }
        Ok(Self { rows })
    }

    /// 直接插入一行.
    #[inline]
    pub fn insert<S: Into<String>>(&mut self, name: S, left: f64, right: f64) {
        self.rows.insert(name.into(), (left, right));
    }

    /// 表的行数.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 表是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 查询 `name` 在 `side` 一侧的背景值.
    #[inline]
    pub fn get(&self, name: &str, side: Side) -> Option<f64> {
        self.rows.get(name).map(|&(l, r)| match side {
            Side::Left => l,
            Side::Right => r,
        })
    }
}

/// 先按完整文件名查找, 再按文件名主干查找. 都找不到时返回 [`TraceError::MissingBackground`].
impl BackgroundSource for BackgroundTable {
    fn background(&self, ctx: &SectionContext<'_>) -> TraceResult<f64> {
        self.get(ctx.name, ctx.side)
            .or_else(|| self.get(ctx.stem, ctx.side))
            .ok_or_else(|| TraceError::MissingBackground {
                section: ctx.name.to_string(),
            })
    }
}

/// 由背景 ROI 计算背景阈值.
#[derive(Clone, Debug)]
pub struct RoiBackground {
    roi_dir: PathBuf,
    naming: RoiNaming,
    correction: f64,
}

impl RoiBackground {
    /// 创建计算模式的背景来源. `correction` 必须为正数.
    pub fn new<P: AsRef<Path>>(roi_dir: P, naming: RoiNaming, correction: f64) -> TraceResult<Self> {
        let correction = TraceError::check_param("correction", correction, |v| v > 0.0)?;
        Ok(Self {
            roi_dir: roi_dir.as_ref().to_owned(),
            naming,
            correction,
        })
    }
}

impl BackgroundSource for RoiBackground {
    fn background(&self, ctx: &SectionContext<'_>) -> TraceResult<f64> {
        let path = self.roi_dir.join(self.naming.background_roi(ctx.stem));
        let roi = PolygonRoi::open(path)?;
        corrected_mean(ctx.image, &roi, self.correction)
    }
}

/// 计算 `roi` 内部像素在 `image` 上的平均强度, 再乘以 `correction`.
///
/// ROI 内部没有像素时返回 [`TraceError::EmptyRoi`].
pub fn corrected_mean(image: &SectionImage, roi: &PolygonRoi, correction: f64) -> TraceResult<f64> {
    let pixels = roi.rasterize()?;
    Ok(image.mean_xy(&pixels)? * correction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BitDepth, ErrorKind};
    use ndarray::Array2;

    const CSV: &str = "\
,Filename,Left BG,Right BG
0,slide 1 slice 1.tif,40,52
1,slide 1 slice 2.tif,41.5,50
";

    fn image() -> SectionImage {
        SectionImage::from_raw(Array2::from_elem((4, 4), 10), BitDepth::Eight)
    }

    fn ctx<'a>(name: &'a str, stem: &'a str, side: Side, image: &'a SectionImage) -> SectionContext<'a> {
        SectionContext {
            name,
            stem,
            side,
            image,
        }
    }

    #[test]
    fn test_table_lookup() {
        let table = BackgroundTable::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("slide 1 slice 2.tif", Side::Left), Some(41.5));
        assert_eq!(table.get("slide 1 slice 2.tif", Side::Right), Some(50.0));

        let img = image();
        let c = ctx("slide 1 slice 1.tif", "slide 1 slice 1", Side::Right, &img);
        assert_eq!(table.background(&c).unwrap(), 52.0);
    }

    #[test]
    fn test_table_stem_fallback() {
        let mut table = BackgroundTable::default();
        table.insert("slide 2 slice 1", 7.0, 8.0);
        let img = image();
        let c = ctx("slide 2 slice 1.tif", "slide 2 slice 1", Side::Left, &img);
        assert_eq!(table.background(&c).unwrap(), 7.0);
    }

    /// 缺少对应行是配置错误, 且不会回退为 0.
    #[test]
    fn test_table_missing_row() {
        let table = BackgroundTable::from_reader(CSV.as_bytes()).unwrap();
        let img = image();
        let c = ctx("slide 9 slice 9.tif", "slide 9 slice 9", Side::Left, &img);
        let e = table.background(&c).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Configuration);
        assert!(matches!(e, TraceError::MissingBackground { section } if section == "slide 9 slice 9.tif"));
    }

    #[test]
    fn test_table_bad_header() {
        assert!(BackgroundTable::from_reader("Name,L,R\na,1,2\n".as_bytes()).is_err());
    }

    #[test]
    fn test_corrected_mean() {
        let mut data = Array2::from_elem((6, 6), 0u16);
        // 矩形 ROI (1, 1) ~ (3, 3) 覆盖 x, y ∈ {1, 2}.
        data[(1, 1)] = 10;
        data[(1, 2)] = 20;
        data[(2, 1)] = 30;
        data[(2, 2)] = 40;
        let img = SectionImage::from_raw(data, BitDepth::Sixteen);
        let roi = PolygonRoi::new(vec![(1, 1), (3, 1), (3, 3), (1, 3)]);
        let bg = corrected_mean(&img, &roi, 1.65).unwrap();
        assert!((bg - 25.0 * 1.65).abs() < 1e-9);

        let empty = PolygonRoi::new(vec![(1, 1), (3, 1)]);
        assert!(matches!(
            corrected_mean(&img, &empty, 1.65),
            Err(TraceError::EmptyRoi)
        ));
    }

    #[test]
    fn test_roi_background_missing_file() {
        let src = RoiBackground::new(std::env::temp_dir(), RoiNaming::default(), 1.65).unwrap();
        let img = image();
        let c = ctx("no-such-section.tif", "no-such-section", Side::Left, &img);
        assert_eq!(src.background(&c).unwrap_err().kind(), ErrorKind::Integrity);

        assert!(RoiBackground::new(".", RoiNaming::default(), 0.0).is_err());
    }
}
