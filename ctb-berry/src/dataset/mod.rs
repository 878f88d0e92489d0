//! 数据集操作: 切片图像的发现与排序, ROI 文件命名约定, 项目目录脚手架.

use std::path::{Path, PathBuf};

use crate::consts::{BACKGROUND_ROI_PREFIX, DEFAULT_ROI_SUFFIX};
use crate::error::{TraceError, TraceResult};
use crate::Side;

mod order;
mod scaffold;

pub use order::{slide_slice, sort_sections};
pub use scaffold::{animal_dirs, scaffold};

/// 获取 `{用户主目录}/dataset/ctb` 目录.
pub fn home_project_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    ans.push("ctb");
    Some(ans)
}

/// 获取 `{用户主目录}/dataset/ctb` 目录下给定继续项组成的全路径.
pub fn home_project_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = home_project_dir()?;
    ans.extend(it);
    Some(ans)
}

/// ROI 文件命名约定.
///
/// - 切片 ROI: `{L|R}_{图像主干}{后缀}`, 如 `L_slide 1 slice 2.nd2.roi`;
/// - 背景 ROI: `BG_{图像主干}{后缀}`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoiNaming {
    suffix: String,
}

impl Default for RoiNaming {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_ROI_SUFFIX.to_string(),
        }
    }
}

impl RoiNaming {
    /// 使用自定义后缀.
    #[inline]
    pub fn with_suffix<S: Into<String>>(suffix: S) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    /// 切片 ROI 文件名.
    #[inline]
    pub fn section_roi(&self, stem: &str, side: Side) -> String {
        format!("{}_{stem}{}", side.initial(), self.suffix)
    }

    /// 背景 ROI 文件名.
    #[inline]
    pub fn background_roi(&self, stem: &str) -> String {
        format!("{BACKGROUND_ROI_PREFIX}_{stem}{}", self.suffix)
    }
}

/// 一张切片图像的路径, 以及由它导出的名称.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SectionFile {
    path: PathBuf,
    name: String,
    stem: String,
}

impl SectionFile {
    /// 由图像路径创建. 路径没有文件名时返回 `None`.
    pub fn new<P: Into<PathBuf>>(path: P) -> Option<Self> {
        let path = path.into();
        let name = path.file_name()?.to_string_lossy().into_owned();
        let stem = path.file_stem()?.to_string_lossy().into_owned();
        Some(Self { path, name, stem })
    }

    /// 图像路径.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 文件名 (含扩展名). 也是背景值表的键.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 文件名主干 (不含扩展名).
    #[inline]
    pub fn stem(&self) -> &str {
        &self.stem
    }
}

/// 列出 `dir` 下的全部切片图像并按 (slide, slice) 排序.
///
/// 隐藏文件 (以 `.` 开头, 如 `.DS_Store`) 与子目录被忽略.
pub fn discover_sections<P: AsRef<Path>>(dir: P) -> TraceResult<Vec<SectionFile>> {
    let dir = dir.as_ref();
    let io_err = |source| TraceError::Io {
        path: dir.to_owned(),
        source,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if !path.is_file() {
            continue;
        }
        match SectionFile::new(path) {
            Some(f) if !f.name.starts_with('.') => files.push(f),
            _ => {}
        }
    }
    sort_sections(&mut files);
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::{RoiNaming, SectionFile};
    use crate::Side;

    #[test]
    fn test_roi_naming() {
        let n = RoiNaming::default();
        assert_eq!(n.section_roi("slide 1 slice 2", Side::Left), "L_slide 1 slice 2.nd2.roi");
        assert_eq!(n.section_roi("s", Side::Right), "R_s.nd2.roi");
        assert_eq!(n.background_roi("s"), "BG_s.nd2.roi");
        assert_eq!(RoiNaming::with_suffix(".roi").section_roi("7", Side::Left), "L_7.roi");
    }

    #[test]
    fn test_section_file() {
        let f = SectionFile::new("/data/35 tif/slide 3 slice 1.tif").unwrap();
        assert_eq!(f.name(), "slide 3 slice 1.tif");
        assert_eq!(f.stem(), "slide 3 slice 1");
        assert!(SectionFile::new("/").is_none());
    }
}
