//! 项目目录脚手架.
//!
//! ```text
//! {project}/
//! ├── colorbar.png
//! ├── 35/
//! │   ├── 35 tif/
//! │   └── 35 roi/
//! └── 36/
//!     ├── 36 tif/
//!     └── 36 roi/
//! ```

use std::fmt::Display;
use std::path::{Path, PathBuf};

use crate::error::{TraceError, TraceResult};
use crate::heatmap::{colorbar, Colormap};

/// 颜色条图像的尺寸 (宽, 高).
const COLORBAR_SIZE: (u32, u32) = (40, 256);

/// 获取动物 `animal` 在项目 `project` 下的 (图像目录, ROI 目录).
pub fn animal_dirs<A: Display>(project: &Path, animal: A) -> (PathBuf, PathBuf) {
    let base = project.join(animal.to_string());
    (
        base.join(format!("{animal} tif")),
        base.join(format!("{animal} roi")),
    )
}

/// 为每只动物创建图像目录与 ROI 目录, 并在项目根目录输出 `colormap` 的颜色条.
///
/// 已存在的目录不会被修改.
pub fn scaffold<A, I>(project: &Path, animals: I, colormap: Colormap) -> TraceResult<()>
where
    A: Display,
    I: IntoIterator<Item = A>,
{
    let create = |dir: &Path| {
        std::fs::create_dir_all(dir).map_err(|source| TraceError::Io {
            path: dir.to_owned(),
            source,
        })
    };
    create(project)?;
    for animal in animals {
        let (tif, roi) = animal_dirs(project, animal);
        create(&tif)?;
        create(&roi)?;
    }

    let path = project.join("colorbar.png");
    let (w, h) = COLORBAR_SIZE;
    colorbar(colormap, w, h)
        .save(&path)
        .map_err(|source| TraceError::Image { path, source })
}

#[cfg(test)]
mod tests {
    use super::{animal_dirs, scaffold};
    use crate::heatmap::Colormap;
    use std::path::Path;

    #[test]
    fn test_animal_dirs() {
        let (tif, roi) = animal_dirs(Path::new("/p"), 35);
        assert_eq!(tif, Path::new("/p/35/35 tif"));
        assert_eq!(roi, Path::new("/p/35/35 roi"));
    }

    #[test]
    fn test_scaffold() {
        let project = std::env::temp_dir().join(format!("ctb-scaffold-{}", std::process::id()));
        scaffold(&project, [39, 40], Colormap::Plasma).unwrap();
        for a in [39, 40] {
            let (tif, roi) = animal_dirs(&project, a);
            assert!(tif.is_dir());
            assert!(roi.is_dir());
        }
        assert!(project.join("colorbar.png").is_file());

        // 重复运行不出错.
        scaffold(&project, [39], Colormap::Plasma).unwrap();
        std::fs::remove_dir_all(&project).unwrap();
    }
}
