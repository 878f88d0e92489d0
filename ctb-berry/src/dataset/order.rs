//! 切片排序. 文件名中形如 `slide 3 slice 12` 的编号决定切片的物理顺序.

use super::SectionFile;

/// 在小写化的 `name` 中查找 `key`, 并解析紧随其后的数字.
/// `key` 与数字之间允许空格, 下划线或连字符.
fn number_after(name: &str, key: &str) -> Option<u32> {
    let mut rest = name;
    while let Some(at) = rest.find(key) {
        rest = &rest[at + key.len()..];
        let digits = rest.trim_start_matches([' ', '_', '-']);
        let end = digits
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(digits.len());
        if end > 0 {
            return digits[..end].parse().ok();
        }
    }
    None
}

/// 从文件名中解析 `(slide, slice)` 编号, 大小写不敏感. 任一编号缺失时返回 `None`.
pub fn slide_slice(name: &str) -> Option<(u32, u32)> {
    let lower = name.to_ascii_lowercase();
    Some((number_after(&lower, "slide")?, number_after(&lower, "slice")?))
}

/// 按 `(slide, slice)` 升序原地排序.
///
/// 无法解析编号的文件排在最后, 彼此之间按文件名字典序排列.
pub fn sort_sections(files: &mut [SectionFile]) {
    for f in files.iter().filter(|f| slide_slice(f.name()).is_none()) {
        log::warn!(
            "Cannot parse slide/slice numbers from `{}`, it will be ordered last",
            f.name()
        );
    }
    files.sort_by_cached_key(|f| {
        let key = slide_slice(f.name());
        (key.is_none(), key, f.name().to_string())
    });
}

#[cfg(test)]
mod tests {
    use super::{slide_slice, sort_sections};
    use crate::dataset::SectionFile;

    #[test]
    fn test_slide_slice() {
        assert_eq!(slide_slice("35 slide 2 slice 11.tif"), Some((2, 11)));
        assert_eq!(slide_slice("Slide_3_Slice-4.tif"), Some((3, 4)));
        assert_eq!(slide_slice("slide 3.tif"), None);
        assert_eq!(slide_slice("slideshow slide 5 slice 1.tif"), Some((5, 1)));
        assert_eq!(slide_slice("random.tif"), None);
    }

    /// 数字顺序而不是字典序: slice 2 在 slice 10 之前.
    #[test]
    fn test_sort_sections() {
        let mut files: Vec<SectionFile> = [
            "slide 2 slice 1.tif",
            "slide 1 slice 10.tif",
            "zzz.tif",
            "slide 1 slice 2.tif",
            "aaa.tif",
        ]
        .into_iter()
        .filter_map(SectionFile::new)
        .collect();
        sort_sections(&mut files);
        let names: Vec<&str> = files.iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            [
                "slide 1 slice 2.tif",
                "slide 1 slice 10.tif",
                "slide 2 slice 1.tif",
                "aaa.tif",
                "zzz.tif"
            ]
        );
    }
}
