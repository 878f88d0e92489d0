//! 图像的持久化存储.

use std::path::Path;

use image::{ImageResult, Rgb};

use super::{Colormap, Heatmap};
use crate::strip::StripImage;

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
///
/// `ImgWriteVis` trait 的意图是, 图像将以 "可视化友好" 的方式保存, 而不是 "as is"
/// 的方式. 对于 `StripImage` 与 `Heatmap` 这类以密度量化值存储的单通道图像,
/// 保存时会经过 [`Colormap::Plasma`] 着色; `Heatmap` 的补齐区域会被涂成黑色.
pub trait ImgWriteVis {
    /// 按照一定的可视化规则将图片保存到 `path` 路径.
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

/// 表明一个可以通过 **按原样** 模式持久化存储的图像对象.
///
/// `ImgWriteRaw` trait 的额外意图是, 图像将按原样保存为 8 位灰度图,
/// 像素值即量化后的密度, 便于后续重新着色或统计.
pub trait ImgWriteRaw {
    /// 按原样将图片保存到 `path` 路径.
    fn save_raw<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

macro_rules! impl_gray_raw {
    ($($img: ty),+) => {
        $(
            /// 按原样存储.
            impl ImgWriteRaw for $img {
                fn save_raw<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
                    let view = self.view();
                    let (height, width) = view.dim();
                    let mut buf = image::GrayImage::new(width as u32, height as u32);
                    for ((h, w), &pix) in view.indexed_iter() {
                        buf.put_pixel(w as u32, h as u32, image::Luma([pix]));
                    }
                    buf.save(path)
                }
            }
        )+
    };
}

impl_gray_raw!(StripImage, Heatmap);

/// 用 `plasma` 着色, 没有补齐区域.
impl ImgWriteVis for StripImage {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let view = self.view();
        let (height, width) = view.dim();
        let mut buf = image::RgbImage::new(width as u32, height as u32);
        for ((h, w), &pix) in view.indexed_iter() {
            buf.put_pixel(w as u32, h as u32, Colormap::Plasma.map(pix));
        }
        buf.save(path)
    }
}

/// 用 `plasma` 着色, 补齐区域为黑色.
impl ImgWriteVis for Heatmap {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        self.colorize(Colormap::Plasma, Rgb([0, 0, 0])).save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::{ImgWriteRaw, ImgWriteVis};
    use crate::heatmap::HeatmapBuilder;
    use crate::strip::StripImage;
    use crate::Side;

    #[test]
    fn test_save() {
        let dir = std::env::temp_dir().join(format!("ctb-save-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let strip = StripImage::from_densities([0.2, 0.4, 1.0], 3, Side::Left).unwrap();
        strip.save_raw(dir.join("strip_raw.png")).unwrap();
        strip.save(dir.join("strip.png")).unwrap();

        let mut b = HeatmapBuilder::new();
        b.push(strip.clone());
        b.push(StripImage::from_densities([0.5], 3, Side::Left).unwrap());
        let hm = b.finish().unwrap();
        hm.save_raw(dir.join("heatmap_raw.png")).unwrap();
        hm.save(dir.join("heatmap.png")).unwrap();

        let back = image::open(dir.join("heatmap_raw.png")).unwrap().to_luma8();
        assert_eq!(back.dimensions(), (6, 3));
        assert_eq!(back.get_pixel(0, 0).0[0], 255);
        assert_eq!(back.get_pixel(3, 0).0[0], 0);
        assert_eq!(back.get_pixel(3, 1).0[0], 128);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
