//! 单张切片的荧光图像.

use std::ops::Index;
use std::path::Path;

use image::DynamicImage;
use ndarray::{Array2, ArrayView2};
use num::ToPrimitive;

use crate::error::{TraceError, TraceResult};
use crate::{Idx2d, PixelXy};

/// 图像强度域.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BitDepth {
    /// 0 ~ 255.
    Eight,

    /// 0 ~ 65535.
    Sixteen,
}

/// 彩色图像中用于取样的通道. 对单通道图像无意义.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Channel {
    /// 红.
    Red,

    /// 绿. LUT 着色的 CTB 图像只有该通道有值.
    #[default]
    Green,

    /// 蓝.
    Blue,
}

impl Channel {
    #[inline]
    const fn offset(&self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }
}

/// 单张切片的单通道荧光图像, 以 `(行, 列)` 存储原始强度.
///
/// 8 位和 16 位图像都以 `u16` 保存, 强度域由 [`BitDepth`] 记录.
#[derive(Debug, Clone)]
pub struct SectionImage {
    data: Array2<u16>,
    depth: BitDepth,
}

impl Index<Idx2d> for SectionImage {
    type Output = u16;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl SectionImage {
    /// 打开 `path` 处的图像. 彩色图像取 `channel` 通道.
    ///
    /// 文件不存在时返回 [`TraceError::MissingFile`], 无法解码时返回 [`TraceError::Image`].
    pub fn open<P: AsRef<Path>>(path: P, channel: Channel) -> TraceResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(TraceError::MissingFile(path.to_owned()));
        }
        let img = image::open(path).map_err(|source| TraceError::Image {
            path: path.to_owned(),
            source,
        })?;
        Ok(Self::from_dynamic(img, channel))
    }

    /// 从已解码的图像创建.
    pub fn from_dynamic(img: DynamicImage, channel: Channel) -> Self {
        let shape = (img.height() as usize, img.width() as usize);
        let c = channel.offset();
        let (buf, depth): (Vec<u16>, _) = match img {
            DynamicImage::ImageLuma8(g) => (
                g.into_raw().into_iter().map(u16::from).collect(),
                BitDepth::Eight,
            ),
            DynamicImage::ImageLuma16(g) => (g.into_raw(), BitDepth::Sixteen),
            rgb @ (DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageRgb8(_)
            | DynamicImage::ImageRgba8(_)) => (
                rgb.to_rgb8().pixels().map(|p| u16::from(p.0[c])).collect(),
                BitDepth::Eight,
            ),
            other => (
                other.to_rgb16().pixels().map(|p| p.0[c]).collect(),
                BitDepth::Sixteen,
            ),
        };

        // 该操作不会生成 `Err`: 缓冲区长度恰为 `高 * 宽`.
        let data = Array2::from_shape_vec(shape, buf).unwrap();
        Self { data, depth }
    }

    /// 直接用原始数据创建. `data` 按 `(行, 列)` 组织.
    ///
    /// # 注意
    ///
    /// 8 位图像中超过 255 的值不会被检查.
    #[inline]
    pub fn from_raw(data: Array2<u16>, depth: BitDepth) -> Self {
        Self { data, depth }
    }

    /// 强度域.
    #[inline]
    pub fn depth(&self) -> BitDepth {
        self.depth
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView2<'_, u16> {
        self.data.view()
    }

    /// 获取 `(x, y)` 处的强度. 越界时返回 `None`.
    ///
    /// 注意参数是 `(x, y)`, 内部会转换为 `(y, x)` 索引.
    #[inline]
    pub fn get_xy(&self, (x, y): PixelXy) -> Option<u16> {
        let pos = (y.to_usize()?, x.to_usize()?);
        self.data.get(pos).copied()
    }

    /// 获取 `(x, y)` 处的强度. 越界时返回 [`TraceError::PixelOutOfImage`].
    #[inline]
    pub fn try_xy(&self, p: PixelXy) -> TraceResult<u16> {
        self.get_xy(p)
            .ok_or(TraceError::PixelOutOfImage { x: p.0, y: p.1 })
    }

    /// 计算由 `it` 给出的所有 `(x, y)` 坐标处强度的平均值.
    ///
    /// `it` 为空时返回 [`TraceError::EmptyRoi`], 存在越界坐标时返回
    /// [`TraceError::PixelOutOfImage`].
    pub fn mean_xy<I: IntoIterator<Item = PixelXy>>(&self, it: I) -> TraceResult<f64> {
        let mut count = 0u64;
        let mut sum = 0.0;
        for p in it.into_iter() {
            count += 1;
            sum += self.try_xy(p)? as f64;
        }
        if count == 0 {
            return Err(TraceError::EmptyRoi);
        }
        Ok(sum / (count as f64))
    }
}
