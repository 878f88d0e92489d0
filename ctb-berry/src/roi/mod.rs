//! 多边形 ROI 及其光栅化.
//!
//! 坐标统一为 `(x, y)`, 与 ImageJ 一致. 需要按 `(行, 列)` 访问图像时必须交换分量,
//! 参见 [`crate::SectionImage::get_xy`].
//!
//! 判定规则为奇偶规则 (射线法), 容差为零. 恰好落在边上的像素可能被判为内部或外部,
//! 这是实现定义的行为; 但扫描线实现 [`PolygonRoi::rasterize`] 与逐点判定
//! [`PolygonRoi::contains`] 的结果严格一致.

use std::path::Path;

use itertools::Itertools;

use crate::error::{TraceError, TraceResult};
use crate::PixelXy;

mod imagej;

pub use imagej::{RoiDecodeError, RoiKind};

/// 手绘的单轮廓多边形 ROI, 顶点按顺序首尾相接. 创建后不可变.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PolygonRoi {
    vertices: Vec<PixelXy>,
}

/// 外接矩形, 左闭右开: `x_min <= x < x_max`, `y_min <= y < y_max`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BoundingBox {
    /// x 下界 (含).
    pub x_min: i32,
    /// x 上界 (不含).
    pub x_max: i32,
    /// y 下界 (含).
    pub y_min: i32,
    /// y 上界 (不含).
    pub y_max: i32,
}

impl PolygonRoi {
    /// 以顶点序列创建多边形. 少于 3 个顶点的多边形不包含任何像素.
    #[inline]
    pub fn new(vertices: Vec<PixelXy>) -> Self {
        Self { vertices }
    }

    /// 打开 ImageJ `.roi` 文件.
    ///
    /// 文件不存在时返回 [`TraceError::MissingFile`], 格式错误时返回 [`TraceError::Roi`].
    pub fn open<P: AsRef<Path>>(path: P) -> TraceResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(TraceError::MissingFile(path.to_owned()));
        }
        let buf = std::fs::read(path).map_err(|source| TraceError::Io {
            path: path.to_owned(),
            source,
        })?;
        imagej::decode(&buf).map_err(|source| TraceError::Roi {
            path: path.to_owned(),
            source,
        })
    }

    /// 顶点序列.
    #[inline]
    pub fn vertices(&self) -> &[PixelXy] {
        &self.vertices
    }

    /// 外接矩形. x 与 y 分别独立取最值, 上界不含. 没有顶点时返回 `None`.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let (x_min, x_max) = self.vertices.iter().map(|p| p.0).minmax().into_option()?;
        let (y_min, y_max) = self
            .vertices
            .iter()
            .map(|p| p.1)
            .minmax()
            .into_option()?;
        Some(BoundingBox {
            x_min,
            x_max,
            y_min,
            y_max,
        })
    }

    /// 所有边, 包括末顶点到首顶点的闭合边.
    fn edges(&self) -> impl Iterator<Item = (PixelXy, PixelXy)> + '_ {
        self.vertices
            .iter()
            .copied()
            .zip(self.vertices.iter().copied().cycle().skip(1))
    }

    /// 判断点 `(x, y)` 是否在多边形内部 (奇偶规则, 零容差).
    pub fn contains(&self, (x, y): PixelXy) -> bool {
        if self.vertices.len() < 3 {
            return false;
        }
        let mut inside = false;
        for (a, b) in self.edges() {
            if let Some(cx) = crossing_at(a, b, y) {
                if (x as f64) < cx {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// 逐点判定外接矩形内的所有像素, 复杂度为 O(面积 * 边数).
    ///
    /// 仅用于验证 [`Self::rasterize`].
    pub fn rasterize_naive(&self) -> Vec<PixelXy> {
        let Some(bb) = self.bounding_box() else {
            return Vec::new();
        };
        (bb.y_min..bb.y_max)
            .flat_map(|y| (bb.x_min..bb.x_max).map(move |x| (x, y)))
            .filter(|p| self.contains(*p))
            .collect()
    }

    /// 以扫描线方式获取多边形内部的所有像素, 限制在外接矩形内.
    ///
    /// 每行只计算一次与各边的交点, 复杂度为 O(行数 * 边数 * log(边数) + 像素数).
    /// 结果与 [`Self::contains`] 逐点判定一致, 按行优先排列, 无重复.
    ///
    /// 没有任何内部像素时返回 [`TraceError::EmptyRoi`].
    pub fn rasterize(&self) -> TraceResult<PixelSet> {
        let bb = match self.bounding_box() {
            Some(bb) if self.vertices.len() >= 3 => bb,
            _ => return Err(TraceError::EmptyRoi),
        };

        let mut pixels = Vec::new();
        let mut crossings = Vec::with_capacity(self.vertices.len());
        for y in bb.y_min..bb.y_max {
            crossings.clear();
            crossings.extend(self.edges().filter_map(|(a, b)| crossing_at(a, b, y)));
            crossings.sort_by(f64::total_cmp);

            // 交点个数必为偶数. 点 x 在内部, 当且仅当严格大于 x 的交点个数为奇数,
            // 即 c[2k] <= x < c[2k + 1].
            debug_assert_eq!(crossings.len() % 2, 0);
            for pair in crossings.chunks_exact(2) {
                let lo = (pair[0].ceil() as i32).max(bb.x_min);
                let hi = (pair[1].ceil() as i32).min(bb.x_max);
                pixels.extend((lo..hi).map(|x| (x, y)));
            }
        }

        if pixels.is_empty() {
            return Err(TraceError::EmptyRoi);
        }
        Ok(PixelSet { pixels })
    }
}

/// 边 `a -> b` 与水平线 `y` 的交点 x 坐标. 端点按左闭右开规则处理, 水平边没有交点.
#[inline]
fn crossing_at((x1, y1): PixelXy, (x2, y2): PixelXy, y: i32) -> Option<f64> {
    if (y1 > y) == (y2 > y) {
        return None;
    }
    let (x1, y1, x2, y2) = (x1 as f64, y1 as f64, x2 as f64, y2 as f64);
    Some(x1 + (y as f64 - y1) * (x2 - x1) / (y2 - y1))
}

/// 光栅化结果: ROI 内部的整数像素坐标集合, 无重复, 非空.
#[derive(Clone, Debug)]
pub struct PixelSet {
    pixels: Vec<PixelXy>,
}

impl PixelSet {
    /// 不经光栅化直接创建, 仅用于测试.
    #[cfg(test)]
    pub(crate) fn from_unchecked(pixels: Vec<PixelXy>) -> Self {
        Self { pixels }
    }

    /// 像素个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// 是否为空. 由 [`PolygonRoi::rasterize`] 得到的集合总是非空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// 获取能迭代所有像素的迭代器.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = PixelXy> + '_ {
        self.pixels.iter().copied()
    }

    /// x 坐标的最小值与最大值 (均含).
    pub fn x_range(&self) -> Option<(i32, i32)> {
        self.pixels.iter().map(|p| p.0).minmax().into_option()
    }
}

impl<'a> IntoIterator for &'a PixelSet {
    type Item = PixelXy;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, PixelXy>>;

    fn into_iter(self) -> Self::IntoIter {
        self.pixels.iter().copied()
    }
}
