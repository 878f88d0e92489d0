use ndarray::{Array2, ArrayView2, Axis};

use super::StripProfile;
use crate::error::{TraceError, TraceResult};
use crate::Side;

/// 将 `[0, 1]` 区间的密度量化为 8 位强度 `round(255 * density)`.
///
/// 舍入得到的 256 被截断为 255, 区间外的输入被截断到 `[0, 255]`.
#[inline]
pub fn quantize(density: f64) -> u8 {
    let v = (255.0 * density).round();
    if v >= 255.0 {
        255
    } else if v > 0.0 {
        v as u8
    } else {
        // 负数与 NaN
        0
    }
}

/// 单张切片的条带图像. 高为条带个数, 宽为配置的条带宽度.
///
/// 对于左侧, 图像在竖直方向翻转, 使得内侧端总是位于上方.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StripImage {
    data: Array2<u8>,
}

impl StripImage {
    /// 由密度序列构建条带图像.
    ///
    /// `strip_width` 为 0 时返回 [`TraceError::InvalidParameter`].
    pub fn build(profile: &StripProfile, strip_width: usize, side: Side) -> TraceResult<Self> {
        Self::from_densities(profile.densities(), strip_width, side)
    }

    /// 由按空间顺序排列的密度构建条带图像.
    pub fn from_densities<I>(densities: I, strip_width: usize, side: Side) -> TraceResult<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        TraceError::check_param("strip_width", strip_width as f64, |v| v >= 1.0)?;
        let q: Vec<u8> = densities.into_iter().map(quantize).collect();

        // 先沿宽度方向平铺 (宽, 条带数), 再转置为 (条带数, 宽).
        let tiled = Array2::from_shape_fn((strip_width, q.len()), |(_, i)| q[i]);
        let mut data = tiled.reversed_axes();
        if side.is_flipped() {
            data.invert_axis(Axis(0));
        }
        Ok(Self {
            data: data.as_standard_layout().into_owned(),
        })
    }

    /// 图像高度, 即条带个数.
    #[inline]
    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// 图像宽度.
    #[inline]
    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    /// 获取像素视图.
    #[inline]
    pub fn view(&self) -> ArrayView2<'_, u8> {
        self.data.view()
    }

    /// 取出底层数组.
    #[inline]
    pub fn into_raw(self) -> Array2<u8> {
        self.data
    }
}
