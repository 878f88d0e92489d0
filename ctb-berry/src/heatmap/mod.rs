//! 热图合成.
//!
//! 同一动物同一侧的所有切片条带图像高度不一. 合成时先将它们在竖直方向居中补齐到
//! 最大高度, 再按切片顺序横向拼接. 与之平行的掩膜记录了哪些像素来自真实数据,
//! 颜色映射之后补齐区域会被统一涂成背景色, 而不是显示为颜色表的端点颜色.

use image::{Rgb, RgbImage};
use ndarray::{s, Array2, ArrayView2};

use crate::consts::gray::{is_padding, MASK_DATA, MASK_PADDING};
use crate::error::{TraceError, TraceResult};
use crate::strip::{StripImage, StripProfile};

mod colormap;
mod save;

pub use colormap::{colorbar, Colormap};
pub use save::{ImgWriteRaw, ImgWriteVis};

/// 高度为 `height` 的条带补齐到 `target` 时的 (上方, 下方) 补齐量.
///
/// 上方取 `floor`, 奇数余量放在下方. `height > target` 时返回 `None`.
#[inline]
pub fn padding(height: usize, target: usize) -> Option<(usize, usize)> {
    let total = target.checked_sub(height)?;
    let top = total / 2;
    Some((top, total - top))
}

/// 将 `strip` 竖直居中补齐到 `target` 行, 补齐区域填充 `fill`.
///
/// # 注意
///
/// 调用者保证 `strip` 的行数不超过 `target`, 否则 panic.
pub fn pad_vertical(strip: ArrayView2<'_, u8>, target: usize, fill: u8) -> Array2<u8> {
    let (h, w) = strip.dim();
    let (top, _) = padding(h, target).expect("条带高度超过补齐目标");
    let mut ans = Array2::from_elem((target, w), fill);
    ans.slice_mut(s![top..top + h, ..]).assign(&strip);
    ans
}

/// 运输统计的累加器.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TransportTally {
    total_bins: usize,
    total_pass: usize,
}

impl TransportTally {
    /// 累加一张切片的条带数与达标条带数.
    #[inline]
    pub fn add(&mut self, bins: usize, pass: usize) {
        debug_assert!(pass <= bins);
        self.total_bins += bins;
        self.total_pass += pass;
    }

    /// 累加一张切片的密度序列.
    #[inline]
    pub fn add_profile(&mut self, profile: &StripProfile) {
        self.add(profile.num_bins(), profile.num_pass());
    }

    /// 条带总数.
    #[inline]
    pub fn total_bins(&self) -> usize {
        self.total_bins
    }

    /// 达标条带总数.
    #[inline]
    pub fn total_pass(&self) -> usize {
        self.total_pass
    }

    /// 运输百分比 `round(100 * 达标 / 总数, 1)`.
    ///
    /// 条带总数为 0 时返回 [`TraceError::EmptyBatch`], 而不是 0%.
    pub fn percent(&self) -> TraceResult<f64> {
        if self.total_bins == 0 {
            return Err(TraceError::EmptyBatch);
        }
        let p = 100.0 * self.total_pass as f64 / self.total_bins as f64;
        Ok(round_half_even(p * 10.0) / 10.0)
    }
}

/// 四舍六入五成双: 恰好落在 `.5` 上时取相邻的偶数.
fn round_half_even(v: f64) -> f64 {
    let f = v.floor();
    if v - f == 0.5 {
        if f % 2.0 == 0.0 {
            f
        } else {
            f + 1.0
        }
    } else {
        v.round()
    }
}

/// 按切片顺序收集条带图像, 最终合成热图.
#[derive(Clone, Debug, Default)]
pub struct HeatmapBuilder {
    strips: Vec<StripImage>,
    max_height: usize,
}

impl HeatmapBuilder {
    /// 创建空的合成器.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 在最右侧追加一张切片的条带图像.
    pub fn push(&mut self, strip: StripImage) {
        self.max_height = self.max_height.max(strip.height());
        self.strips.push(strip);
    }

    /// 已收集的条带图像个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.strips.len()
    }

    /// 是否尚未收集任何条带图像?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strips.is_empty()
    }

    /// 目前为止的最大条带高度.
    #[inline]
    pub fn max_height(&self) -> usize {
        self.max_height
    }

    /// 居中补齐并横向拼接全部条带图像, 同时生成掩膜.
    ///
    /// 没有任何条带图像时返回 [`TraceError::EmptyBatch`].
    pub fn finish(self) -> TraceResult<Heatmap> {
        if self.strips.is_empty() {
            return Err(TraceError::EmptyBatch);
        }
        let target = self.max_height;
        let width = self.strips.iter().map(StripImage::width).sum();
        let mut data = Array2::zeros((target, width));
        let mut mask = Array2::from_elem((target, width), MASK_PADDING);

        let mut col = 0;
        for strip in &self.strips {
            let view = strip.view();
            let w = view.ncols();
            let full = Array2::from_elem(view.dim(), MASK_DATA);
            data.slice_mut(s![.., col..col + w])
                .assign(&pad_vertical(view, target, 0));
            mask.slice_mut(s![.., col..col + w])
                .assign(&pad_vertical(full.view(), target, MASK_PADDING));
            col += w;
        }
        Ok(Heatmap { data, mask })
    }
}

/// 单通道 8 位热图及其掩膜.
///
/// 掩膜与热图形状相同, 255 代表真实数据, 0 代表补齐区域.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Heatmap {
    data: Array2<u8>,
    mask: Array2<u8>,
}

impl Heatmap {
    /// 热图形状 `(高, 宽)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// 热图像素.
    #[inline]
    pub fn view(&self) -> ArrayView2<'_, u8> {
        self.data.view()
    }

    /// 掩膜像素.
    #[inline]
    pub fn mask(&self) -> ArrayView2<'_, u8> {
        self.mask.view()
    }

    /// 用 `colormap` 着色, 再将掩膜为 0 的像素覆盖为 `background`.
    pub fn colorize(&self, colormap: Colormap, background: Rgb<u8>) -> RgbImage {
        let (h, w) = self.shape();
        let mut buf = RgbImage::new(w as u32, h as u32);
        for (((r, c), &v), &m) in self.data.indexed_iter().zip(self.mask.iter()) {
            let color = if is_padding(m) {
                background
            } else {
                colormap.map(v)
            };
            buf.put_pixel(c as u32, r as u32, color);
        }
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Side;
    use ndarray::arr2;

    fn strip(densities: &[f64], width: usize) -> StripImage {
        StripImage::from_densities(densities.iter().copied(), width, Side::Right).unwrap()
    }

    #[test]
    fn test_padding() {
        for target in 0..20 {
            for h in 0..=target {
                let (top, bottom) = padding(h, target).unwrap();
                assert_eq!(top + bottom + h, target);
                assert_eq!(top, (target - h) / 2);
                assert!(bottom == top || bottom == top + 1);
            }
        }
        assert_eq!(padding(3, 8), Some((2, 3)));
        assert_eq!(padding(5, 4), None);
    }

    #[test]
    fn test_pad_vertical() {
        let a = arr2(&[[7u8, 7], [9, 9]]);
        let p = pad_vertical(a.view(), 5, 1);
        assert_eq!(p, arr2(&[[1, 1], [7, 7], [9, 9], [1, 1], [1, 1]]));
    }

    /// 两张切片: 10 条全部达标, 10 条中 3 条达标, 总计 65.0%.
    #[test]
    fn test_transport_percent() {
        let mut t = TransportTally::default();
        t.add(10, 10);
        t.add(10, 3);
        assert_eq!(t.percent().unwrap(), 65.0);

        let mut t = TransportTally::default();
        t.add(3, 1);
        assert_eq!(t.percent().unwrap(), 33.3);
        t.add(3, 1);
        t.add(3, 2);
        assert_eq!(t.percent().unwrap(), 44.4);
    }

    /// 恰好落在一位小数的中点时取偶数.
    #[test]
    fn test_transport_percent_ties_to_even() {
        let mut t = TransportTally::default();
        t.add(16, 1);
        assert_eq!(t.percent().unwrap(), 6.2);

        let mut t = TransportTally::default();
        t.add(80, 1);
        assert_eq!(t.percent().unwrap(), 1.2);

        let mut t = TransportTally::default();
        t.add(16, 3);
        assert_eq!(t.percent().unwrap(), 18.8);
    }

    /// 与累加顺序无关.
    #[test]
    fn test_transport_order_independent() {
        let counts = [(12, 5), (7, 7), (30, 11), (1, 0)];
        let mut a = TransportTally::default();
        counts.iter().for_each(|&(n, p)| a.add(n, p));
        let mut b = TransportTally::default();
        counts.iter().rev().for_each(|&(n, p)| b.add(n, p));
        assert_eq!(a, b);
        assert_eq!(a.percent().unwrap(), b.percent().unwrap());
    }

    #[test]
    fn test_transport_empty() {
        let e = TransportTally::default().percent().unwrap_err();
        assert!(matches!(e, TraceError::EmptyBatch));
    }

    #[test]
    fn test_heatmap_finish() {
        let mut b = HeatmapBuilder::new();
        b.push(strip(&[1.0, 1.0], 2));
        b.push(strip(&[0.0, 0.5, 1.0, 1.0, 1.0], 1));
        assert_eq!(b.max_height(), 5);
        let hm = b.finish().unwrap();
        assert_eq!(hm.shape(), (5, 3));
        assert_eq!(
            hm.view(),
            arr2(&[
                [0, 0, 0],
                [255, 255, 128],
                [255, 255, 255],
                [0, 0, 255],
                [0, 0, 255],
            ])
        );
        assert_eq!(
            hm.mask(),
            arr2(&[
                [0, 0, 255],
                [255, 255, 255],
                [255, 255, 255],
                [0, 0, 255],
                [0, 0, 255],
            ])
        );
    }

    #[test]
    fn test_heatmap_empty() {
        assert!(matches!(
            HeatmapBuilder::new().finish(),
            Err(TraceError::EmptyBatch)
        ));
    }

    /// 补齐区域被涂成背景色, 数据区域中的 0 仍然着色.
    #[test]
    fn test_colorize_mask() {
        let mut b = HeatmapBuilder::new();
        b.push(strip(&[0.0], 1));
        b.push(strip(&[0.0, 0.0, 0.0], 1));
        let hm = b.finish().unwrap();
        let bg = Rgb([1, 2, 3]);
        let img = hm.colorize(Colormap::Plasma, bg);
        assert_eq!(img.dimensions(), (2, 3));
        assert_eq!(*img.get_pixel(0, 0), bg);
        assert_eq!(*img.get_pixel(0, 2), bg);
        assert_eq!(*img.get_pixel(0, 1), Colormap::Plasma.map(0));
        assert_eq!(*img.get_pixel(1, 0), Colormap::Plasma.map(0));
    }
}
