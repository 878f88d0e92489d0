use crate::error::{TraceError, TraceResult};
use crate::roi::PixelSet;
use crate::SectionImage;

/// 物理宽度 `microns` 在分辨率 `resolution` (像素每微米) 下对应的箱宽, 向上取整到整像素.
///
/// 两个参数都必须为正数, 否则返回 [`TraceError::InvalidParameter`].
pub fn bin_width(microns: f64, resolution: f64) -> TraceResult<usize> {
    let microns = TraceError::check_param("strip_microns", microns, |v| v > 0.0)?;
    let resolution = TraceError::check_param("resolution", resolution, |v| v > 0.0)?;
    let w = (microns * resolution).ceil();
    // 防止溢出 `i32` 坐标运算.
    TraceError::check_param("bin_width", w, |v| v <= i32::MAX as f64).map(|w| w as usize)
}

/// `samples` 中严格大于 `background` 的比例. 样本为空时返回 `None`.
#[inline]
pub fn density(samples: &[u16], background: f64) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let above = samples.iter().filter(|&&s| s as f64 > background).count();
    Some(above as f64 / samples.len() as f64)
}

/// 密度是否达到阈值 (含).
#[inline]
pub fn passes(density: f64, threshold: f64) -> bool {
    density >= threshold
}

/// 单个条带的密度记录.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DensityRecord {
    /// 条带起点的 x 坐标.
    pub origin: i32,

    /// 高于背景的像素比例, 位于 `[0, 1]`.
    pub density: f64,

    /// 密度是否达到运输阈值.
    pub passes_threshold: bool,
}

/// 分箱结果: 按起点升序排列的 (起点, 原始强度样本).
#[derive(Clone, Debug)]
pub struct StripBins {
    bins: Vec<(i32, Vec<u16>)>,
}

impl StripBins {
    /// 箱的个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// 是否没有任何箱. 由 [`StripBinner::bins`] 得到的结果总是非空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// 按起点升序迭代 `(起点, 样本)`.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (i32, &[u16])> {
        self.bins.iter().map(|(o, s)| (*o, s.as_slice()))
    }

    /// 计算每个箱的密度记录.
    ///
    /// 出现空箱时返回 [`TraceError::EmptyBin`], 不会产生 NaN.
    pub fn profile(&self, background: f64, threshold: f64) -> TraceResult<StripProfile> {
        let records = self
            .iter()
            .map(|(origin, samples)| {
                let density = density(samples, background).ok_or(TraceError::EmptyBin { origin })?;
                Ok(DensityRecord {
                    origin,
                    density,
                    passes_threshold: passes(density, threshold),
                })
            })
            .collect::<TraceResult<Vec<_>>>()?;
        Ok(StripProfile { records })
    }
}

/// 条带分箱器.
#[derive(Copy, Clone, Debug)]
pub struct StripBinner {
    width: i32,
}

impl StripBinner {
    /// 以 `width` 像素为箱宽创建分箱器. `width` 为 0 时返回 `None`.
    pub fn new(width: usize) -> Option<Self> {
        match i32::try_from(width) {
            Ok(width) if width > 0 => Some(Self { width }),
            _ => None,
        }
    }

    /// 箱宽.
    #[inline]
    pub fn width(&self) -> usize {
        self.width as usize
    }

    /// 将 `pixels` 按 x 坐标分箱, 并收集它们在 `image` 上的原始强度.
    ///
    /// 箱的起点为 `min_x, min_x + w, min_x + 2w, ...`, 不超过 `max_x`.
    /// 每个像素归入起点不大于其 x 坐标的最大起点 (左闭右开).
    ///
    /// # 错误
    ///
    /// - `pixels` 为空: [`TraceError::EmptyRoi`];
    /// - 某个起点没有分到任何像素: [`TraceError::EmptyBin`];
    /// - 像素越出图像: [`TraceError::PixelOutOfImage`].
    pub fn bins(&self, pixels: &PixelSet, image: &SectionImage) -> TraceResult<StripBins> {
        let (min_x, max_x) = pixels.x_range().ok_or(TraceError::EmptyRoi)?;
        let w = self.width;
        let count = ((max_x - min_x) / w + 1) as usize;

        let mut bins: Vec<(i32, Vec<u16>)> =
            (0..count).map(|i| (min_x + i as i32 * w, Vec::new())).collect();
        for p in pixels {
            let index = ((p.0 - min_x) / w) as usize;
            bins[index].1.push(image.try_xy(p)?);
        }

        if let Some((origin, _)) = bins.iter().find(|(_, s)| s.is_empty()) {
            return Err(TraceError::EmptyBin { origin: *origin });
        }
        Ok(StripBins { bins })
    }

    /// 分箱后直接计算密度记录.
    #[inline]
    pub fn profile(
        &self,
        pixels: &PixelSet,
        image: &SectionImage,
        background: f64,
        threshold: f64,
    ) -> TraceResult<StripProfile> {
        self.bins(pixels, image)?.profile(background, threshold)
    }
}

/// 一张切片的条带密度序列, 按空间顺序排列.
#[derive(Clone, Debug, Default)]
pub struct StripProfile {
    records: Vec<DensityRecord>,
}

impl StripProfile {
    /// 直接由记录创建. 调用者保证记录按起点升序排列.
    #[inline]
    pub fn from_records(records: Vec<DensityRecord>) -> Self {
        Self { records }
    }

    /// 全部记录.
    #[inline]
    pub fn records(&self) -> &[DensityRecord] {
        &self.records
    }

    /// 条带个数.
    #[inline]
    pub fn num_bins(&self) -> usize {
        self.records.len()
    }

    /// 达到运输阈值的条带个数.
    #[inline]
    pub fn num_pass(&self) -> usize {
        self.records.iter().filter(|r| r.passes_threshold).count()
    }

    /// 获取能按空间顺序迭代密度的迭代器.
    #[inline]
    pub fn densities(&self) -> impl ExactSizeIterator<Item = f64> + '_ {
        self.records.iter().map(|r| r.density)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roi::PolygonRoi;
    use crate::{BitDepth, ErrorKind};
    use ndarray::Array2;

    /// 第 `x` 列的强度均为 `x * 10`.
    fn column_image(h: usize, w: usize) -> SectionImage {
        let data = Array2::from_shape_fn((h, w), |(_, x)| (x * 10) as u16);
        SectionImage::from_raw(data, BitDepth::Eight)
    }

    fn rect(x0: i32, y0: i32, x1: i32, y1: i32) -> PixelSet {
        PolygonRoi::new(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1)])
            .rasterize()
            .unwrap()
    }

    #[test]
    fn test_bin_width() {
        // ceil(6 * 0.6154) = ceil(3.6924)
        assert_eq!(bin_width(6.0, 0.6154).unwrap(), 4);
        assert_eq!(bin_width(6.0, 0.5).unwrap(), 3);
        assert_eq!(bin_width(6.0, 0.01).unwrap(), 1);
        assert_eq!(bin_width(6.0, 0.0).unwrap_err().kind(), ErrorKind::Configuration);
        assert!(bin_width(-6.0, 1.0).is_err());
        assert!(bin_width(6.0, f64::NAN).is_err());
    }

    #[test]
    fn test_density_threshold_boundary() {
        assert_eq!(density(&[], 0.0), None);
        assert!(passes(0.70, 0.70));
        assert!(!passes(0.699999, 0.70));
        // 7/10 和 14/20 在浮点数下都恰好是 0.7.
        let samples: Vec<u16> = (0..10).map(|i| if i < 7 { 100 } else { 0 }).collect();
        let d = density(&samples, 50.0).unwrap();
        assert!(passes(d, 0.7));
    }

    /// 严格大于背景才计数.
    #[test]
    fn test_density_strict() {
        assert_eq!(density(&[10, 10, 11, 9], 10.0), Some(0.25));
        assert_eq!(density(&[0, 0], 0.0), Some(0.0));
        assert_eq!(density(&[5, 6], 1.0), Some(1.0));
    }

    #[test]
    fn test_bins_left_closed() {
        // x ∈ [2, 12), y ∈ [0, 3)
        let pixels = rect(2, 0, 12, 3);
        let img = column_image(4, 16);
        let bins = StripBinner::new(4).unwrap().bins(&pixels, &img).unwrap();

        let got: Vec<(i32, usize)> = bins.iter().map(|(o, s)| (o, s.len())).collect();
        // x = 2..=5 -> 2, x = 6..=9 -> 6, x = 10..=11 -> 10.
        assert_eq!(got, [(2, 12), (6, 12), (10, 6)]);

        let (_, first) = bins.iter().next().unwrap();
        assert!(first.iter().all(|&s| (20..=50).contains(&s)));
    }

    #[test]
    fn test_profile() {
        let pixels = rect(0, 0, 10, 2);
        let img = column_image(2, 10);
        // 强度 0, 10, ..., 90; 背景 45 -> x >= 5 高于背景.
        let profile = StripBinner::new(2)
            .unwrap()
            .profile(&pixels, &img, 45.0, 0.7)
            .unwrap();
        let densities: Vec<f64> = profile.densities().collect();
        assert_eq!(densities, [0.0, 0.0, 0.5, 1.0, 1.0]);
        assert_eq!(profile.num_bins(), 5);
        assert_eq!(profile.num_pass(), 2);
        assert!(profile.records().windows(2).all(|w| w[0].origin < w[1].origin));
    }

    /// 同一输入重复分箱, 结果完全一致.
    #[test]
    fn test_bins_deterministic() {
        // 左右两边竖直, 每一列都有像素.
        let pixels = PolygonRoi::new(vec![(2, 1), (15, 3), (15, 17), (2, 12)])
            .rasterize()
            .unwrap();
        let img = column_image(20, 20);
        for w in 1..=7 {
            let b = StripBinner::new(w).unwrap();
            let run = || -> Vec<(i32, Vec<u16>)> {
                let bins = b.bins(&pixels, &img).unwrap();
                bins.iter().map(|(o, s)| (o, s.to_vec())).collect()
            };
            let (a, c) = (run(), run());
            assert_eq!(a, c);
            let total: usize = a.iter().map(|(_, s)| s.len()).sum();
            assert_eq!(total, pixels.len());
        }
    }

    /// x 方向上的空隙会产生空箱, 此时必须报错而不是得到 NaN.
    #[test]
    fn test_empty_bin() {
        let pixels = PixelSet::from_unchecked(vec![(0, 0), (1, 0), (8, 0), (9, 0)]);
        let img = column_image(2, 10);
        let e = StripBinner::new(2).unwrap().bins(&pixels, &img).unwrap_err();
        assert!(matches!(e, TraceError::EmptyBin { origin: 2 }));
        assert_eq!(e.kind(), ErrorKind::DegenerateInput);
    }

    #[test]
    fn test_out_of_image() {
        let pixels = rect(0, 0, 6, 6);
        let img = column_image(4, 4);
        let e = StripBinner::new(2).unwrap().bins(&pixels, &img).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::DegenerateInput);
    }

    #[test]
    fn test_binner_zero_width() {
        assert!(StripBinner::new(0).is_none());
    }
}
