//! 颜色映射.

use std::fmt;
use std::str::FromStr;

use image::{Rgb, RgbImage};
use serde::Deserialize;

/// 类 `plasma` 颜色表的锚点 (位置, 颜色). 锚点之间线性插值.
const PLASMA_ANCHORS: [(f64, [u8; 3]); 9] = [
    (0.0, [0x0d, 0x08, 0x87]),
    (0.125, [0x4c, 0x02, 0xa1]),
    (0.25, [0x7e, 0x03, 0xa8]),
    (0.375, [0xa8, 0x22, 0x96]),
    (0.5, [0xcc, 0x47, 0x78]),
    (0.625, [0xe6, 0x6c, 0x5c]),
    (0.75, [0xf8, 0x95, 0x40]),
    (0.875, [0xfd, 0xc3, 0x28]),
    (1.0, [0xf0, 0xf9, 0x21]),
];

/// 单通道强度到 RGB 颜色的映射.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colormap {
    /// 蓝紫 -> 橙 -> 黄, 感知均匀.
    #[default]
    Plasma,

    /// 灰度.
    Gray,
}

impl Colormap {
    /// 将强度 `v` 映射为颜色.
    pub fn map(&self, v: u8) -> Rgb<u8> {
        match self {
            Colormap::Gray => Rgb([v, v, v]),
            Colormap::Plasma => Rgb(interpolate(&PLASMA_ANCHORS, v as f64 / 255.0)),
        }
    }

    /// 颜色表名称.
    pub fn name(&self) -> &'static str {
        match self {
            Colormap::Plasma => "plasma",
            Colormap::Gray => "gray",
        }
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Colormap {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plasma" => Ok(Colormap::Plasma),
            "gray" | "grey" => Ok(Colormap::Gray),
            other => Err(format!("未知的颜色表 `{other}`")),
        }
    }
}

/// 在按位置升序排列的锚点之间线性插值, `t` 被截断到 `[0, 1]`.
fn interpolate(anchors: &[(f64, [u8; 3])], t: f64) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    let i = anchors
        .windows(2)
        .position(|w| t <= w[1].0)
        .unwrap_or(anchors.len() - 2);
    let ((t0, c0), (t1, c1)) = (anchors[i], anchors[i + 1]);
    let k = (t - t0) / (t1 - t0);
    let mut ans = [0u8; 3];
    for (a, (&lo, &hi)) in ans.iter_mut().zip(c0.iter().zip(c1.iter())) {
        *a = (lo as f64 + k * (hi as f64 - lo as f64)).round() as u8;
    }
    ans
}

/// 生成宽 `width`, 高 `height` 的竖直颜色条. 顶端为最大强度 (密度 1.0), 底端为 0.
pub fn colorbar(colormap: Colormap, width: u32, height: u32) -> RgbImage {
    let span = height.saturating_sub(1).max(1) as f64;
    RgbImage::from_fn(width, height, |_, y| {
        let v = 255.0 * (1.0 - y as f64 / span);
        colormap.map(v.round().clamp(0.0, 255.0) as u8)
    })
}
