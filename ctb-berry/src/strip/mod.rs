//! 条带分箱, CTB 密度与单切片条带图像.
//!
//! 沿 ROI 的 x 轴 (内侧-外侧方向) 以固定像素宽度分箱, 每个箱即一条背腹向条带.
//! 条带的顺序就是空间顺序, 后续的条带图像依赖这一点.

mod binner;
mod image;

pub use binner::{bin_width, density, passes, DensityRecord, StripBinner, StripBins, StripProfile};
pub use self::image::{quantize, StripImage};
