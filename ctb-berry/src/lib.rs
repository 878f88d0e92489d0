#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 从上丘 (superior colliculus) 连续切片的荧光图像与手绘 ROI 出发,
//! 量化 CTB 轴突运输强度, 并合成整只动物单侧的运输热图.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 坐标约定: ROI 顶点与像素集合均使用 `(x, y)`; 图像数组使用 `(行, 列)`, 即 `(y, x)`.
//!   两者之间的转换只发生在 [`SectionImage`] 的取值接口中.
//! 2. 退化输入 (空 ROI, 空条带, 空批次) 会返回明确的错误, 而不会产生 NaN.
//!
//! # 开发计划
//!
//! ### ROI 光栅化 ✅
//!
//! 扫描线 + 奇偶规则, 结果与逐点射线判定一致.
//!
//! 实现位于 `ctb-berry/src/roi`.
//!
//! ### ImageJ `.roi` 二进制格式解码 ✅
//!
//! 实现位于 `ctb-berry/src/roi/imagej.rs`.
//!
//! ### 背景阈值 ✅
//!
//! 1. 查表模式: 手动标定后导出的 CSV 表, 按文件名与左右侧取值. ✅
//! 2. 计算模式: 背景 ROI 平均强度乘以固定校正系数 (默认 1.65). ✅
//!
//! 实现位于 `ctb-berry/src/background.rs`.
//!
//! ### 条带分箱与 CTB 密度 ✅
//!
//! 以 `ceil(6um * 分辨率)` 像素为宽度沿 x 轴分箱, 计算每箱高于背景的像素比例.
//!
//! 实现位于 `ctb-berry/src/strip`.
//!
//! ### 热图合成 ✅
//!
//! 居中补齐, 横向拼接, 掩膜去背景, 颜色映射.
//!
//! 实现位于 `ctb-berry/src/heatmap`.
//!
//! ### 批处理流水线 ✅
//!
//! 切片排序, 逐切片容错, 可选的 `rayon` 并行.
//!
//! 实现位于 `ctb-berry/src/pipeline.rs`.

/// 二维数组索引 `(行, 列)`, 即 `(y, x)`.
pub type Idx2d = (usize, usize);

/// 图像平面上的像素坐标 `(x, y)`. ROI 可能越出图像, 因此允许负数.
pub type PixelXy = (i32, i32);

pub mod consts;

pub mod error;

/// 切片图像与左右侧等基础数据结构.
mod data;

pub use data::{BitDepth, Channel, SectionImage, Side};

pub mod roi;

pub mod background;

pub mod strip;

pub mod heatmap;

pub mod dataset;

pub mod pipeline;

pub mod prelude;

pub use error::{ErrorKind, TraceError, TraceResult};
