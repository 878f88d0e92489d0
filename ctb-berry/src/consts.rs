//! 通用常量.
//!
//! 标定类常量 (校正系数, 运输阈值) 只作为默认值出现, 运行时均可通过
//! [`crate::pipeline::PipelineConfig`] 覆盖.

/// 单通道颜色.
pub mod gray {
    /// 单通道黑色.
    pub const BLACK: u8 = 0b_0000_0000;

    /// 单通道白色.
    pub const WHITE: u8 = 0b_1111_1111;

    /// 掩膜中代表真实数据的像素值.
    pub const MASK_DATA: u8 = WHITE;

    /// 掩膜中代表补齐区域的像素值.
    pub const MASK_PADDING: u8 = BLACK;

    /// 像素是否是掩膜中的补齐区域?
    #[inline]
    pub const fn is_padding(p: u8) -> bool {
        matches!(p, MASK_PADDING)
    }
}

/// 单条背腹 (dorsal-ventral) 条带的物理宽度, 以微米为单位.
pub const STRIP_MICRONS: f64 = 6.0;

/// 判定一个条带 "运输完好" 的 CTB 密度阈值 (含).
pub const TRANSPORT_THRESHOLD: f64 = 0.70;

/// 计算模式下的背景校正系数. 参考区域 (导水管周围灰质) 的读数偏低.
pub const BACKGROUND_CORRECTION: f64 = 1.65;

/// 默认分辨率, 像素每微米. 对应 4x Nikon 物镜.
pub const DEFAULT_RESOLUTION: f64 = 0.6154;

/// 热图中每个切片条带的默认宽度, 以像素为单位.
pub const DEFAULT_STRIP_WIDTH: usize = 5;

/// 默认 ROI 文件名后缀.
pub const DEFAULT_ROI_SUFFIX: &str = ".nd2.roi";

/// 背景 ROI 文件名前缀.
pub const BACKGROUND_ROI_PREFIX: &str = "BG";
