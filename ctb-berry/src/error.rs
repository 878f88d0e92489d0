//! 运行时错误.

use std::path::PathBuf;

use crate::roi::RoiDecodeError;

/// 错误类别. 决定流水线在切片粒度上如何处置一个错误.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// 配置错误. 对当前工作单元是致命的, 不会尝试任何默认值.
    Configuration,

    /// 文件缺失或损坏. 在切片粒度上可恢复: 跳过该切片.
    Integrity,

    /// 退化输入 (空 ROI, 空条带, 空批次). 致命.
    DegenerateInput,
}

/// 流水线的运行时错误.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    /// 背景值表中没有该切片对应的行.
    #[error("背景值表中没有切片 `{section}` 对应的行")]
    MissingBackground {
        /// 查询所用的切片标识 (文件名).
        section: String,
    },

    /// 左右侧标识既不是 `left` 也不是 `right`.
    #[error("未知的半球方向 `{0}`, 只允许 `left` 或 `right`")]
    InvalidSide(String),

    /// 数值参数不在合法范围内.
    #[error("参数 `{name}` 的取值 {value} 不合法")]
    InvalidParameter {
        /// 参数名.
        name: &'static str,
        /// 实际取值.
        value: f64,
    },

    /// 背景值表无法读取或格式错误.
    #[error("无法读取背景值表 `{path}`")]
    BackgroundTable {
        /// 表文件路径.
        path: PathBuf,
        /// 底层错误.
        #[source]
        source: csv::Error,
    },

    /// 切片所需的文件不存在.
    #[error("找不到文件 `{0}`")]
    MissingFile(PathBuf),

    /// 图像无法解码.
    #[error("无法解码图像 `{path}`")]
    Image {
        /// 图像路径.
        path: PathBuf,
        /// 底层错误.
        #[source]
        source: image::ImageError,
    },

    /// ROI 文件无法解码.
    #[error("无法解码 ROI `{path}`")]
    Roi {
        /// ROI 路径.
        path: PathBuf,
        /// 底层错误.
        #[source]
        source: RoiDecodeError,
    },

    /// 文件读写错误.
    #[error("读写 `{path}` 失败")]
    Io {
        /// 相关路径.
        path: PathBuf,
        /// 底层错误.
        #[source]
        source: std::io::Error,
    },

    /// ROI 内部不包含任何像素.
    #[error("ROI 内部不包含任何像素")]
    EmptyRoi,

    /// 以 `origin` 为起点的条带没有任何像素样本.
    #[error("起点为 x = {origin} 的条带没有任何像素样本")]
    EmptyBin {
        /// 条带起点 x 坐标.
        origin: i32,
    },

    /// ROI 像素落在图像范围之外.
    #[error("ROI 像素 ({x}, {y}) 落在图像范围之外")]
    PixelOutOfImage {
        /// x 坐标.
        x: i32,
        /// y 坐标.
        y: i32,
    },

    /// 整个批次没有处理任何条带.
    #[error("没有任何条带被处理, 无法计算运输百分比")]
    EmptyBatch,
}

impl TraceError {
    /// 获取错误类别.
    pub fn kind(&self) -> ErrorKind {
        use TraceError::*;
        match self {
            MissingBackground { .. }
            | InvalidSide(_)
            | InvalidParameter { .. }
            | BackgroundTable { .. } => ErrorKind::Configuration,
            MissingFile(_) | Image { .. } | Roi { .. } | Io { .. } => ErrorKind::Integrity,
            EmptyRoi | EmptyBin { .. } | PixelOutOfImage { .. } | EmptyBatch => {
                ErrorKind::DegenerateInput
            }
        }
    }

    /// 该错误是否仅使当前切片被跳过?
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Integrity)
    }

    /// 检查浮点参数 `value` 是否满足 `ok`, 否则返回 [`TraceError::InvalidParameter`].
    #[inline]
    pub(crate) fn check_param(
        name: &'static str,
        value: f64,
        ok: impl FnOnce(f64) -> bool,
    ) -> TraceResult<f64> {
        if value.is_finite() && ok(value) {
            Ok(value)
        } else {
            Err(Self::InvalidParameter { name, value })
        }
    }
}

/// 流水线运行时结果.
pub type TraceResult<T> = Result<T, TraceError>;
