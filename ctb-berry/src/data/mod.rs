use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::TraceError;

mod image;

pub use self::image::{BitDepth, Channel, SectionImage};

/// 上丘的左右侧. 决定背景值表的列和条带图像的方向.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Side {
    /// 左侧. 条带图像需要垂直翻转, 使内侧位于顶端.
    Left,

    /// 右侧.
    Right,
}

impl Side {
    /// 两侧, 按左, 右的顺序.
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    /// 小写名称.
    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    /// ROI 文件名前缀字母.
    #[inline]
    pub const fn initial(&self) -> char {
        match self {
            Side::Left => 'L',
            Side::Right => 'R',
        }
    }

    /// 条带图像是否需要垂直翻转?
    #[inline]
    pub const fn is_flipped(&self) -> bool {
        matches!(self, Side::Left)
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// 大小写不敏感.
impl FromStr for Side {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Side::Left),
            "right" => Ok(Side::Right),
            _ => Err(TraceError::InvalidSide(s.to_string())),
        }
    }
}
