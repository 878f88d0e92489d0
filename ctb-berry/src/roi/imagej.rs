//! ImageJ `.roi` 二进制格式解码.
//!
//! 文件以 64 字节大端序头部开始, 随后是相对外接矩形左上角的 `i16` 顶点坐标:
//! 先是全部 x, 再是全部 y.

use super::PolygonRoi;
use crate::PixelXy;

const MAGIC: &[u8; 4] = b"Iout";
const TYPE: usize = 6;
const TOP: usize = 8;
const LEFT: usize = 10;
const BOTTOM: usize = 12;
const RIGHT: usize = 14;
const N_COORDINATES: usize = 16;
/// 顶点数超过 `u16` 范围时, 真实个数以 `i32` 存放在这里.
const SIZE: usize = 18;
const SHAPE_ROI_SIZE: usize = 36;
const COORDINATES: usize = 64;

/// ImageJ ROI 类型.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RoiKind {
    /// 多边形.
    Polygon,
    /// 矩形.
    Rect,
    /// 椭圆.
    Oval,
    /// 直线.
    Line,
    /// 自由线.
    FreeLine,
    /// 折线.
    PolyLine,
    /// 空.
    NoRoi,
    /// 自由手绘.
    Freehand,
    /// 魔棒追踪.
    Traced,
    /// 角度.
    Angle,
    /// 点.
    Point,
}

impl RoiKind {
    fn from_byte(b: u8) -> Option<Self> {
        use RoiKind::*;
        Some(match b {
            0 => Polygon,
            1 => Rect,
            2 => Oval,
            3 => Line,
            4 => FreeLine,
            5 => PolyLine,
            6 => NoRoi,
            7 => Freehand,
            8 => Traced,
            9 => Angle,
            10 => Point,
            _ => return None,
        })
    }

    /// 该类型是否围成一个封闭区域, 并以顶点序列存储?
    #[inline]
    pub fn is_area_polygon(&self) -> bool {
        matches!(self, RoiKind::Polygon | RoiKind::Freehand | RoiKind::Traced)
    }
}

/// ROI 解码错误.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum RoiDecodeError {
    /// 文件不以 `Iout` 开头.
    #[error("不是 ImageJ ROI 文件")]
    BadMagic,

    /// 文件长度不足.
    ///
    /// 第一个参数代表需要的最少字节数, 第二个参数代表实际字节数.
    #[error("文件过短: 至少需要 {0} 字节, 实际只有 {1} 字节")]
    Truncated(usize, usize),

    /// 未知的 ROI 类型字节.
    #[error("未知的 ROI 类型 {0}")]
    UnknownType(u8),

    /// 不是多边形区域 (或者是组合 ROI).
    #[error("不支持的 ROI 类型 {0:?}")]
    Unsupported(RoiKind),
}

/// 带边界检查的大端序读取.
struct Reader<'a>(&'a [u8]);

impl Reader<'_> {
    fn bytes<const N: usize>(&self, at: usize) -> Result<[u8; N], RoiDecodeError> {
        self.0
            .get(at..at + N)
            .and_then(|s| s.try_into().ok())
            .ok_or(RoiDecodeError::Truncated(at + N, self.0.len()))
    }

    #[inline]
    fn i16(&self, at: usize) -> Result<i16, RoiDecodeError> {
        self.bytes(at).map(i16::from_be_bytes)
    }

    #[inline]
    fn u16(&self, at: usize) -> Result<u16, RoiDecodeError> {
        self.bytes(at).map(u16::from_be_bytes)
    }

    #[inline]
    fn i32(&self, at: usize) -> Result<i32, RoiDecodeError> {
        self.bytes(at).map(i32::from_be_bytes)
    }
}

/// 解码一个 ImageJ ROI. 多边形/手绘/追踪类型返回其绝对坐标顶点, 矩形返回四个角点.
pub fn decode(buf: &[u8]) -> Result<PolygonRoi, RoiDecodeError> {
    let r = Reader(buf);
    if &r.bytes::<4>(0)? != MAGIC {
        return Err(RoiDecodeError::BadMagic);
    }
    let [ty] = r.bytes::<1>(TYPE)?;
    let kind = RoiKind::from_byte(ty).ok_or(RoiDecodeError::UnknownType(ty))?;
    let top = r.i16(TOP)? as i32;
    let left = r.i16(LEFT)? as i32;

    match kind {
        RoiKind::Rect => {
            if r.i32(SHAPE_ROI_SIZE)? > 0 {
                return Err(RoiDecodeError::Unsupported(kind));
            }
            let bottom = r.i16(BOTTOM)? as i32;
            let right = r.i16(RIGHT)? as i32;
            Ok(PolygonRoi::new(vec![
                (left, top),
                (right, top),
                (right, bottom),
                (left, bottom),
            ]))
        }
        k if k.is_area_polygon() => {
            let n = match r.u16(N_COORDINATES)? {
                0 => r.i32(SIZE)?.max(0) as usize,
                n => n as usize,
            };
            let xs = COORDINATES;
            let ys = COORDINATES + 2 * n;
            let vertices = (0..n)
                .map(|i| -> Result<PixelXy, RoiDecodeError> {
                    let x = r.i16(xs + 2 * i)? as i32;
                    let y = r.i16(ys + 2 * i)? as i32;
                    Ok((left + x, top + y))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(PolygonRoi::new(vertices))
        }
        k => Err(RoiDecodeError::Unsupported(k)),
    }
}

#[cfg(test)]
mod tests {
    use super::{decode, RoiDecodeError, RoiKind};

    /// 按 ImageJ 的布局拼出一个 ROI 文件.
    fn build(ty: u8, (top, left, bottom, right): (i16, i16, i16, i16), rel: &[(i16, i16)]) -> Vec<u8> {
        let mut buf = vec![0u8; 64];
        buf[..4].copy_from_slice(b"Iout");
        buf[4..6].copy_from_slice(&228i16.to_be_bytes());
        buf[6] = ty;
        buf[8..10].copy_from_slice(&top.to_be_bytes());
        buf[10..12].copy_from_slice(&left.to_be_bytes());
        buf[12..14].copy_from_slice(&bottom.to_be_bytes());
        buf[14..16].copy_from_slice(&right.to_be_bytes());
        buf[16..18].copy_from_slice(&(rel.len() as u16).to_be_bytes());
        for (x, _) in rel {
            buf.extend_from_slice(&x.to_be_bytes());
        }
        for (_, y) in rel {
            buf.extend_from_slice(&y.to_be_bytes());
        }
        buf
    }

    #[test]
    fn test_decode_polygon() {
        let buf = build(0, (20, 10, 30, 18), &[(0, 0), (8, 3), (2, 10)]);
        let roi = decode(&buf).unwrap();
        assert_eq!(roi.vertices(), &[(10, 20), (18, 23), (12, 30)]);
    }

    #[test]
    fn test_decode_freehand_and_rect() {
        let buf = build(7, (0, 5, 4, 9), &[(0, 0), (4, 0), (4, 4), (0, 4)]);
        assert_eq!(decode(&buf).unwrap().vertices().len(), 4);

        let buf = build(1, (2, 3, 7, 9), &[]);
        let roi = decode(&buf).unwrap();
        assert_eq!(roi.vertices(), &[(3, 2), (9, 2), (9, 7), (3, 7)]);
    }

    #[test]
    fn test_decode_errors() {
        let mut buf = build(0, (0, 0, 1, 1), &[(0, 0)]);
        buf[0] = b'X';
        assert_eq!(decode(&buf).unwrap_err(), RoiDecodeError::BadMagic);

        let buf = build(2, (0, 0, 1, 1), &[]);
        assert_eq!(
            decode(&buf).unwrap_err(),
            RoiDecodeError::Unsupported(RoiKind::Oval)
        );

        let buf = build(42, (0, 0, 1, 1), &[]);
        assert_eq!(decode(&buf).unwrap_err(), RoiDecodeError::UnknownType(42));

        let mut buf = build(0, (0, 0, 1, 1), &[(0, 0), (1, 1)]);
        buf.truncate(66);
        assert!(matches!(
            decode(&buf).unwrap_err(),
            RoiDecodeError::Truncated(_, 66)
        ));

        assert!(matches!(decode(b"Io").unwrap_err(), RoiDecodeError::Truncated(4, 2)));
    }

    /// 坐标数的 u16 字段为 0 时, 从 32 位的 `size` 字段读取.
    #[test]
    fn test_decode_large_count() {
        let mut buf = build(0, (20, 10, 30, 18), &[(0, 0), (8, 3), (2, 10)]);
        buf[16..18].copy_from_slice(&0u16.to_be_bytes());
        buf[18..22].copy_from_slice(&3i32.to_be_bytes());
        let roi = decode(&buf).unwrap();
        assert_eq!(roi.vertices(), &[(10, 20), (18, 23), (12, 30)]);
    }
}
