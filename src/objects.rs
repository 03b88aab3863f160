//! Graphics objects created by META_CREATE* records

use std::rc::Rc;
use std::sync::Arc;

use crate::bitmap::{Bitmap, ColorUsage};
use crate::cursor::ByteCursor;
use crate::error::{DecodeError, DecodeResult};
use crate::text::decode_ansi;
use crate::types::{Color, RectS};

/// Pen line style (low nibble of the style word).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenStyle {
    Solid,
    Dash,
    Dot,
    DashDot,
    DashDotDot,
    Null,
    InsideFrame,
    UserStyle,
    Alternate,
}

impl PenStyle {
    pub fn from_u16(value: u16) -> Self {
        match value & 0x000F {
            1 => PenStyle::Dash,
            2 => PenStyle::Dot,
            3 => PenStyle::DashDot,
            4 => PenStyle::DashDotDot,
            5 => PenStyle::Null,
            6 => PenStyle::InsideFrame,
            7 => PenStyle::UserStyle,
            8 => PenStyle::Alternate,
            _ => PenStyle::Solid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCap {
    Round,
    Square,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineJoin {
    Round,
    Bevel,
    Miter,
}

/// LOGPEN16
#[derive(Debug, Clone, PartialEq)]
pub struct Pen {
    pub style: PenStyle,
    pub cap: LineCap,
    pub join: LineJoin,
    /// Width in logical units; 0 means one device pixel
    pub width: i16,
    pub color: Color,
}

impl Default for Pen {
    /// BLACK_PEN
    fn default() -> Self {
        Self {
            style: PenStyle::Solid,
            cap: LineCap::Round,
            join: LineJoin::Round,
            width: 0,
            color: Color::black(),
        }
    }
}

impl Pen {
    pub(crate) fn read(cursor: &mut ByteCursor<'_>) -> DecodeResult<Self> {
        let style = cursor.read_u16()?;
        let width = cursor.read_i16()?;
        let _height = cursor.read_i16()?;
        let color = Color::from_colorref(cursor.read_u32()?);
        let cap = match style & 0x0F00 {
            0x0100 => LineCap::Square,
            0x0200 => LineCap::Flat,
            _ => LineCap::Round,
        };
        let join = match style & 0xF000 {
            0x1000 => LineJoin::Bevel,
            0x2000 => LineJoin::Miter,
            _ => LineJoin::Round,
        };
        Ok(Self {
            style: PenStyle::from_u16(style),
            cap,
            join,
            width,
            color,
        })
    }

    pub fn is_null(&self) -> bool {
        self.style == PenStyle::Null
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HatchStyle {
    Horizontal,
    Vertical,
    ForwardDiagonal,
    BackwardDiagonal,
    Cross,
    DiagonalCross,
}

impl HatchStyle {
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => HatchStyle::Vertical,
            2 => HatchStyle::ForwardDiagonal,
            3 => HatchStyle::BackwardDiagonal,
            4 => HatchStyle::Cross,
            5 => HatchStyle::DiagonalCross,
            _ => HatchStyle::Horizontal,
        }
    }
}

/// Brush kinds, from LOGBRUSH16 or the pattern brush records.
#[derive(Debug, Clone, PartialEq)]
pub enum Brush {
    Solid(Color),
    Null,
    Hatched { color: Color, hatch: HatchStyle },
    Pattern(Arc<Bitmap>),
}

impl Default for Brush {
    /// WHITE_BRUSH
    fn default() -> Self {
        Brush::Solid(Color::white())
    }
}

const BS_SOLID: u16 = 0;
const BS_NULL: u16 = 1;
const BS_HATCHED: u16 = 2;

impl Brush {
    pub(crate) fn read_indirect(cursor: &mut ByteCursor<'_>) -> DecodeResult<Self> {
        let style = cursor.read_u16()?;
        let color = Color::from_colorref(cursor.read_u32()?);
        let hatch = cursor.read_u16()?;
        Ok(match style {
            BS_SOLID => Brush::Solid(color),
            BS_NULL => Brush::Null,
            BS_HATCHED => Brush::Hatched {
                color,
                hatch: HatchStyle::from_u16(hatch),
            },
            // Pattern styles without a bitmap cannot be honored; paint the color
            _ => Brush::Solid(color),
        })
    }

    /// META_CREATEPATTERNBRUSH: Bitmap16 header, 18 reserved bytes, bits
    pub(crate) fn read_pattern(cursor: &mut ByteCursor<'_>) -> DecodeResult<Self> {
        let bitmap = Bitmap::read_bitmap16(cursor, 18)?;
        Ok(Brush::Pattern(Arc::new(bitmap)))
    }

    /// META_DIBCREATEPATTERNBRUSH: style, color usage, DIB
    pub(crate) fn read_dib_pattern(cursor: &mut ByteCursor<'_>) -> DecodeResult<Self> {
        let _style = cursor.read_u16()?;
        let usage = ColorUsage::from_u16(cursor.read_u16()?);
        let bitmap = Bitmap::read_dib(cursor, usage)?;
        Ok(Brush::Pattern(Arc::new(bitmap)))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Brush::Null)
    }
}

/// LOGFONT16
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    /// Negative: character height; positive: cell height (logical units)
    pub height: i16,
    pub width: i16,
    /// Tenths of a degree, counterclockwise
    pub escapement: i16,
    pub orientation: i16,
    pub weight: i16,
    pub italic: bool,
    pub underline: bool,
    pub strike_out: bool,
    pub charset: u8,
    pub out_precision: u8,
    pub clip_precision: u8,
    pub quality: u8,
    pub pitch_and_family: u8,
    pub face_name: String,
}

impl Default for Font {
    /// SYSTEM_FONT
    fn default() -> Self {
        Self {
            height: 12,
            width: 0,
            escapement: 0,
            orientation: 0,
            weight: 400,
            italic: false,
            underline: false,
            strike_out: false,
            charset: 0,
            out_precision: 0,
            clip_precision: 0,
            quality: 0,
            pitch_and_family: 0,
            face_name: "Arial".to_string(),
        }
    }
}

impl Font {
    pub(crate) fn read(cursor: &mut ByteCursor<'_>) -> DecodeResult<Self> {
        let height = cursor.read_i16()?;
        let width = cursor.read_i16()?;
        let escapement = cursor.read_i16()?;
        let orientation = cursor.read_i16()?;
        let weight = cursor.read_i16()?;
        let italic = cursor.read_u8()? != 0;
        let underline = cursor.read_u8()? != 0;
        let strike_out = cursor.read_u8()? != 0;
        let charset = cursor.read_u8()?;
        let out_precision = cursor.read_u8()?;
        let clip_precision = cursor.read_u8()?;
        let quality = cursor.read_u8()?;
        let pitch_and_family = cursor.read_u8()?;

        // Face name: up to 32 bytes, NUL terminated, frequently cut short
        let rest = cursor.read_rest();
        let name_bytes = &rest[..rest.len().min(32)];
        let end = name_bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(name_bytes.len());
        let face_name = decode_ansi(&name_bytes[..end], charset);

        Ok(Self {
            height,
            width,
            escapement,
            orientation,
            weight,
            italic,
            underline,
            strike_out,
            charset,
            out_precision,
            clip_precision,
            quality,
            pitch_and_family,
            face_name,
        })
    }

    pub fn is_bold(&self) -> bool {
        self.weight >= 600
    }
}

/// PaletteEntry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteEntry {
    pub color: Color,
    pub flags: u8,
}

impl PaletteEntry {
    pub(crate) fn read(cursor: &mut ByteCursor<'_>) -> DecodeResult<Self> {
        let r = cursor.read_u8()?;
        let g = cursor.read_u8()?;
        let b = cursor.read_u8()?;
        let flags = cursor.read_u8()?;
        Ok(Self {
            color: Color::rgb(r, g, b),
            flags,
        })
    }

    pub(crate) fn read_list(cursor: &mut ByteCursor<'_>, count: usize) -> DecodeResult<Vec<Self>> {
        let mut entries = Vec::with_capacity(count.min(cursor.remaining() / 4));
        for _ in 0..count {
            entries.push(PaletteEntry::read(cursor)?);
        }
        Ok(entries)
    }
}

/// Logical palette
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Palette {
    pub start: u16,
    pub entries: Vec<PaletteEntry>,
}

impl Palette {
    pub(crate) fn read(cursor: &mut ByteCursor<'_>) -> DecodeResult<Self> {
        let start = cursor.read_u16()?;
        let count = cursor.read_u16()? as usize;
        let entries = PaletteEntry::read_list(cursor, count)?;
        Ok(Self { start, entries })
    }

    pub fn color(&self, index: u16) -> Option<Color> {
        self.entries.get(index as usize).map(|e| e.color)
    }

    /// Overwrite entries starting at `start`, growing the palette if needed.
    pub fn set_entries(&mut self, start: u16, entries: &[PaletteEntry]) {
        let start = start as usize;
        if self.entries.len() < start + entries.len() {
            self.entries.resize(
                start + entries.len(),
                PaletteEntry {
                    color: Color::black(),
                    flags: 0,
                },
            );
        }
        self.entries[start..start + entries.len()].copy_from_slice(entries);
    }

    pub fn resize(&mut self, count: u16) {
        self.entries.resize(
            count as usize,
            PaletteEntry {
                color: Color::black(),
                flags: 0,
            },
        );
    }
}

/// One horizontal band of a region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan {
    pub top: i16,
    pub bottom: i16,
    /// (left, right) pairs
    pub spans: Vec<(i16, i16)>,
}

/// Region object: bounding box plus scanline bands, in logical units.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Region {
    pub bounds: RectS,
    pub scans: Vec<Scan>,
}

impl Region {
    pub(crate) fn read(cursor: &mut ByteCursor<'_>) -> DecodeResult<Self> {
        let _next_in_chain = cursor.read_u16()?;
        let _object_type = cursor.read_i16()?;
        let _object_count = cursor.read_i32()?;
        let _region_size = cursor.read_i16()?;
        let offset = cursor.offset();
        let scan_count = cursor.read_i16()?;
        let _max_scan = cursor.read_i16()?;
        let left = cursor.read_i16()?;
        let top = cursor.read_i16()?;
        let right = cursor.read_i16()?;
        let bottom = cursor.read_i16()?;
        if scan_count < 0 {
            return Err(DecodeError::InvalidField {
                offset,
                reason: format!("negative region scan count {}", scan_count),
            });
        }

        let mut scans = Vec::with_capacity(scan_count as usize);
        for _ in 0..scan_count {
            // Count is the number of x coordinates, two per span
            let count = cursor.read_u16()? as usize;
            let top = cursor.read_i16()?;
            let bottom = cursor.read_i16()?;
            let mut spans = Vec::with_capacity(count / 2);
            for _ in 0..count / 2 {
                let l = cursor.read_i16()?;
                let r = cursor.read_i16()?;
                spans.push((l, r));
            }
            let _count2 = cursor.read_u16()?;
            scans.push(Scan { top, bottom, spans });
        }

        Ok(Self {
            bounds: RectS::new(left, top, right, bottom),
            scans,
        })
    }

    /// Rectangles covered by the region; the bounding box when it has no scans.
    pub fn rects(&self) -> Vec<RectS> {
        if self.scans.is_empty() {
            return vec![self.bounds];
        }
        self.scans
            .iter()
            .flat_map(|scan| {
                scan.spans
                    .iter()
                    .map(move |&(l, r)| RectS::new(l, scan.top, r, scan.bottom))
            })
            .collect()
    }
}

/// Any object that can live in the handle table.
///
/// Variants share their payload so that a selected object stays alive after
/// its slot is deleted.
#[derive(Debug, Clone, PartialEq)]
pub enum GdiObject {
    Pen(Rc<Pen>),
    Brush(Rc<Brush>),
    Font(Rc<Font>),
    Palette(Rc<Palette>),
    Region(Rc<Region>),
}

impl GdiObject {
    pub fn kind_name(&self) -> &'static str {
        match self {
            GdiObject::Pen(_) => "pen",
            GdiObject::Brush(_) => "brush",
            GdiObject::Font(_) => "font",
            GdiObject::Palette(_) => "palette",
            GdiObject::Region(_) => "region",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pen_style_bits() {
        let mut data = Vec::new();
        data.extend_from_slice(&0x2201u16.to_le_bytes());
        data.extend_from_slice(&3i16.to_le_bytes());
        data.extend_from_slice(&0i16.to_le_bytes());
        data.extend_from_slice(&0x000000FFu32.to_le_bytes());
        let pen = Pen::read(&mut ByteCursor::new(&data)).unwrap();
        assert_eq!(pen.style, PenStyle::Dash);
        assert_eq!(pen.cap, LineCap::Flat);
        assert_eq!(pen.join, LineJoin::Miter);
        assert_eq!(pen.width, 3);
        assert_eq!(pen.color, Color::rgb(255, 0, 0));
    }

    #[test]
    fn test_font_face_name_is_nul_terminated() {
        let mut data = Vec::new();
        for v in [-16i16, 0, 900, 0, 700] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend_from_slice(&[1, 0, 0, 0, 0, 0, 0, 0]);
        data.extend_from_slice(b"Times New Roman\0garbage");
        let font = Font::read(&mut ByteCursor::new(&data)).unwrap();
        assert_eq!(font.face_name, "Times New Roman");
        assert!(font.italic);
        assert!(font.is_bold());
        assert_eq!(font.escapement, 900);
    }

    #[test]
    fn test_region_rects_from_scans() {
        let mut data = Vec::new();
        for v in [0i16, 6, 0, 0, 0, 1, 0, 0, 0, 10, 10] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        // one scan with two spans
        for v in [4i16, 0, 5, 0, 2, 6, 8, 4] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let region = Region::read(&mut ByteCursor::new(&data)).unwrap();
        assert_eq!(region.bounds, RectS::new(0, 0, 10, 10));
        assert_eq!(
            region.rects(),
            vec![RectS::new(0, 0, 2, 5), RectS::new(6, 0, 8, 5)]
        );
    }

    #[test]
    fn test_palette_set_entries_grows() {
        let mut palette = Palette::default();
        let entry = PaletteEntry {
            color: Color::rgb(1, 2, 3),
            flags: 0,
        };
        palette.set_entries(2, &[entry]);
        assert_eq!(palette.entries.len(), 3);
        assert_eq!(palette.color(2), Some(Color::rgb(1, 2, 3)));
    }
}
