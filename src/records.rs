//! Record catalog: typed decoding of raw records
//!
//! Most WMF records store their parameters in reverse order relative to the
//! GDI call that produced them (y before x, bottom-right before top-left).
//! Decoding normalizes them into [`PointS`], [`SizeS`] and [`RectS`].

use log::warn;

use crate::bitmap::{Bitmap, ColorUsage};
use crate::cursor::ByteCursor;
use crate::decoder::{RawRecord, RECORD_HEADER_LEN};
use crate::error::{DecodeError, DecodeResult};
use crate::objects::{Brush, Font, Palette, PaletteEntry, Pen, Region};
use crate::record_types::*;
use crate::types::{Color, PointS, RectS, SizeS};

/// ExtTextOut option: fill the rectangle with the background color
pub const ETO_OPAQUE: u16 = 0x0002;
/// ExtTextOut option: clip text to the rectangle
pub const ETO_CLIPPED: u16 = 0x0004;

/// Escape function carrying comments (and embedded EMF chunks)
pub const MFCOMMENT: u16 = 0x000F;

/// SRCCOPY raster operation
pub const SRCCOPY: u32 = 0x00CC0020;

/// Mapping modes (MM_*)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapMode {
    Text,
    LoMetric,
    HiMetric,
    LoEnglish,
    HiEnglish,
    Twips,
    Isotropic,
    Anisotropic,
}

impl MapMode {
    pub fn from_u16(value: u16) -> Option<Self> {
        Some(match value {
            1 => MapMode::Text,
            2 => MapMode::LoMetric,
            3 => MapMode::HiMetric,
            4 => MapMode::LoEnglish,
            5 => MapMode::HiEnglish,
            6 => MapMode::Twips,
            7 => MapMode::Isotropic,
            8 => MapMode::Anisotropic,
            _ => return None,
        })
    }

    /// Logical units per inch for the fixed-scale modes
    pub fn units_per_inch(self) -> Option<f64> {
        match self {
            MapMode::LoMetric => Some(254.0),
            MapMode::HiMetric => Some(2540.0),
            MapMode::LoEnglish => Some(100.0),
            MapMode::HiEnglish => Some(1000.0),
            MapMode::Twips => Some(1440.0),
            MapMode::Text | MapMode::Isotropic | MapMode::Anisotropic => None,
        }
    }
}

/// Background mix mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BkMode {
    Transparent,
    Opaque,
}

impl BkMode {
    pub fn from_u16(value: u16) -> Self {
        if value == 1 {
            BkMode::Transparent
        } else {
            BkMode::Opaque
        }
    }
}

/// Polygon fill mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolyFillMode {
    Alternate,
    Winding,
}

impl PolyFillMode {
    pub fn from_u16(value: u16) -> Self {
        if value == 2 {
            PolyFillMode::Winding
        } else {
            PolyFillMode::Alternate
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalAlign {
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAlign {
    Top,
    Bottom,
    Baseline,
}

/// TA_* flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextAlign(pub u16);

impl TextAlign {
    pub fn update_cp(&self) -> bool {
        self.0 & 0x0001 != 0
    }

    pub fn horizontal(&self) -> HorizontalAlign {
        match self.0 & 0x0006 {
            0x0006 => HorizontalAlign::Center,
            0x0002 => HorizontalAlign::Right,
            _ => HorizontalAlign::Left,
        }
    }

    pub fn vertical(&self) -> VerticalAlign {
        match self.0 & 0x0018 {
            0x0018 => VerticalAlign::Baseline,
            0x0008 => VerticalAlign::Bottom,
            _ => VerticalAlign::Top,
        }
    }

    pub fn rtl_reading(&self) -> bool {
        self.0 & 0x0100 != 0
    }
}

/// Rectangle given as origin plus extent, as blit records store it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlitRect {
    pub x: i16,
    pub y: i16,
    pub width: i16,
    pub height: i16,
}

/// Parameters shared by every bitmap transfer record.
#[derive(Debug, Clone, PartialEq)]
pub struct Blit {
    pub rop: u32,
    pub dest: BlitRect,
    pub source: Option<BlitRect>,
    pub color_usage: ColorUsage,
    /// `None` for the pattern-only form of BITBLT/STRETCHBLT
    pub bitmap: Option<Bitmap>,
}

/// Typed record body, one variant per record family.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordKind {
    EndOfFile,

    // Drawing state
    SetBkColor(Color),
    SetBkMode(BkMode),
    SetMapMode(u16),
    SetRop2(u16),
    SetRelAbs(u16),
    SetPolyFillMode(PolyFillMode),
    SetStretchBltMode(u16),
    SetTextCharExtra(i16),
    SetTextColor(Color),
    SetTextJustification { break_count: u16, break_extra: u16 },
    SetTextAlign(TextAlign),
    SetMapperFlags(u32),
    SetLayout(u16),
    SaveDc,
    RestoreDc(i16),
    MoveTo(PointS),

    // Coordinate mapping
    SetWindowOrg(PointS),
    SetWindowExt(SizeS),
    SetViewportOrg(PointS),
    SetViewportExt(SizeS),
    OffsetWindowOrg { dx: i16, dy: i16 },
    OffsetViewportOrg { dx: i16, dy: i16 },
    ScaleWindowExt { x_num: i16, x_denom: i16, y_num: i16, y_denom: i16 },
    ScaleViewportExt { x_num: i16, x_denom: i16, y_num: i16, y_denom: i16 },

    // Lines and shapes
    LineTo(PointS),
    Polyline(Vec<PointS>),
    Polygon(Vec<PointS>),
    PolyPolygon(Vec<Vec<PointS>>),
    Rectangle(RectS),
    RoundRect { rect: RectS, corner: SizeS },
    Ellipse(RectS),
    Arc { rect: RectS, start: PointS, end: PointS },
    Pie { rect: RectS, start: PointS, end: PointS },
    Chord { rect: RectS, start: PointS, end: PointS },
    SetPixel { at: PointS, color: Color },
    FloodFill { at: PointS, color: Color },
    ExtFloodFill { at: PointS, color: Color, mode: u16 },
    PatBlt { dest: BlitRect, rop: u32 },

    // Text
    TextOut { at: PointS, text: Vec<u8> },
    ExtTextOut {
        at: PointS,
        options: u16,
        rect: Option<RectS>,
        text: Vec<u8>,
        dx: Vec<i16>,
    },

    // Bitmaps
    Blit(Blit),

    // Object table
    CreatePen(Pen),
    CreateBrush(Brush),
    CreateFont(Font),
    CreatePalette(Palette),
    CreateRegion(Region),
    SelectObject(u16),
    SelectPalette(u16),
    DeleteObject(u16),
    RealizePalette,
    SetPalEntries { start: u16, entries: Vec<PaletteEntry> },
    AnimatePalette { start: u16, entries: Vec<PaletteEntry> },
    ResizePalette(u16),

    // Regions and clipping
    SelectClipRegion(u16),
    IntersectClipRect(RectS),
    ExcludeClipRect(RectS),
    OffsetClipRgn { dx: i16, dy: i16 },
    FillRegion { region: u16, brush: u16 },
    FrameRegion { region: u16, brush: u16, width: i16, height: i16 },
    InvertRegion(u16),
    PaintRegion(u16),

    Escape { function: u16, data: Vec<u8> },

    /// Unrecognized record, kept byte for byte
    Unparsed(Vec<u8>),
}

impl RecordKind {
    /// True for records that create a handle-table entry.
    pub fn creates_object(&self) -> bool {
        matches!(
            self,
            RecordKind::CreatePen(_)
                | RecordKind::CreateBrush(_)
                | RecordKind::CreateFont(_)
                | RecordKind::CreatePalette(_)
                | RecordKind::CreateRegion(_)
        )
    }
}

/// A decoded record together with its on-disk framing.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Absolute stream offset of the record header
    pub offset: usize,
    pub size_words: u32,
    pub record_type: u16,
    pub payload_len: usize,
    pub kind: RecordKind,
}

impl Record {
    /// Decode the payload of `raw` according to its function code.
    pub fn decode(raw: &RawRecord<'_>) -> DecodeResult<Self> {
        let mut cursor = ByteCursor::with_base(raw.payload, raw.payload_offset());
        let kind = decode_kind(raw, &mut cursor)?;
        Ok(Self {
            offset: raw.offset,
            size_words: raw.size_words,
            record_type: raw.record_type,
            payload_len: raw.payload.len(),
            kind,
        })
    }

    pub fn name(&self) -> &'static str {
        record_type_name(self.record_type)
    }

    /// Total bytes this record occupies on disk.
    pub fn byte_len(&self) -> usize {
        RECORD_HEADER_LEN + self.payload_len
    }

    /// Embedded bitmap, for blit and pattern-brush records.
    pub fn bitmap(&self) -> Option<&Bitmap> {
        match &self.kind {
            RecordKind::Blit(blit) => blit.bitmap.as_ref(),
            RecordKind::CreateBrush(Brush::Pattern(bitmap)) => Some(bitmap.as_ref()),
            _ => None,
        }
    }
}

fn read_point(c: &mut ByteCursor<'_>) -> DecodeResult<PointS> {
    let y = c.read_i16()?;
    let x = c.read_i16()?;
    Ok(PointS::new(x, y))
}

fn read_size(c: &mut ByteCursor<'_>) -> DecodeResult<SizeS> {
    let cy = c.read_i16()?;
    let cx = c.read_i16()?;
    Ok(SizeS::new(cx, cy))
}

/// bottom, right, top, left
fn read_rect_reversed(c: &mut ByteCursor<'_>) -> DecodeResult<RectS> {
    let bottom = c.read_i16()?;
    let right = c.read_i16()?;
    let top = c.read_i16()?;
    let left = c.read_i16()?;
    Ok(RectS::new(left, top, right, bottom))
}

/// left, top, right, bottom
fn read_rect(c: &mut ByteCursor<'_>) -> DecodeResult<RectS> {
    let left = c.read_i16()?;
    let top = c.read_i16()?;
    let right = c.read_i16()?;
    let bottom = c.read_i16()?;
    Ok(RectS::new(left, top, right, bottom))
}

fn read_count(c: &mut ByteCursor<'_>, what: &str) -> DecodeResult<usize> {
    let offset = c.offset();
    let count = c.read_i16()?;
    if count < 0 {
        return Err(DecodeError::InvalidField {
            offset,
            reason: format!("negative {} count {}", what, count),
        });
    }
    Ok(count as usize)
}

/// x, y pairs in natural order
fn read_points(c: &mut ByteCursor<'_>, count: usize) -> DecodeResult<Vec<PointS>> {
    let mut points = Vec::with_capacity(count.min(c.remaining() / 4));
    for _ in 0..count {
        let x = c.read_i16()?;
        let y = c.read_i16()?;
        points.push(PointS::new(x, y));
    }
    Ok(points)
}

/// Arc-family parameters: end, start, then the bounding box
fn read_arc(c: &mut ByteCursor<'_>) -> DecodeResult<(RectS, PointS, PointS)> {
    let end = read_point(c)?;
    let start = read_point(c)?;
    let rect = read_rect_reversed(c)?;
    Ok((rect, start, end))
}

/// String bytes, padded to an even length on disk
fn read_string(c: &mut ByteCursor<'_>, len: usize) -> DecodeResult<Vec<u8>> {
    let bytes = c.read_bytes(len)?.to_vec();
    if len % 2 == 1 && c.remaining() > 0 {
        c.skip(1)?;
    }
    Ok(bytes)
}

fn read_blit_rect(c: &mut ByteCursor<'_>) -> DecodeResult<BlitRect> {
    let height = c.read_i16()?;
    let width = c.read_i16()?;
    let y = c.read_i16()?;
    let x = c.read_i16()?;
    Ok(BlitRect {
        x,
        y,
        width,
        height,
    })
}

enum BitmapKind {
    Device,
    Dib,
}

/// BITBLT / DIBBITBLT: source and destination share one extent
fn read_bit_blt(
    raw: &RawRecord<'_>,
    c: &mut ByteCursor<'_>,
    kind: BitmapKind,
) -> DecodeResult<Blit> {
    let has_bitmap = blit_has_bitmap(raw.record_type, raw.size_words);
    let rop = c.read_u32()?;
    let y_src = c.read_i16()?;
    let x_src = c.read_i16()?;
    if !has_bitmap {
        let _reserved = c.read_u16()?;
    }
    let dest = read_blit_rect(c)?;
    let source = BlitRect {
        x: x_src,
        y: y_src,
        width: dest.width,
        height: dest.height,
    };
    let bitmap = read_blit_bitmap(c, has_bitmap, kind, ColorUsage::RgbColors)?;
    Ok(Blit {
        rop,
        dest,
        source: Some(source),
        color_usage: ColorUsage::RgbColors,
        bitmap,
    })
}

/// STRETCHBLT / DIBSTRETCHBLT: independent source and destination extents
fn read_stretch_blt(
    raw: &RawRecord<'_>,
    c: &mut ByteCursor<'_>,
    kind: BitmapKind,
) -> DecodeResult<Blit> {
    let has_bitmap = blit_has_bitmap(raw.record_type, raw.size_words);
    let rop = c.read_u32()?;
    let source = read_blit_rect(c)?;
    if !has_bitmap {
        let _reserved = c.read_u16()?;
    }
    let dest = read_blit_rect(c)?;
    let bitmap = read_blit_bitmap(c, has_bitmap, kind, ColorUsage::RgbColors)?;
    Ok(Blit {
        rop,
        dest,
        source: Some(source),
        color_usage: ColorUsage::RgbColors,
        bitmap,
    })
}

fn read_blit_bitmap(
    c: &mut ByteCursor<'_>,
    has_bitmap: bool,
    kind: BitmapKind,
    usage: ColorUsage,
) -> DecodeResult<Option<Bitmap>> {
    if !has_bitmap {
        return Ok(None);
    }
    let bitmap = match kind {
        BitmapKind::Device => Bitmap::read_bitmap16(c, 0)?,
        BitmapKind::Dib => Bitmap::read_dib(c, usage)?,
    };
    Ok(Some(bitmap))
}

fn decode_kind(raw: &RawRecord<'_>, c: &mut ByteCursor<'_>) -> DecodeResult<RecordKind> {
    let kind = match raw.record_type {
        META_EOF => RecordKind::EndOfFile,

        META_SETBKCOLOR => RecordKind::SetBkColor(Color::from_colorref(c.read_u32()?)),
        META_SETBKMODE => RecordKind::SetBkMode(BkMode::from_u16(c.read_u16()?)),
        META_SETMAPMODE => RecordKind::SetMapMode(c.read_u16()?),
        META_SETROP2 => RecordKind::SetRop2(c.read_u16()?),
        META_SETRELABS => RecordKind::SetRelAbs(c.read_u16()?),
        META_SETPOLYFILLMODE => RecordKind::SetPolyFillMode(PolyFillMode::from_u16(c.read_u16()?)),
        META_SETSTRETCHBLTMODE => RecordKind::SetStretchBltMode(c.read_u16()?),
        META_SETTEXTCHAREXTRA => RecordKind::SetTextCharExtra(c.read_i16()?),
        META_SETTEXTCOLOR => RecordKind::SetTextColor(Color::from_colorref(c.read_u32()?)),
        META_SETTEXTJUSTIFICATION => {
            let break_count = c.read_u16()?;
            let break_extra = c.read_u16()?;
            RecordKind::SetTextJustification {
                break_count,
                break_extra,
            }
        }
        META_SETTEXTALIGN => RecordKind::SetTextAlign(TextAlign(c.read_u16()?)),
        META_SETMAPPERFLAGS => RecordKind::SetMapperFlags(c.read_u32()?),
        META_SETLAYOUT => RecordKind::SetLayout(c.read_u16()?),
        META_SAVEDC => RecordKind::SaveDc,
        META_RESTOREDC => RecordKind::RestoreDc(c.read_i16()?),
        META_MOVETO => RecordKind::MoveTo(read_point(c)?),

        META_SETWINDOWORG => RecordKind::SetWindowOrg(read_point(c)?),
        META_SETWINDOWEXT => RecordKind::SetWindowExt(read_size(c)?),
        META_SETVIEWPORTORG => RecordKind::SetViewportOrg(read_point(c)?),
        META_SETVIEWPORTEXT => RecordKind::SetViewportExt(read_size(c)?),
        META_OFFSETWINDOWORG => {
            let p = read_point(c)?;
            RecordKind::OffsetWindowOrg { dx: p.x, dy: p.y }
        }
        META_OFFSETVIEWPORTORG => {
            let p = read_point(c)?;
            RecordKind::OffsetViewportOrg { dx: p.x, dy: p.y }
        }
        META_SCALEWINDOWEXT | META_SCALEVIEWPORTEXT => {
            let y_denom = c.read_i16()?;
            let y_num = c.read_i16()?;
            let x_denom = c.read_i16()?;
            let x_num = c.read_i16()?;
            if raw.record_type == META_SCALEWINDOWEXT {
                RecordKind::ScaleWindowExt {
                    x_num,
                    x_denom,
                    y_num,
                    y_denom,
                }
            } else {
                RecordKind::ScaleViewportExt {
                    x_num,
                    x_denom,
                    y_num,
                    y_denom,
                }
            }
        }

        META_LINETO => RecordKind::LineTo(read_point(c)?),
        META_POLYLINE | META_POLYGON => {
            let count = read_count(c, "point")?;
            let points = read_points(c, count)?;
            if raw.record_type == META_POLYLINE {
                RecordKind::Polyline(points)
            } else {
                RecordKind::Polygon(points)
            }
        }
        META_POLYPOLYGON => {
            let polygons = read_count(c, "polygon")?;
            let mut counts = Vec::with_capacity(polygons.min(c.remaining() / 2));
            for _ in 0..polygons {
                counts.push(c.read_u16()? as usize);
            }
            let mut result = Vec::with_capacity(counts.len());
            for count in counts {
                result.push(read_points(c, count)?);
            }
            RecordKind::PolyPolygon(result)
        }
        META_RECTANGLE => RecordKind::Rectangle(read_rect_reversed(c)?),
        META_ROUNDRECT => {
            let corner = read_size(c)?;
            let rect = read_rect_reversed(c)?;
            RecordKind::RoundRect { rect, corner }
        }
        META_ELLIPSE => RecordKind::Ellipse(read_rect_reversed(c)?),
        META_ARC => {
            let (rect, start, end) = read_arc(c)?;
            RecordKind::Arc { rect, start, end }
        }
        META_PIE => {
            let (rect, start, end) = read_arc(c)?;
            RecordKind::Pie { rect, start, end }
        }
        META_CHORD => {
            let (rect, start, end) = read_arc(c)?;
            RecordKind::Chord { rect, start, end }
        }
        META_SETPIXEL => {
            let color = Color::from_colorref(c.read_u32()?);
            let at = read_point(c)?;
            RecordKind::SetPixel { at, color }
        }
        META_FLOODFILL => {
            let color = Color::from_colorref(c.read_u32()?);
            let at = read_point(c)?;
            RecordKind::FloodFill { at, color }
        }
        META_EXTFLOODFILL => {
            let mode = c.read_u16()?;
            let color = Color::from_colorref(c.read_u32()?);
            let at = read_point(c)?;
            RecordKind::ExtFloodFill { at, color, mode }
        }
        META_PATBLT => {
            let rop = c.read_u32()?;
            let dest = read_blit_rect(c)?;
            RecordKind::PatBlt { dest, rop }
        }

        META_TEXTOUT => {
            let len = read_count(c, "string")?;
            let text = read_string(c, len)?;
            let at = read_point(c)?;
            RecordKind::TextOut { at, text }
        }
        META_EXTTEXTOUT => {
            let at = read_point(c)?;
            let len = read_count(c, "string")?;
            let options = c.read_u16()?;
            let rect = if options & (ETO_OPAQUE | ETO_CLIPPED) != 0 {
                Some(read_rect(c)?)
            } else {
                None
            };
            let text = read_string(c, len)?;
            // The spacing array is optional and often omitted
            let mut dx = Vec::new();
            if c.remaining() >= len * 2 {
                dx.reserve(len);
                for _ in 0..len {
                    dx.push(c.read_i16()?);
                }
            }
            RecordKind::ExtTextOut {
                at,
                options,
                rect,
                text,
                dx,
            }
        }

        META_BITBLT => RecordKind::Blit(read_bit_blt(raw, c, BitmapKind::Device)?),
        META_DIBBITBLT => RecordKind::Blit(read_bit_blt(raw, c, BitmapKind::Dib)?),
        META_STRETCHBLT => RecordKind::Blit(read_stretch_blt(raw, c, BitmapKind::Device)?),
        META_DIBSTRETCHBLT => RecordKind::Blit(read_stretch_blt(raw, c, BitmapKind::Dib)?),
        META_STRETCHDIB => {
            let rop = c.read_u32()?;
            let usage = ColorUsage::from_u16(c.read_u16()?);
            let source = read_blit_rect(c)?;
            let dest = read_blit_rect(c)?;
            let bitmap = Bitmap::read_dib(c, usage)?;
            RecordKind::Blit(Blit {
                rop,
                dest,
                source: Some(source),
                color_usage: usage,
                bitmap: Some(bitmap),
            })
        }
        META_SETDIBTODEV => {
            let usage = ColorUsage::from_u16(c.read_u16()?);
            let _scan_count = c.read_u16()?;
            let _start_scan = c.read_u16()?;
            let y_dib = c.read_i16()?;
            let x_dib = c.read_i16()?;
            let dest = read_blit_rect(c)?;
            let bitmap = Bitmap::read_dib(c, usage)?;
            RecordKind::Blit(Blit {
                rop: SRCCOPY,
                dest,
                source: Some(BlitRect {
                    x: x_dib,
                    y: y_dib,
                    width: dest.width,
                    height: dest.height,
                }),
                color_usage: usage,
                bitmap: Some(bitmap),
            })
        }

        META_CREATEPENINDIRECT => RecordKind::CreatePen(Pen::read(c)?),
        META_CREATEBRUSHINDIRECT => RecordKind::CreateBrush(Brush::read_indirect(c)?),
        META_CREATEPATTERNBRUSH => RecordKind::CreateBrush(Brush::read_pattern(c)?),
        META_DIBCREATEPATTERNBRUSH => RecordKind::CreateBrush(Brush::read_dib_pattern(c)?),
        META_CREATEFONTINDIRECT => RecordKind::CreateFont(Font::read(c)?),
        META_CREATEPALETTE => RecordKind::CreatePalette(Palette::read(c)?),
        META_CREATEREGION => RecordKind::CreateRegion(Region::read(c)?),
        META_SELECTOBJECT => RecordKind::SelectObject(c.read_u16()?),
        META_SELECTPALETTE => RecordKind::SelectPalette(c.read_u16()?),
        META_DELETEOBJECT => RecordKind::DeleteObject(c.read_u16()?),
        META_REALIZEPALETTE => RecordKind::RealizePalette,
        META_SETPALENTRIES | META_ANIMATEPALETTE => {
            let start = c.read_u16()?;
            let count = c.read_u16()? as usize;
            let entries = PaletteEntry::read_list(c, count)?;
            if raw.record_type == META_SETPALENTRIES {
                RecordKind::SetPalEntries { start, entries }
            } else {
                RecordKind::AnimatePalette { start, entries }
            }
        }
        META_RESIZEPALETTE => RecordKind::ResizePalette(c.read_u16()?),

        META_SELECTCLIPREGION => RecordKind::SelectClipRegion(c.read_u16()?),
        META_INTERSECTCLIPRECT => RecordKind::IntersectClipRect(read_rect_reversed(c)?),
        META_EXCLUDECLIPRECT => RecordKind::ExcludeClipRect(read_rect_reversed(c)?),
        META_OFFSETCLIPRGN => {
            let p = read_point(c)?;
            RecordKind::OffsetClipRgn { dx: p.x, dy: p.y }
        }
        META_FILLREGION => {
            let region = c.read_u16()?;
            let brush = c.read_u16()?;
            RecordKind::FillRegion { region, brush }
        }
        META_FRAMEREGION => {
            let region = c.read_u16()?;
            let brush = c.read_u16()?;
            let height = c.read_i16()?;
            let width = c.read_i16()?;
            RecordKind::FrameRegion {
                region,
                brush,
                width,
                height,
            }
        }
        META_INVERTREGION => RecordKind::InvertRegion(c.read_u16()?),
        META_PAINTREGION => RecordKind::PaintRegion(c.read_u16()?),

        META_ESCAPE => {
            let function = c.read_u16()?;
            let byte_count = c.read_u16()? as usize;
            let available = c.remaining();
            if byte_count > available {
                warn!(
                    "Escape at {} declares {} bytes, only {} present",
                    raw.offset, byte_count, available
                );
            }
            let data = c.read_bytes(byte_count.min(available))?.to_vec();
            RecordKind::Escape { function, data }
        }

        other => {
            warn!(
                "Unknown record type {:#06x} at offset {} ({} bytes), skipping",
                other,
                raw.offset,
                raw.byte_len()
            );
            RecordKind::Unparsed(raw.payload.to_vec())
        }
    };
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(params: &[i16]) -> (Vec<u8>, u32) {
        let mut payload = Vec::new();
        for p in params {
            payload.extend_from_slice(&p.to_le_bytes());
        }
        let words = (RECORD_HEADER_LEN + payload.len()) as u32 / 2;
        (payload, words)
    }

    fn decode(record_type: u16, params: &[i16]) -> Record {
        let (payload, size_words) = raw(params);
        Record::decode(&RawRecord {
            offset: 0,
            size_words,
            record_type,
            payload: &payload,
        })
        .unwrap()
    }

    #[test]
    fn test_reversed_parameters() {
        let record = decode(META_LINETO, &[20, 10]);
        assert_eq!(record.kind, RecordKind::LineTo(PointS::new(10, 20)));

        let record = decode(META_RECTANGLE, &[40, 30, 20, 10]);
        assert_eq!(record.kind, RecordKind::Rectangle(RectS::new(10, 20, 30, 40)));

        let record = decode(META_SETWINDOWEXT, &[600, 800]);
        assert_eq!(record.kind, RecordKind::SetWindowExt(SizeS::new(800, 600)));
    }

    #[test]
    fn test_polygon_points_in_order() {
        let record = decode(META_POLYGON, &[3, 0, 0, 10, 0, 10, 10]);
        assert_eq!(
            record.kind,
            RecordKind::Polygon(vec![
                PointS::new(0, 0),
                PointS::new(10, 0),
                PointS::new(10, 10)
            ])
        );
        assert_eq!(record.byte_len(), record.size_words as usize * 2);
    }

    #[test]
    fn test_polypolygon() {
        let record = decode(META_POLYPOLYGON, &[2, 1, 2, 5, 5, 0, 0, 1, 1]);
        assert_eq!(
            record.kind,
            RecordKind::PolyPolygon(vec![
                vec![PointS::new(5, 5)],
                vec![PointS::new(0, 0), PointS::new(1, 1)]
            ])
        );
    }

    #[test]
    fn test_arc_parameters() {
        let record = decode(META_ARC, &[0, 100, 50, 0, 100, 100, 0, 0]);
        assert_eq!(
            record.kind,
            RecordKind::Arc {
                rect: RectS::new(0, 0, 100, 100),
                start: PointS::new(0, 50),
                end: PointS::new(100, 0),
            }
        );
    }

    #[test]
    fn test_textout_odd_length() {
        // "abc" + pad, then y, x
        let payload_words = [3i16, i16::from_le_bytes([b'a', b'b']), i16::from_le_bytes([b'c', 0]), 7, 5];
        let record = decode(META_TEXTOUT, &payload_words);
        assert_eq!(
            record.kind,
            RecordKind::TextOut {
                at: PointS::new(5, 7),
                text: b"abc".to_vec()
            }
        );
    }

    #[test]
    fn test_exttextout_with_rect_and_dx() {
        let params = [
            10i16,
            20,
            2,
            ETO_OPAQUE as i16,
            0,
            0,
            50,
            30,
            i16::from_le_bytes([b'h', b'i']),
            6,
            7,
        ];
        let record = decode(META_EXTTEXTOUT, &params);
        assert_eq!(
            record.kind,
            RecordKind::ExtTextOut {
                at: PointS::new(20, 10),
                options: ETO_OPAQUE,
                rect: Some(RectS::new(0, 0, 50, 30)),
                text: b"hi".to_vec(),
                dx: vec![6, 7],
            }
        );
    }

    #[test]
    fn test_blit_without_bitmap() {
        // rop (2 words), ySrc, xSrc, reserved, height, width, yDest, xDest
        let rop = 0x00F00021u32;
        let params = [
            (rop & 0xFFFF) as u16 as i16,
            (rop >> 16) as u16 as i16,
            0,
            0,
            0,
            5,
            6,
            7,
            8,
        ];
        let record = decode(META_DIBBITBLT, &params);
        let RecordKind::Blit(blit) = record.kind else {
            panic!("expected blit");
        };
        assert_eq!(blit.rop, rop);
        assert!(blit.bitmap.is_none());
        assert_eq!(
            blit.dest,
            BlitRect {
                x: 8,
                y: 7,
                width: 6,
                height: 5
            }
        );
    }

    #[test]
    fn test_unknown_record_is_preserved() {
        let record = decode(0x0777, &[1, 2, 3]);
        assert_eq!(record.kind, RecordKind::Unparsed(vec![1, 0, 2, 0, 3, 0]));
        assert_eq!(record.payload_len, 6);
    }

    #[test]
    fn test_negative_count_is_invalid() {
        let (payload, size_words) = raw(&[-1]);
        let err = Record::decode(&RawRecord {
            offset: 40,
            size_words,
            record_type: META_POLYLINE,
            payload: &payload,
        })
        .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidField { offset: 46, .. }));
    }

    #[test]
    fn test_short_payload_is_truncated() {
        let (payload, size_words) = raw(&[1, 2]);
        let err = Record::decode(&RawRecord {
            offset: 0,
            size_words,
            record_type: META_RECTANGLE,
            payload: &payload,
        })
        .unwrap_err();
        assert!(matches!(err, DecodeError::TruncatedStream { .. }));
    }
}
