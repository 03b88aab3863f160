//! Embedded bitmap descriptors (DIB and device-dependent Bitmap16)
//!
//! Bitmaps are decoded structurally only: header fields, color table and the
//! raw pixel bytes. Converting pixels to another format is left to canvases.

use log::warn;

use crate::cursor::ByteCursor;
use crate::error::{DecodeError, DecodeResult};
use crate::types::Color;

const BITMAPCOREHEADER_LEN: u32 = 12;
const BITMAPINFOHEADER_LEN: u32 = 40;

/// DIB compression tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Rgb,
    Rle8,
    Rle4,
    Bitfields,
    Jpeg,
    Png,
    Other(u32),
}

impl Compression {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => Compression::Rgb,
            1 => Compression::Rle8,
            2 => Compression::Rle4,
            3 => Compression::Bitfields,
            4 => Compression::Jpeg,
            5 => Compression::Png,
            other => Compression::Other(other),
        }
    }
}

/// How DIB color table entries are to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorUsage {
    /// Entries are RGB values
    RgbColors,
    /// Entries are indices into the selected logical palette
    PalColors,
    /// Entries are indices into the device palette
    PalIndices,
}

impl ColorUsage {
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => ColorUsage::PalColors,
            2 => ColorUsage::PalIndices,
            _ => ColorUsage::RgbColors,
        }
    }
}

/// Color table carried with a bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorTable {
    Rgb(Vec<Color>),
    /// Indices into the selected logical palette (DIB_PAL_COLORS)
    PaletteIndices(Vec<u16>),
}

impl ColorTable {
    pub fn len(&self) -> usize {
        match self {
            ColorTable::Rgb(colors) => colors.len(),
            ColorTable::PaletteIndices(indices) => indices.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Where a bitmap came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitmapFormat {
    /// Device-independent bitmap
    Dib,
    /// Device-dependent Bitmap16 (legacy blit records)
    Device,
}

/// Structured bitmap descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub format: BitmapFormat,
    pub width: u32,
    pub height: u32,
    /// Rows stored top to bottom (negative DIB height, or any Bitmap16)
    pub top_down: bool,
    pub planes: u16,
    pub bit_count: u16,
    pub compression: Compression,
    pub color_table: ColorTable,
    /// Red, green and blue masks for `Compression::Bitfields`
    pub masks: Option<[u32; 3]>,
    /// Bytes per pixel row
    pub stride: usize,
    pub pixels: Vec<u8>,
}

impl Bitmap {
    /// Parse a DIB (BITMAPINFO + bits) occupying the rest of `cursor`.
    pub fn read_dib(cursor: &mut ByteCursor<'_>, usage: ColorUsage) -> DecodeResult<Self> {
        let offset = cursor.offset();
        let header_len = cursor.read_u32()?;

        let (width, height, planes, bit_count, compression, size_image, colors_used) =
            if header_len == BITMAPCOREHEADER_LEN {
                let width = cursor.read_u16()? as i32;
                let height = cursor.read_u16()? as i32;
                let planes = cursor.read_u16()?;
                let bit_count = cursor.read_u16()?;
                (width, height, planes, bit_count, Compression::Rgb, 0, 0)
            } else if header_len >= BITMAPINFOHEADER_LEN {
                let width = cursor.read_i32()?;
                let height = cursor.read_i32()?;
                let planes = cursor.read_u16()?;
                let bit_count = cursor.read_u16()?;
                let compression = Compression::from_u32(cursor.read_u32()?);
                let size_image = cursor.read_u32()?;
                let _x_pels_per_meter = cursor.read_i32()?;
                let _y_pels_per_meter = cursor.read_i32()?;
                let colors_used = cursor.read_u32()?;
                let _colors_important = cursor.read_u32()?;
                (
                    width,
                    height,
                    planes,
                    bit_count,
                    compression,
                    size_image,
                    colors_used,
                )
            } else {
                return Err(DecodeError::InvalidField {
                    offset,
                    reason: format!("unsupported bitmap header size {}", header_len),
                });
            };

        if width < 0 {
            return Err(DecodeError::InvalidField {
                offset,
                reason: format!("negative bitmap width {}", width),
            });
        }

        // Bitfield masks follow a plain BITMAPINFOHEADER; V4/V5 headers embed them
        let mut masks = None;
        if header_len > BITMAPINFOHEADER_LEN {
            if compression == Compression::Bitfields && header_len >= 52 {
                masks = Some([cursor.read_u32()?, cursor.read_u32()?, cursor.read_u32()?]);
                cursor.skip((header_len - 52) as usize)?;
            } else {
                cursor.skip((header_len - BITMAPINFOHEADER_LEN) as usize)?;
            }
        } else if compression == Compression::Bitfields {
            masks = Some([cursor.read_u32()?, cursor.read_u32()?, cursor.read_u32()?]);
        }

        let entries = if colors_used > 0 {
            colors_used as usize
        } else if bit_count <= 8 {
            1usize << bit_count
        } else {
            0
        };
        // Entry counts come from the file; size buffers by what is actually there
        let color_table = match usage {
            ColorUsage::PalColors => {
                let mut indices = Vec::with_capacity(entries.min(cursor.remaining() / 2));
                for _ in 0..entries {
                    indices.push(cursor.read_u16()?);
                }
                ColorTable::PaletteIndices(indices)
            }
            // DIB_PAL_INDICES carries no color table at all
            ColorUsage::PalIndices => ColorTable::PaletteIndices(Vec::new()),
            ColorUsage::RgbColors => {
                let entry_len = if header_len == BITMAPCOREHEADER_LEN { 3 } else { 4 };
                let mut colors = Vec::with_capacity(entries.min(cursor.remaining() / entry_len));
                for _ in 0..entries {
                    let b = cursor.read_u8()?;
                    let g = cursor.read_u8()?;
                    let r = cursor.read_u8()?;
                    if header_len != BITMAPCOREHEADER_LEN {
                        let _reserved = cursor.read_u8()?;
                    }
                    colors.push(Color::rgb(r, g, b));
                }
                ColorTable::Rgb(colors)
            }
        };

        let abs_height = height.unsigned_abs();
        let geometry_error = || DecodeError::InvalidField {
            offset,
            reason: format!(
                "bitmap geometry {}x{} at {} bpp overflows",
                width, abs_height, bit_count
            ),
        };
        let stride = (width as usize)
            .checked_mul(bit_count as usize)
            .and_then(|bits| bits.checked_add(31))
            .map(|bits| bits / 32 * 4)
            .ok_or_else(geometry_error)?;
        let expected = match compression {
            Compression::Rgb | Compression::Bitfields => stride
                .checked_mul(abs_height as usize)
                .ok_or_else(geometry_error)?,
            _ => size_image as usize,
        };
        let available = cursor.remaining();
        let take = if expected == 0 || expected > available {
            if expected > available {
                warn!(
                    "Bitmap at {} declares {} pixel bytes, only {} present",
                    offset, expected, available
                );
            }
            available
        } else {
            expected
        };
        let pixels = cursor.read_bytes(take)?.to_vec();

        Ok(Self {
            format: BitmapFormat::Dib,
            width: width as u32,
            height: abs_height,
            top_down: height < 0,
            planes,
            bit_count,
            compression,
            color_table,
            masks,
            stride,
            pixels,
        })
    }

    /// Parse a device-dependent Bitmap16 header followed by `reserved` bytes and its bits.
    pub fn read_bitmap16(cursor: &mut ByteCursor<'_>, reserved: usize) -> DecodeResult<Self> {
        let offset = cursor.offset();
        let _kind = cursor.read_i16()?;
        let width = cursor.read_i16()?;
        let height = cursor.read_i16()?;
        let width_bytes = cursor.read_i16()?;
        let planes = cursor.read_u8()? as u16;
        let bit_count = cursor.read_u8()? as u16;
        if width < 0 || height < 0 || width_bytes < 0 {
            return Err(DecodeError::InvalidField {
                offset,
                reason: format!(
                    "negative Bitmap16 geometry {}x{} ({} bytes/row)",
                    width, height, width_bytes
                ),
            });
        }
        cursor.skip(reserved)?;

        let stride = width_bytes as usize;
        let expected = stride * height as usize;
        let available = cursor.remaining();
        if expected > available {
            warn!(
                "Bitmap16 at {} declares {} pixel bytes, only {} present",
                offset, expected, available
            );
        }
        let pixels = cursor.read_bytes(expected.min(available))?.to_vec();

        // Monochrome device bitmaps render with the text/background colors; keep black/white
        let color_table = if bit_count == 1 {
            ColorTable::Rgb(vec![Color::black(), Color::white()])
        } else {
            ColorTable::Rgb(Vec::new())
        };

        Ok(Self {
            format: BitmapFormat::Device,
            width: width as u32,
            height: height as u32,
            top_down: true,
            planes,
            bit_count,
            compression: Compression::Rgb,
            color_table,
            masks: None,
            stride,
            pixels,
        })
    }

    /// Number of pixel rows actually present.
    pub fn available_rows(&self) -> usize {
        if self.stride == 0 {
            0
        } else {
            (self.pixels.len() / self.stride).min(self.height as usize)
        }
    }

    /// Pixel bytes of row `y`, counted from the top of the image.
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        if y >= self.height as usize || self.stride == 0 {
            return None;
        }
        let stored = if self.top_down {
            y
        } else {
            self.height as usize - 1 - y
        };
        let start = stored * self.stride;
        self.pixels.get(start..start + self.stride)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info_header(width: i32, height: i32, bit_count: u16, colors_used: u32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&40u32.to_le_bytes());
        out.extend_from_slice(&width.to_le_bytes());
        out.extend_from_slice(&height.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&bit_count.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&0i32.to_le_bytes());
        out.extend_from_slice(&0i32.to_le_bytes());
        out.extend_from_slice(&colors_used.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out
    }

    #[test]
    fn test_palettized_dib() {
        let mut data = info_header(2, 2, 1, 2);
        // color table: black, red (BGRX)
        data.extend_from_slice(&[0, 0, 0, 0, 0, 0, 255, 0]);
        // two rows, 4 bytes each
        data.extend_from_slice(&[0x80, 0, 0, 0, 0x40, 0, 0, 0]);

        let mut cursor = ByteCursor::new(&data);
        let bitmap = Bitmap::read_dib(&mut cursor, ColorUsage::RgbColors).unwrap();
        assert_eq!(bitmap.width, 2);
        assert_eq!(bitmap.height, 2);
        assert!(!bitmap.top_down);
        assert_eq!(bitmap.stride, 4);
        assert_eq!(
            bitmap.color_table,
            ColorTable::Rgb(vec![Color::black(), Color::rgb(255, 0, 0)])
        );
        // bottom-up storage: top row is the last stored row
        assert_eq!(bitmap.row(0), Some(&[0x40, 0, 0, 0][..]));
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_palette_index_table() {
        let mut data = info_header(1, -1, 8, 2);
        data.extend_from_slice(&[3, 0, 7, 0]);
        data.extend_from_slice(&[1, 0, 0, 0]);
        let mut cursor = ByteCursor::new(&data);
        let bitmap = Bitmap::read_dib(&mut cursor, ColorUsage::PalColors).unwrap();
        assert!(bitmap.top_down);
        assert_eq!(bitmap.color_table, ColorTable::PaletteIndices(vec![3, 7]));
    }

    #[test]
    fn test_short_pixel_data_is_kept() {
        let mut data = info_header(4, 4, 24, 0);
        data.extend_from_slice(&[0u8; 10]);
        let mut cursor = ByteCursor::new(&data);
        let bitmap = Bitmap::read_dib(&mut cursor, ColorUsage::RgbColors).unwrap();
        assert_eq!(bitmap.pixels.len(), 10);
        assert_eq!(bitmap.available_rows(), 0);
    }

    #[test]
    fn test_bitmap16() {
        let mut data = Vec::new();
        for v in [0i16, 8, 2, 2] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend_from_slice(&[1, 1]);
        data.extend_from_slice(&[0xFF, 0x00, 0x0F, 0x00]);
        let mut cursor = ByteCursor::new(&data);
        let bitmap = Bitmap::read_bitmap16(&mut cursor, 0).unwrap();
        assert_eq!(bitmap.format, BitmapFormat::Device);
        assert_eq!(bitmap.row(1), Some(&[0x0F, 0x00][..]));
    }

    #[test]
    fn test_oversized_color_table_is_truncation() {
        let mut data = info_header(1, 1, 24, u32::MAX);
        data.extend_from_slice(&[0, 0, 255, 0]);
        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            Bitmap::read_dib(&mut cursor, ColorUsage::RgbColors),
            Err(DecodeError::TruncatedStream { .. })
        ));

        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            Bitmap::read_dib(&mut cursor, ColorUsage::PalColors),
            Err(DecodeError::TruncatedStream { .. })
        ));
    }

    #[test]
    fn test_pixel_size_overflow_is_rejected() {
        let data = info_header(i32::MAX, i32::MAX, u16::MAX, 0);
        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            Bitmap::read_dib(&mut cursor, ColorUsage::RgbColors),
            Err(DecodeError::InvalidField { offset: 0, .. })
        ));
    }
}
