//! Bitmap pixel conversion for the SVG export canvas
//!
//! Turns the structural [`Bitmap`] descriptors kept by the decoder into RGBA
//! images and PNG bytes. Palettized, 16/24/32-bit and bitfield DIBs are
//! expanded here; JPEG and PNG payloads are passed through untouched.

use std::io::Cursor;

use image::{Rgba, RgbaImage};
use log::warn;

use crate::bitmap::{Bitmap, ColorTable, Compression};
use crate::error::WmfResult;
use crate::objects::Palette;
use crate::types::{Color, Rect};

/// Default 5-5-5 layout of 16-bit DIBs without bitfields
const RGB555_MASKS: [u32; 3] = [0x7C00, 0x03E0, 0x001F];
const RGB888_MASKS: [u32; 3] = [0x00FF_0000, 0x0000_FF00, 0x0000_00FF];

/// Encoded image ready to embed, with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime_type: &'static str,
    pub data: Vec<u8>,
}

/// Encode `bitmap` (optionally cropped to `source`) for embedding.
///
/// Returns `Ok(None)` for formats that cannot be converted (RLE, planar
/// device bitmaps, unusual bit depths); those are logged and skipped.
pub fn encode_bitmap(
    bitmap: &Bitmap,
    source: Option<Rect>,
    palette: Option<&Palette>,
) -> WmfResult<Option<EncodedImage>> {
    match bitmap.compression {
        Compression::Png => Ok(Some(EncodedImage {
            mime_type: "image/png",
            data: bitmap.pixels.clone(),
        })),
        Compression::Jpeg => Ok(Some(EncodedImage {
            mime_type: "image/jpeg",
            data: bitmap.pixels.clone(),
        })),
        Compression::Rgb | Compression::Bitfields => {
            let Some(mut rgba) = to_rgba(bitmap, palette) else {
                return Ok(None);
            };
            if let Some(src) = source {
                rgba = crop(&rgba, src);
            }
            Ok(Some(EncodedImage {
                mime_type: "image/png",
                data: encode_png(&rgba)?,
            }))
        }
        other => {
            warn!("Skipping bitmap with unsupported compression {:?}", other);
            Ok(None)
        }
    }
}

/// Expand an uncompressed bitmap to RGBA. Rows missing from a short pixel
/// buffer stay transparent.
pub fn to_rgba(bitmap: &Bitmap, palette: Option<&Palette>) -> Option<RgbaImage> {
    if bitmap.planes > 1 {
        warn!("Skipping planar bitmap ({} planes)", bitmap.planes);
        return None;
    }
    if !matches!(bitmap.bit_count, 1 | 4 | 8 | 16 | 24 | 32) {
        warn!("Skipping bitmap with {} bits per pixel", bitmap.bit_count);
        return None;
    }
    if bitmap.width == 0 || bitmap.height == 0 {
        return None;
    }

    let table = resolve_color_table(bitmap, palette);
    let masks = bitmap.masks.unwrap_or(if bitmap.bit_count == 16 {
        RGB555_MASKS
    } else {
        RGB888_MASKS
    });

    let mut image = RgbaImage::new(bitmap.width, bitmap.height);
    for y in 0..bitmap.height {
        let Some(row) = bitmap.row(y as usize) else {
            continue;
        };
        for x in 0..bitmap.width {
            let color = pixel(row, x as usize, bitmap.bit_count, &table, &masks);
            if let Some(c) = color {
                image.put_pixel(x, y, Rgba([c.r, c.g, c.b, 255]));
            }
        }
    }
    Some(image)
}

/// PNG bytes of an RGBA image.
pub fn encode_png(image: &RgbaImage) -> WmfResult<Vec<u8>> {
    let mut png_data = Vec::new();
    let mut cursor = Cursor::new(&mut png_data);
    image.write_to(&mut cursor, image::ImageFormat::Png)?;
    Ok(png_data)
}

fn crop(image: &RgbaImage, source: Rect) -> RgbaImage {
    let x = source.x.max(0.0) as u32;
    let y = source.y.max(0.0) as u32;
    if x >= image.width() || y >= image.height() {
        return image.clone();
    }
    let width = (source.width.max(1.0) as u32).min(image.width() - x);
    let height = (source.height.max(1.0) as u32).min(image.height() - y);
    if (x, y, width, height) == (0, 0, image.width(), image.height()) {
        return image.clone();
    }
    image::imageops::crop_imm(image, x, y, width, height).to_image()
}

/// Color table as RGB values, looking DIB_PAL_COLORS indices up in `palette`.
fn resolve_color_table(bitmap: &Bitmap, palette: Option<&Palette>) -> Vec<Color> {
    match &bitmap.color_table {
        ColorTable::Rgb(colors) => colors.clone(),
        ColorTable::PaletteIndices(indices) => {
            let lookup = |index: u16| {
                palette
                    .and_then(|p| p.color(index))
                    .unwrap_or_else(|| gray(index))
            };
            if indices.is_empty() {
                // DIB_PAL_INDICES: pixel values index the palette directly
                (0..1u16 << bitmap.bit_count.min(8)).map(lookup).collect()
            } else {
                indices.iter().copied().map(lookup).collect()
            }
        }
    }
}

fn gray(index: u16) -> Color {
    let v = index.min(255) as u8;
    Color::rgb(v, v, v)
}

fn pixel(row: &[u8], x: usize, bit_count: u16, table: &[Color], masks: &[u32; 3]) -> Option<Color> {
    match bit_count {
        1 | 4 | 8 => {
            let bits = bit_count as usize;
            let bit_offset = x * bits;
            let byte = *row.get(bit_offset / 8)?;
            let shift = 8 - bits - (bit_offset % 8);
            let index = ((byte >> shift) & ((1u16 << bits) - 1) as u8) as u16;
            Some(
                table
                    .get(index as usize)
                    .copied()
                    .unwrap_or_else(|| gray(index)),
            )
        }
        16 => {
            let bytes = row.get(x * 2..x * 2 + 2)?;
            let value = u16::from_le_bytes([bytes[0], bytes[1]]) as u32;
            Some(masked(value, masks))
        }
        24 => {
            let bytes = row.get(x * 3..x * 3 + 3)?;
            Some(Color::rgb(bytes[2], bytes[1], bytes[0]))
        }
        32 => {
            let bytes = row.get(x * 4..x * 4 + 4)?;
            let value = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            Some(masked(value, masks))
        }
        _ => None,
    }
}

fn masked(value: u32, masks: &[u32; 3]) -> Color {
    Color::rgb(
        channel(value, masks[0]),
        channel(value, masks[1]),
        channel(value, masks[2]),
    )
}

/// Scale the bits selected by `mask` to 0..=255.
fn channel(value: u32, mask: u32) -> u8 {
    if mask == 0 {
        return 0;
    }
    let shift = mask.trailing_zeros();
    let bits = (mask >> shift).count_ones();
    let max = (1u64 << bits) - 1;
    let v = ((value & mask) >> shift) as u64;
    (v * 255 / max) as u8
}
