//! Picture facade: header, typed records and replay

use log::{debug, warn};

use crate::bitmap::Bitmap;
use crate::canvas::Canvas;
use crate::cursor::ByteCursor;
use crate::decoder::RecordDecoder;
use crate::error::{DecodeResult, ReplayResult};
use crate::header::Header;
use crate::player::Player;
use crate::records::{Record, RecordKind, MFCOMMENT};
use crate::state::{ViewTransform, DEFAULT_DPI};
use crate::types::{PointS, RectS};

/// Points per inch
const POINTS_PER_INCH: f64 = 72.0;

/// "WMFC" comment identifier of META_ESCAPE_ENHANCED_METAFILE
const WMFC_IDENTIFIER: u32 = 0x43464D57;
const WMFC_COMMENT_TYPE: u32 = 0x0000_0001;

/// Parse a metafile. Shorthand for [`Picture::parse`].
pub fn parse(data: &[u8]) -> DecodeResult<Picture> {
    Picture::parse(data)
}

/// A parsed metafile: immutable header and record list.
///
/// Replaying never mutates the picture, so one picture can be drawn any
/// number of times, including from several threads onto separate canvases.
#[derive(Debug, Clone, PartialEq)]
pub struct Picture {
    header: Header,
    records: Vec<Record>,
    bounds: RectS,
    consumed: usize,
}

impl Picture {
    pub fn parse(data: &[u8]) -> DecodeResult<Self> {
        let mut cursor = ByteCursor::new(data);
        let header = Header::read(&mut cursor)?;

        let mut consumed = cursor.offset();
        let mut records = Vec::new();
        for raw in RecordDecoder::new(cursor) {
            let raw = raw?;
            consumed += raw.byte_len();
            records.push(Record::decode(&raw)?);
        }

        let bounds = header
            .bounds()
            .unwrap_or_else(|| window_from_records(&records));
        debug!(
            "Parsed {} records ({} of {} bytes), bounds {:?}",
            records.len(),
            consumed,
            data.len(),
            bounds
        );
        if !matches!(records.last().map(|r| &r.kind), Some(RecordKind::EndOfFile)) {
            warn!("Metafile has no META_EOF record");
        }

        Ok(Self {
            header,
            records,
            bounds,
            consumed,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Records in stream order, META_EOF included when present.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Logical bounding box: the placeable header's, otherwise the window
    /// set up by the leading SETWINDOWORG/SETWINDOWEXT records.
    pub fn bounds(&self) -> RectS {
        self.bounds
    }

    /// Logical units per inch; files without a placeable header count
    /// logical units as pixels.
    pub fn units_per_inch(&self) -> f64 {
        self.header
            .units_per_inch()
            .map(f64::from)
            .unwrap_or(DEFAULT_DPI)
    }

    /// Width and height at `dpi` target units per inch.
    pub fn size_at_dpi(&self, dpi: f64) -> (f64, f64) {
        let scale = dpi / self.units_per_inch();
        (
            self.bounds.width().abs() as f64 * scale,
            self.bounds.height().abs() as f64 * scale,
        )
    }

    /// Size in pixels at 96 DPI.
    pub fn logical_size(&self) -> (f64, f64) {
        self.size_at_dpi(DEFAULT_DPI)
    }

    /// Size in points (1/72 inch).
    pub fn size_in_points(&self) -> (f64, f64) {
        self.size_at_dpi(POINTS_PER_INCH)
    }

    /// Bytes taken by the header(s) and every decoded record.
    pub fn consumed_len(&self) -> usize {
        self.consumed
    }

    /// Embedded bitmaps with the index of the record carrying them.
    pub fn bitmaps(&self) -> impl Iterator<Item = (usize, &Bitmap)> + '_ {
        self.records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| record.bitmap().map(|b| (index, b)))
    }

    /// Reassemble an EMF carried in MFCOMMENT escape chunks, if any.
    pub fn embedded_emf(&self) -> Option<Vec<u8>> {
        let mut emf = Vec::new();
        let mut declared = None;
        for record in &self.records {
            let RecordKind::Escape { function, data } = &record.kind else {
                continue;
            };
            if *function != MFCOMMENT {
                continue;
            }
            match read_emf_chunk(data) {
                Ok(Some((total, chunk))) => {
                    declared.get_or_insert(total);
                    emf.extend_from_slice(chunk);
                }
                Ok(None) => {}
                Err(err) => warn!("Skipping malformed EMF comment: {}", err),
            }
        }
        let declared = declared?;
        if emf.len() != declared as usize {
            warn!(
                "Embedded EMF declares {} bytes, reassembled {}",
                declared,
                emf.len()
            );
        }
        Some(emf)
    }

    /// Replay onto `canvas` at 96 DPI.
    pub fn replay<C: Canvas + ?Sized>(&self, canvas: &mut C) -> ReplayResult<()> {
        self.replay_at_dpi(canvas, DEFAULT_DPI)
    }

    /// Replay onto `canvas`, mapping the bounds onto a frame sized for `dpi`.
    pub fn replay_at_dpi<C: Canvas + ?Sized>(&self, canvas: &mut C, dpi: f64) -> ReplayResult<()> {
        let (width, height) = self.size_at_dpi(dpi);
        let view = ViewTransform::new(
            (self.bounds.left as i32, self.bounds.top as i32),
            (self.bounds.width(), self.bounds.height()),
            width,
            height,
        );
        Player::new(canvas, self.header.number_of_objects as usize, view).play(&self.records)
    }
}

/// Window from the first SETWINDOWORG / SETWINDOWEXT before any drawing.
fn window_from_records(records: &[Record]) -> RectS {
    let mut origin = PointS::default();
    let mut extent = None;
    for record in records {
        match &record.kind {
            RecordKind::SetWindowOrg(p) => origin = *p,
            RecordKind::SetWindowExt(s) => {
                extent = Some(*s);
                break;
            }
            _ => {}
        }
    }
    match extent {
        Some(ext) => {
            let clamp = |v: i32| v.clamp(i16::MIN as i32, i16::MAX as i32) as i16;
            RectS::new(
                origin.x,
                origin.y,
                clamp(origin.x as i32 + ext.cx as i32),
                clamp(origin.y as i32 + ext.cy as i32),
            )
        }
        None => RectS::default(),
    }
}

/// (declared EMF size, chunk bytes) for a "WMFC" comment, `None` for other comments.
fn read_emf_chunk(data: &[u8]) -> DecodeResult<Option<(u32, &[u8])>> {
    let mut cursor = ByteCursor::new(data);
    if cursor.remaining() < 4 || cursor.read_u32()? != WMFC_IDENTIFIER {
        return Ok(None);
    }
    if cursor.read_u32()? != WMFC_COMMENT_TYPE {
        return Ok(None);
    }
    let _version = cursor.read_u32()?;
    let _checksum = cursor.read_u16()?;
    let _flags = cursor.read_u32()?;
    let _record_count = cursor.read_u32()?;
    let chunk_size = cursor.read_u32()?;
    let _remaining = cursor.read_u32()?;
    let total = cursor.read_u32()?;
    let chunk = cursor.read_bytes(chunk_size as usize)?;
    Ok(Some((total, chunk)))
}
