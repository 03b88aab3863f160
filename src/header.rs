//! Metafile headers: the optional placeable header and META_HEADER

use log::{debug, warn};

use crate::cursor::ByteCursor;
use crate::error::{DecodeError, DecodeResult};
use crate::types::RectS;

/// Key of the placeable (Aldus) header.
pub const PLACEABLE_KEY: u32 = 0x9AC6CDD7;
pub const PLACEABLE_HEADER_LEN: usize = 22;
pub const META_HEADER_LEN: usize = 18;
/// META_HEADER size in 16-bit words
const META_HEADER_WORDS: u16 = 9;

/// Check if data is WMF format
pub fn is_wmf_format(data: &[u8]) -> bool {
    if data.len() >= 4 {
        let sig = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        if sig == PLACEABLE_KEY {
            return true;
        }
    }

    // Standard WMF: type 1 or 2 followed by a 9-word header size
    if data.len() >= 4 {
        let kind = u16::from_le_bytes([data[0], data[1]]);
        let size = u16::from_le_bytes([data[2], data[3]]);
        if (kind == 1 || kind == 2) && size == META_HEADER_WORDS {
            return true;
        }
    }

    false
}

/// Aldus placeable header, present in most `.wmf` files on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceableHeader {
    pub hmf: u16,
    pub bounds: RectS,
    pub units_per_inch: u16,
    pub checksum: u16,
}

impl PlaceableHeader {
    fn read(cursor: &mut ByteCursor<'_>) -> DecodeResult<Self> {
        let start = cursor.clone();
        let _key = cursor.read_u32()?;
        let hmf = cursor.read_u16()?;
        let left = cursor.read_i16()?;
        let top = cursor.read_i16()?;
        let right = cursor.read_i16()?;
        let bottom = cursor.read_i16()?;
        let units_per_inch = cursor.read_u16()?;
        let _reserved = cursor.read_u32()?;
        let checksum = cursor.read_u16()?;

        // XOR of the ten words preceding the checksum
        let mut words = start;
        let mut expected = 0u16;
        for _ in 0..10 {
            expected ^= words.read_u16()?;
        }
        if expected != checksum {
            warn!(
                "Placeable header checksum mismatch: stored {:#06x}, computed {:#06x}",
                checksum, expected
            );
        }

        Ok(Self {
            hmf,
            bounds: RectS::new(left, top, right, bottom),
            units_per_inch,
            checksum,
        })
    }
}

/// Where the metafile was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetafileKind {
    Memory,
    Disk,
}

/// Parsed metafile header. Immutable after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub placeable: Option<PlaceableHeader>,
    pub kind: MetafileKind,
    pub version: u16,
    /// Declared size of the whole metafile, in words
    pub size_words: u32,
    /// Handle-table capacity
    pub number_of_objects: u16,
    /// Largest record, in words
    pub max_record_words: u32,
}

impl Header {
    /// Parse the header(s) at the start of `cursor`, leaving it on the first record.
    pub fn read(cursor: &mut ByteCursor<'_>) -> DecodeResult<Self> {
        let placeable = if cursor.remaining() >= 4 {
            let mut probe = cursor.clone();
            if probe.read_u32()? == PLACEABLE_KEY {
                Some(PlaceableHeader::read(cursor)?)
            } else {
                None
            }
        } else {
            None
        };

        let offset = cursor.offset();
        let kind = match cursor.read_u16()? {
            1 => MetafileKind::Memory,
            2 => MetafileKind::Disk,
            other => {
                return Err(DecodeError::InvalidHeader {
                    offset,
                    reason: format!("unknown metafile type {}", other),
                })
            }
        };
        let header_words = cursor.read_u16()?;
        if header_words != META_HEADER_WORDS {
            return Err(DecodeError::InvalidHeader {
                offset: offset + 2,
                reason: format!("header size {} words, expected 9", header_words),
            });
        }
        let version = cursor.read_u16()?;
        let size_words = cursor.read_u32()?;
        let number_of_objects = cursor.read_u16()?;
        let max_record_words = cursor.read_u32()?;
        let _number_of_members = cursor.read_u16()?;

        let header = Self {
            placeable,
            kind,
            version,
            size_words,
            number_of_objects,
            max_record_words,
        };
        debug!(
            "WMF header: placeable={}, version={:#06x}, size={} words, objects={}, max record={} words",
            header.placeable.is_some(),
            header.version,
            header.size_words,
            header.number_of_objects,
            header.max_record_words
        );
        Ok(header)
    }

    /// Bytes occupied by the header(s).
    pub fn header_len(&self) -> usize {
        if self.placeable.is_some() {
            PLACEABLE_HEADER_LEN + META_HEADER_LEN
        } else {
            META_HEADER_LEN
        }
    }

    pub fn bounds(&self) -> Option<RectS> {
        self.placeable.map(|p| p.bounds)
    }

    pub fn units_per_inch(&self) -> Option<u16> {
        self.placeable
            .map(|p| p.units_per_inch)
            .filter(|&upi| upi > 0)
    }
}
