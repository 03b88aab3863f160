//! Record framing: splits the stream after the header into raw records

use log::debug;

use crate::cursor::ByteCursor;
use crate::error::{DecodeError, DecodeResult};
use crate::record_types::{record_type_name, META_EOF};

/// Size of the record header (size + function) in bytes.
pub const RECORD_HEADER_LEN: usize = 6;
/// Smallest legal record, in words.
pub const MIN_RECORD_WORDS: u32 = 3;

/// One framed record, borrowing its payload from the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRecord<'a> {
    /// Absolute stream offset of the record header
    pub offset: usize,
    pub size_words: u32,
    pub record_type: u16,
    pub payload: &'a [u8],
}

impl<'a> RawRecord<'a> {
    /// Total bytes this record occupies on disk.
    pub fn byte_len(&self) -> usize {
        RECORD_HEADER_LEN + self.payload.len()
    }

    /// Absolute stream offset of the first payload byte.
    pub fn payload_offset(&self) -> usize {
        self.offset + RECORD_HEADER_LEN
    }

    pub fn is_eof(&self) -> bool {
        self.record_type == META_EOF
    }
}

/// Lazy iterator over the raw records of a metafile.
///
/// Stops after the META_EOF record (which is yielded) or when the stream is
/// exhausted. After the first error it yields nothing more. Construct a new
/// decoder over the same bytes to start again from scratch.
#[derive(Debug, Clone)]
pub struct RecordDecoder<'a> {
    cursor: ByteCursor<'a>,
    done: bool,
}

impl<'a> RecordDecoder<'a> {
    /// `cursor` must be positioned just after the header.
    pub fn new(cursor: ByteCursor<'a>) -> Self {
        Self {
            cursor,
            done: false,
        }
    }

    /// Decoder over `data` starting at absolute offset `start`.
    pub fn from_offset(data: &'a [u8], start: usize) -> Self {
        let start = start.min(data.len());
        Self::new(ByteCursor::with_base(&data[start..], start))
    }

    /// Absolute stream offset of the next record.
    pub fn offset(&self) -> usize {
        self.cursor.offset()
    }

    fn read_record(&mut self) -> DecodeResult<RawRecord<'a>> {
        let offset = self.cursor.offset();
        let size_words = self.cursor.read_u32()?;
        let record_type = self.cursor.read_u16()?;
        if size_words < MIN_RECORD_WORDS {
            return Err(DecodeError::InvalidRecordSize { offset, size_words });
        }
        let total = (size_words as usize).checked_mul(2).ok_or(
            DecodeError::InvalidRecordSize { offset, size_words },
        )?;
        let payload = self.cursor.read_bytes(total - RECORD_HEADER_LEN)?;
        debug!(
            "Record at {}: {} ({:#06x}) size={} words",
            offset,
            record_type_name(record_type),
            record_type,
            size_words
        );
        Ok(RawRecord {
            offset,
            size_words,
            record_type,
            payload,
        })
    }
}

impl<'a> Iterator for RecordDecoder<'a> {
    type Item = DecodeResult<RawRecord<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.cursor.is_empty() {
            debug!("Stream ended at {} without META_EOF", self.cursor.offset());
            self.done = true;
            return None;
        }
        match self.read_record() {
            Ok(record) => {
                if record.is_eof() {
                    self.done = true;
                }
                Some(Ok(record))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl std::iter::FusedIterator for RecordDecoder<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(function: u16, params: &[u8]) -> Vec<u8> {
        let words = (RECORD_HEADER_LEN + params.len()) / 2;
        let mut out = Vec::new();
        out.extend_from_slice(&(words as u32).to_le_bytes());
        out.extend_from_slice(&function.to_le_bytes());
        out.extend_from_slice(params);
        out
    }

    #[test]
    fn test_stops_at_eof_record() {
        let mut data = record(0x0213, &[1, 0, 2, 0]);
        data.extend(record(META_EOF, &[]));
        data.extend(record(0x0213, &[1, 0, 2, 0]));

        let records: Vec<_> = RecordDecoder::from_offset(&data, 0)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[1].is_eof());
        assert_eq!(records[0].byte_len(), 10);
        assert_eq!(records[1].offset, 10);
    }

    #[test]
    fn test_unknown_record_keeps_framing() {
        let mut data = record(0x7777, &[9, 9, 9, 9, 9, 9]);
        data.extend(record(META_EOF, &[]));
        let records: Vec<_> = RecordDecoder::from_offset(&data, 0)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(records[0].payload.len(), 6);
        assert_eq!(records[1].offset, 12);
    }

    #[test]
    fn test_rejects_undersized_record() {
        let mut data = Vec::new();
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&0x0213u16.to_le_bytes());
        let mut decoder = RecordDecoder::from_offset(&data, 0);
        assert_eq!(
            decoder.next(),
            Some(Err(DecodeError::InvalidRecordSize {
                offset: 0,
                size_words: 2
            }))
        );
        assert_eq!(decoder.next(), None);
    }

    #[test]
    fn test_payload_past_end_is_truncated() {
        let mut data = Vec::new();
        data.extend_from_slice(&10u32.to_le_bytes());
        data.extend_from_slice(&0x0213u16.to_le_bytes());
        data.extend_from_slice(&[0, 0]);
        let mut decoder = RecordDecoder::from_offset(&data, 0);
        assert!(matches!(
            decoder.next(),
            Some(Err(DecodeError::TruncatedStream { offset: 6, .. }))
        ));
    }
}
