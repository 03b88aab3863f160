//! Byte-stream builder for hand-made metafiles

#![allow(dead_code)]

use wmf_converter::record_types::*;

/// Builds a metafile record by record.
pub struct WmfBuilder {
    placeable: Option<([i16; 4], u16)>,
    objects: u16,
    body: Vec<u8>,
    max_record_words: u32,
}

impl WmfBuilder {
    pub fn new() -> Self {
        Self {
            placeable: None,
            objects: 0,
            body: Vec::new(),
            max_record_words: 3,
        }
    }

    /// Add a placeable header with bbox `[left, top, right, bottom]`.
    pub fn placeable(mut self, bbox: [i16; 4], units_per_inch: u16) -> Self {
        self.placeable = Some((bbox, units_per_inch));
        self
    }

    /// Handle-table capacity declared in META_HEADER.
    pub fn objects(mut self, count: u16) -> Self {
        self.objects = count;
        self
    }

    /// Record with raw payload bytes; odd payloads are padded.
    pub fn raw(mut self, function: u16, payload: &[u8]) -> Self {
        let mut payload = payload.to_vec();
        if payload.len() % 2 == 1 {
            payload.push(0);
        }
        let words = (6 + payload.len()) as u32 / 2;
        self.max_record_words = self.max_record_words.max(words);
        self.body.extend_from_slice(&words.to_le_bytes());
        self.body.extend_from_slice(&function.to_le_bytes());
        self.body.extend_from_slice(&payload);
        self
    }

    /// Record with 16-bit parameters, given in on-disk order.
    pub fn record(self, function: u16, params: &[i16]) -> Self {
        let payload: Vec<u8> = params.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.raw(function, &payload)
    }

    pub fn move_to(self, x: i16, y: i16) -> Self {
        self.record(META_MOVETO, &[y, x])
    }

    pub fn line_to(self, x: i16, y: i16) -> Self {
        self.record(META_LINETO, &[y, x])
    }

    pub fn rectangle(self, left: i16, top: i16, right: i16, bottom: i16) -> Self {
        self.record(META_RECTANGLE, &[bottom, right, top, left])
    }

    pub fn window(self, org: (i16, i16), ext: (i16, i16)) -> Self {
        self.record(META_SETWINDOWORG, &[org.1, org.0])
            .record(META_SETWINDOWEXT, &[ext.1, ext.0])
    }

    /// CREATEPENINDIRECT with a COLORREF.
    pub fn create_pen(self, style: u16, width: i16, colorref: u32) -> Self {
        let mut payload = Vec::new();
        payload.extend_from_slice(&style.to_le_bytes());
        payload.extend_from_slice(&width.to_le_bytes());
        payload.extend_from_slice(&0i16.to_le_bytes());
        payload.extend_from_slice(&colorref.to_le_bytes());
        self.raw(META_CREATEPENINDIRECT, &payload)
    }

    /// CREATEBRUSHINDIRECT, solid style.
    pub fn create_solid_brush(self, colorref: u32) -> Self {
        let mut payload = Vec::new();
        payload.extend_from_slice(&0u16.to_le_bytes());
        payload.extend_from_slice(&colorref.to_le_bytes());
        payload.extend_from_slice(&0u16.to_le_bytes());
        self.raw(META_CREATEBRUSHINDIRECT, &payload)
    }

    /// META_STRETCHDIB of `dib`; rects are `[x, y, width, height]`.
    pub fn stretch_dib(self, dest: [i16; 4], source: [i16; 4], rop: u32, dib: &[u8]) -> Self {
        let mut payload = Vec::new();
        payload.extend_from_slice(&rop.to_le_bytes());
        payload.extend_from_slice(&0u16.to_le_bytes());
        for rect in [source, dest] {
            for v in [rect[3], rect[2], rect[1], rect[0]] {
                payload.extend_from_slice(&v.to_le_bytes());
            }
        }
        payload.extend_from_slice(dib);
        self.raw(META_STRETCHDIB, &payload)
    }

    /// META_DIBCREATEPATTERNBRUSH with an RGB color table DIB.
    pub fn create_dib_pattern_brush(self, dib: &[u8]) -> Self {
        let mut payload = Vec::new();
        payload.extend_from_slice(&5u16.to_le_bytes());
        payload.extend_from_slice(&0u16.to_le_bytes());
        payload.extend_from_slice(dib);
        self.raw(META_DIBCREATEPATTERNBRUSH, &payload)
    }

    pub fn select(self, handle: u16) -> Self {
        self.record(META_SELECTOBJECT, &[handle as i16])
    }

    pub fn delete(self, handle: u16) -> Self {
        self.record(META_DELETEOBJECT, &[handle as i16])
    }

    pub fn save(self) -> Self {
        self.record(META_SAVEDC, &[])
    }

    pub fn restore(self, depth: i16) -> Self {
        self.record(META_RESTOREDC, &[depth])
    }

    pub fn eof(self) -> Self {
        self.record(META_EOF, &[])
    }

    /// Bottom-up 24-bit DIB filled with one BGR color.
    pub fn dib24(width: i32, height: i32, bgr: [u8; 3]) -> Vec<u8> {
        let stride = ((width as usize * 24 + 31) / 32) * 4;
        let mut out = Vec::new();
        out.extend_from_slice(&40u32.to_le_bytes());
        out.extend_from_slice(&width.to_le_bytes());
        out.extend_from_slice(&height.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&24u16.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&((stride * height as usize) as u32).to_le_bytes());
        out.extend_from_slice(&[0u8; 16]);
        for _ in 0..height {
            let mut row: Vec<u8> = (0..width).flat_map(|_| bgr).collect();
            row.resize(stride, 0);
            out.extend_from_slice(&row);
        }
        out
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        if let Some((bbox, upi)) = self.placeable {
            let mut words: Vec<u16> = vec![0x9AC6, 0xCDD7, 0];
            words.extend(bbox.iter().map(|&v| v as u16));
            words.push(upi);
            words.extend([0, 0]);
            let checksum = words.iter().fold(0u16, |acc, w| acc ^ w);
            // key is stored little-endian as a u32
            out.extend_from_slice(&0x9AC6CDD7u32.to_le_bytes());
            for w in &words[2..] {
                out.extend_from_slice(&w.to_le_bytes());
            }
            out.extend_from_slice(&checksum.to_le_bytes());
        }
        let total_words = (18 + self.body.len()) as u32 / 2;
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&9u16.to_le_bytes());
        out.extend_from_slice(&0x0300u16.to_le_bytes());
        out.extend_from_slice(&total_words.to_le_bytes());
        out.extend_from_slice(&self.objects.to_le_bytes());
        out.extend_from_slice(&self.max_record_words.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&self.body);
        out
    }
}
