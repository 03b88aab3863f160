mod common;

use common::WmfBuilder;
use wmf_converter::record_types::{META_LINETO, META_MOVETO};
use wmf_converter::{
    convert_wmf_to_svg, parse, CanvasCall, DecodeError, DeviceTransform, Picture, Point, PointS,
    Rect, RecordKind, RecordingCanvas, ReplayErrorKind,
};

const SRCCOPY: u32 = 0x00CC0020;

/// Header (1 handle, bbox 0,0-100,100 at 96 DPI), one line to (50,50), EOF.
fn minimal_line() -> Vec<u8> {
    WmfBuilder::new()
        .placeable([0, 0, 100, 100], 96)
        .objects(1)
        .line_to(50, 50)
        .eof()
        .build()
}

fn drawing() -> Vec<u8> {
    WmfBuilder::new()
        .placeable([0, 0, 200, 100], 96)
        .objects(2)
        .create_pen(0, 2, 0x0000FF)
        .select(0)
        .create_solid_brush(0x00FF00)
        .select(1)
        .save()
        .move_to(10, 10)
        .line_to(190, 90)
        .rectangle(20, 20, 80, 60)
        .restore(-1)
        .delete(0)
        .delete(1)
        .eof()
        .build()
}

#[test]
fn test_minimal_line_scenario() {
    let data = minimal_line();
    let picture = parse(&data).unwrap();
    assert_eq!(picture.records().len(), 2);
    assert_eq!(picture.logical_size(), (100.0, 100.0));

    let mut canvas = RecordingCanvas::new();
    picture.replay(&mut canvas).unwrap();
    assert_eq!(
        canvas.calls.first(),
        Some(&CanvasCall::SetTransform(DeviceTransform::identity()))
    );
    let drawing = canvas.drawing_calls();
    assert_eq!(drawing.len(), 1);
    match drawing[0] {
        CanvasCall::Line { from, to, .. } => {
            assert_eq!(*from, Point::new(0.0, 0.0));
            assert_eq!(*to, Point::new(50.0, 50.0));
        }
        other => panic!("expected a line, got {:?}", other),
    }
}

#[test]
fn test_record_count_and_consumed_bytes() {
    let data = drawing();
    let picture = parse(&data).unwrap();
    assert_eq!(picture.records().len(), 12);
    assert!(matches!(
        picture.records().last().map(|r| &r.kind),
        Some(RecordKind::EndOfFile)
    ));

    let records_len: usize = picture.records().iter().map(|r| r.byte_len()).sum();
    assert_eq!(picture.header().header_len() + records_len, data.len());
    assert_eq!(picture.consumed_len(), data.len());
}

#[test]
fn test_record_size_accounting() {
    let picture = parse(&drawing()).unwrap();
    for record in picture.records() {
        assert_eq!(
            record.payload_len + 6,
            record.size_words as usize * 2,
            "{} at {}",
            record.name(),
            record.offset
        );
    }
}

#[test]
fn test_parse_is_deterministic() {
    let data = drawing();
    assert_eq!(parse(&data).unwrap(), parse(&data).unwrap());
}

#[test]
fn test_replay_is_idempotent() {
    let picture = parse(&drawing()).unwrap();
    let before = picture.clone();

    let mut first = RecordingCanvas::new();
    let mut second = RecordingCanvas::new();
    picture.replay(&mut first).unwrap();
    picture.replay(&mut second).unwrap();

    assert!(!first.calls.is_empty());
    assert_eq!(first.calls, second.calls);
    assert_eq!(picture, before);
}

#[test]
fn test_unknown_opcode_is_skipped() {
    // Unknown function 0x0999 with a 5-word payload between two known records
    let data = WmfBuilder::new()
        .objects(0)
        .record(META_MOVETO, &[2, 1])
        .record(0x0999, &[1, 2, 3, 4, 5])
        .record(META_LINETO, &[4, 3])
        .build();
    let picture = parse(&data).unwrap();
    let records = picture.records();
    assert_eq!(records.len(), 3);

    assert_eq!(records[0].kind, RecordKind::MoveTo(PointS::new(1, 2)));
    assert_eq!(records[1].size_words, 8);
    assert!(matches!(&records[1].kind, RecordKind::Unparsed(bytes) if bytes.len() == 10));
    assert_eq!(records[2].offset, records[1].offset + 16);
    assert_eq!(records[2].kind, RecordKind::LineTo(PointS::new(3, 4)));
}

#[test]
fn test_handle_table_exhausted() {
    let data = WmfBuilder::new()
        .objects(1)
        .create_pen(0, 1, 0)
        .create_pen(0, 1, 0)
        .eof()
        .build();
    // Parsing succeeds; the table only overflows when replayed
    let picture = parse(&data).unwrap();
    let err = picture.replay(&mut RecordingCanvas::new()).unwrap_err();
    assert_eq!(err.record_index, 1);
    assert_eq!(err.kind, ReplayErrorKind::HandleTableExhausted { capacity: 1 });
}

#[test]
fn test_invalid_handle() {
    let data = WmfBuilder::new().objects(8).select(5).eof().build();
    let picture = parse(&data).unwrap();
    let err = picture.replay(&mut RecordingCanvas::new()).unwrap_err();
    assert_eq!(err.record_index, 0);
    assert_eq!(err.kind, ReplayErrorKind::InvalidHandle { handle: 5 });
}

#[test]
fn test_restore_underflow() {
    let data = WmfBuilder::new().save().restore(-2).eof().build();
    let picture = parse(&data).unwrap();
    let err = picture.replay(&mut RecordingCanvas::new()).unwrap_err();
    assert_eq!(
        err.kind,
        ReplayErrorKind::RestoreUnderflow {
            requested: -2,
            depth: 1
        }
    );
}

#[test]
fn test_failed_replay_leaves_picture_usable() {
    let data = WmfBuilder::new()
        .objects(1)
        .line_to(10, 10)
        .select(3)
        .eof()
        .build();
    let picture = parse(&data).unwrap();
    let mut canvas = RecordingCanvas::new();
    assert!(picture.replay(&mut canvas).is_err());
    // The line before the failing record was already drawn
    assert_eq!(canvas.drawing_calls().len(), 1);
    assert_eq!(picture.records().len(), 3);
}

#[test]
fn test_truncated_stream() {
    let mut data = minimal_line();
    // Cut into the LINETO payload
    data.truncate(data.len() - 8);
    assert!(matches!(
        parse(&data),
        Err(DecodeError::TruncatedStream { .. })
    ));
}

#[test]
fn test_record_size_below_minimum() {
    let mut data = WmfBuilder::new().build();
    data.extend_from_slice(&2u32.to_le_bytes());
    data.extend_from_slice(&META_LINETO.to_le_bytes());
    assert_eq!(
        parse(&data),
        Err(DecodeError::InvalidRecordSize {
            offset: 18,
            size_words: 2
        })
    );
}

#[test]
fn test_not_a_metafile() {
    assert!(matches!(
        parse(b"GIF89a not a metafile at all"),
        Err(DecodeError::InvalidHeader { .. })
    ));
}

#[test]
fn test_size_from_placeable_units() {
    // One inch square at 1440 units per inch
    let data = WmfBuilder::new()
        .placeable([0, 0, 1440, 1440], 1440)
        .eof()
        .build();
    let picture = parse(&data).unwrap();
    let (width, height) = picture.logical_size();
    assert!((width - 96.0).abs() < 1e-9 && (height - 96.0).abs() < 1e-9);
    let (width, height) = picture.size_in_points();
    assert!((width - 72.0).abs() < 1e-9 && (height - 72.0).abs() < 1e-9);
}

#[test]
fn test_window_scales_onto_frame() {
    let data = WmfBuilder::new()
        .placeable([0, 0, 1000, 1000], 1000)
        .window((0, 0), (1000, 1000))
        .line_to(500, 1000)
        .eof()
        .build();
    let picture = parse(&data).unwrap();
    let mut canvas = RecordingCanvas::new();
    picture.replay(&mut canvas).unwrap();
    let calls = canvas.drawing_calls();
    match calls.as_slice() {
        [CanvasCall::Line { from, to, .. }] => {
            assert_eq!(*from, Point::new(0.0, 0.0));
            assert_eq!(*to, Point::new(48.0, 96.0));
        }
        other => panic!("unexpected calls {:?}", other),
    }
}

#[test]
fn test_svg_conversion() {
    let svg = convert_wmf_to_svg(&drawing()).unwrap();
    assert!(svg.contains("<svg"));
    assert!(svg.contains("viewBox=\"0 0 200 100\""));
    assert!(svg.contains("stroke=\"#ff0000\""));
    assert!(svg.contains("fill=\"#00ff00\""));
}

fn with_bitmaps() -> Vec<u8> {
    WmfBuilder::new()
        .placeable([0, 0, 100, 100], 96)
        .objects(1)
        .create_dib_pattern_brush(&WmfBuilder::dib24(2, 2, [0, 0, 255]))
        .stretch_dib(
            [10, 20, 40, 30],
            [0, 0, 2, 1],
            SRCCOPY,
            &WmfBuilder::dib24(2, 2, [255, 0, 0]),
        )
        .eof()
        .build()
}

#[test]
fn test_bitmap_records() {
    let picture = parse(&with_bitmaps()).unwrap();
    let bitmaps: Vec<_> = picture.bitmaps().collect();
    assert_eq!(bitmaps.len(), 2);
    assert_eq!(bitmaps[0].0, 0);
    assert_eq!(bitmaps[1].0, 1);
    for (_, bitmap) in &bitmaps {
        assert_eq!((bitmap.width, bitmap.height, bitmap.bit_count), (2, 2, 24));
        assert!(!bitmap.top_down);
        assert_eq!(bitmap.pixels.len(), 16);
    }

    let mut canvas = RecordingCanvas::new();
    picture.replay(&mut canvas).unwrap();
    match canvas.drawing_calls().as_slice() {
        [CanvasCall::Bitmap {
            dest,
            source,
            width,
            height,
            bit_count,
            rop,
        }] => {
            assert_eq!(*dest, Rect::new(10.0, 20.0, 40.0, 30.0));
            // The top stored row of a bottom-up DIB is the last image row
            assert_eq!(*source, Some(Rect::new(0.0, 1.0, 2.0, 1.0)));
            assert_eq!((*width, *height, *bit_count, *rop), (2, 2, 24, SRCCOPY));
        }
        other => panic!("unexpected calls {:?}", other),
    }
}

#[test]
fn test_bitmap_embedded_in_svg() {
    let svg = convert_wmf_to_svg(&with_bitmaps()).unwrap();
    assert!(svg.contains("data:image/png;base64,"));
}

#[test]
fn test_concurrent_replay() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Picture>();

    let picture = parse(&with_bitmaps()).unwrap();
    let expected = {
        let mut canvas = RecordingCanvas::new();
        picture.replay(&mut canvas).unwrap();
        canvas.calls
    };
    std::thread::scope(|scope| {
        let workers: Vec<_> = (0..2)
            .map(|_| {
                scope.spawn(|| {
                    let mut canvas = RecordingCanvas::new();
                    picture.replay(&mut canvas).unwrap();
                    canvas.calls
                })
            })
            .collect();
        for worker in workers {
            assert_eq!(worker.join().unwrap(), expected);
        }
    });
}
