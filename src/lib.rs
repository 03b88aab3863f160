//! WMF (Windows Metafile) parser and replay engine
//!
//! A metafile is parsed once into an immutable [`Picture`]: header plus a
//! list of typed [`Record`]s. Replaying a picture walks the records against
//! a fresh graphics state and emits drawing intents to any [`Canvas`]
//! implementation. [`SvgCanvas`] renders them to SVG; [`RecordingCanvas`]
//! captures them for inspection.
//!
//! ```no_run
//! let data = std::fs::read("drawing.wmf")?;
//! let picture = wmf_converter::parse(&data)?;
//! let mut canvas = wmf_converter::RecordingCanvas::new();
//! picture.replay(&mut canvas)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod bitmap;
pub mod canvas;
pub mod convert;
pub mod cursor;
pub mod decoder;
pub mod error;
pub mod handles;
pub mod header;
pub mod objects;
pub mod picture;
pub mod player;
pub mod raster;
pub mod record_types;
pub mod records;
pub mod state;
pub mod svg_writer;
pub mod text;
pub mod types;

#[cfg(feature = "python")]
mod python;

pub use bitmap::{Bitmap, ColorTable, ColorUsage, Compression};
pub use canvas::{
    ArcKind, BitmapBlit, Canvas, CanvasCall, ClipRegion, DeviceTransform, Fill, FillRule, Paint,
    RecordingCanvas, Stroke, TextFont, TextRun,
};
pub use convert::{convert_wmf_to_svg, convert_wmf_to_svg_with_options, render_svg};
pub use cursor::ByteCursor;
pub use decoder::{RawRecord, RecordDecoder};
pub use error::{
    CanvasError, CanvasResult, DecodeError, DecodeResult, ReplayError, ReplayErrorKind,
    ReplayResult, WmfError, WmfResult,
};
pub use header::{is_wmf_format, Header, PlaceableHeader};
pub use objects::{Brush, Font, GdiObject, Palette, PaletteEntry, Pen, Region};
pub use picture::{parse, Picture};
pub use records::{Record, RecordKind};
pub use svg_writer::{SvgCanvas, SvgOptions};
pub use types::{Color, Point, PointS, Rect, RectS, SizeS};
