//! Drawing surface contract consumed by the player
//!
//! Every coordinate handed to a [`Canvas`] is already mapped into the target
//! space (pixels at the picture's DPI). Canvases never see WMF mapping modes;
//! `set_transform` only reports how the current logical space relates to the
//! target, for canvases that want to keep it (e.g. for hairline widths).

use std::sync::Arc;

use crate::bitmap::Bitmap;
use crate::error::{CanvasError, CanvasResult};
use crate::objects::{HatchStyle, LineCap, LineJoin, Palette, PenStyle};
use crate::records::{HorizontalAlign, VerticalAlign};
use crate::types::{Color, Point, Rect};

/// Logical-to-target mapping currently in effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceTransform {
    /// Target position of logical (0, 0)
    pub origin: Point,
    /// Target units per logical unit, always positive
    pub scale_x: f64,
    pub scale_y: f64,
    pub flip_x: bool,
    pub flip_y: bool,
}

impl DeviceTransform {
    pub fn identity() -> Self {
        Self {
            origin: Point::new(0.0, 0.0),
            scale_x: 1.0,
            scale_y: 1.0,
            flip_x: false,
            flip_y: false,
        }
    }

    /// Build from signed per-axis scales.
    pub fn from_signed(origin: Point, sx: f64, sy: f64) -> Self {
        Self {
            origin,
            scale_x: sx.abs(),
            scale_y: sy.abs(),
            flip_x: sx < 0.0,
            flip_y: sy < 0.0,
        }
    }

    pub fn signed_scale_x(&self) -> f64 {
        if self.flip_x {
            -self.scale_x
        } else {
            self.scale_x
        }
    }

    pub fn signed_scale_y(&self) -> f64 {
        if self.flip_y {
            -self.scale_y
        } else {
            self.scale_y
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> Point {
        Point::new(
            self.origin.x + x * self.signed_scale_x(),
            self.origin.y + y * self.signed_scale_y(),
        )
    }

    /// Map a logical rectangle given by two corners; the result is normalized.
    pub fn apply_rect(&self, left: f64, top: f64, right: f64, bottom: f64) -> Rect {
        Rect::from_points(self.apply(left, top), self.apply(right, bottom))
    }

    /// True when exactly one axis is mirrored, which reverses arc directions.
    pub fn is_mirrored(&self) -> bool {
        self.flip_x != self.flip_y
    }
}

impl Default for DeviceTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Polygon fill rule (SETPOLYFILLMODE).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillRule {
    /// ALTERNATE
    EvenOdd,
    /// WINDING
    NonZero,
}

/// Outline parameters resolved from the selected pen.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub color: Color,
    /// Target units; cosmetic pens are one unit wide
    pub width: f64,
    pub style: PenStyle,
    pub cap: LineCap,
    pub join: LineJoin,
}

/// Interior fill resolved from a brush.
#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    Solid(Color),
    Hatched {
        color: Color,
        hatch: HatchStyle,
        /// Set when the background mode is OPAQUE
        background: Option<Color>,
    },
    Pattern(Arc<Bitmap>),
}

/// Stroke and fill for a shape. Either part may be absent (null pen/brush).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paint {
    pub stroke: Option<Stroke>,
    pub fill: Option<Fill>,
}

impl Paint {
    pub fn is_invisible(&self) -> bool {
        self.stroke.is_none() && self.fill.is_none()
    }
}

/// Shape closed by an arc record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcKind {
    /// ARC: outline only
    Open,
    /// PIE: closed through the center
    Pie,
    /// CHORD: closed by a straight segment
    Chord,
}

/// Clip area as a union of target-space rectangles.
///
/// An empty rectangle list clips everything away.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClipRegion {
    pub rects: Vec<Rect>,
}

impl ClipRegion {
    pub fn from_rect(rect: Rect) -> Self {
        Self { rects: vec![rect] }
    }

    pub fn intersect(&self, rect: &Rect) -> Self {
        Self {
            rects: self.rects.iter().filter_map(|r| r.intersect(rect)).collect(),
        }
    }

    pub fn exclude(&self, rect: &Rect) -> Self {
        Self {
            rects: self.rects.iter().flat_map(|r| r.subtract(rect)).collect(),
        }
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            rects: self.rects.iter().map(|r| r.translate(dx, dy)).collect(),
        }
    }

    pub fn bounds(&self) -> Option<Rect> {
        let mut iter = self.rects.iter();
        let first = *iter.next()?;
        Some(iter.fold(first, |acc, r| {
            let x = acc.x.min(r.x);
            let y = acc.y.min(r.y);
            let right = acc.right().max(r.right());
            let bottom = acc.bottom().max(r.bottom());
            Rect::new(x, y, right - x, bottom - y)
        }))
    }
}

/// Font resolved for a text run; sizes are in target units.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFont {
    pub face_name: String,
    pub size: f64,
    pub weight: i16,
    pub italic: bool,
    pub underline: bool,
    pub strike_out: bool,
    /// Baseline angle in degrees, counterclockwise on screen
    pub angle: f64,
}

/// One text output record, fully resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// Reference point; what it anchors depends on the alignment fields
    pub position: Point,
    pub text: String,
    pub font: TextFont,
    pub color: Color,
    /// Background fill behind the glyphs (OPAQUE background mode)
    pub background: Option<Color>,
    pub horizontal: HorizontalAlign,
    pub vertical: VerticalAlign,
    /// Per-character advances in target units, empty when not given
    pub dx: Vec<f64>,
    /// Rectangle from EXTTEXTOUT, with whether to fill and/or clip to it
    pub rect: Option<Rect>,
    pub opaque: bool,
    pub clipped: bool,
}

/// A bitmap transfer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BitmapBlit<'a> {
    pub dest: Rect,
    /// Source rectangle in bitmap pixels, rows counted from the top
    pub source: Option<Rect>,
    pub bitmap: &'a Bitmap,
    pub rop: u32,
    /// Selected logical palette, for DIB_PAL_COLORS bitmaps
    pub palette: Option<&'a Palette>,
}

/// Abstract 2D surface the player draws onto.
///
/// Any method may return a [`CanvasError`] to abort the replay; the player
/// propagates it immediately.
pub trait Canvas {
    fn set_transform(&mut self, _transform: &DeviceTransform) -> CanvasResult {
        Ok(())
    }

    fn save_state(&mut self) -> CanvasResult;

    fn restore_state(&mut self) -> CanvasResult;

    /// `None` removes clipping.
    fn set_clip(&mut self, clip: Option<&ClipRegion>) -> CanvasResult;

    fn draw_line(&mut self, from: Point, to: Point, stroke: &Stroke) -> CanvasResult;

    fn draw_polygon(
        &mut self,
        points: &[Point],
        closed: bool,
        fill_rule: FillRule,
        paint: &Paint,
    ) -> CanvasResult;

    fn draw_poly_polygon(
        &mut self,
        polygons: &[Vec<Point>],
        fill_rule: FillRule,
        paint: &Paint,
    ) -> CanvasResult;

    fn draw_ellipse(&mut self, bounds: Rect, paint: &Paint) -> CanvasResult;

    /// Angles in degrees, counterclockwise on screen from the positive x axis.
    /// A positive sweep runs counterclockwise.
    fn draw_arc(
        &mut self,
        bounds: Rect,
        start_angle: f64,
        sweep_angle: f64,
        kind: ArcKind,
        paint: &Paint,
    ) -> CanvasResult;

    fn draw_round_rect(
        &mut self,
        bounds: Rect,
        radius_x: f64,
        radius_y: f64,
        paint: &Paint,
    ) -> CanvasResult;

    fn draw_text(&mut self, run: &TextRun) -> CanvasResult;

    fn draw_bitmap(&mut self, blit: &BitmapBlit<'_>) -> CanvasResult;

    fn fill_region(&mut self, rects: &[Rect], paint: &Paint) -> CanvasResult {
        for rect in rects {
            self.draw_polygon(&rect.corners(), true, FillRule::NonZero, paint)?;
        }
        Ok(())
    }

    fn set_pixel(&mut self, at: Point, color: Color) -> CanvasResult {
        let paint = Paint {
            stroke: None,
            fill: Some(Fill::Solid(color)),
        };
        self.draw_polygon(
            &Rect::new(at.x, at.y, 1.0, 1.0).corners(),
            true,
            FillRule::NonZero,
            &paint,
        )
    }
}

/// A canvas call captured by [`RecordingCanvas`].
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasCall {
    SetTransform(DeviceTransform),
    SaveState,
    RestoreState,
    SetClip(Option<ClipRegion>),
    Line {
        from: Point,
        to: Point,
        stroke: Stroke,
    },
    Polygon {
        points: Vec<Point>,
        closed: bool,
        fill_rule: FillRule,
        paint: Paint,
    },
    PolyPolygon {
        polygons: Vec<Vec<Point>>,
        fill_rule: FillRule,
        paint: Paint,
    },
    Ellipse {
        bounds: Rect,
        paint: Paint,
    },
    Arc {
        bounds: Rect,
        start_angle: f64,
        sweep_angle: f64,
        kind: ArcKind,
        paint: Paint,
    },
    RoundRect {
        bounds: Rect,
        radius_x: f64,
        radius_y: f64,
        paint: Paint,
    },
    FillRegion {
        rects: Vec<Rect>,
        paint: Paint,
    },
    Pixel {
        at: Point,
        color: Color,
    },
    Text(TextRun),
    Bitmap {
        dest: Rect,
        source: Option<Rect>,
        width: u32,
        height: u32,
        bit_count: u16,
        rop: u32,
    },
}

impl CanvasCall {
    /// True for calls that put marks on the surface.
    pub fn is_drawing(&self) -> bool {
        !matches!(
            self,
            CanvasCall::SetTransform(_)
                | CanvasCall::SaveState
                | CanvasCall::RestoreState
                | CanvasCall::SetClip(_)
        )
    }
}

/// Canvas that stores every call, for tests and diagnostics.
#[derive(Debug, Clone, Default)]
pub struct RecordingCanvas {
    pub calls: Vec<CanvasCall>,
    fail_at: Option<usize>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// A canvas that aborts on its `n`-th call (0-based).
    pub fn failing_at(n: usize) -> Self {
        Self {
            calls: Vec::new(),
            fail_at: Some(n),
        }
    }

    /// Only the calls that draw something.
    pub fn drawing_calls(&self) -> Vec<&CanvasCall> {
        self.calls.iter().filter(|c| c.is_drawing()).collect()
    }

    fn push(&mut self, call: CanvasCall) -> CanvasResult {
        if self.fail_at == Some(self.calls.len()) {
            return Err(CanvasError::new(format!(
                "recording canvas stopped at call {}",
                self.calls.len()
            )));
        }
        self.calls.push(call);
        Ok(())
    }
}

impl Canvas for RecordingCanvas {
    fn set_transform(&mut self, transform: &DeviceTransform) -> CanvasResult {
        self.push(CanvasCall::SetTransform(*transform))
    }

    fn save_state(&mut self) -> CanvasResult {
        self.push(CanvasCall::SaveState)
    }

    fn restore_state(&mut self) -> CanvasResult {
        self.push(CanvasCall::RestoreState)
    }

    fn set_clip(&mut self, clip: Option<&ClipRegion>) -> CanvasResult {
        self.push(CanvasCall::SetClip(clip.cloned()))
    }

    fn draw_line(&mut self, from: Point, to: Point, stroke: &Stroke) -> CanvasResult {
        self.push(CanvasCall::Line {
            from,
            to,
            stroke: stroke.clone(),
        })
    }

    fn draw_polygon(
        &mut self,
        points: &[Point],
        closed: bool,
        fill_rule: FillRule,
        paint: &Paint,
    ) -> CanvasResult {
        self.push(CanvasCall::Polygon {
            points: points.to_vec(),
            closed,
            fill_rule,
            paint: paint.clone(),
        })
    }

    fn draw_poly_polygon(
        &mut self,
        polygons: &[Vec<Point>],
        fill_rule: FillRule,
        paint: &Paint,
    ) -> CanvasResult {
        self.push(CanvasCall::PolyPolygon {
            polygons: polygons.to_vec(),
            fill_rule,
            paint: paint.clone(),
        })
    }

    fn draw_ellipse(&mut self, bounds: Rect, paint: &Paint) -> CanvasResult {
        self.push(CanvasCall::Ellipse {
            bounds,
            paint: paint.clone(),
        })
    }

    fn draw_arc(
        &mut self,
        bounds: Rect,
        start_angle: f64,
        sweep_angle: f64,
        kind: ArcKind,
        paint: &Paint,
    ) -> CanvasResult {
        self.push(CanvasCall::Arc {
            bounds,
            start_angle,
            sweep_angle,
            kind,
            paint: paint.clone(),
        })
    }

    fn draw_round_rect(
        &mut self,
        bounds: Rect,
        radius_x: f64,
        radius_y: f64,
        paint: &Paint,
    ) -> CanvasResult {
        self.push(CanvasCall::RoundRect {
            bounds,
            radius_x,
            radius_y,
            paint: paint.clone(),
        })
    }

    fn draw_text(&mut self, run: &TextRun) -> CanvasResult {
        self.push(CanvasCall::Text(run.clone()))
    }

    fn draw_bitmap(&mut self, blit: &BitmapBlit<'_>) -> CanvasResult {
        self.push(CanvasCall::Bitmap {
            dest: blit.dest,
            source: blit.source,
            width: blit.bitmap.width,
            height: blit.bitmap.height,
            bit_count: blit.bitmap.bit_count,
            rop: blit.rop,
        })
    }

    fn fill_region(&mut self, rects: &[Rect], paint: &Paint) -> CanvasResult {
        self.push(CanvasCall::FillRegion {
            rects: rects.to_vec(),
            paint: paint.clone(),
        })
    }

    fn set_pixel(&mut self, at: Point, color: Color) -> CanvasResult {
        self.push(CanvasCall::Pixel { at, color })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_flip() {
        let t = DeviceTransform::from_signed(Point::new(0.0, 100.0), 2.0, -2.0);
        assert!(t.flip_y);
        assert!(t.is_mirrored());
        assert_eq!(t.apply(10.0, 10.0), Point::new(20.0, 80.0));
        let r = t.apply_rect(0.0, 10.0, 10.0, 0.0);
        assert_eq!(r, Rect::new(0.0, 80.0, 20.0, 20.0));
    }

    #[test]
    fn test_clip_exclude_then_intersect() {
        let clip = ClipRegion::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        let clip = clip.exclude(&Rect::new(0.0, 0.0, 10.0, 5.0));
        assert_eq!(clip.rects, vec![Rect::new(0.0, 5.0, 10.0, 5.0)]);
        let clip = clip.intersect(&Rect::new(20.0, 20.0, 5.0, 5.0));
        assert!(clip.rects.is_empty());
        assert_eq!(clip.bounds(), None);
    }

    #[test]
    fn test_recording_canvas_abort() {
        let mut canvas = RecordingCanvas::failing_at(1);
        assert!(canvas.save_state().is_ok());
        assert!(canvas.restore_state().is_err());
        assert_eq!(canvas.calls, vec![CanvasCall::SaveState]);
    }

    #[test]
    fn test_default_set_pixel_draws_unit_square() {
        struct Forwarding(RecordingCanvas);
        impl Canvas for Forwarding {
            fn save_state(&mut self) -> CanvasResult {
                self.0.save_state()
            }
            fn restore_state(&mut self) -> CanvasResult {
                self.0.restore_state()
            }
            fn set_clip(&mut self, clip: Option<&ClipRegion>) -> CanvasResult {
                self.0.set_clip(clip)
            }
            fn draw_line(&mut self, from: Point, to: Point, stroke: &Stroke) -> CanvasResult {
                self.0.draw_line(from, to, stroke)
            }
            fn draw_polygon(
                &mut self,
                points: &[Point],
                closed: bool,
                fill_rule: FillRule,
                paint: &Paint,
            ) -> CanvasResult {
                self.0.draw_polygon(points, closed, fill_rule, paint)
            }
            fn draw_poly_polygon(
                &mut self,
                polygons: &[Vec<Point>],
                fill_rule: FillRule,
                paint: &Paint,
            ) -> CanvasResult {
                self.0.draw_poly_polygon(polygons, fill_rule, paint)
            }
            fn draw_ellipse(&mut self, bounds: Rect, paint: &Paint) -> CanvasResult {
                self.0.draw_ellipse(bounds, paint)
            }
            fn draw_arc(
                &mut self,
                bounds: Rect,
                start_angle: f64,
                sweep_angle: f64,
                kind: ArcKind,
                paint: &Paint,
            ) -> CanvasResult {
                self.0.draw_arc(bounds, start_angle, sweep_angle, kind, paint)
            }
            fn draw_round_rect(
                &mut self,
                bounds: Rect,
                radius_x: f64,
                radius_y: f64,
                paint: &Paint,
            ) -> CanvasResult {
                self.0.draw_round_rect(bounds, radius_x, radius_y, paint)
            }
            fn draw_text(&mut self, run: &TextRun) -> CanvasResult {
                self.0.draw_text(run)
            }
            fn draw_bitmap(&mut self, blit: &BitmapBlit<'_>) -> CanvasResult {
                self.0.draw_bitmap(blit)
            }
        }

        let mut canvas = Forwarding(RecordingCanvas::new());
        canvas.set_pixel(Point::new(3.0, 4.0), Color::white()).unwrap();
        match &canvas.0.calls[..] {
            [CanvasCall::Polygon { points, closed, .. }] => {
                assert!(*closed);
                assert_eq!(points[2], Point::new(4.0, 5.0));
            }
            other => panic!("unexpected calls {:?}", other),
        }
    }
}
