//! Replay engine
//!
//! Walks the typed records in order, keeps the handle table and the saved
//! state stack, and turns every drawing record into one canvas call with
//! target-space coordinates. All of this state lives for one replay only.

use std::rc::Rc;

use log::{debug, warn};

use crate::bitmap::Bitmap;
use crate::canvas::{
    ArcKind, BitmapBlit, Canvas, ClipRegion, Fill, FillRule, Paint, Stroke, TextFont, TextRun,
};
use crate::error::{ReplayError, ReplayErrorKind, ReplayResult};
use crate::handles::HandleTable;
use crate::objects::{Brush, GdiObject, LineCap, LineJoin, PenStyle, Region};
use crate::records::{
    BlitRect, MapMode, PolyFillMode, Record, RecordKind, ETO_CLIPPED, ETO_OPAQUE,
};
use crate::state::{DrawingState, ViewTransform};
use crate::text::decode_ansi;
use crate::types::{Color, Point, PointS, Rect, RectS};

const PATCOPY: u32 = 0x00F00021;
const BLACKNESS: u32 = 0x00000042;
const WHITENESS: u32 = 0x00FF0062;

/// Height used when a font leaves it to the mapper (0)
const DEFAULT_FONT_HEIGHT: f64 = 12.0;

type Step = Result<(), ReplayErrorKind>;

/// One replay pass over a record list.
pub struct Player<'c, C: Canvas + ?Sized> {
    canvas: &'c mut C,
    handles: HandleTable,
    state: DrawingState,
    stack: Vec<DrawingState>,
    /// Target area of the picture, the starting point for clip exclusion
    frame: Rect,
}

impl<'c, C: Canvas + ?Sized> Player<'c, C> {
    pub fn new(canvas: &'c mut C, handle_capacity: usize, view: ViewTransform) -> Self {
        let frame = Rect::new(0.0, 0.0, view.frame_width, view.frame_height);
        Self {
            canvas,
            handles: HandleTable::new(handle_capacity),
            state: DrawingState::new(view),
            stack: Vec::new(),
            frame,
        }
    }

    /// Replay `records` until META_EOF or the end of the list.
    pub fn play(mut self, records: &[Record]) -> ReplayResult<()> {
        debug!(
            "Replay start: {} records, {} handle slots",
            records.len(),
            self.handles.capacity()
        );
        let initial = self.state.transform();
        self.canvas
            .set_transform(&initial)
            .map_err(|e| ReplayError::new(0, e.into()))?;

        for (index, record) in records.iter().enumerate() {
            if matches!(record.kind, RecordKind::EndOfFile) {
                break;
            }
            self.play_record(record)
                .map_err(|kind| ReplayError::new(index, kind))?;
        }
        debug!("Replay finished with {} unrestored saves", self.stack.len());
        Ok(())
    }

    fn play_record(&mut self, record: &Record) -> Step {
        match &record.kind {
            RecordKind::EndOfFile => {}

            RecordKind::SetBkColor(color) => self.state.bk_color = *color,
            RecordKind::SetBkMode(mode) => self.state.bk_mode = *mode,
            RecordKind::SetMapMode(value) => match MapMode::from_u16(*value) {
                Some(mode) => {
                    self.state.view.set_map_mode(mode);
                    self.update_transform()?;
                }
                None => warn!("Ignoring unknown mapping mode {}", value),
            },
            RecordKind::SetRop2(rop) => self.state.rop2 = *rop,
            RecordKind::SetRelAbs(mode) => self.state.rel_abs = *mode,
            RecordKind::SetPolyFillMode(mode) => self.state.poly_fill_mode = *mode,
            RecordKind::SetStretchBltMode(mode) => self.state.stretch_blt_mode = *mode,
            RecordKind::SetTextCharExtra(extra) => self.state.text_char_extra = *extra,
            RecordKind::SetTextColor(color) => self.state.text_color = *color,
            RecordKind::SetTextJustification {
                break_count,
                break_extra,
            } => {
                self.state.break_count = *break_count;
                self.state.break_extra = *break_extra;
            }
            RecordKind::SetTextAlign(align) => self.state.text_align = *align,
            RecordKind::SetMapperFlags(flags) => self.state.mapper_flags = *flags,
            RecordKind::SetLayout(layout) => self.state.layout = *layout,
            RecordKind::SaveDc => {
                self.stack.push(self.state.clone());
                self.canvas.save_state()?;
            }
            RecordKind::RestoreDc(n) => self.restore(*n)?,
            RecordKind::MoveTo(p) => self.state.position = *p,

            RecordKind::SetWindowOrg(p) => {
                self.state.view.set_window_org(p.x as i32, p.y as i32);
                self.update_transform()?;
            }
            RecordKind::SetWindowExt(s) => {
                self.state.view.set_window_ext(s.cx as i32, s.cy as i32);
                self.update_transform()?;
            }
            RecordKind::SetViewportOrg(p) => {
                self.state.view.set_viewport_org(p.x as i32, p.y as i32);
                self.update_transform()?;
            }
            RecordKind::SetViewportExt(s) => {
                self.state.view.set_viewport_ext(s.cx as i32, s.cy as i32);
                self.update_transform()?;
            }
            RecordKind::OffsetWindowOrg { dx, dy } => {
                self.state.view.offset_window_org(*dx as i32, *dy as i32);
                self.update_transform()?;
            }
            RecordKind::OffsetViewportOrg { dx, dy } => {
                self.state.view.offset_viewport_org(*dx as i32, *dy as i32);
                self.update_transform()?;
            }
            RecordKind::ScaleWindowExt {
                x_num,
                x_denom,
                y_num,
                y_denom,
            } => {
                self.state
                    .view
                    .scale_window_ext(*x_num, *x_denom, *y_num, *y_denom);
                self.update_transform()?;
            }
            RecordKind::ScaleViewportExt {
                x_num,
                x_denom,
                y_num,
                y_denom,
            } => {
                self.state
                    .view
                    .scale_viewport_ext(*x_num, *x_denom, *y_num, *y_denom);
                self.update_transform()?;
            }

            RecordKind::LineTo(p) => {
                if let Some(stroke) = self.stroke() {
                    let from = self.map(self.state.position);
                    let to = self.map(*p);
                    self.canvas.draw_line(from, to, &stroke)?;
                }
                self.state.position = *p;
            }
            RecordKind::Polyline(points) => {
                if points.len() >= 2 {
                    if let Some(stroke) = self.stroke() {
                        let paint = Paint {
                            stroke: Some(stroke),
                            fill: None,
                        };
                        let mapped = self.map_points(points);
                        let rule = self.fill_rule();
                        self.canvas.draw_polygon(&mapped, false, rule, &paint)?;
                    }
                }
            }
            RecordKind::Polygon(points) => {
                let paint = self.paint();
                if points.len() >= 2 && !paint.is_invisible() {
                    let mapped = self.map_points(points);
                    let rule = self.fill_rule();
                    self.canvas.draw_polygon(&mapped, true, rule, &paint)?;
                }
            }
            RecordKind::PolyPolygon(polygons) => {
                let paint = self.paint();
                if !polygons.is_empty() && !paint.is_invisible() {
                    let mapped: Vec<Vec<Point>> =
                        polygons.iter().map(|p| self.map_points(p)).collect();
                    let rule = self.fill_rule();
                    self.canvas.draw_poly_polygon(&mapped, rule, &paint)?;
                }
            }
            RecordKind::Rectangle(rect) => {
                let paint = self.paint();
                if !paint.is_invisible() {
                    let corners = self.map_rect(rect).corners();
                    let rule = self.fill_rule();
                    self.canvas.draw_polygon(&corners, true, rule, &paint)?;
                }
            }
            RecordKind::RoundRect { rect, corner } => {
                let paint = self.paint();
                if !paint.is_invisible() {
                    let t = self.state.transform();
                    let rx = (corner.cx as f64).abs() * t.scale_x / 2.0;
                    let ry = (corner.cy as f64).abs() * t.scale_y / 2.0;
                    let bounds = self.map_rect(rect);
                    self.canvas.draw_round_rect(bounds, rx, ry, &paint)?;
                }
            }
            RecordKind::Ellipse(rect) => {
                let paint = self.paint();
                if !paint.is_invisible() {
                    let bounds = self.map_rect(rect);
                    self.canvas.draw_ellipse(bounds, &paint)?;
                }
            }
            RecordKind::Arc { rect, start, end } => {
                self.draw_arc(rect, *start, *end, ArcKind::Open)?
            }
            RecordKind::Pie { rect, start, end } => {
                self.draw_arc(rect, *start, *end, ArcKind::Pie)?
            }
            RecordKind::Chord { rect, start, end } => {
                self.draw_arc(rect, *start, *end, ArcKind::Chord)?
            }
            RecordKind::SetPixel { at, color } => {
                let at = self.map(*at);
                self.canvas.set_pixel(at, *color)?;
            }
            RecordKind::FloodFill { at, .. } | RecordKind::ExtFloodFill { at, .. } => {
                debug!("Flood fill at ({}, {}) needs surface pixels, skipped", at.x, at.y);
            }
            RecordKind::PatBlt { dest, rop } => self.pattern_blit(dest, *rop)?,

            RecordKind::TextOut { at, text } => self.draw_text(*at, text, 0, None, &[])?,
            RecordKind::ExtTextOut {
                at,
                options,
                rect,
                text,
                dx,
            } => self.draw_text(*at, text, *options, rect.as_ref(), dx)?,

            RecordKind::Blit(blit) => match &blit.bitmap {
                Some(bitmap) => self.draw_bitmap(&blit.dest, blit.source, bitmap, blit.rop)?,
                None => self.pattern_blit(&blit.dest, blit.rop)?,
            },

            RecordKind::CreatePen(pen) => {
                self.handles.insert(GdiObject::Pen(Rc::new(pen.clone())))?;
            }
            RecordKind::CreateBrush(brush) => {
                self.handles
                    .insert(GdiObject::Brush(Rc::new(brush.clone())))?;
            }
            RecordKind::CreateFont(font) => {
                self.handles.insert(GdiObject::Font(Rc::new(font.clone())))?;
            }
            RecordKind::CreatePalette(palette) => {
                self.handles
                    .insert(GdiObject::Palette(Rc::new(palette.clone())))?;
            }
            RecordKind::CreateRegion(region) => {
                self.handles
                    .insert(GdiObject::Region(Rc::new(region.clone())))?;
            }
            RecordKind::SelectObject(handle) => self.select(*handle)?,
            RecordKind::SelectPalette(handle) => match self.handles.get(*handle)? {
                GdiObject::Palette(palette) => self.state.palette = Some(palette.clone()),
                _ => return Err(ReplayErrorKind::InvalidHandle { handle: *handle }),
            },
            RecordKind::DeleteObject(handle) => {
                // The drawing state keeps its own reference to a selected object
                self.handles.delete(*handle)?;
            }
            RecordKind::RealizePalette => {}
            RecordKind::SetPalEntries { start, entries }
            | RecordKind::AnimatePalette { start, entries } => match &mut self.state.palette {
                Some(palette) => Rc::make_mut(palette).set_entries(*start, entries),
                None => debug!("Palette update without a selected palette"),
            },
            RecordKind::ResizePalette(count) => match &mut self.state.palette {
                Some(palette) => Rc::make_mut(palette).resize(*count),
                None => debug!("Palette resize without a selected palette"),
            },

            RecordKind::SelectClipRegion(handle) => {
                let region = self.region(*handle)?;
                self.clip_to_region(&region)?;
            }
            RecordKind::IntersectClipRect(rect) => {
                let rect = self.map_rect(rect);
                let clip = match &self.state.clip {
                    Some(clip) => clip.intersect(&rect),
                    None => ClipRegion::from_rect(rect),
                };
                self.set_clip(Some(clip))?;
            }
            RecordKind::ExcludeClipRect(rect) => {
                let rect = self.map_rect(rect);
                let clip = match &self.state.clip {
                    Some(clip) => clip.exclude(&rect),
                    None => ClipRegion::from_rect(self.unclipped_area()).exclude(&rect),
                };
                self.set_clip(Some(clip))?;
            }
            RecordKind::OffsetClipRgn { dx, dy } => {
                if let Some(clip) = &self.state.clip {
                    let t = self.state.transform();
                    let moved = clip.translate(
                        *dx as f64 * t.signed_scale_x(),
                        *dy as f64 * t.signed_scale_y(),
                    );
                    self.set_clip(Some(moved))?;
                }
            }
            RecordKind::FillRegion { region, brush } => {
                let region = self.region(*region)?;
                let brush = self.brush(*brush)?;
                let paint = Paint {
                    stroke: None,
                    fill: self.fill(&brush),
                };
                if !paint.is_invisible() {
                    let rects = self.region_rects(&region);
                    self.canvas.fill_region(&rects, &paint)?;
                }
            }
            RecordKind::FrameRegion {
                region,
                brush,
                width,
                height,
            } => {
                let region = self.region(*region)?;
                let brush = self.brush(*brush)?;
                let color = match &*brush {
                    Brush::Solid(color) | Brush::Hatched { color, .. } => Some(*color),
                    Brush::Null => None,
                    Brush::Pattern(_) => Some(Color::black()),
                };
                if let Some(color) = color {
                    let t = self.state.transform();
                    let w = (*width as f64).abs() * t.scale_x;
                    let h = (*height as f64).abs() * t.scale_y;
                    let paint = Paint {
                        stroke: Some(Stroke {
                            color,
                            width: w.max(h).max(1.0),
                            style: PenStyle::Solid,
                            cap: LineCap::Flat,
                            join: LineJoin::Miter,
                        }),
                        fill: None,
                    };
                    let rects = self.region_rects(&region);
                    self.canvas.fill_region(&rects, &paint)?;
                }
            }
            RecordKind::PaintRegion(region) => {
                let region = self.region(*region)?;
                let paint = Paint {
                    stroke: None,
                    fill: self.fill(&self.state.brush),
                };
                if !paint.is_invisible() {
                    let rects = self.region_rects(&region);
                    self.canvas.fill_region(&rects, &paint)?;
                }
            }
            RecordKind::InvertRegion(region) => {
                self.region(*region)?;
                debug!("InvertRegion needs surface pixels, skipped");
            }

            RecordKind::Escape { function, data } => {
                debug!("Escape {:#06x} ({} bytes)", function, data.len());
            }
            RecordKind::Unparsed(_) => {}
        }
        Ok(())
    }

    fn update_transform(&mut self) -> Step {
        let transform = self.state.transform();
        self.canvas.set_transform(&transform)?;
        Ok(())
    }

    /// RESTOREDC: negative `n` counts back from the most recent save,
    /// positive `n` names the n-th live save counting from the bottom.
    fn restore(&mut self, n: i16) -> Step {
        let depth = self.stack.len();
        let underflow = ReplayErrorKind::RestoreUnderflow {
            requested: n,
            depth,
        };
        let target = if n < 0 {
            let back = n.unsigned_abs() as usize;
            if back > depth {
                return Err(underflow);
            }
            depth - back
        } else if n > 0 {
            let index = n as usize - 1;
            if index >= depth {
                return Err(underflow);
            }
            index
        } else {
            return Err(underflow);
        };

        for _ in target..depth {
            self.canvas.restore_state()?;
        }
        let before = self.state.transform();
        self.state = self.stack[target].clone();
        self.stack.truncate(target);
        if self.state.transform() != before {
            self.update_transform()?;
        }
        Ok(())
    }

    fn select(&mut self, handle: u16) -> Step {
        match self.handles.get(handle)? {
            GdiObject::Pen(pen) => self.state.pen = pen.clone(),
            GdiObject::Brush(brush) => self.state.brush = brush.clone(),
            GdiObject::Font(font) => self.state.font = font.clone(),
            GdiObject::Palette(palette) => self.state.palette = Some(palette.clone()),
            GdiObject::Region(region) => {
                let region = region.clone();
                self.clip_to_region(&region)?;
            }
        }
        Ok(())
    }

    fn region(&self, handle: u16) -> Result<Rc<Region>, ReplayErrorKind> {
        match self.handles.get(handle)? {
            GdiObject::Region(region) => Ok(region.clone()),
            _ => Err(ReplayErrorKind::InvalidHandle { handle }),
        }
    }

    fn brush(&self, handle: u16) -> Result<Rc<Brush>, ReplayErrorKind> {
        match self.handles.get(handle)? {
            GdiObject::Brush(brush) => Ok(brush.clone()),
            _ => Err(ReplayErrorKind::InvalidHandle { handle }),
        }
    }

    fn region_rects(&self, region: &Region) -> Vec<Rect> {
        region.rects().iter().map(|r| self.map_rect(r)).collect()
    }

    fn clip_to_region(&mut self, region: &Region) -> Step {
        let clip = ClipRegion {
            rects: self.region_rects(region),
        };
        self.set_clip(Some(clip))
    }

    fn set_clip(&mut self, clip: Option<ClipRegion>) -> Step {
        self.state.clip = clip;
        self.canvas.set_clip(self.state.clip.as_ref())?;
        Ok(())
    }

    fn unclipped_area(&self) -> Rect {
        if self.frame.is_empty() {
            Rect::new(-1.0e7, -1.0e7, 2.0e7, 2.0e7)
        } else {
            self.frame
        }
    }

    fn map(&self, p: PointS) -> Point {
        self.state.transform().apply(p.x as f64, p.y as f64)
    }

    fn map_points(&self, points: &[PointS]) -> Vec<Point> {
        let t = self.state.transform();
        points
            .iter()
            .map(|p| t.apply(p.x as f64, p.y as f64))
            .collect()
    }

    fn map_rect(&self, r: &RectS) -> Rect {
        self.state.transform().apply_rect(
            r.left as f64,
            r.top as f64,
            r.right as f64,
            r.bottom as f64,
        )
    }

    fn fill_rule(&self) -> FillRule {
        match self.state.poly_fill_mode {
            PolyFillMode::Alternate => FillRule::EvenOdd,
            PolyFillMode::Winding => FillRule::NonZero,
        }
    }

    fn stroke(&self) -> Option<Stroke> {
        let pen = &self.state.pen;
        if pen.is_null() {
            return None;
        }
        let width = if pen.width <= 0 {
            1.0
        } else {
            pen.width as f64 * self.state.transform().scale_x
        };
        Some(Stroke {
            color: pen.color,
            width,
            style: pen.style,
            cap: pen.cap,
            join: pen.join,
        })
    }

    fn fill(&self, brush: &Brush) -> Option<Fill> {
        match brush {
            Brush::Solid(color) => Some(Fill::Solid(*color)),
            Brush::Null => None,
            Brush::Hatched { color, hatch } => Some(Fill::Hatched {
                color: *color,
                hatch: *hatch,
                background: self.state.opaque_background(),
            }),
            Brush::Pattern(bitmap) => Some(Fill::Pattern(bitmap.clone())),
        }
    }

    fn paint(&self) -> Paint {
        Paint {
            stroke: self.stroke(),
            fill: self.fill(&self.state.brush),
        }
    }

    fn draw_arc(&mut self, rect: &RectS, start: PointS, end: PointS, kind: ArcKind) -> Step {
        let paint = match kind {
            ArcKind::Open => Paint {
                stroke: self.stroke(),
                fill: None,
            },
            ArcKind::Pie | ArcKind::Chord => self.paint(),
        };
        if paint.is_invisible() {
            return Ok(());
        }
        let bounds = self.map_rect(rect);
        let center = bounds.center();
        let angle = |p: Point| (-(p.y - center.y)).atan2(p.x - center.x).to_degrees();
        let start_angle = angle(self.map(start));
        let end_angle = angle(self.map(end));

        // Counterclockwise in logical space; a mirrored mapping reverses it on screen
        let mut sweep = end_angle - start_angle;
        if sweep <= 0.0 {
            sweep += 360.0;
        }
        if self.state.transform().is_mirrored() {
            sweep -= 360.0;
        }
        self.canvas
            .draw_arc(bounds, start_angle, sweep, kind, &paint)?;
        Ok(())
    }

    fn draw_text(
        &mut self,
        at: PointS,
        bytes: &[u8],
        options: u16,
        rect: Option<&RectS>,
        dx: &[i16],
    ) -> Step {
        let align = self.state.text_align;
        let origin = if align.update_cp() {
            self.state.position
        } else {
            at
        };
        let t = self.state.transform();
        let font = &self.state.font;
        let height = if font.height == 0 {
            DEFAULT_FONT_HEIGHT
        } else {
            (font.height as f64).abs()
        };
        let escapement = font.escapement as f64 / 10.0;
        let opaque = options & ETO_OPAQUE != 0;
        let run = TextRun {
            position: self.map(origin),
            text: decode_ansi(bytes, font.charset),
            font: TextFont {
                face_name: font.face_name.clone(),
                size: height * t.scale_y,
                weight: font.weight,
                italic: font.italic,
                underline: font.underline,
                strike_out: font.strike_out,
                angle: if t.is_mirrored() {
                    -escapement
                } else {
                    escapement
                },
            },
            color: self.state.text_color,
            // ETO_OPAQUE paints the rectangle whatever the background mode
            background: if opaque {
                Some(self.state.bk_color)
            } else {
                self.state.opaque_background()
            },
            horizontal: align.horizontal(),
            vertical: align.vertical(),
            dx: dx.iter().map(|&d| d as f64 * t.scale_x).collect(),
            rect: rect.map(|r| self.map_rect(r)),
            opaque,
            clipped: options & ETO_CLIPPED != 0,
        };
        self.canvas.draw_text(&run)?;

        if align.update_cp() && !dx.is_empty() {
            let advance: i32 = dx.iter().map(|&d| d as i32).sum();
            let x = (origin.x as i32 + advance).clamp(i16::MIN as i32, i16::MAX as i32);
            self.state.position = PointS::new(x as i16, origin.y);
        }
        Ok(())
    }

    fn blit_dest(&self, dest: &BlitRect) -> Rect {
        let t = self.state.transform();
        let x = dest.x as f64;
        let y = dest.y as f64;
        t.apply_rect(x, y, x + dest.width as f64, y + dest.height as f64)
    }

    fn draw_bitmap(
        &mut self,
        dest: &BlitRect,
        source: Option<BlitRect>,
        bitmap: &Bitmap,
        rop: u32,
    ) -> Step {
        let dest = self.blit_dest(dest);
        // Bottom-up DIB source rectangles are measured from the last row
        let source = source.map(|s| {
            let height = (s.height as f64).abs();
            let y = if bitmap.top_down {
                s.y as f64
            } else {
                bitmap.height as f64 - s.y as f64 - height
            };
            Rect::new(s.x as f64, y, (s.width as f64).abs(), height)
        });
        let blit = BitmapBlit {
            dest,
            source,
            bitmap,
            rop,
            palette: self.state.palette.as_deref(),
        };
        self.canvas.draw_bitmap(&blit)?;
        Ok(())
    }

    fn pattern_blit(&mut self, dest: &BlitRect, rop: u32) -> Step {
        let fill = match rop {
            PATCOPY => self.fill(&self.state.brush),
            BLACKNESS => Some(Fill::Solid(Color::black())),
            WHITENESS => Some(Fill::Solid(Color::white())),
            other => {
                debug!("Raster operation {:#010x} without a source is not drawn", other);
                None
            }
        };
        if let Some(fill) = fill {
            let paint = Paint {
                stroke: None,
                fill: Some(fill),
            };
            let rect = self.blit_dest(dest);
            self.canvas.fill_region(&[rect], &paint)?;
        }
        Ok(())
    }
}
