//! SVG export canvas
//!
//! [`SvgCanvas`] implements [`Canvas`] by building an SVG document with the
//! `svg` crate. Shapes become `<path>` elements with hand-built path data,
//! clip regions and non-solid fills become entries in `<defs>`, and bitmaps
//! are embedded as base64 data URIs.

use base64::{engine::general_purpose, Engine as _};
use log::trace;
use svg::node::element::{
    ClipPath, Definitions, Element, Group, Image, Path, Pattern, Rectangle, Text,
};
use svg::node::Text as TextNode;
use svg::Document;

use crate::bitmap::Bitmap;
use crate::canvas::{
    ArcKind, BitmapBlit, Canvas, ClipRegion, Fill, FillRule, Paint, Stroke, TextRun,
};
use crate::error::{CanvasError, CanvasResult};
use crate::objects::{HatchStyle, LineCap, LineJoin, Palette, PenStyle};
use crate::raster::encode_bitmap;
use crate::records::{HorizontalAlign, VerticalAlign};
use crate::state::DEFAULT_DPI;
use crate::types::{Color, Point, Rect};

/// Hatch pattern tile size in target units
const HATCH_TILE: f64 = 8.0;

/// Options for SVG export
#[derive(Debug, Clone, PartialEq)]
pub struct SvgOptions {
    /// Target units per inch; the document size is the picture size at this DPI
    pub dpi: f64,
    /// Embed bitmaps as data URIs; when false, blits are dropped
    pub embed_bitmaps: bool,
    /// Clip all output to the picture frame
    pub clip_to_frame: bool,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            embed_bitmaps: true,
            clip_to_frame: true,
        }
    }
}

/// Canvas that accumulates SVG elements
pub struct SvgCanvas {
    width: f64,
    height: f64,
    options: SvgOptions,
    defs: Vec<Element>,
    elements: Vec<Element>,
    /// Elements drawn under the current clip, flushed when the clip changes
    pending: Vec<Element>,
    clip: Option<String>,
    saved: Vec<Option<String>>,
    next_id: usize,
}

impl SvgCanvas {
    pub fn new(width: f64, height: f64, options: SvgOptions) -> Self {
        Self {
            width,
            height,
            options,
            defs: Vec::new(),
            elements: Vec::new(),
            pending: Vec::new(),
            clip: None,
            saved: Vec::new(),
            next_id: 0,
        }
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("wmf-{}-{}", prefix, self.next_id)
    }

    fn push<E: Into<Element>>(&mut self, element: E) {
        self.pending.push(element.into());
    }

    /// Move pending elements into the document, grouped under their clip.
    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending);
        match &self.clip {
            Some(id) => {
                let mut group = Group::new().set("clip-path", format!("url(#{})", id));
                for element in pending {
                    group = group.add(element);
                }
                self.elements.push(group.into());
            }
            None => self.elements.extend(pending),
        }
    }

    fn switch_clip(&mut self, clip: Option<String>) {
        if self.clip != clip {
            self.flush();
            self.clip = clip;
        }
    }

    fn stroke_attrs(&self, path: Path, stroke: &Stroke) -> Path {
        let width = stroke.width.max(0.0);
        let mut path = path
            .set("stroke", stroke.color.to_hex())
            .set("stroke-width", num(width))
            .set(
                "stroke-linecap",
                match stroke.cap {
                    LineCap::Round => "round",
                    LineCap::Square => "square",
                    LineCap::Flat => "butt",
                },
            )
            .set(
                "stroke-linejoin",
                match stroke.join {
                    LineJoin::Round => "round",
                    LineJoin::Bevel => "bevel",
                    LineJoin::Miter => "miter",
                },
            );
        if let Some(dashes) = dash_array(stroke.style, width) {
            path = path.set("stroke-dasharray", dashes);
        }
        path
    }

    /// Value for a `fill` attribute, registering a pattern when needed.
    fn fill_value(&mut self, fill: &Fill) -> Result<String, CanvasError> {
        match fill {
            Fill::Solid(color) => Ok(color.to_hex()),
            Fill::Hatched {
                color,
                hatch,
                background,
            } => {
                let id = self.next_id("hatch");
                self.defs
                    .push(hatch_pattern(&id, *color, *hatch, *background).into());
                Ok(format!("url(#{})", id))
            }
            Fill::Pattern(bitmap) => match self.bitmap_href(bitmap, None, None)? {
                Some(href) => {
                    let id = self.next_id("pattern");
                    let pattern = Pattern::new()
                        .set("id", id.as_str())
                        .set("patternUnits", "userSpaceOnUse")
                        .set("width", bitmap.width)
                        .set("height", bitmap.height)
                        .add(
                            Image::new()
                                .set("width", bitmap.width)
                                .set("height", bitmap.height)
                                .set("href", href),
                        );
                    self.defs.push(pattern.into());
                    Ok(format!("url(#{})", id))
                }
                None => Ok(Color::black().to_hex()),
            },
        }
    }

    fn paint_path(&mut self, d: String, fill_rule: FillRule, paint: &Paint) -> CanvasResult {
        if paint.is_invisible() {
            return Ok(());
        }
        let mut path = Path::new().set("d", d);
        path = match &paint.fill {
            Some(fill) => {
                let value = self.fill_value(fill)?;
                path.set("fill", value).set(
                    "fill-rule",
                    match fill_rule {
                        FillRule::EvenOdd => "evenodd",
                        FillRule::NonZero => "nonzero",
                    },
                )
            }
            None => path.set("fill", "none"),
        };
        if let Some(stroke) = &paint.stroke {
            path = self.stroke_attrs(path, stroke);
        }
        self.push(path);
        Ok(())
    }

    fn bitmap_href(
        &self,
        bitmap: &Bitmap,
        source: Option<Rect>,
        palette: Option<&Palette>,
    ) -> Result<Option<String>, CanvasError> {
        if !self.options.embed_bitmaps {
            return Ok(None);
        }
        let encoded = encode_bitmap(bitmap, source, palette)
            .map_err(|err| CanvasError::new(err.to_string()))?;
        Ok(encoded.map(|image| {
            format!(
                "data:{};base64,{}",
                image.mime_type,
                general_purpose::STANDARD.encode(&image.data)
            )
        }))
    }

    fn rect_clip(&mut self, rect: Rect) -> String {
        let id = self.next_id("clip");
        let clip = ClipPath::new().set("id", id.as_str()).add(rectangle(rect));
        self.defs.push(clip.into());
        id
    }

    /// Serialize the document.
    pub fn finish(mut self) -> String {
        self.flush();
        let mut document = Document::new()
            .set("width", num(self.width))
            .set("height", num(self.height))
            .set(
                "viewBox",
                format!("0 0 {} {}", num(self.width), num(self.height)),
            );

        let frame_clip = if self.options.clip_to_frame {
            let id = self.next_id("frame");
            self.defs.push(
                ClipPath::new()
                    .set("id", id.as_str())
                    .add(rectangle(Rect::new(0.0, 0.0, self.width, self.height)))
                    .into(),
            );
            Some(id)
        } else {
            None
        };

        if !self.defs.is_empty() {
            let mut defs = Definitions::new();
            for def in self.defs {
                defs = defs.add(def);
            }
            document = document.add(defs);
        }

        let mut group = Group::new();
        if let Some(id) = frame_clip {
            group = group.set("clip-path", format!("url(#{})", id));
        }
        for element in self.elements {
            group = group.add(element);
        }
        document.add(group).to_string()
    }
}

impl Canvas for SvgCanvas {
    fn save_state(&mut self) -> CanvasResult {
        self.saved.push(self.clip.clone());
        Ok(())
    }

    fn restore_state(&mut self) -> CanvasResult {
        if let Some(clip) = self.saved.pop() {
            self.switch_clip(clip);
        }
        Ok(())
    }

    fn set_clip(&mut self, clip: Option<&ClipRegion>) -> CanvasResult {
        let id = clip.map(|region| {
            let id = self.next_id("clip");
            let mut clip_path = ClipPath::new().set("id", id.as_str());
            for rect in &region.rects {
                clip_path = clip_path.add(rectangle(*rect));
            }
            self.defs.push(clip_path.into());
            id
        });
        trace!("set_clip {:?}", id);
        self.switch_clip(id);
        Ok(())
    }

    fn draw_line(&mut self, from: Point, to: Point, stroke: &Stroke) -> CanvasResult {
        let d = format!("M {} {} L {} {}", num(from.x), num(from.y), num(to.x), num(to.y));
        trace!("draw_line {}", d);
        let path = Path::new().set("d", d).set("fill", "none");
        let path = self.stroke_attrs(path, stroke);
        self.push(path);
        Ok(())
    }

    fn draw_polygon(
        &mut self,
        points: &[Point],
        closed: bool,
        fill_rule: FillRule,
        paint: &Paint,
    ) -> CanvasResult {
        if points.is_empty() {
            return Ok(());
        }
        let mut d = subpath(points);
        if closed {
            d.push_str(" Z");
        }
        trace!("draw_polygon {} points", points.len());
        self.paint_path(d, fill_rule, paint)
    }

    fn draw_poly_polygon(
        &mut self,
        polygons: &[Vec<Point>],
        fill_rule: FillRule,
        paint: &Paint,
    ) -> CanvasResult {
        let d = polygons
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| format!("{} Z", subpath(p)))
            .collect::<Vec<_>>()
            .join(" ");
        if d.is_empty() {
            return Ok(());
        }
        self.paint_path(d, fill_rule, paint)
    }

    fn draw_ellipse(&mut self, bounds: Rect, paint: &Paint) -> CanvasResult {
        let c = bounds.center();
        let (rx, ry) = (bounds.width / 2.0, bounds.height / 2.0);
        let d = format!(
            "M {} {} A {} {} 0 1 0 {} {} A {} {} 0 1 0 {} {} Z",
            num(c.x - rx),
            num(c.y),
            num(rx),
            num(ry),
            num(c.x + rx),
            num(c.y),
            num(rx),
            num(ry),
            num(c.x - rx),
            num(c.y)
        );
        self.paint_path(d, FillRule::NonZero, paint)
    }

    fn draw_arc(
        &mut self,
        bounds: Rect,
        start_angle: f64,
        sweep_angle: f64,
        kind: ArcKind,
        paint: &Paint,
    ) -> CanvasResult {
        let c = bounds.center();
        let (rx, ry) = (bounds.width / 2.0, bounds.height / 2.0);
        let at = |angle: f64| {
            let rad = angle.to_radians();
            Point::new(c.x + rx * rad.cos(), c.y - ry * rad.sin())
        };
        let start = at(start_angle);
        let mut d = format!("M {} {}", num(start.x), num(start.y));
        if kind == ArcKind::Pie {
            d = format!(
                "M {} {} L {} {}",
                num(c.x),
                num(c.y),
                num(start.x),
                num(start.y)
            );
        }

        // Counterclockwise on screen is SVG's negative sweep direction
        let sweep_flag = if sweep_angle >= 0.0 { 0 } else { 1 };
        let segments = if sweep_angle.abs() > 180.0 { 2 } else { 1 };
        let step = sweep_angle / segments as f64;
        for i in 1..=segments {
            let end = at(start_angle + step * i as f64);
            d.push_str(&format!(
                " A {} {} 0 0 {} {} {}",
                num(rx),
                num(ry),
                sweep_flag,
                num(end.x),
                num(end.y)
            ));
        }

        let paint = match kind {
            ArcKind::Open => {
                // ARC never fills
                Paint {
                    stroke: paint.stroke.clone(),
                    fill: None,
                }
            }
            ArcKind::Pie | ArcKind::Chord => {
                d.push_str(" Z");
                paint.clone()
            }
        };
        trace!("draw_arc {:?} {}", kind, d);
        self.paint_path(d, FillRule::NonZero, &paint)
    }

    fn draw_round_rect(
        &mut self,
        bounds: Rect,
        radius_x: f64,
        radius_y: f64,
        paint: &Paint,
    ) -> CanvasResult {
        let rx = radius_x.abs().min(bounds.width / 2.0);
        let ry = radius_y.abs().min(bounds.height / 2.0);
        if rx <= 0.0 || ry <= 0.0 {
            return self.draw_polygon(&bounds.corners(), true, FillRule::NonZero, paint);
        }
        let (l, t, r, b) = (bounds.x, bounds.y, bounds.right(), bounds.bottom());
        let corner = |x: f64, y: f64| format!("A {} {} 0 0 1 {} {}", num(rx), num(ry), num(x), num(y));
        let d = format!(
            "M {} {} H {} {} V {} {} H {} {} V {} {} Z",
            num(l + rx),
            num(t),
            num(r - rx),
            corner(r, t + ry),
            num(b - ry),
            corner(r - rx, b),
            num(l + rx),
            corner(l, b - ry),
            num(t + ry),
            corner(l + rx, t)
        );
        self.paint_path(d, FillRule::NonZero, paint)
    }

    fn draw_text(&mut self, run: &TextRun) -> CanvasResult {
        if let (Some(rect), true, Some(background)) = (run.rect, run.opaque, run.background) {
            self.push(rectangle(rect).set("fill", background.to_hex()));
        }
        if run.text.is_empty() {
            return Ok(());
        }

        let font = &run.font;
        let mut text = Text::new()
            .set("y", num(run.position.y))
            .set("font-family", font.face_name.as_str())
            .set("font-size", num(font.size))
            .set("fill", run.color.to_hex())
            .set("xml:space", "preserve");

        if run.dx.is_empty() {
            text = text.set("x", num(run.position.x));
        } else {
            // One absolute x per character
            let mut x = run.position.x;
            let mut xs = Vec::with_capacity(run.dx.len());
            for (_, advance) in run.text.chars().zip(run.dx.iter()) {
                xs.push(num(x));
                x += advance;
            }
            text = text.set("x", xs.join(" "));
        }

        if font.weight != 400 && font.weight != 0 {
            text = text.set("font-weight", font.weight);
        }
        if font.italic {
            text = text.set("font-style", "italic");
        }
        let decoration = match (font.underline, font.strike_out) {
            (true, true) => Some("underline line-through"),
            (true, false) => Some("underline"),
            (false, true) => Some("line-through"),
            (false, false) => None,
        };
        if let Some(decoration) = decoration {
            text = text.set("text-decoration", decoration);
        }
        text = match run.horizontal {
            HorizontalAlign::Left => text,
            HorizontalAlign::Center => text.set("text-anchor", "middle"),
            HorizontalAlign::Right => text.set("text-anchor", "end"),
        };
        text = match run.vertical {
            VerticalAlign::Baseline => text,
            VerticalAlign::Top => text.set("dominant-baseline", "text-before-edge"),
            VerticalAlign::Bottom => text.set("dominant-baseline", "text-after-edge"),
        };
        if font.angle != 0.0 {
            text = text.set(
                "transform",
                format!(
                    "rotate({} {} {})",
                    num(-font.angle),
                    num(run.position.x),
                    num(run.position.y)
                ),
            );
        }
        if let (Some(rect), true) = (run.rect, run.clipped) {
            let id = self.rect_clip(rect);
            text = text.set("clip-path", format!("url(#{})", id));
        }

        trace!("draw_text {:?} at {:?}", run.text, run.position);
        self.push(text.add(TextNode::new(run.text.as_str())));
        Ok(())
    }

    fn draw_bitmap(&mut self, blit: &BitmapBlit<'_>) -> CanvasResult {
        let Some(href) = self.bitmap_href(blit.bitmap, blit.source, blit.palette)? else {
            return Ok(());
        };
        trace!(
            "draw_bitmap {}x{} -> {:?} rop {:#010x}",
            blit.bitmap.width,
            blit.bitmap.height,
            blit.dest,
            blit.rop
        );
        let image = Image::new()
            .set("x", num(blit.dest.x))
            .set("y", num(blit.dest.y))
            .set("width", num(blit.dest.width))
            .set("height", num(blit.dest.height))
            .set("preserveAspectRatio", "none")
            .set("href", href);
        self.push(image);
        Ok(())
    }

    fn fill_region(&mut self, rects: &[Rect], paint: &Paint) -> CanvasResult {
        let d = rects
            .iter()
            .map(|r| format!("{} Z", subpath(&r.corners())))
            .collect::<Vec<_>>()
            .join(" ");
        if d.is_empty() {
            return Ok(());
        }
        self.paint_path(d, FillRule::NonZero, paint)
    }

    fn set_pixel(&mut self, at: Point, color: Color) -> CanvasResult {
        self.push(rectangle(Rect::new(at.x, at.y, 1.0, 1.0)).set("fill", color.to_hex()));
        Ok(())
    }
}

/// Round to three decimals for compact output.
fn num(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0 + 0.0;
    format!("{}", rounded)
}

fn subpath(points: &[Point]) -> String {
    let mut d = String::new();
    for (i, p) in points.iter().enumerate() {
        let cmd = if i == 0 { "M" } else { " L" };
        d.push_str(&format!("{} {} {}", cmd, num(p.x), num(p.y)));
    }
    d
}

fn rectangle(rect: Rect) -> Rectangle {
    Rectangle::new()
        .set("x", num(rect.x))
        .set("y", num(rect.y))
        .set("width", num(rect.width))
        .set("height", num(rect.height))
}

fn dash_array(style: PenStyle, width: f64) -> Option<String> {
    let unit = width.max(1.0);
    let pattern: &[f64] = match style {
        PenStyle::Dash => &[6.0, 2.0],
        PenStyle::Dot | PenStyle::Alternate => &[1.0, 1.0],
        PenStyle::DashDot => &[6.0, 2.0, 1.0, 2.0],
        PenStyle::DashDotDot => &[6.0, 2.0, 1.0, 2.0, 1.0, 2.0],
        _ => return None,
    };
    Some(
        pattern
            .iter()
            .map(|v| num(v * unit))
            .collect::<Vec<_>>()
            .join(" "),
    )
}

fn hatch_pattern(id: &str, color: Color, hatch: HatchStyle, background: Option<Color>) -> Pattern {
    let s = HATCH_TILE;
    let h = s / 2.0;
    let lines: &[(f64, f64, f64, f64)] = match hatch {
        HatchStyle::Horizontal => &[(0.0, h, s, h)],
        HatchStyle::Vertical => &[(h, 0.0, h, s)],
        HatchStyle::ForwardDiagonal => &[(0.0, 0.0, s, s)],
        HatchStyle::BackwardDiagonal => &[(0.0, s, s, 0.0)],
        HatchStyle::Cross => &[(0.0, h, s, h), (h, 0.0, h, s)],
        HatchStyle::DiagonalCross => &[(0.0, 0.0, s, s), (0.0, s, s, 0.0)],
    };
    let d = lines
        .iter()
        .map(|(x1, y1, x2, y2)| format!("M {} {} L {} {}", num(*x1), num(*y1), num(*x2), num(*y2)))
        .collect::<Vec<_>>()
        .join(" ");

    let mut pattern = Pattern::new()
        .set("id", id)
        .set("patternUnits", "userSpaceOnUse")
        .set("width", s)
        .set("height", s);
    if let Some(bg) = background {
        pattern = pattern.add(rectangle(Rect::new(0.0, 0.0, s, s)).set("fill", bg.to_hex()));
    }
    pattern.add(
        Path::new()
            .set("d", d)
            .set("stroke", color.to_hex())
            .set("stroke-width", 1)
            .set("fill", "none"),
    )
}
