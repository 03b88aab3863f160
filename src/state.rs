//! Drawing state tracked during replay

use std::rc::Rc;

use log::debug;

use crate::canvas::{ClipRegion, DeviceTransform};
use crate::records::{BkMode, MapMode, PolyFillMode, TextAlign};
use crate::objects::{Brush, Font, Palette, Pen};
use crate::types::{Color, Point, PointS};

/// Target pixels per inch used for every fixed-scale mapping mode.
pub const DEFAULT_DPI: f64 = 96.0;

/// Window and viewport transformation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub map_mode: MapMode,
    pub window_org_x: i32,
    pub window_org_y: i32,
    pub window_ext_x: i32,
    pub window_ext_y: i32,
    pub viewport_org_x: i32,
    pub viewport_org_y: i32,
    pub viewport_ext_x: i32,
    pub viewport_ext_y: i32,
    /// Target size the window maps onto in the scaled modes
    pub frame_width: f64,
    pub frame_height: f64,
}

impl ViewTransform {
    /// Anisotropic mapping of `window` (origin, extent) onto a frame.
    pub fn new(
        window_org: (i32, i32),
        window_ext: (i32, i32),
        frame_width: f64,
        frame_height: f64,
    ) -> Self {
        Self {
            map_mode: MapMode::Anisotropic,
            window_org_x: window_org.0,
            window_org_y: window_org.1,
            window_ext_x: window_ext.0,
            window_ext_y: window_ext.1,
            viewport_org_x: 0,
            viewport_org_y: 0,
            viewport_ext_x: 1,
            viewport_ext_y: 1,
            frame_width,
            frame_height,
        }
    }

    fn scale_factor(frame: f64, ext: i32) -> f64 {
        if ext != 0 && frame > 0.0 {
            frame / ext as f64
        } else {
            1.0
        }
    }

    /// Current logical to target mapping.
    pub fn device_transform(&self) -> DeviceTransform {
        let (sx, sy, vx, vy) = match self.map_mode {
            // The frame stands in for the device viewport, so neither the
            // viewport origin nor its extent moves the picture here
            MapMode::Anisotropic => (
                Self::scale_factor(self.frame_width, self.window_ext_x),
                Self::scale_factor(self.frame_height, self.window_ext_y),
                0.0,
                0.0,
            ),
            MapMode::Isotropic => {
                let sx = Self::scale_factor(self.frame_width, self.window_ext_x);
                let sy = if self.window_ext_y < 0 { -sx.abs() } else { sx.abs() };
                (sx, sy, 0.0, 0.0)
            }
            MapMode::Text => (
                1.0,
                1.0,
                self.viewport_org_x as f64,
                self.viewport_org_y as f64,
            ),
            fixed => {
                let upi = fixed.units_per_inch().unwrap_or(DEFAULT_DPI);
                let s = DEFAULT_DPI / upi;
                (
                    s,
                    -s,
                    self.viewport_org_x as f64,
                    self.viewport_org_y as f64,
                )
            }
        };
        let origin = Point::new(
            vx - self.window_org_x as f64 * sx,
            vy - self.window_org_y as f64 * sy,
        );
        DeviceTransform::from_signed(origin, sx, sy)
    }

    pub fn set_map_mode(&mut self, mode: MapMode) {
        debug!("Mapping mode {:?}", mode);
        self.map_mode = mode;
    }

    pub fn set_window_org(&mut self, x: i32, y: i32) {
        self.window_org_x = x;
        self.window_org_y = y;
    }

    pub fn set_window_ext(&mut self, x: i32, y: i32) {
        self.window_ext_x = x;
        self.window_ext_y = y;
    }

    pub fn set_viewport_org(&mut self, x: i32, y: i32) {
        self.viewport_org_x = x;
        self.viewport_org_y = y;
    }

    pub fn set_viewport_ext(&mut self, x: i32, y: i32) {
        self.viewport_ext_x = x;
        self.viewport_ext_y = y;
    }

    pub fn offset_window_org(&mut self, dx: i32, dy: i32) {
        self.window_org_x = self.window_org_x.saturating_add(dx);
        self.window_org_y = self.window_org_y.saturating_add(dy);
    }

    pub fn offset_viewport_org(&mut self, dx: i32, dy: i32) {
        self.viewport_org_x = self.viewport_org_x.saturating_add(dx);
        self.viewport_org_y = self.viewport_org_y.saturating_add(dy);
    }

    /// Multiply the window extent by num/denom per axis; zero denominators leave an axis alone.
    pub fn scale_window_ext(&mut self, x_num: i16, x_denom: i16, y_num: i16, y_denom: i16) {
        self.window_ext_x = scale_extent(self.window_ext_x, x_num, x_denom);
        self.window_ext_y = scale_extent(self.window_ext_y, y_num, y_denom);
    }

    pub fn scale_viewport_ext(&mut self, x_num: i16, x_denom: i16, y_num: i16, y_denom: i16) {
        self.viewport_ext_x = scale_extent(self.viewport_ext_x, x_num, x_denom);
        self.viewport_ext_y = scale_extent(self.viewport_ext_y, y_num, y_denom);
    }
}

/// `ext * num / denom`, clamped to the i32 range.
fn scale_extent(ext: i32, num: i16, denom: i16) -> i32 {
    if denom == 0 {
        return ext;
    }
    let scaled = ext as i64 * num as i64 / denom as i64;
    scaled.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Snapshot-able drawing state. Selected objects are shared with the handle
/// table, so a snapshot costs a few reference count bumps.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingState {
    pub pen: Rc<Pen>,
    pub brush: Rc<Brush>,
    pub font: Rc<Font>,
    pub palette: Option<Rc<Palette>>,
    pub clip: Option<ClipRegion>,
    pub view: ViewTransform,
    /// Current position, in logical units
    pub position: PointS,
    pub text_color: Color,
    pub bk_color: Color,
    pub bk_mode: BkMode,
    pub text_align: TextAlign,
    pub poly_fill_mode: PolyFillMode,
    pub rop2: u16,
    pub stretch_blt_mode: u16,
    pub rel_abs: u16,
    pub text_char_extra: i16,
    pub break_count: u16,
    pub break_extra: u16,
    pub mapper_flags: u32,
    pub layout: u16,
}

/// R2_COPYPEN
const R2_COPYPEN: u16 = 13;

impl DrawingState {
    pub fn new(view: ViewTransform) -> Self {
        Self {
            pen: Rc::new(Pen::default()),
            brush: Rc::new(Brush::default()),
            font: Rc::new(Font::default()),
            palette: None,
            clip: None,
            view,
            position: PointS::default(),
            text_color: Color::black(),
            bk_color: Color::white(),
            bk_mode: BkMode::Opaque,
            text_align: TextAlign::default(),
            poly_fill_mode: PolyFillMode::Alternate,
            rop2: R2_COPYPEN,
            stretch_blt_mode: 0,
            rel_abs: 0,
            text_char_extra: 0,
            break_count: 0,
            break_extra: 0,
            mapper_flags: 0,
            layout: 0,
        }
    }

    pub fn transform(&self) -> DeviceTransform {
        self.view.device_transform()
    }

    /// Background color, when the background mode paints it.
    pub fn opaque_background(&self) -> Option<Color> {
        match self.bk_mode {
            BkMode::Opaque => Some(self.bk_color),
            BkMode::Transparent => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_maps_to_frame() {
        let view = ViewTransform::new((0, 0), (100, 100), 100.0, 100.0);
        assert_eq!(view.device_transform(), DeviceTransform::identity());

        let view = ViewTransform::new((100, 200), (1000, 500), 100.0, 100.0);
        let t = view.device_transform();
        assert_eq!(t.apply(100.0, 200.0), Point::new(0.0, 0.0));
        assert_eq!(t.apply(1100.0, 700.0), Point::new(100.0, 100.0));
    }

    #[test]
    fn test_negative_extent_flips() {
        let view = ViewTransform::new((0, 0), (100, -100), 100.0, 100.0);
        let t = view.device_transform();
        assert!(t.flip_y);
        assert_eq!(t.apply(0.0, -100.0), Point::new(0.0, 100.0));
    }

    #[test]
    fn test_isotropic_uses_x_scale() {
        let mut view = ViewTransform::new((0, 0), (200, 50), 100.0, 100.0);
        view.set_map_mode(MapMode::Isotropic);
        let t = view.device_transform();
        assert_eq!(t.scale_x, 0.5);
        assert_eq!(t.scale_y, 0.5);
    }

    #[test]
    fn test_metric_mode_flips_y() {
        let mut view = ViewTransform::new((0, 0), (1, 1), 0.0, 0.0);
        view.set_map_mode(MapMode::LoEnglish);
        view.set_viewport_org(0, 96);
        let t = view.device_transform();
        // 100 units per inch -> 0.96 px per unit
        assert_eq!(t.apply(100.0, 100.0), Point::new(96.0, 0.0));
    }

    #[test]
    fn test_text_mode_applies_viewport_origin() {
        let mut view = ViewTransform::new((0, 0), (1, 1), 0.0, 0.0);
        view.set_map_mode(MapMode::Text);
        view.set_window_org(10, 10);
        view.set_viewport_org(5, 5);
        assert_eq!(view.device_transform().apply(10.0, 10.0), Point::new(5.0, 5.0));
    }

    #[test]
    fn test_scale_window_ext() {
        let mut view = ViewTransform::new((0, 0), (100, 100), 100.0, 100.0);
        view.scale_window_ext(2, 1, 1, 0);
        assert_eq!((view.window_ext_x, view.window_ext_y), (200, 100));
    }

    #[test]
    fn test_repeated_scaling_saturates() {
        let mut view = ViewTransform::new((0, 0), (32767, 32767), 100.0, 100.0);
        view.scale_window_ext(32767, 1, 32767, 1);
        assert_eq!(view.window_ext_x, 32767 * 32767);
        view.scale_window_ext(32767, 1, -32767, 1);
        assert_eq!((view.window_ext_x, view.window_ext_y), (i32::MAX, i32::MIN));

        view.set_window_org(i32::MAX - 1, 0);
        view.offset_window_org(10, 0);
        assert_eq!(view.window_org_x, i32::MAX);
    }

    #[test]
    fn test_scaled_modes_ignore_viewport() {
        let mut view = ViewTransform::new((0, 0), (100, 100), 100.0, 100.0);
        view.set_viewport_org(40, 40);
        view.set_viewport_ext(3, 3);
        assert_eq!(view.device_transform().apply(10.0, 10.0), Point::new(10.0, 10.0));
        view.set_map_mode(MapMode::Isotropic);
        assert_eq!(view.device_transform().apply(10.0, 10.0), Point::new(10.0, 10.0));
    }

    #[test]
    fn test_default_state() {
        let state = DrawingState::new(ViewTransform::new((0, 0), (1, 1), 1.0, 1.0));
        assert_eq!(state.pen.color, Color::black());
        assert_eq!(*state.brush, Brush::Solid(Color::white()));
        assert_eq!(state.opaque_background(), Some(Color::white()));
    }
}
