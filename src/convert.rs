//! One-call WMF to SVG conversion

use log::debug;

use crate::error::WmfResult;
use crate::picture::Picture;
use crate::svg_writer::{SvgCanvas, SvgOptions};

/// Convert WMF data to an SVG string with default options.
pub fn convert_wmf_to_svg(data: &[u8]) -> WmfResult<String> {
    convert_wmf_to_svg_with_options(data, &SvgOptions::default())
}

/// Convert WMF data to an SVG string sized for `options.dpi`.
pub fn convert_wmf_to_svg_with_options(data: &[u8], options: &SvgOptions) -> WmfResult<String> {
    let picture = Picture::parse(data)?;
    render_svg(&picture, options)
}

/// Replay an already parsed picture onto a fresh SVG canvas.
pub fn render_svg(picture: &Picture, options: &SvgOptions) -> WmfResult<String> {
    let (width, height) = picture.size_at_dpi(options.dpi);
    debug!("WMF - SVG dimensions: {}x{} at {} DPI", width, height, options.dpi);

    let mut canvas = SvgCanvas::new(width, height, options.clone());
    picture.replay_at_dpi(&mut canvas, options.dpi)?;
    Ok(canvas.finish())
}
