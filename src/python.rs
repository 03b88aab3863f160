//! Python bindings

use std::fs;
use std::path::Path;

use pyo3::prelude::*;

use crate::convert;
use crate::header::is_wmf_format;
use crate::picture::Picture;

/// Convert a WMF file to SVG
///
/// Args:
///     input_path: Path to input WMF file
///     output_path: Path to output SVG file
///
/// Returns:
///     True if conversion successful
#[pyfunction]
fn convert_wmf_to_svg(input_path: &str, output_path: &str) -> PyResult<bool> {
    let input = Path::new(input_path);
    if !input.exists() {
        return Err(PyErr::new::<pyo3::exceptions::PyFileNotFoundError, _>(format!(
            "Input file not found: {}",
            input_path
        )));
    }

    let data = fs::read(input).map_err(|e| {
        PyErr::new::<pyo3::exceptions::PyIOError, _>(format!("Failed to read input file: {}", e))
    })?;
    if !is_wmf_format(&data) {
        return Err(PyErr::new::<pyo3::exceptions::PyValueError, _>(
            "Input file must be WMF format",
        ));
    }

    let svg_content = convert::convert_wmf_to_svg(&data)?;
    fs::write(output_path, svg_content).map_err(|e| {
        PyErr::new::<pyo3::exceptions::PyIOError, _>(format!("Failed to write output file: {}", e))
    })?;
    Ok(true)
}

/// Convert WMF bytes to an SVG string
#[pyfunction]
fn convert_wmf_bytes_to_svg(data: &[u8]) -> PyResult<String> {
    if !is_wmf_format(data) {
        return Err(PyErr::new::<pyo3::exceptions::PyValueError, _>(
            "Input must be WMF data",
        ));
    }
    Ok(convert::convert_wmf_to_svg(data)?)
}

/// Picture size as (width, height) in pixels at 96 DPI
#[pyfunction]
fn wmf_size(data: &[u8]) -> PyResult<(f64, f64)> {
    let picture = Picture::parse(data).map_err(crate::error::WmfError::from)?;
    Ok(picture.logical_size())
}

/// Python module definition
#[pymodule]
fn wmf_converter(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(convert_wmf_to_svg, m)?)?;
    m.add_function(wrap_pyfunction!(convert_wmf_bytes_to_svg, m)?)?;
    m.add_function(wrap_pyfunction!(wmf_size, m)?)?;
    Ok(())
}
