// PARCELPLOT: Scaling Analysis and Figure Generation for Parcel-Merge MPI Benchmarks
// Copyright (C) 2024-2025 The parcelplot developers
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//! Rendering configuration and drawing helpers shared by the plot binaries.
//!
//! The configuration is an immutable value handed to every draw routine;
//! nothing here mutates process-global state.
use std::{ops::Range, path::PathBuf};

use itertools::{Itertools, MinMaxResult};
use plotters::prelude::*;

use crate::{
    catalog::GridShape,
    error::{Error, Result},
};

/// Label typesetting mode: plain text, or TeX math fragments for figures
/// post-processed by a TeX pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LabelMode {
    #[default]
    Plain,
    Typeset,
}

/// Marker shapes for line plots. The string forms follow the usual
/// single-character plotting conventions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum_macros::EnumString)]
pub enum MarkerKind {
    #[strum(serialize = "o")]
    Circle,
    #[strum(serialize = "s")]
    Square,
    #[strum(serialize = "D")]
    Diamond,
    #[strum(serialize = "^")]
    Triangle,
    #[strum(serialize = "x")]
    Cross,
}

/// Named colour palettes mirroring the common qualitative maps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, clap::ValueEnum)]
#[strum(serialize_all = "lowercase")]
pub enum Palette {
    #[default]
    Tab10,
    Dark2,
}

const TAB10: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

const DARK2: [RGBColor; 8] = [
    RGBColor(27, 158, 119),
    RGBColor(217, 95, 2),
    RGBColor(117, 112, 179),
    RGBColor(231, 41, 138),
    RGBColor(102, 166, 30),
    RGBColor(230, 171, 2),
    RGBColor(166, 118, 29),
    RGBColor(102, 102, 102),
];

impl Palette {
    pub fn colors(&self) -> &'static [RGBColor] {
        match self {
            Palette::Tab10 => &TAB10,
            Palette::Dark2 => &DARK2,
        }
    }
}

/// Immutable rendering configuration passed to every draw call.
#[derive(Clone, Debug)]
pub struct RenderConfig {
    pub font_family: String,
    pub font_size: i32,
    pub line_width: u32,
    pub marker_size: i32,
    pub label_mode: LabelMode,
    pub palette: Palette,
    pub markers: Vec<MarkerKind>,
    pub output_dir: PathBuf,
}

impl RenderConfig {
    pub fn new(
        output_dir: PathBuf,
        label_mode: LabelMode,
        palette: Palette,
        markers: Vec<MarkerKind>,
    ) -> RenderConfig {
        RenderConfig {
            font_family: "sans-serif".to_string(),
            font_size: 12,
            line_width: 1,
            marker_size: 3,
            label_mode,
            palette,
            markers,
            output_dir,
        }
    }

    /// Axis label and legend font.
    pub fn font(&self) -> (&str, i32) {
        (self.font_family.as_str(), self.font_size)
    }

    /// Panel caption font.
    pub fn caption_font(&self) -> (&str, i32) {
        (self.font_family.as_str(), self.font_size + 4)
    }

    /// Colour for series index `idx`, cycling through the palette.
    pub fn color(&self, idx: usize) -> RGBColor {
        let colors = self.palette.colors();
        colors[idx % colors.len()]
    }

    pub fn figure_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }

    /// Every discovered configuration needs its own marker.
    pub fn ensure_markers(&self, needed: usize) -> Result<()> {
        if needed > self.markers.len() {
            return Err(Error::NotEnoughSymbols {
                what: "markers",
                needed,
                available: self.markers.len(),
            });
        }
        Ok(())
    }

    /// Bar series are told apart by colour alone, so the palette must cover
    /// every configuration without cycling.
    pub fn ensure_palette(&self, needed: usize) -> Result<()> {
        let available = self.palette.colors().len();
        if needed > available {
            return Err(Error::NotEnoughSymbols {
                what: "palette colours",
                needed,
                available,
            });
        }
        Ok(())
    }
}

/// Grid label for panel captions.
pub fn grid_label(grid: GridShape, mode: LabelMode) -> String {
    match mode {
        LabelMode::Plain => format!(
            "(nx = {}) x (ny = {}) x (nz = {})",
            grid.nx, grid.ny, grid.nz
        ),
        LabelMode::Typeset => format!(
            "$(nx = {})\\times(ny = {})\\times(nz = {})$",
            grid.nx, grid.ny, grid.nz
        ),
    }
}

/// Latency axis label; the typeset form uses the proper micro sign.
pub fn latency_label(mode: LabelMode) -> &'static str {
    match mode {
        LabelMode::Plain => "latency (us)",
        LabelMode::Typeset => "latency ($\\mu$s)",
    }
}

/// Subplot layout of the multi-panel figures: an approximately square grid
/// with `rows * cols >= n`.
pub fn panel_grid(n: usize) -> (usize, usize) {
    let rows = ((n as f64).sqrt() as usize).max(1);
    let cols = ((n as f64 / rows as f64 + 0.5) as usize).max(1);
    (rows, cols)
}

/// A single marker at `pos`, drawn in backend pixels around the anchor.
pub fn marker_element<'a, DB: DrawingBackend + 'a>(
    kind: MarkerKind,
    pos: (f64, f64),
    size: i32,
    style: ShapeStyle,
) -> DynElement<'a, DB, (f64, f64)> {
    match kind {
        MarkerKind::Circle => Circle::new(pos, size, style).into_dyn(),
        MarkerKind::Triangle => TriangleMarker::new(pos, size, style).into_dyn(),
        MarkerKind::Cross => Cross::new(pos, size, style).into_dyn(),
        MarkerKind::Square => (EmptyElement::at(pos)
            + Rectangle::new([(-size, -size), (size, size)], style))
        .into_dyn(),
        MarkerKind::Diamond => (EmptyElement::at(pos)
            + Polygon::new(vec![(0, -size), (size, 0), (0, size), (-size, 0)], style))
        .into_dyn(),
    }
}

/// Padded axis range over all positive finite values, suitable for a log
/// scale.
pub fn log_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    match values
        .filter(|value| value.is_finite() && *value > 0.0)
        .minmax_by(f64::total_cmp)
    {
        MinMaxResult::NoElements => 0.1..10.0,
        MinMaxResult::OneElement(value) => value / 2.0..value * 2.0,
        MinMaxResult::MinMax(lo, hi) => lo / 1.5..hi * 1.5,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn panel_grid_layouts() {
        assert_eq!(panel_grid(1), (1, 1));
        assert_eq!(panel_grid(2), (1, 2));
        assert_eq!(panel_grid(3), (1, 3));
        assert_eq!(panel_grid(4), (2, 2));
        assert_eq!(panel_grid(6), (2, 3));
    }

    #[test]
    fn marker_string_forms_round_trip() {
        assert_eq!("o".parse::<MarkerKind>().unwrap(), MarkerKind::Circle);
        assert_eq!("D".parse::<MarkerKind>().unwrap(), MarkerKind::Diamond);
        assert_eq!(MarkerKind::Square.to_string(), "s");
        assert!("q".parse::<MarkerKind>().is_err());
    }

    #[test]
    fn insufficient_markers_are_a_configuration_error() {
        let config = RenderConfig::new(
            PathBuf::from("."),
            LabelMode::Plain,
            Palette::Tab10,
            vec![MarkerKind::Circle, MarkerKind::Square],
        );
        assert!(config.ensure_markers(2).is_ok());
        let err = config.ensure_markers(3).unwrap_err();
        assert!(matches!(
            err,
            Error::NotEnoughSymbols {
                needed: 3,
                available: 2,
                ..
            }
        ));
    }

    #[test]
    fn grid_labels_follow_the_mode() {
        let grid = GridShape {
            nx: 64,
            ny: 64,
            nz: 32,
        };
        assert_eq!(
            grid_label(grid, LabelMode::Plain),
            "(nx = 64) x (ny = 64) x (nz = 32)"
        );
        assert_eq!(
            grid_label(grid, LabelMode::Typeset),
            "$(nx = 64)\\times(ny = 64)\\times(nz = 32)$"
        );
    }

    #[test]
    fn log_range_padding() {
        let range = log_range([1.0, 100.0].into_iter());
        assert!(range.start < 1.0 && range.end > 100.0);
        // non-positive values cannot appear on a log axis
        let range = log_range([0.0, -3.0].into_iter());
        assert!(range.start > 0.0);
    }
}
