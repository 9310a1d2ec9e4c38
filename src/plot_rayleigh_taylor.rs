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
use std::{fs, path::PathBuf, process};

use anyhow::{Context, Result};
use clap::Parser;
use lazy_static::lazy_static;
use plotters::prelude::*;
use regex::Regex;

use parcelplot::prelude::*;
use parcelplot::render::Palette;

/// Rayleigh-Taylor runs shipped with the benchmark campaign, smallest grid
/// first.
const RT_DIRS: [&str; 3] = ["rt-64x64x64", "rt-128x128x128", "rt-256x256x256"];

lazy_static! {
    static ref RT_DIR: Regex = Regex::new(r"^rt-(\d+)x(\d+)x(\d+)$").unwrap();
}

#[derive(Parser, Debug)]
#[command(about = "Generate Rayleigh-Taylor statistics plots.", long_about = None)]
struct Args {
    /// Data directory.
    #[arg(long, default_value = "rayleigh_taylor")]
    path: PathBuf,
    /// Figure save directory.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
    /// Colour palette for plotting.
    #[arg(long, value_enum, default_value_t = Palette::Tab10)]
    palette: Palette,
    /// Typeset labels as TeX math.
    #[arg(long)]
    enable_latex: bool,
}

fn main() {
    pretty_env_logger::init();
    if let Err(e) = run(Args::parse()) {
        log::error!("{e:#}");
        process::exit(1);
    }
}

/// Legend label of one run directory, e.g. `rt-64x64x64`.
fn grid_dir_label(dirname: &str, mode: LabelMode) -> Result<String> {
    let caps = RT_DIR
        .captures(dirname)
        .with_context(|| format!("unrecognized run directory name '{dirname}'"))?;
    Ok(match mode {
        LabelMode::Plain => format!("{} x {} x {}", &caps[1], &caps[2], &caps[3]),
        LabelMode::Typeset => format!("${}\\times {}\\times {}$", &caps[1], &caps[2], &caps[3]),
    })
}

fn run(args: Args) -> Result<()> {
    fs::create_dir_all(&args.output_dir)?;
    let label_mode = if args.enable_latex {
        LabelMode::Typeset
    } else {
        LabelMode::Plain
    };
    let config = RenderConfig::new(
        args.output_dir.clone(),
        label_mode,
        args.palette,
        Vec::new(),
    );

    plot_subcomm_statistics(&args, &config)
}

/// Sub-communicator size over simulation time, one series per grid.
fn plot_subcomm_statistics(args: &Args, config: &RenderConfig) -> Result<()> {
    let mut series: Vec<(String, Vec<(f64, f64)>)> = Vec::new();
    for dirname in RT_DIRS {
        let fullpath = args.path.join(dirname);
        if !fullpath.exists() {
            return Err(Error::MissingDirectory(fullpath).into());
        }

        let stem = dirname.replace('-', "_");
        let stats = fullpath.join(format!("epic_{stem}_prepare_nearest_subcomm.asc"));
        let data =
            Columnar::read(&stats).with_context(|| format!("reading {}", stats.display()))?;
        let (Some(time), Some(percentage)) = (data.column(0), data.column(2)) else {
            log::info!("No data in {stats:?}; not plotting.");
            continue;
        };
        series.push((
            grid_dir_label(dirname, config.label_mode)?,
            time.into_iter().zip(percentage).collect(),
        ));
    }

    let x_max = series
        .iter()
        .flat_map(|(_, points)| points.iter().map(|&(t, _)| t))
        .fold(f64::NEG_INFINITY, f64::max)
        .max(5.0);

    let figure = config.figure_path("rt_subcomm.svg");
    let root = SVGBackend::new(&figure, (600, 450)).into_drawing_area();
    root.fill(&WHITE).map_err(render_error)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d(0f64..x_max, 0f64..100f64)
        .map_err(render_error)?;

    let y_desc = match config.label_mode {
        LabelMode::Plain => "MPI sub-communicator size (%)",
        LabelMode::Typeset => "MPI sub-communicator size (\\%)",
    };
    chart
        .configure_mesh()
        .x_desc("simulation time")
        .y_desc(y_desc)
        .x_label_style(config.font())
        .y_label_style(config.font())
        .draw()
        .map_err(render_error)?;

    for (i, (label, points)) in series.into_iter().enumerate() {
        let color = config.color(i);
        chart
            .draw_series(LineSeries::new(
                points.into_iter(),
                color.stroke_width(config.line_width + 1),
            ))
            .map_err(render_error)?
            .label(label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(2))
            });
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(config.font())
        .draw()
        .map_err(render_error)?;
    root.present().map_err(render_error)?;
    log::info!("Wrote {figure:?}");
    Ok(())
}

fn render_error<E: std::fmt::Display>(e: E) -> anyhow::Error {
    anyhow::anyhow!("{e}")
}
