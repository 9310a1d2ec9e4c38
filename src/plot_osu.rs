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

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use plotters::coord::Shift;
use plotters::prelude::*;

use parcelplot::prelude::*;
use parcelplot::render;
use parcelplot::render::Palette;

/// Node counts the OSU runs were collected with: one node exercises the
/// intra-node fabric, two nodes the interconnect.
const OSU_NODES: [u32; 2] = [1, 2];

#[derive(Parser, Debug)]
#[command(about = "Generate OSU micro benchmark plots.", long_about = None)]
struct Args {
    /// OSU micro benchmark test family.
    #[arg(long, value_enum)]
    plot_type: PlotType,
    /// Computing systems.
    #[arg(long, num_args = 1..,
          default_values_t = ["archer2".to_string(), "hotlum".to_string(), "cirrus".to_string()])]
    machines: Vec<String>,
    /// Root directory of the OSU micro benchmark data.
    #[arg(long, default_value = ".")]
    dirname: PathBuf,
    /// Figure save directory.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
    /// Typeset labels as TeX math.
    #[arg(long)]
    enable_latex: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, strum::Display)]
#[strum(serialize_all = "kebab-case")]
enum PlotType {
    BandwidthPut,
    BandwidthGet,
    LatencyPut,
    LatencyGet,
}

impl PlotType {
    /// The three OSU tests compared side by side for this plot type.
    fn tests(&self) -> [&'static str; 3] {
        match self {
            PlotType::BandwidthPut => ["osu_oshm_put_bw", "osu_put_bw_lock", "osu_put_bw_flush"],
            PlotType::BandwidthGet => ["osu_oshm_get_bw", "osu_get_bw_lock", "osu_get_bw_flush"],
            PlotType::LatencyPut => ["osu_oshm_put", "osu_put_latency_lock", "osu_put_latency_flush"],
            PlotType::LatencyGet => ["osu_oshm_get", "osu_get_latency_lock", "osu_get_latency_flush"],
        }
    }
}

fn osu_test_title(test: &str) -> &str {
    match test {
        "osu_allreduce" => "OSU MPI Allreduce Latency Test (v7.5)",
        "osu_bw" => "OSU MPI Bandwidth Test (v7.5)",
        "osu_get_bw_flush" => "OSU MPI-3 RMA Get (flush) Bandwidth Test (v7.5)",
        "osu_get_bw_lock" => "OSU MPI-3 RMA Get (lock/unlock) Bandwidth Test (v7.5)",
        "osu_get_latency_flush" => "OSU MPI-3 RMA Get (flush) Latency Test (v7.5)",
        "osu_get_latency_lock" => "OSU MPI-3 RMA Get (lock/unlock) Latency Test (v7.5)",
        "osu_latency" => "OSU MPI Latency Test (v7.5)",
        "osu_oshm_barrier" => "OSU OpenSHMEM Barrier Latency Test (v7.5)",
        "osu_oshm_get" => "OSU OpenSHMEM Get Test (v7.5)",
        "osu_oshm_get_bw" => "OSU OpenSHMEM Get Bandwidth Test (v7.5)",
        "osu_oshm_put" => "OSU OpenSHMEM Put Test (v7.5)",
        "osu_oshm_put_bw" => "OSU OpenSHMEM Put Bandwidth Test (v7.5)",
        "osu_put_bw_flush" => "OSU MPI-3 RMA Put (flush) Bandwidth Test (v7.5)",
        "osu_put_bw_lock" => "OSU MPI-3 RMA Put (lock/unlock) Bandwidth Test (v7.5)",
        "osu_put_latency_flush" => "OSU MPI-3 RMA Put (flush) Latency Test (v7.5)",
        "osu_put_latency_lock" => "OSU MPI-3 RMA Put (lock/unlock) Latency Test (v7.5)",
        other => other,
    }
}

/// Interconnect label of each known system.
fn network_label(machine: &str) -> Option<&'static str> {
    match machine {
        "archer2" => Some("SS10"),
        "hotlum" => Some("SS11"),
        "cirrus" => Some("IB"),
        _ => None,
    }
}

fn node_label(nodes: u32) -> &'static str {
    if nodes == 1 {
        "(intra-node)"
    } else {
        "(inter-node)"
    }
}

fn main() {
    pretty_env_logger::init();
    if let Err(e) = run(Args::parse()) {
        log::error!("{e:#}");
        process::exit(1);
    }
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
        Palette::Tab10,
        vec![MarkerKind::Circle, MarkerKind::Square, MarkerKind::Diamond],
    );
    config.ensure_markers(args.machines.len())?;

    let tests = args.plot_type.tests();
    let figure = config.figure_path(&format!("osu-{}.svg", args.plot_type));
    let root = SVGBackend::new(&figure, (500 * tests.len() as u32, 500)).into_drawing_area();
    root.fill(&WHITE).map_err(render_error)?;
    let panels = root.split_evenly((1, tests.len()));

    for (i, test) in tests.iter().enumerate() {
        draw_osu_panel(&panels[i], test, &args, &config, i == 0)
            .with_context(|| format!("panel for {test}"))?;
    }
    root.present().map_err(render_error)?;
    log::info!("Wrote {figure:?}");
    Ok(())
}

fn draw_osu_panel(
    panel: &DrawingArea<SVGBackend, Shift>,
    test: &str,
    args: &Args,
    config: &RenderConfig,
    show_ylabel: bool,
) -> Result<()> {
    // one series per (machine, node count); a degenerate file is skipped
    let mut series: Vec<(String, usize, u32, Vec<(f64, f64)>)> = Vec::new();
    for (j, machine) in args.machines.iter().enumerate() {
        let Some(network) = network_label(machine) else {
            bail!("no interconnect label for machine '{machine}'");
        };
        for &nodes in &OSU_NODES {
            let path = args
                .dirname
                .join(format!("{machine}-osu-runs"))
                .join(format!("{machine}-nodes-{nodes}-{test}"));
            let data =
                Columnar::read(&path).with_context(|| format!("reading {}", path.display()))?;
            let (Some(sizes), Some(values)) = (data.column(0), data.column(1)) else {
                log::info!("No data in {path:?}; not plotting.");
                continue;
            };
            let label = format!("{network} {}", node_label(nodes));
            series.push((
                label,
                j,
                nodes,
                sizes.into_iter().zip(values).collect(),
            ));
        }
    }

    let x_range = render::log_range(series.iter().flat_map(|(_, _, _, points)| {
        points.iter().map(|&(size, _)| size)
    }));
    let y_range = render::log_range(series.iter().flat_map(|(_, _, _, points)| {
        points.iter().map(|&(_, value)| value)
    }));

    let is_bandwidth = test.contains("bw");
    let y_desc = if is_bandwidth {
        "bandwidth (MB/s)"
    } else {
        render::latency_label(config.label_mode)
    };

    let mut chart = ChartBuilder::on(panel)
        .caption(osu_test_title(test), config.caption_font())
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d(x_range.log_scale(), y_range.log_scale())
        .map_err(render_error)?;

    {
        let mut mesh = chart.configure_mesh();
        mesh.x_desc("message size (B)")
            .x_label_style(config.font())
            .y_label_style(config.font());
        if show_ylabel {
            mesh.y_desc(y_desc);
        }
        mesh.draw().map_err(render_error)?;
    }

    for (label, machine_idx, nodes, points) in series {
        let color = config.color(machine_idx);
        let marker = config.markers[machine_idx];

        if nodes == 1 {
            chart
                .draw_series(LineSeries::new(
                    points.iter().copied(),
                    color.stroke_width(config.line_width),
                ))
                .map_err(render_error)?
                .label(label)
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(2))
                });
        } else {
            chart
                .draw_series(DashedLineSeries::new(
                    points.iter().copied(),
                    4,
                    4,
                    color.stroke_width(config.line_width),
                ))
                .map_err(render_error)?
                .label(label)
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(2))
                });
        }
        chart
            .draw_series(points.into_iter().map(|pos| {
                render::marker_element(marker, pos, config.marker_size, color.filled())
            }))
            .map_err(render_error)?;
    }

    let legend_position = if is_bandwidth {
        SeriesLabelPosition::LowerRight
    } else {
        SeriesLabelPosition::UpperLeft
    };
    chart
        .configure_series_labels()
        .position(legend_position)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(config.font())
        .draw()
        .map_err(render_error)?;
    Ok(())
}

fn render_error<E: std::fmt::Display>(e: E) -> anyhow::Error {
    anyhow::anyhow!("{e}")
}
