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
use std::{collections::HashSet, fs, path::PathBuf, process};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use itertools::Itertools;
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::Serialize;

use parcelplot::prelude::*;
use parcelplot::render::Palette;
use parcelplot::{aggregate, render};

#[derive(Parser, Debug)]
#[command(about = "Generate benchmark scaling figures.", long_about = None)]
struct Args {
    /// Type of benchmark figure.
    #[arg(short, long, value_enum, default_value_t = Plot::WeakStrongScaling)]
    plot: Plot,
    /// Compiler environments.
    #[arg(long, num_args = 1.., default_values_t = ["cray".to_string()])]
    compiler_suites: Vec<String>,
    /// Test case to analyse.
    #[arg(long, default_value = "random")]
    test_case: String,
    /// Communication methods for the efficiency figure.
    #[arg(long, value_enum, num_args = 1..,
          default_values_t = [CommMethod::P2p, CommMethod::Rma, CommMethod::Shmem])]
    comm: Vec<CommMethod>,
    /// Timer data to visualise.
    #[arg(long, num_args = 1..,
          default_values_t = [
              "parcel merge (total)".to_string(),
              "find nearest".to_string(),
              "build graphs".to_string(),
              "resolve graphs".to_string(),
          ])]
    timings: Vec<String>,
    /// Data directory.
    #[arg(long, default_value = ".")]
    path: PathBuf,
    /// Figure save directory.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
    /// Markers for the line plots.
    #[arg(long, num_args = 1..,
          default_values_t = [MarkerKind::Circle, MarkerKind::Square, MarkerKind::Diamond])]
    markers: Vec<MarkerKind>,
    /// Colour palette for plotting.
    #[arg(long, value_enum, default_value_t = Palette::Tab10)]
    palette: Palette,
    /// Number of runs to use (-1: all available).
    #[arg(long, default_value_t = -1)]
    nruns: i64,
    /// Add the ideal scaling line to the plot.
    #[arg(long)]
    add_ideal_scaling: bool,
    /// Typeset labels as TeX math.
    #[arg(long)]
    enable_latex: bool,
    /// Use sub-communicator data.
    #[arg(long)]
    use_subcomm: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, strum::Display)]
#[strum(serialize_all = "kebab-case")]
enum Plot {
    /// Run time of the timer series against the node count.
    #[default]
    WeakStrongScaling,
    /// Strong-scaling parallel efficiency bars per grid configuration.
    StrongEfficiency,
    /// Min/max communication call counts against the node count.
    CommStats,
}

/// Raw data point written next to the scaling figure.
#[derive(Serialize)]
struct ScalingRecord<'a> {
    machine: &'a str,
    compiler: &'a str,
    comm: &'a str,
    grid: String,
    nodes: u32,
    series: &'a str,
    mean: f64,
    std: f64,
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
        args.palette,
        args.markers.clone(),
    );

    let catalog = Catalog::scan(
        &args.path,
        &args.compiler_suites,
        &args.test_case,
        args.use_subcomm,
    )?;

    for machine in catalog.machines.keys() {
        log::info!("Generating a {} plot for {machine}.", args.plot);
        match args.plot {
            Plot::WeakStrongScaling => generate_scaling_plot(&catalog, machine, &args, &config)?,
            Plot::StrongEfficiency => {
                generate_strong_efficiency_plot(&catalog, machine, &args, &config)?
            }
            Plot::CommStats => generate_comm_stats_plot(&catalog, machine, &args, &config)?,
        }
    }
    Ok(())
}

fn subcomm_tag(catalog: &Catalog) -> &'static str {
    if catalog.use_subcomm {
        "-subcomm"
    } else {
        ""
    }
}

fn node_axis_label(tasks_per_node: Option<u32>) -> String {
    match tasks_per_node {
        Some(tasks) => format!("number of nodes (1 node = {tasks} cores)"),
        None => "number of nodes".to_string(),
    }
}

/// Legend names of the well-known timer series; anything else keeps its
/// column name.
fn timer_label(series: &str) -> &str {
    match series {
        "parcel merge (total)" => "parcel merge",
        "find nearest" => "NNS",
        "build graphs" => "DG construction",
        "resolve graphs" => "DG pruning",
        other => other,
    }
}

// ---------------------------------------------------------------------------
// weak/strong scaling

fn generate_scaling_plot(
    catalog: &Catalog,
    machine: &str,
    args: &Args,
    config: &RenderConfig,
) -> Result<()> {
    let entry = &catalog.machines[machine];
    for suite in &args.compiler_suites {
        if !entry.compilers.contains(suite) {
            continue;
        }
        let comms: Vec<CommMethod> = entry.comms.iter().copied().collect();
        let (nrows, ncols) = render::panel_grid(comms.len());

        let stem = format!(
            "{machine}-{suite}-{}{}-scaling",
            catalog.test_case,
            subcomm_tag(catalog)
        );
        let figure = config.figure_path(&format!("{stem}.svg"));
        let mut export = csv::Writer::from_path(config.figure_path(&format!("{stem}.csv")))?;

        let root = SVGBackend::new(&figure, (450 * ncols as u32, 425 * nrows as u32))
            .into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;
        let panels = root.split_evenly((nrows, ncols));

        for (i, comm) in comms.iter().enumerate() {
            draw_scaling_panel(
                &panels[i],
                catalog,
                machine,
                suite,
                *comm,
                args,
                config,
                &mut export,
                i >= (nrows - 1) * ncols,
                i % ncols == 0,
            )
            .with_context(|| format!("panel for {comm}"))?;
        }
        root.present().map_err(render_error)?;
        export.flush()?;
        log::info!("Wrote {figure:?}");
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn draw_scaling_panel(
    panel: &DrawingArea<SVGBackend, Shift>,
    catalog: &Catalog,
    machine: &str,
    suite: &str,
    comm: CommMethod,
    args: &Args,
    config: &RenderConfig,
    export: &mut csv::Writer<fs::File>,
    show_xlabel: bool,
    show_ylabel: bool,
) -> Result<()> {
    let entry = &catalog.machines[machine];
    let query = GroupQuery {
        machine: machine.to_string(),
        compiler: suite.to_string(),
        comm,
        grid: None,
    };
    let groups = catalog.groups(&query);
    config.ensure_markers(groups.len())?;

    let runs = RunSelection::from_flag(args.nruns);
    let mut per_group: Vec<(&RunGroup, GroupData)> = Vec::new();
    for group in groups {
        let data = aggregate::timings(catalog, group, &args.timings, runs)
            .with_context(|| format!("loading timings of {}", group.key))?;
        per_group.push((group, data));
    }

    // axis ranges over everything the panel will show
    let x_range = render::log_range(
        per_group
            .iter()
            .flat_map(|(group, _)| group.nodes.iter().map(|&n| f64::from(n))),
    );
    let mut y_values: Vec<f64> = Vec::new();
    for (group, data) in &per_group {
        for series in &args.timings {
            for (mean, std) in data.primary[series].iter().zip(&data.secondary[series]) {
                y_values.push(mean - std);
                y_values.push(mean + std);
            }
        }
        if args.add_ideal_scaling {
            if let Some(baseline) = data.primary[&args.timings[0]].first() {
                let n0 = f64::from(group.nodes[0]);
                y_values
                    .extend(group.nodes.iter().map(|&n| baseline * n0 / f64::from(n)));
            }
        }
    }
    let y_range = render::log_range(y_values.into_iter());

    let mut chart = ChartBuilder::on(panel)
        .caption(comm.title(), config.caption_font())
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d(x_range.log_scale(), y_range.clone().log_scale())
        .map_err(render_error)?;

    {
        let mut mesh = chart.configure_mesh();
        mesh.x_label_style(config.font()).y_label_style(config.font());
        if show_xlabel {
            mesh.x_desc(node_axis_label(entry.tasks_per_node));
        }
        if show_ylabel {
            mesh.y_desc("run time (s)");
        }
        mesh.draw().map_err(render_error)?;
    }

    if args.add_ideal_scaling {
        if let Some((group, data)) = per_group.first() {
            if let Some(&baseline) = data.primary[&args.timings[0]].first() {
                let n0 = f64::from(group.nodes[0]);
                let ideal = group
                    .nodes
                    .iter()
                    .map(|&n| (f64::from(n), baseline * n0 / f64::from(n)));
                chart
                    .draw_series(DashedLineSeries::new(
                        ideal,
                        4,
                        4,
                        BLACK.stroke_width(config.line_width),
                    ))
                    .map_err(render_error)?
                    .label("ideal scaling")
                    .legend(|(x, y)| {
                        PathElement::new(vec![(x, y), (x + 18, y)], BLACK.stroke_width(1))
                    });
            }
        }
    }

    for (j, (group, data)) in per_group.iter().enumerate() {
        let marker = config.markers[j];
        let nodes: Vec<f64> = group.nodes.iter().map(|&n| f64::from(n)).collect();
        for (i, series) in args.timings.iter().enumerate() {
            let color = config.color(i);
            let means = &data.primary[series];
            let stds = &data.secondary[series];

            for ((&node, &mean), &std) in group.nodes.iter().zip(means).zip(stds) {
                export.serialize(ScalingRecord {
                    machine,
                    compiler: suite,
                    comm: comm.method_label(),
                    grid: group.key.grid.to_string(),
                    nodes: node,
                    series,
                    mean,
                    std,
                })?;
            }

            chart
                .draw_series(nodes.iter().zip(means).zip(stds).map(
                    |((&x, &mean), &std)| {
                        // the lower whisker may fall below the log range
                        let lo = (mean - std).max(y_range.start);
                        let hi = (mean + std).max(y_range.start);
                        ErrorBar::new_vertical(
                            x,
                            lo,
                            mean,
                            hi,
                            color.stroke_width(config.line_width),
                            6,
                        )
                    },
                ))
                .map_err(render_error)?;

            let line = chart
                .draw_series(LineSeries::new(
                    nodes.iter().zip(means).map(|(&x, &mean)| (x, mean)),
                    color.stroke_width(config.line_width),
                ))
                .map_err(render_error)?;
            if j == 0 {
                line.label(timer_label(series)).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(2))
                });
            }

            chart
                .draw_series(nodes.iter().zip(means).map(|(&x, &mean)| {
                    render::marker_element(marker, (x, mean), config.marker_size, color.filled())
                }))
                .map_err(render_error)?;
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(config.font())
        .draw()
        .map_err(render_error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// strong-scaling efficiency

fn generate_strong_efficiency_plot(
    catalog: &Catalog,
    machine: &str,
    args: &Args,
    config: &RenderConfig,
) -> Result<()> {
    let entry = &catalog.machines[machine];
    let timing = args
        .timings
        .first()
        .context("at least one timer series is required")?;
    let tag = timing.replace(' ', "-").replace(['(', ')'], "");

    for suite in &args.compiler_suites {
        if !entry.compilers.contains(suite) {
            continue;
        }
        let grids = entry.sorted_grids();
        if grids.is_empty() {
            continue;
        }
        let (nrows, ncols) = render::panel_grid(grids.len());

        let figure = config.figure_path(&format!("{machine}-{suite}-{tag}-strong-efficiency.svg"));
        let root = SVGBackend::new(&figure, (500 * ncols as u32, 500 * nrows as u32))
            .into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;
        let panels = root.split_evenly((nrows, ncols));

        for (j, grid) in grids.iter().enumerate() {
            draw_efficiency_panel(
                &panels[j],
                catalog,
                machine,
                suite,
                *grid,
                timing,
                args,
                config,
                j % ncols == 0,
            )
            .with_context(|| format!("panel for {grid}"))?;
        }
        root.present().map_err(render_error)?;
        log::info!("Wrote {figure:?}");
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn draw_efficiency_panel(
    panel: &DrawingArea<SVGBackend, Shift>,
    catalog: &Catalog,
    machine: &str,
    suite: &str,
    grid: GridShape,
    timing: &str,
    args: &Args,
    config: &RenderConfig,
    show_ylabel: bool,
) -> Result<()> {
    let entry = &catalog.machines[machine];
    let comms: Vec<CommMethod> = args.comm.iter().copied().sorted().dedup().collect();
    config.ensure_palette(comms.len())?;

    let runs = RunSelection::from_flag(args.nruns);
    let mut bars: Vec<(usize, CommMethod, Vec<f64>)> = Vec::new();
    let mut axis_nodes: Vec<u32> = Vec::new();
    for (i, comm) in comms.iter().enumerate() {
        let query = GroupQuery {
            machine: machine.to_string(),
            compiler: suite.to_string(),
            comm: *comm,
            grid: Some(grid),
        };
        for group in catalog.groups(&query) {
            let data = aggregate::timings(catalog, group, &args.timings, runs)
                .with_context(|| format!("loading timings of {}", group.key))?;
            let eff = aggregate::strong_efficiency(&group.nodes, &data.primary[timing]);
            if group.nodes.len() > axis_nodes.len() {
                axis_nodes = group.nodes.clone();
            }
            bars.push((i, *comm, eff));
        }
    }

    let n_slots = axis_nodes.len().max(1);
    let mut chart = ChartBuilder::on(panel)
        .caption(
            render::grid_label(grid, config.label_mode),
            config.caption_font(),
        )
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d(-0.6f64..(n_slots as f64 - 0.4), 0f64..1.6f64)
        .map_err(render_error)?;

    let tick_nodes = axis_nodes.clone();
    let formatter = move |x: &f64| -> String {
        let idx = x.round();
        if (x - idx).abs() < 0.05 && idx >= 0.0 && (idx as usize) < tick_nodes.len() {
            tick_nodes[idx as usize].to_string()
        } else {
            String::new()
        }
    };
    {
        let mut mesh = chart.configure_mesh();
        mesh.disable_x_mesh()
            .x_labels(n_slots)
            .x_label_formatter(&formatter)
            .x_label_style(config.font())
            .y_label_style(config.font())
            .x_desc(node_axis_label(entry.tasks_per_node));
        if show_ylabel {
            mesh.y_desc("strong parallel efficiency");
        }
        mesh.draw().map_err(render_error)?;
    }

    // reference line at perfect efficiency
    chart
        .draw_series(LineSeries::new(
            [(-0.6, 1.0), (n_slots as f64 - 0.4, 1.0)],
            BLACK.stroke_width(1),
        ))
        .map_err(render_error)?;

    let width = 0.4 / comms.len() as f64;
    let mut labeled: HashSet<CommMethod> = HashSet::new();
    for (i, comm, eff) in bars {
        let color = config.color(i);
        let offset = width * (i as f64 - 0.5 * comms.len() as f64);
        let rects = eff.iter().enumerate().map(|(k, &value)| {
            let x0 = k as f64 + offset;
            (x0, x0 + width, value)
        });
        let filled = chart
            .draw_series(
                rects
                    .clone()
                    .map(|(x0, x1, value)| Rectangle::new([(x0, 0.0), (x1, value)], color.filled())),
            )
            .map_err(render_error)?;
        if labeled.insert(comm) {
            filled.label(comm.title()).legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled())
            });
        }
        chart
            .draw_series(rects.map(|(x0, x1, value)| {
                Rectangle::new([(x0, 0.0), (x1, value)], BLACK.stroke_width(1))
            }))
            .map_err(render_error)?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(config.font())
        .draw()
        .map_err(render_error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// communication call statistics

fn generate_comm_stats_plot(
    catalog: &Catalog,
    machine: &str,
    args: &Args,
    config: &RenderConfig,
) -> Result<()> {
    let entry = &catalog.machines[machine];
    for suite in &args.compiler_suites {
        if !entry.compilers.contains(suite) {
            continue;
        }
        let comms: Vec<CommMethod> = entry.comms.iter().copied().collect();
        let (nrows, ncols) = render::panel_grid(comms.len());

        let figure = config.figure_path(&format!(
            "{machine}-{suite}-{}{}-comm-stats.svg",
            catalog.test_case,
            subcomm_tag(catalog)
        ));
        let root = SVGBackend::new(&figure, (450 * ncols as u32, 425 * nrows as u32))
            .into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;
        let panels = root.split_evenly((nrows, ncols));

        for (i, comm) in comms.iter().enumerate() {
            draw_comm_stats_panel(
                &panels[i],
                catalog,
                machine,
                suite,
                *comm,
                config,
                i >= (nrows - 1) * ncols,
                i % ncols == 0,
            )
            .with_context(|| format!("panel for {comm}"))?;
        }
        root.present().map_err(render_error)?;
        log::info!("Wrote {figure:?}");
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn draw_comm_stats_panel(
    panel: &DrawingArea<SVGBackend, Shift>,
    catalog: &Catalog,
    machine: &str,
    suite: &str,
    comm: CommMethod,
    config: &RenderConfig,
    show_xlabel: bool,
    show_ylabel: bool,
) -> Result<()> {
    let entry = &catalog.machines[machine];
    let series: Vec<String> = comm.stat_series().iter().map(|s| s.to_string()).collect();
    let query = GroupQuery {
        machine: machine.to_string(),
        compiler: suite.to_string(),
        comm,
        grid: None,
    };
    let groups = catalog.groups(&query);
    config.ensure_markers(groups.len())?;

    let mut per_group: Vec<(&RunGroup, GroupData)> = Vec::new();
    for group in groups {
        let data = aggregate::comm_stats(catalog, group, &series)
            .with_context(|| format!("loading call counts of {}", group.key))?;
        for name in &series {
            let lo = data.primary[name].iter().cloned().fold(f64::INFINITY, f64::min);
            let hi = data.secondary[name]
                .iter()
                .cloned()
                .fold(f64::NEG_INFINITY, f64::max);
            log::info!("{name}\tmin: {lo}\tmax: {hi}");
        }
        per_group.push((group, data));
    }

    let x_range = render::log_range(
        per_group
            .iter()
            .flat_map(|(group, _)| group.nodes.iter().map(|&n| f64::from(n))),
    );
    let y_range = render::log_range(per_group.iter().flat_map(|(_, data)| {
        data.primary
            .values()
            .chain(data.secondary.values())
            .flatten()
            .copied()
    }));

    let mut chart = ChartBuilder::on(panel)
        .caption(comm.title(), config.caption_font())
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d(x_range.log_scale(), y_range.clone().log_scale())
        .map_err(render_error)?;

    {
        let mut mesh = chart.configure_mesh();
        mesh.x_label_style(config.font()).y_label_style(config.font());
        if show_xlabel {
            mesh.x_desc(node_axis_label(entry.tasks_per_node));
        }
        if show_ylabel {
            mesh.y_desc("number of calls");
        }
        mesh.draw().map_err(render_error)?;
    }

    for (j, (group, data)) in per_group.iter().enumerate() {
        let marker = config.markers[j];
        let nodes: Vec<f64> = group.nodes.iter().map(|&n| f64::from(n)).collect();
        for (i, name) in series.iter().enumerate() {
            let color = config.color(i);
            let clamp = |value: f64| value.max(y_range.start);

            // maxima as solid lines with markers, minima dashed
            let maxima = nodes
                .iter()
                .zip(&data.secondary[name])
                .map(|(&x, &value)| (x, clamp(value)))
                .collect::<Vec<_>>();
            let minima = nodes
                .iter()
                .zip(&data.primary[name])
                .map(|(&x, &value)| (x, clamp(value)))
                .collect::<Vec<_>>();

            let line = chart
                .draw_series(LineSeries::new(
                    maxima.iter().copied(),
                    color.stroke_width(config.line_width),
                ))
                .map_err(render_error)?;
            if j == 0 {
                line.label(name.clone()).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(2))
                });
            }
            chart
                .draw_series(DashedLineSeries::new(
                    minima.into_iter(),
                    4,
                    4,
                    color.stroke_width(config.line_width),
                ))
                .map_err(render_error)?;
            chart
                .draw_series(maxima.into_iter().map(|pos| {
                    render::marker_element(marker, pos, config.marker_size, color.filled())
                }))
                .map_err(render_error)?;
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(config.font())
        .draw()
        .map_err(render_error)?;
    Ok(())
}

/// Flattens plotters' backend-parameterized drawing errors for anyhow.
fn render_error<E: std::fmt::Display>(e: E) -> anyhow::Error {
    anyhow::anyhow!("{e}")
}
