use std::{
    fs,
    ops::Range,
    path::{Path, PathBuf},
};

use eyre::{Result, WrapErr, bail};
use plotters::{
    coord::{Shift, ranged1d::ValueFormatter},
    prelude::*,
    series::DashedLineSeries,
};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::{debug, warn};

use crate::{
    plot::{ChartSpec, ImageFormat, SeriesStyle},
    util::format_tick,
};

const FONT: &str = "sans-serif";

/// Output surface shared by every chart of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct RenderJob {
    pub filepath: PathBuf,
    pub spec: ChartSpec,
}

/// Renders every job in parallel. All jobs run to completion; the first failure is returned.
pub fn render_charts<F>(jobs: &[RenderJob], canvas: Canvas, on_done: F) -> Result<()>
where
    F: Fn(&RenderJob) + Sync,
{
    let results = jobs
        .par_iter()
        .map(|job| {
            let result = render_chart(&job.spec, &job.filepath, canvas)
                .wrap_err_with(|| format!("Rendering {}", job.filepath.display()));
            on_done(job);
            result
        })
        .collect::<Vec<_>>();
    for item in results {
        item?;
    }
    Ok(())
}

pub fn render_chart(spec: &ChartSpec, filepath: &Path, canvas: Canvas) -> Result<()> {
    if let Some(parent) = filepath.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)?;
    }

    let size = (canvas.width, canvas.height);
    match canvas.format {
        ImageFormat::Svg => {
            let root = SVGBackend::new(filepath, size).into_drawing_area();
            draw(&root, spec)?;
            root.present()?;
        }
    }
    debug!("Wrote {}", filepath.display());
    Ok(())
}

fn axis_range(min: f64, max: f64, log_scale: bool) -> Result<Range<f64>> {
    if log_scale {
        if min <= 0.0 {
            bail!("Log scaled axis needs positive values, got {min}");
        }
        return Ok((min / 1.5)..(max * 1.5));
    }
    let span = if max > min {
        max - min
    } else {
        max.abs().max(1.0)
    };
    Ok((min - span * 0.05)..(max + span * 0.05))
}

fn draw<DB>(root: &DrawingArea<DB, Shift>, spec: &ChartSpec) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let ((x_min, x_max), (y_min, y_max)) = match spec.bounds() {
        Some(bounds) => bounds,
        None => {
            warn!("Chart '{}' has no data points", spec.title);
            ((1.0, 10.0), (1.0, 10.0))
        }
    };
    let x_range = axis_range(x_min, x_max, spec.x_axis.log_scale)?;
    let y_range = axis_range(y_min, y_max, spec.y_axis.log_scale)?;

    let mut builder = ChartBuilder::on(root);
    builder
        .caption(&spec.title, (FONT, 24))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(70);

    match (spec.x_axis.log_scale, spec.y_axis.log_scale) {
        (false, false) => draw_series(builder.build_cartesian_2d(x_range, y_range)?, spec),
        (true, false) => draw_series(
            builder.build_cartesian_2d(x_range.log_scale(), y_range)?,
            spec,
        ),
        (false, true) => draw_series(
            builder.build_cartesian_2d(x_range, y_range.log_scale())?,
            spec,
        ),
        (true, true) => draw_series(
            builder.build_cartesian_2d(x_range.log_scale(), y_range.log_scale())?,
            spec,
        ),
    }
}

fn draw_series<'a, DB, X, Y>(
    mut chart: ChartContext<'a, DB, Cartesian2d<X, Y>>,
    spec: &ChartSpec,
) -> Result<()>
where
    DB: DrawingBackend + 'a,
    DB::ErrorType: 'static,
    X: Ranged<ValueType = f64> + ValueFormatter<f64>,
    Y: Ranged<ValueType = f64> + ValueFormatter<f64>,
{
    chart
        .configure_mesh()
        .x_desc(spec.x_axis.label.as_str())
        .y_desc(spec.y_axis.label.as_str())
        .x_label_formatter(&|x| format_tick(*x))
        .y_label_formatter(&|y| format_tick(*y))
        .axis_desc_style((FONT, 18))
        .draw()?;

    let mut color_idx = 0;
    for series in &spec.series {
        if series.points.is_empty() {
            warn!("Series '{}' of '{}' is empty", series.label, spec.title);
            continue;
        }
        let points = series.points.clone();
        let label = series.label.as_str();

        match series.style {
            SeriesStyle::Line => {
                let color = Palette99::pick(color_idx).mix(1.0);
                color_idx += 1;
                chart
                    .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))?
                    .label(label)
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                    });
                chart.draw_series(
                    points
                        .into_iter()
                        .map(|p| Circle::new(p, 4, color.filled())),
                )?;
            }
            SeriesStyle::Scatter => {
                let color = Palette99::pick(color_idx).mix(1.0);
                color_idx += 1;
                chart
                    .draw_series(points.into_iter().map(|p| {
                        EmptyElement::at(p) + Rectangle::new([(-5, -5), (5, 5)], color.filled())
                    }))?
                    .label(label)
                    .legend(move |(x, y)| {
                        Rectangle::new([(x + 5, y - 5), (x + 15, y + 5)], color.filled())
                    });
            }
            SeriesStyle::Reference => {
                chart
                    .draw_series(DashedLineSeries::new(
                        points,
                        10,
                        6,
                        BLACK.stroke_width(2),
                    ))?
                    .label(label)
                    .legend(|(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], BLACK.stroke_width(2))
                    });
            }
        }
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font((FONT, 16))
        .draw()?;
    Ok(())
}
