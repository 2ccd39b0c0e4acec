use std::{
    io::stdout,
    path::{Path, PathBuf},
};

use common::{
    config::Config,
    metrics::DerivedTables,
    plot::{Plot, PlotData, artifact_path},
    render::{RenderJob, render_charts},
    result::{ResultRow, load_results},
};
use console::style;
use eyre::{Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use tokio::{
    fs::{create_dir_all, read_to_string, write},
    task::spawn_blocking,
};
use tracing::{debug, info};

pub struct ReportArgs {
    pub input: PathBuf,
    pub config: Option<PathBuf>,
    pub output: PathBuf,
    pub only: Option<String>,
    pub no_progress: bool,
}

pub async fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => serde_yml::from_str(
            &read_to_string(path)
                .await
                .wrap_err_with(|| format!("Reading {}", path.display()))?,
        )
        .wrap_err_with(|| format!("Parsing {}", path.display())),
        None => Ok(Config::default()),
    }
}

fn configured_plots(config: &Config) -> Vec<Box<dyn Plot>> {
    config
        .plots
        .clone()
        .unwrap_or_else(default_plots::default_plots)
}

async fn load_table(input: &Path) -> Result<Vec<ResultRow>> {
    let path = input.to_path_buf();
    spawn_blocking(move || load_results(&path))
        .await?
        .wrap_err_with(|| format!("Loading {}", input.display()))
}

async fn derive(input: &Path, config: &Config) -> Result<(Vec<ResultRow>, DerivedTables)> {
    let rows = load_table(input).await?;
    let derived = DerivedTables::derive(&rows, config.settings.missing_baseline)
        .wrap_err("Deriving speedup and efficiency")?;
    Ok((rows, derived))
}

/// Runs the whole pipeline and returns the files written
pub async fn run_report(args: ReportArgs) -> Result<Vec<PathBuf>> {
    let config = load_config(args.config.as_deref()).await?;
    let (rows, derived) = derive(&args.input, &config).await?;

    create_dir_all(&args.output)
        .await
        .wrap_err_with(|| format!("Creating {}", args.output.display()))?;
    let mut written = Vec::new();

    if config.settings.write_derived {
        for (filename, is_speedup) in [("speedup.csv", true), ("efficiency.csv", false)] {
            let mut buf = Vec::new();
            if is_speedup {
                derived.write_speedup(&mut buf)?;
            } else {
                derived.write_efficiency(&mut buf)?;
            }
            let path = args.output.join(filename);
            write(&path, buf).await?;
            written.push(path);
        }
    }

    let only = args.only.as_deref().map(Regex::new).transpose()?;
    let data = PlotData::new(&rows, &derived);
    let jobs = configured_plots(&config)
        .iter()
        .filter(|plot| only.as_ref().is_none_or(|r| r.is_match(plot.name())))
        .map(|plot| {
            Ok(RenderJob {
                filepath: artifact_path(&args.output, plot.name(), config.settings.format),
                spec: plot
                    .chart(&data)
                    .wrap_err_with(|| format!("Building {}", plot.name()))?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    debug!("Rendering {} charts for {}", jobs.len(), config.name);

    let progress = if args.no_progress {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(jobs.len() as u64)
    };
    progress.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    written.extend(jobs.iter().map(|job| job.filepath.clone()));
    let canvas = config.settings.canvas();
    let bar = progress.clone();
    spawn_blocking(move || {
        render_charts(&jobs, canvas, |job| {
            bar.set_message(job.filepath.display().to_string());
            bar.inc(1);
        })
    })
    .await??;
    progress.finish_and_clear();

    info!(
        "Wrote {} files to {}",
        written.len(),
        args.output.display()
    );
    Ok(written)
}

pub async fn print_derived(input: &Path, config: Option<&Path>) -> Result<()> {
    let config = load_config(config).await?;
    let (_, derived) = derive(input, &config).await?;
    derived.write_speedup(stdout())?;
    println!();
    derived.write_efficiency(stdout())?;
    Ok(())
}

pub async fn list_views(config: Option<&Path>) -> Result<()> {
    let config = load_config(config).await?;
    for plot in configured_plots(&config) {
        println!(
            "{} -> {}",
            style(plot.name()).bold(),
            artifact_path(Path::new(""), plot.name(), config.settings.format).display()
        );
    }
    Ok(())
}
