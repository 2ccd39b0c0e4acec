use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eyre::Result;
use tracing::error;
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

mod report;

const DEFAULT_INPUT: &str = "data/results/performance_results.csv";

/// Crates whose logs follow the default level unless overridden with `--log`
const MODULES: &[&str] = &[
    "common",
    "plot_common",
    "speedup_analysis",
    "scaling_efficiency",
    "execution_time",
    "density_impact",
];

#[derive(Parser)]
#[command(version, about = "Speedup and efficiency charts from benchmark results")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(long, default_value_t = false)]
    no_progress: bool,
    #[arg(short, long)]
    log: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive metrics and render every configured chart
    Plot {
        /// Benchmark results table
        #[arg(short, long, default_value = DEFAULT_INPUT)]
        input: PathBuf,
        /// Report config, the default views are used without one
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output folder for the charts
        #[arg(short, long, default_value = "plots")]
        output: PathBuf,
        /// Only render views whose name matches this regex
        #[arg(long)]
        only: Option<String>,
    },
    /// Print the derived speedup and efficiency tables as CSV
    Derive {
        /// Benchmark results table
        #[arg(short, long, default_value = DEFAULT_INPUT)]
        input: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// List configured views
    Ls {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or("warn".to_owned());
    let args = Cli::parse();
    let file_appender = tracing_appender::rolling::never(".", "log.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let mut env_filter = EnvFilter::new(format!("scaling_report={log_level}"));

    if !args.log.is_empty() {
        for log in &args.log {
            env_filter = env_filter.add_directive(log.parse()?);
        }
    }

    for module in MODULES {
        if !args.log.iter().any(|x| x.starts_with(module)) {
            env_filter = env_filter.add_directive(format!("{module}={log_level}").parse()?);
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .compact(),
        )
        .with(layer().with_writer(non_blocking))
        .init();

    default_plots::init_plots()?;

    match args.command {
        Commands::Plot {
            input,
            config,
            output,
            only,
        } => {
            let report = report::ReportArgs {
                input,
                config,
                output,
                only,
                no_progress: args.no_progress,
            };
            if let Err(err) = report::run_report(report).await {
                error!("{err:#?}");
                return Err(err);
            }
        }
        Commands::Derive { input, config } => {
            report::print_derived(&input, config.as_deref()).await?
        }
        Commands::Ls { config } => report::list_views(config.as_deref()).await?,
    };

    Ok(())
}
