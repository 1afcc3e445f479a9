#![forbid(unsafe_code)]

//! Chartflow CLI
//!
//! Aggregates JSON series fixtures into a chart-ready DataTable.

mod input;

use std::path::PathBuf;

use anyhow::{Result, bail};
use chartflow_aggregate::{AggregateOptions, Aggregator, DerivedConfig};
use chartflow_chart::{ChartOptions, ChartPanel, JsonSink, PanelView};
use chartflow_core::{ChartflowConfig, MergedTable, logging};
use chartflow_task::AsyncTask;
use clap::Parser;
use futures::FutureExt;

use crate::input::InputSeries;

/// Chartflow CLI - multi-series chart aggregation
#[derive(Parser, Debug)]
#[command(name = "chartflow-cli")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "CHARTFLOW_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// Merge series fixtures and print the DataTable JSON
    Aggregate {
        /// Series fixture (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Add a running-maximum series with this label
        #[arg(long)]
        max: Option<String>,

        /// Chart title (overrides the config)
        #[arg(long)]
        title: Option<String>,

        /// Indent the output
        #[arg(long)]
        pretty: bool,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ChartflowConfig::load_or_default(args.config.as_deref())?;
    logging::init(&config.logging)?;

    match args.command {
        Command::Aggregate {
            input,
            max,
            title,
            pretty,
        } => {
            let series = input::load(&input)?;
            let mut options = ChartOptions::from_config(&config.chart);
            if let Some(title) = title {
                options = options.with_title(title);
            }
            let view = aggregate(&config, series, max, options, pretty).await?;
            tracing::info!(?view, "Done");
        }
        Command::Config => {
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}

async fn aggregate(
    config: &ChartflowConfig,
    series: Vec<InputSeries>,
    max: Option<String>,
    options: ChartOptions,
    pretty: bool,
) -> Result<PanelView> {
    let engine = Aggregator::new(AggregateOptions::from_config(&config.aggregation));
    let task: AsyncTask<Vec<InputSeries>, MergedTable> =
        AsyncTask::new("cli", move |series: Vec<InputSeries>| {
            let engine = engine.clone();
            let derived: Vec<_> = max
                .iter()
                .map(|label| DerivedConfig::running_max(label.clone(), input::accessors()))
                .collect();
            async move { engine.aggregate(input::fetch_configs(series), derived).await }.boxed()
        });

    let rx = task.subscribe();
    let run = task.run(series);
    drop(task);
    let worker = tokio::spawn(run);

    let sink = JsonSink::new(std::io::stdout().lock()).pretty(pretty);
    let mut panel = ChartPanel::new(sink, options);
    let view = panel.follow(rx).await?;
    worker.await?;

    if let PanelView::Failed { message } = &view {
        bail!("aggregation failed: {message}");
    }
    Ok(view)
}
