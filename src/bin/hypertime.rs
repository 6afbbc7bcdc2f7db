//! # hypertime
//!
//! Train a temporal model on a file of timestamped binary observations and
//! write one predicted probability per query timestamp.
//!
//! ```text
//! hypertime --train training.txt --test queries.txt --model HyT-EM --order 2
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `hypertime=info`); logs go to
//! stderr so stdout carries only the model summary.

use anyhow::{Context, Result};
use clap::Parser;
use hypertime::io::{parse_queries, parse_training, write_predictions};
use hypertime::temporal::{config::WEEK, ModelFactory, TemporalConfig, TemporalModel};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hypertime")]
#[command(about = "Predict binary environment states from periodic observations", long_about = None)]
struct Cli {
    /// Training file: one `timestamp state` pair per line
    #[arg(long, required_unless_present = "load")]
    train: Option<PathBuf>,

    /// Query file: one timestamp per line
    #[arg(long)]
    test: PathBuf,

    /// Model kind (None, Mean, Hist, FreMEn, HyT-EM, VonMises, ...)
    #[arg(short, long, default_value = "HyT-EM")]
    model: String,

    /// Model order (mixture components per class, or spectral elements)
    #[arg(short, long, default_value_t = 2)]
    order: usize,

    /// Longest period considered, in seconds
    #[arg(long, default_value_t = WEEK)]
    max_period: u32,

    /// Candidate periods examined per round
    #[arg(long, default_value_t = 10)]
    elements: usize,

    /// Restore a saved model instead of training
    #[arg(long)]
    load: Option<PathBuf>,

    /// Save the trained model to this path
    #[arg(long)]
    save: Option<PathBuf>,

    /// Prediction output file
    #[arg(long, default_value = "predictions.txt")]
    output: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hypertime=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = TemporalConfig::new(cli.max_period, cli.elements, 1)
        .context("invalid model configuration")?;
    let mut model = ModelFactory::new().create_by_name(&cli.model, config);

    match (&cli.load, &cli.train) {
        (Some(path), _) => {
            model.load(path).with_context(|| format!("loading model from {}", path.display()))?;
        }
        (None, Some(path)) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading training file {}", path.display()))?;
            let observations = parse_training(&text)
                .with_context(|| format!("parsing training file {}", path.display()))?;
            tracing::info!(observations = observations.len(), model = %model.kind(), "training");
            for o in &observations {
                model.add(o.timestamp, o.state)?;
            }
            model.update(cli.order).context("model update failed")?;
        }
        (None, None) => anyhow::bail!("either --train or --load is required"),
    }
    model.print(true);

    if let Some(path) = &cli.save {
        model.save(path).with_context(|| format!("saving model to {}", path.display()))?;
    }

    let text = fs::read_to_string(&cli.test)
        .with_context(|| format!("reading query file {}", cli.test.display()))?;
    let queries = parse_queries(&text)
        .with_context(|| format!("parsing query file {}", cli.test.display()))?;
    let predictions: Vec<f64> = queries.iter().map(|&t| model.predict(t)).collect();

    let file = File::create(&cli.output)
        .with_context(|| format!("creating {}", cli.output.display()))?;
    write_predictions(&mut BufWriter::new(file), &predictions)
        .with_context(|| format!("writing {}", cli.output.display()))?;
    tracing::info!(queries = predictions.len(), output = %cli.output.display(), "predictions written");
    Ok(())
}
