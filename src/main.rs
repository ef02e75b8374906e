mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tagvision::{DetectionService, LoadedModel};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = cli::Args::parse();

    let model = LoadedModel::load(&args.model, &args.labels)
        .with_context(|| format!("loading {}", args.model))?;
    let service = DetectionService::new(Arc::new(model));

    let response = if args.source.starts_with("http://") || args.source.starts_with("https://") {
        service.predict_url(&args.source)?
    } else {
        let bytes =
            std::fs::read(&args.source).with_context(|| format!("reading {}", args.source))?;
        service.predict_bytes(&bytes)?
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
