mod adapters;
mod application;
mod config;
mod domain;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::adapters::{
    cli,
    onnx::{model_catalog::OnnxModelCatalog, runtime_probe::OrtRuntimeProbe},
    render::annotator::ImageAnnotator,
};
use crate::application::services::{DetectionService, EnvironmentService};
use crate::config::AppConfig;

fn main() -> anyhow::Result<()> {
    // 1. Logs go to stderr so the report on stdout stays clean (RUST_LOG=warn by default)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env();
    tracing::debug!(?config, "configuration loaded");

    // 2. Adapters
    let model_cat = Arc::new(OnnxModelCatalog::new(
        config.detector.params.clone(),
        config.detector.runtime.clone(),
    ));
    let probe = Arc::new(OrtRuntimeProbe::from_env());
    let annotator = Arc::new(ImageAnnotator::new());

    // 3. Services
    let environment = EnvironmentService::new(model_cat.clone(), probe);
    let detection = DetectionService::new(model_cat, annotator, config.detector.model.clone());

    // 4. Run; every outcome exits with status 0
    let args: Vec<String> = std::env::args().collect();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    cli::run(&args, &environment, &detection, &config.detector.model, &mut out);

    Ok(())
}
