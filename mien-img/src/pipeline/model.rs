use std::path::Path;

use anyhow::{Error, Result};
use ort::execution_providers;
use ort::session::builder::GraphOptimizationLevel;
pub use ort::session::Session;
use tracing::debug;

/// Set up the process-wide onnxruntime environment. Call once before loading any model.
pub fn init_runtime() -> Result<()> {
    ort::init()
        .with_name("mien")
        .with_execution_providers([execution_providers::XNNPACKExecutionProvider::default().build()])
        .commit()?;

    Ok(())
}

pub fn initialize_model(models_dir: &Path, filename: &str, threads: usize) -> Result<Session> {
    let path = models_dir.join(filename);
    if !path.is_file() {
        return Err(Error::msg(format!("Model not found at {}", path.display())));
    }
    debug!("Loading model {}", path.display());

    let model = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(threads.max(1))?
        .commit_from_file(path)?;

    Ok(model)
}
