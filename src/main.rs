#![warn(unused_extern_crates)]
use anyhow::Result;
use clap::Parser;
use mien::config::Config;
use mien::pool::LandmarkerPool;
use mien::server;
use mien_img::pipeline::{self, FaceMesh};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_env_filter(filter)
        .init();

    let config = Config::parse();
    config.validate()?;

    pipeline::init_runtime()?;

    let opts = config.mesh_options();
    let size = config.pool_size();
    let meshes = (0..size)
        .map(|_| FaceMesh::new(&opts))
        .collect::<Result<Vec<_>>>()?;
    let pool = LandmarkerPool::new(meshes)?;
    info!(
        "Loaded {} face meshes from {}",
        pool.size(),
        opts.models_dir.display()
    );

    server::serve(&config, pool).await
}
