use std::path::PathBuf;

use anyhow::{Error, Result};
use clap::Parser;
use mien_img::pipeline::MeshOptions;

#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "MIEN_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "MIEN_PORT", default_value = "5000")]
    pub port: u16,

    /// Directory containing the face detection and face landmark .onnx models
    #[arg(short, long, env = "MIEN_MODELS_DIR", default_value = "./models")]
    pub models_dir: PathBuf,

    /// Face meshes kept ready for requests. Defaults to half the available cores
    #[arg(long, env = "MIEN_POOL_SIZE")]
    pub pool_size: Option<usize>,

    /// onnxruntime threads per model
    #[arg(long, env = "MIEN_THREADS", default_value = "2")]
    pub threads: usize,

    /// Minimum face detector score for a face to count
    #[arg(long, env = "MIEN_MIN_DETECTION_CONFIDENCE", default_value = "0.5")]
    pub min_detection_confidence: f32,

    /// Largest accepted request body, in bytes
    #[arg(long, env = "MIEN_MAX_UPLOAD_BYTES", default_value = "10485760")]
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_detection_confidence) {
            return Err(Error::msg(format!(
                "min detection confidence must be within 0-1, got {}",
                self.min_detection_confidence
            )));
        }
        if self.pool_size == Some(0) {
            return Err(Error::msg("pool size must be at least 1"));
        }
        if self.threads == 0 {
            return Err(Error::msg("threads must be at least 1"));
        }
        if self.max_upload_bytes == 0 {
            return Err(Error::msg("max upload bytes must be at least 1"));
        }

        Ok(())
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
            .unwrap_or_else(|| num_cpus::get() / 2)
            .max(1)
    }

    pub fn mesh_options(&self) -> MeshOptions {
        MeshOptions {
            models_dir: self.models_dir.clone(),
            threads: self.threads,
            min_detection_confidence: self.min_detection_confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["mien"]).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.min_detection_confidence, 0.5);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert!(config.pool_size() >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flags() {
        let config = Config::try_parse_from([
            "mien",
            "--port",
            "8080",
            "--models-dir",
            "/srv/models",
            "--pool-size",
            "3",
            "--min-detection-confidence",
            "0.7",
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.pool_size(), 3);

        let opts = config.mesh_options();
        assert_eq!(opts.models_dir, PathBuf::from("/srv/models"));
        assert_eq!(opts.min_detection_confidence, 0.7);
    }

    #[test]
    fn test_validate_rejects() {
        let bad_confidence =
            Config::try_parse_from(["mien", "--min-detection-confidence", "1.5"]).unwrap();
        assert!(bad_confidence.validate().is_err());

        let empty_pool = Config::try_parse_from(["mien", "--pool-size", "0"]).unwrap();
        assert!(empty_pool.validate().is_err());
    }
}
