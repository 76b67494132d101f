use std::path::PathBuf;

use anyhow::Result;
use image::RgbImage;
use tracing::{Level, debug, span, trace};

use crate::landmark::{Landmark, LandmarkProvider};
use detection::FaceDetector;
use landmarks::FaceLandmarker;

mod detection;
mod landmarks;
mod model;

pub use model::init_runtime;

#[derive(Debug, Clone)]
pub struct MeshOptions {
    /// Directory holding the detector and landmark `.onnx` files.
    pub models_dir: PathBuf,
    /// onnxruntime intra-op threads per model.
    pub threads: usize,
    pub min_detection_confidence: f32,
}

/// MediaPipe style face mesh over still images: BlazeFace to find the face, then the face
/// landmark model on a crop around it.
///
/// Every call starts from scratch; nothing is tracked between images.
pub struct FaceMesh {
    face_detector: FaceDetector,
    face_landmarker: FaceLandmarker,
}

impl FaceMesh {
    pub fn new(opts: &MeshOptions) -> Result<FaceMesh> {
        Ok(FaceMesh {
            face_detector: FaceDetector::new(
                &opts.models_dir,
                opts.threads,
                opts.min_detection_confidence,
            )?,
            face_landmarker: FaceLandmarker::new(&opts.models_dir, opts.threads)?,
        })
    }
}

impl LandmarkProvider for FaceMesh {
    fn detect(&mut self, img: &RgbImage) -> Result<Option<Vec<Landmark>>> {
        let span = span!(Level::DEBUG, "face_mesh");
        let _guard = span.enter();

        let faces = self.face_detector.run(img)?;
        // single face mode: only the strongest detection is meshed
        let Some(face) = faces.first() else {
            debug!("No face found");
            return Ok(None);
        };
        trace!("Face bound: {face:?}");

        let landmarks = self.face_landmarker.run(img, face)?;
        trace!("Mesh of {} landmarks", landmarks.len());

        Ok(Some(landmarks))
    }
}
