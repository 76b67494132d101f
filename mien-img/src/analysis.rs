use serde::Serialize;

use crate::classify::{
    Classification, FaceShape, LipFullness, classify_face_shape, classify_lip_fullness,
};
use crate::geometry::FaceGeometry;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceAnalysis {
    pub face_shape: Classification<FaceShape>,
    pub lip_fullness: Classification<LipFullness>,
}

impl FaceAnalysis {
    /// Result reported when no face was found: default labels, zero confidence.
    pub fn undetected() -> FaceAnalysis {
        FaceAnalysis {
            face_shape: Classification::unknown(),
            lip_fullness: Classification::unknown(),
        }
    }

    pub fn from_geometry(geometry: &FaceGeometry) -> FaceAnalysis {
        let face = &geometry.face_oval;
        let lips = &geometry.lips;

        FaceAnalysis {
            face_shape: classify_face_shape(&face.points, face.metrics.as_ref()),
            lip_fullness: classify_lip_fullness(face.metrics.as_ref(), lips.metrics.as_ref()),
        }
    }
}
