use serde::Serialize;

use crate::geometry::{ContourMetrics, Point, width_in_band};

/// Ceiling for every reported confidence.
pub const MAX_CONFIDENCE: f32 = 0.95;

/// Share of the face height sampled at the forehead and at the jaw.
const BAND_FRACTION: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceShape {
    #[default]
    Oval,
    Round,
    Square,
    Heart,
    Oblong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LipFullness {
    Thin,
    #[default]
    Medium,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification<L> {
    pub label: L,
    pub confidence: f32,
}

impl<L> Classification<L> {
    pub fn new(label: L, score: f32) -> Classification<L> {
        Classification {
            label,
            confidence: score.clamp(0., MAX_CONFIDENCE),
        }
    }
}

impl<L: Default> Classification<L> {
    /// The default label with zero confidence, for when there is nothing to measure.
    pub fn unknown() -> Classification<L> {
        Classification {
            label: L::default(),
            confidence: 0.,
        }
    }
}

/// Face shape from the face-oval contour.
///
/// Compares the overall aspect ratio with the ratio of forehead width to jaw width, each sampled
/// over a quarter of the face height.
pub fn classify_face_shape(
    points: &[Point],
    metrics: Option<&ContourMetrics>,
) -> Classification<FaceShape> {
    let Some(metrics) = metrics else {
        return Classification::unknown();
    };
    if points.is_empty() {
        return Classification::unknown();
    }

    let min_y = metrics.bbox.min_y;
    let max_y = metrics.bbox.max_y;
    let band = (max_y - min_y) * BAND_FRACTION;

    let top_w = width_in_band(points, min_y, min_y + band);
    let bottom_w = width_in_band(points, max_y - band, max_y);
    let ratio_top_bottom = if bottom_w > 0. { top_w / bottom_w } else { 1. };

    face_shape_from_ratios(metrics.aspect_ratio, ratio_top_bottom)
}

/// Threshold ladder behind [`classify_face_shape`]. First matching rule wins.
pub fn face_shape_from_ratios(ar: f32, ratio_top_bottom: f32) -> Classification<FaceShape> {
    let (label, score) = if ar > 0.95 && ar < 1.15 {
        (FaceShape::Round, 0.7)
    } else if ar > 1.0 && ratio_top_bottom < 0.85 {
        (FaceShape::Oblong, 0.65)
    } else if ratio_top_bottom > 1.2 {
        (FaceShape::Heart, 0.65)
    } else if ratio_top_bottom < 0.9 && ar < 0.95 {
        (FaceShape::Square, 0.6)
    } else {
        (FaceShape::Oval, 0.6)
    };

    Classification::new(label, score)
}

/// Lip fullness from the lip contour's aspect ratio and its area relative to the face.
pub fn classify_lip_fullness(
    face: Option<&ContourMetrics>,
    lips: Option<&ContourMetrics>,
) -> Classification<LipFullness> {
    let (Some(face), Some(lips)) = (face, lips) else {
        return Classification::unknown();
    };

    let face_area = or_one(face.width) * or_one(face.height);
    let lip_area = lips.width * lips.height;
    let lip_to_face = if face_area > 0. {
        lip_area / face_area
    } else {
        0.
    };

    lip_fullness_from_ratios(lips.aspect_ratio, lip_to_face)
}

/// Threshold ladder behind [`classify_lip_fullness`]. First matching rule wins.
pub fn lip_fullness_from_ratios(lip_aspect: f32, lip_to_face: f32) -> Classification<LipFullness> {
    // wide, flat lips read as thin; tall ones as full
    let (label, score) = if lip_aspect > 4.5 || lip_to_face < 0.008 {
        (LipFullness::Thin, 0.65)
    } else if lip_aspect < 2.8 || lip_to_face > 0.02 {
        (LipFullness::Full, 0.65)
    } else {
        (LipFullness::Medium, 0.6)
    };

    Classification::new(label, score)
}

fn or_one(dim: f32) -> f32 {
    if dim == 0. { 1. } else { dim }
}
