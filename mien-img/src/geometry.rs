use std::collections::BTreeMap;

use image::RgbImage;
use serde::Serialize;

use crate::landmark::Landmark;
use contours::{FACE_OVAL, KEY_POINTS, LEFT_EYE, LEFT_EYEBROW, LIPS, NOSE, RIGHT_EYE, RIGHT_EYEBROW};

pub mod contours;

/// A landmark projected into pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Point {
        Point { x, y, z: 0. }
    }
}

/// Dimensions landmarks are scaled by. Defaults to the unit square, i.e. normalized space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub width: f32,
    pub height: f32,
}

impl Default for Frame {
    fn default() -> Frame {
        Frame {
            width: 1.,
            height: 1.,
        }
    }
}

impl Frame {
    pub fn new(width: f32, height: f32) -> Frame {
        Frame { width, height }
    }

    pub fn of(img: &RgbImage) -> Frame {
        Frame::new(img.width() as f32, img.height() as f32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContourMetrics {
    pub center: Point,
    pub width: f32,
    pub height: f32,
    pub aspect_ratio: f32,
    pub bbox: BoundingBox,
}

/// Pick `indices` out of `landmarks` and scale them into `frame`.
///
/// Indices past the end of `landmarks` are skipped, so an undersized mesh yields fewer points
/// (possibly none) rather than an error.
pub fn landmarks_to_points(landmarks: &[Landmark], indices: &[usize], frame: Frame) -> Vec<Point> {
    indices
        .iter()
        .filter_map(|&i| landmarks.get(i))
        .map(|lm| Point {
            x: lm.x * frame.width,
            y: lm.y * frame.height,
            z: lm.z,
        })
        .collect()
}

/// Axis-aligned extent of a point set. `None` for an empty set.
pub fn contour_metrics(points: &[Point]) -> Option<ContourMetrics> {
    let first = points.first()?;

    let mut bbox = BoundingBox {
        min_x: first.x,
        min_y: first.y,
        max_x: first.x,
        max_y: first.y,
    };
    let (mut sum_x, mut sum_y) = (0., 0.);
    for p in points {
        bbox.min_x = bbox.min_x.min(p.x);
        bbox.max_x = bbox.max_x.max(p.x);
        bbox.min_y = bbox.min_y.min(p.y);
        bbox.max_y = bbox.max_y.max(p.y);
        sum_x += p.x;
        sum_y += p.y;
    }

    let n = points.len() as f32;
    let width = bbox.max_x - bbox.min_x;
    let height = bbox.max_y - bbox.min_y;

    Some(ContourMetrics {
        center: Point::new(sum_x / n, sum_y / n),
        width,
        height,
        aspect_ratio: if height > 0. { width / height } else { 0. },
        bbox,
    })
}

/// Horizontal spread of the points with `y_min <= y <= y_max`, or 0 if none fall in the band.
pub fn width_in_band(points: &[Point], y_min: f32, y_max: f32) -> f32 {
    let mut xs = points
        .iter()
        .filter(|p| p.y >= y_min && p.y <= y_max)
        .map(|p| p.x);

    let Some(first) = xs.next() else {
        return 0.;
    };
    let (min, max) = xs.fold((first, first), |(min, max), x| (min.min(x), max.max(x)));

    max - min
}

#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub points: Vec<Point>,
    pub metrics: Option<ContourMetrics>,
}

impl Contour {
    pub fn from_landmarks(landmarks: &[Landmark], indices: &[usize], frame: Frame) -> Contour {
        let points = landmarks_to_points(landmarks, indices, frame);
        let metrics = contour_metrics(&points);
        Contour { points, metrics }
    }
}

/// Every named contour of one face, in pixel space.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceGeometry {
    pub face_oval: Contour,
    pub lips: Contour,
    pub left_eye: Contour,
    pub right_eye: Contour,
    pub left_eyebrow: Contour,
    pub right_eyebrow: Contour,
    pub nose: Contour,
    pub key_points: BTreeMap<&'static str, Point>,
}

/// Serializable digest of a [`FaceGeometry`]: per-contour metrics and the named keypoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometrySummary {
    pub metrics: BTreeMap<&'static str, Option<ContourMetrics>>,
    pub key_points: BTreeMap<&'static str, Point>,
}

impl FaceGeometry {
    pub fn from_landmarks(landmarks: &[Landmark], frame: Frame) -> FaceGeometry {
        let key_points = KEY_POINTS
            .iter()
            .filter_map(|&(name, i)| {
                landmarks_to_points(landmarks, &[i], frame)
                    .first()
                    .map(|p| (name, *p))
            })
            .collect();

        FaceGeometry {
            face_oval: Contour::from_landmarks(landmarks, &FACE_OVAL, frame),
            lips: Contour::from_landmarks(landmarks, &LIPS, frame),
            left_eye: Contour::from_landmarks(landmarks, &LEFT_EYE, frame),
            right_eye: Contour::from_landmarks(landmarks, &RIGHT_EYE, frame),
            left_eyebrow: Contour::from_landmarks(landmarks, &LEFT_EYEBROW, frame),
            right_eyebrow: Contour::from_landmarks(landmarks, &RIGHT_EYEBROW, frame),
            nose: Contour::from_landmarks(landmarks, &NOSE, frame),
            key_points,
        }
    }

    pub fn summary(&self) -> GeometrySummary {
        let metrics = BTreeMap::from([
            ("faceShape", self.face_oval.metrics),
            ("lipShape", self.lips.metrics),
            ("leftEye", self.left_eye.metrics),
            ("rightEye", self.right_eye.metrics),
            ("leftEyebrow", self.left_eyebrow.metrics),
            ("rightEyebrow", self.right_eyebrow.metrics),
            ("nose", self.nose.metrics),
        ]);

        GeometrySummary {
            metrics,
            key_points: self.key_points.clone(),
        }
    }
}
