use std::path::Path;

use super::model::{Session, initialize_model};
use crate::shapes::point::PointF32;
use crate::shapes::rect::{Rect, RectF32};
use anchors::{ANCHOR_COUNT, gen_anchors};
use anyhow::{Error, Result};
use image::RgbImage;
use image::imageops::{self, FilterType};
use ndarray::Array;
use ort::value::Tensor;
use tracing::{Level, span, trace};

mod anchors;

const WIDTH: u32 = 128;
const HEIGHT: u32 = 128;

// 4 box values then 6 (x, y) keypoints: eyes, nose, mouth, ears
const REGRESSOR_LEN: usize = 16;

// Detections overlapping a stronger one by more than this (IoU, %) are dropped.
const MAX_OVERLAP_PCT: f32 = 30.;

pub struct FaceDetector {
    model: Session,
    anchors: Vec<RectF32>,
    min_confidence: f32,
}

#[derive(Debug, Clone)]
pub struct Face {
    pub bounds: Rect,
    pub l_eye: PointF32,
    pub r_eye: PointF32,
    pub confidence: f32,
}

impl Face {
    pub fn with_eyes(confidence: f32, bounds: Rect, l_eye: PointF32, r_eye: PointF32) -> Face {
        Face {
            l_eye,
            r_eye,
            bounds,
            confidence,
        }
    }

    /// Tilt of the eye line, radians clockwise.
    pub fn rot_theta(&self) -> f32 {
        let dx = self.r_eye.x - self.l_eye.x;
        let dy = self.r_eye.y - self.l_eye.y;
        dy.atan2(dx)
    }
}

impl FaceDetector {
    /*
    BlazeFace (short range) model wrapper. ort runs the model, results
    are decoded into faces here.

    Model Input: 1x128x128x3 f32 image, -1 to 1
    Model Output:
    - classificators: 896 raw confidence logits
    - regressors: 896x16 detection coords

    The first 4 regressor values are centroid offset, width and height
    relative to one of the 896 anchors (same index). The remaining 12
    values are keypoint offsets from the anchor center.
     */
    pub fn new(models_dir: &Path, threads: usize, min_confidence: f32) -> Result<FaceDetector> {
        Ok(FaceDetector {
            model: initialize_model(
                models_dir,
                "mediapipe_face_detection_short_range.onnx",
                threads,
            )?,
            anchors: gen_anchors(WIDTH, HEIGHT),
            min_confidence,
        })
    }

    /// Faces in `img`, strongest first.
    pub fn run(&self, img: &RgbImage) -> Result<Vec<Face>> {
        let span = span!(Level::DEBUG, "face_detector");
        let _guard = span.enter();

        let resized = imageops::resize(img, WIDTH, HEIGHT, FilterType::Triangle);
        let input_arr =
            Array::from_shape_fn((1, HEIGHT as usize, WIDTH as usize, 3), |(_, y, x, c)| {
                resized.get_pixel(x as u32, y as u32)[c] as f32 / 127.5 - 1. // -1. - 1. range
            });
        let input = Tensor::from_array(input_arr)?;

        let outputs = self.model.run(ort::inputs!["input" => input]?)?;
        let regressors = outputs["regressors"].try_extract_tensor::<f32>()?;
        let classificators = outputs["classificators"].try_extract_tensor::<f32>()?;

        let regressors = regressors
            .as_slice()
            .ok_or_else(|| Error::msg("Face detector regressors are not contiguous"))?;
        let scores = classificators
            .as_slice()
            .ok_or_else(|| Error::msg("Face detector scores are not contiguous"))?;

        decode_faces(
            &self.anchors,
            scores,
            regressors,
            self.min_confidence,
            (img.width(), img.height()),
        )
    }
}

/// Turn raw model outputs into faces in `img_dims` pixel space, strongest first.
fn decode_faces(
    anchors: &[RectF32],
    scores: &[f32],
    regressors: &[f32],
    min_confidence: f32,
    img_dims: (u32, u32),
) -> Result<Vec<Face>> {
    if scores.len() != ANCHOR_COUNT || regressors.len() != ANCHOR_COUNT * REGRESSOR_LEN {
        return Err(Error::msg(format!(
            "Unexpected face detector output sizes: {} scores, {} regressors",
            scores.len(),
            regressors.len()
        )));
    }

    let (img_w, img_h) = img_dims;
    let x_scale = img_w as f32 / WIDTH as f32;
    let y_scale = img_h as f32 / HEIGHT as f32;

    let mut candidates: Vec<Face> = Vec::new();
    for (idx, res) in regressors.chunks_exact(REGRESSOR_LEN).enumerate() {
        let score = sigmoid_stable(scores[idx]);
        if score < min_confidence {
            continue;
        }

        let mut anchor = anchors[idx];
        let (ax, ay) = (anchor.x, anchor.y);
        let bounds = anchor
            .adjust(res[0], res[1], res[2], res[3])
            .scale(x_scale, y_scale)
            .clip(img_w, img_h);
        if bounds.area() == 0 {
            continue;
        }

        let l_eye = PointF32::new((ax + res[4]) * x_scale, (ay + res[5]) * y_scale);
        let r_eye = PointF32::new((ax + res[6]) * x_scale, (ay + res[7]) * y_scale);
        candidates.push(Face::with_eyes(score, bounds, l_eye, r_eye));
    }

    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut results: Vec<Face> = Vec::new();
    for face in candidates {
        let overlaps = results
            .iter()
            .any(|kept| kept.bounds.overlap_pct(&face.bounds) > MAX_OVERLAP_PCT);
        if !overlaps {
            results.push(face);
        }
    }

    trace!("Detected {} faces", results.len());

    Ok(results)
}

fn sigmoid_stable(x: f32) -> f32 {
    if x >= 0. {
        1. / (1. + (-x).exp())
    } else {
        x.exp() / (1. + x.exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_outputs() -> (Vec<f32>, Vec<f32>) {
        (
            vec![-10.; ANCHOR_COUNT],
            vec![0.; ANCHOR_COUNT * REGRESSOR_LEN],
        )
    }

    fn place(
        scores: &mut [f32],
        regressors: &mut [f32],
        idx: usize,
        logit: f32,
        box_size: f32,
        eyes: [f32; 4],
    ) {
        scores[idx] = logit;
        let r = &mut regressors[idx * REGRESSOR_LEN..(idx + 1) * REGRESSOR_LEN];
        r[2] = box_size;
        r[3] = box_size;
        r[4..8].copy_from_slice(&eyes);
    }

    #[test]
    fn test_sigmoid() {
        assert_eq!(sigmoid_stable(0.), 0.5);
        assert!(sigmoid_stable(20.) > 0.999);
        assert!(sigmoid_stable(-20.) < 0.001);
        assert!(sigmoid_stable(-200.).is_finite());
    }

    #[test]
    fn test_nothing_detected() {
        let anchors = gen_anchors(WIDTH, HEIGHT);
        let (scores, regressors) = blank_outputs();
        let faces = decode_faces(&anchors, &scores, &regressors, 0.5, (256, 256)).unwrap();
        assert!(faces.is_empty());
    }

    #[test]
    fn test_decodes_and_suppresses() {
        let anchors = gen_anchors(WIDTH, HEIGHT);
        let (mut scores, mut regressors) = blank_outputs();
        // two anchors sharing the cell centered at (8, 8) on the stride 16 grid
        place(&mut scores, &mut regressors, 512, 2., 16., [-4., 0., 4., 0.]);
        place(&mut scores, &mut regressors, 513, 3., 16., [-4., 0., 4., 0.]);
        // a separate face in the bottom right
        place(&mut scores, &mut regressors, 895, 1., 8., [-2., 1., 2., -1.]);

        let faces = decode_faces(&anchors, &scores, &regressors, 0.5, (256, 256)).unwrap();

        assert_eq!(faces.len(), 2);
        assert_eq!(faces[0].confidence, sigmoid_stable(3.));
        assert_eq!(faces[0].bounds, Rect::from_tl(0, 0, 32, 32));
        assert_eq!(faces[0].l_eye, PointF32::new(8., 16.));
        assert_eq!(faces[0].r_eye, PointF32::new(24., 16.));
        assert_eq!(faces[0].rot_theta(), 0.);

        assert_eq!(faces[1].bounds, Rect::from_tl(232, 232, 16, 16));
        assert!(faces[1].rot_theta() < 0.);
    }

    #[test]
    fn test_respects_min_confidence() {
        let anchors = gen_anchors(WIDTH, HEIGHT);
        let (mut scores, mut regressors) = blank_outputs();
        place(&mut scores, &mut regressors, 100, 0.5, 16., [0.; 4]);

        let faces = decode_faces(&anchors, &scores, &regressors, 0.7, (128, 128)).unwrap();
        assert!(faces.is_empty());
        let faces = decode_faces(&anchors, &scores, &regressors, 0.5, (128, 128)).unwrap();
        assert_eq!(faces.len(), 1);
    }

    #[test]
    fn test_drops_negative_box() {
        let anchors = gen_anchors(WIDTH, HEIGHT);
        let (mut scores, mut regressors) = blank_outputs();
        place(&mut scores, &mut regressors, 512, 3., 16., [0.; 4]);
        regressors[512 * REGRESSOR_LEN + 2] = -16.;
        place(&mut scores, &mut regressors, 895, 1., 8., [0.; 4]);

        let faces = decode_faces(&anchors, &scores, &regressors, 0.5, (256, 256)).unwrap();

        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].bounds, Rect::from_tl(232, 232, 16, 16));
    }

    #[test]
    fn test_rejects_wrong_output_shape() {
        let anchors = gen_anchors(WIDTH, HEIGHT);
        assert!(decode_faces(&anchors, &[0.; 10], &[0.; 160], 0.5, (128, 128)).is_err());
    }
}
