use std::path::Path;

use super::detection;
use super::model::{Session, initialize_model};
use crate::landmark::Landmark;
use crate::shapes::point::PointF32;
use crate::shapes::rect::Rect;
use anyhow::{Error, Result};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use ndarray::Array;
use ort::value::Tensor;
use tracing::{Level, debug, span};

pub struct FaceLandmarker {
    model: Session,
}

const HEIGHT: u32 = 192;
const WIDTH: u32 = 192;

// pad detector bounds so the whole jaw and forehead land in the crop
const CROP_SCALE: f32 = 1.5;

impl FaceLandmarker {
    pub fn new(models_dir: &Path, threads: usize) -> Result<FaceLandmarker> {
        Ok(FaceLandmarker {
            model: initialize_model(models_dir, "mediapipe_face_landmark.onnx", threads)?,
        })
    }

    /// Full face mesh for one detected face, normalized to `img`.
    pub fn run(&self, img: &RgbImage, face: &detection::Face) -> Result<Vec<Landmark>> {
        let span = span!(Level::DEBUG, "face_landmarker");
        let _guard = span.enter();

        let theta = face.rot_theta();
        debug!("Tilt: {}", theta.to_degrees());

        let mut bounds = face.bounds;
        bounds.scale(CROP_SCALE, img.width(), img.height());
        if bounds.area() == 0 {
            return Err(Error::msg(format!("Face bounds {bounds:?} are empty")));
        }

        let face_img =
            imageops::crop_imm(img, bounds.left(), bounds.top(), bounds.w, bounds.h).to_image();
        // level the eye line before the mesh model sees it
        let face_img = rotate_about_center(&face_img, -theta, Interpolation::Bilinear, Rgb([0, 0, 0]));
        let input_img = imageops::resize(&face_img, WIDTH, HEIGHT, FilterType::Triangle);

        let input_arr =
            Array::from_shape_fn((1, HEIGHT as usize, WIDTH as usize, 3), |(_, y, x, c)| {
                input_img.get_pixel(x as u32, y as u32)[c] as f32 / 255. // 0. - 1. range
            });
        let input = Tensor::from_array(input_arr)?;

        let model_span = span!(Level::DEBUG, "face_landmarker:model_run");
        let model_guard = model_span.enter();
        let outputs = self.model.run(ort::inputs!["input_1" => input]?)?;
        drop(model_guard);

        let output = outputs["conv2d_21"].try_extract_tensor::<f32>()?;
        let mesh = output
            .as_slice()
            .ok_or_else(|| Error::msg("Face mesh output is not contiguous"))?;

        Ok(extract_landmarks(
            mesh,
            bounds,
            theta,
            img.width(),
            img.height(),
        ))
    }
}

/// Map mesh model output (x, y, z triples in model input pixels) back onto the source image.
///
/// The crop at `run_bounds` was rotated by `-rotation` before inference, so each point is
/// scaled into the crop, offset into the image and rotated back about the crop center.
fn extract_landmarks(
    mesh: &[f32],
    run_bounds: Rect,
    rotation: f32,
    img_width: u32,
    img_height: u32,
) -> Vec<Landmark> {
    let x_scale = run_bounds.w as f32 / WIDTH as f32;
    let y_scale = run_bounds.h as f32 / HEIGHT as f32;
    let x_offset = run_bounds.left() as f32;
    let y_offset = run_bounds.top() as f32;
    let origin = run_bounds.center();
    let img_width = img_width as f32;
    let img_height = img_height as f32;

    mesh.chunks_exact(3)
        .map(|kpt| {
            let mut p = PointF32::new(x_offset + kpt[0] * x_scale, y_offset + kpt[1] * y_scale);
            p.rotate(origin, rotation);

            Landmark::with_depth(
                p.x / img_width,
                p.y / img_height,
                kpt[2] * x_scale / img_width,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn assert_close(actual: Landmark, expected: Landmark) {
        let close = (actual.x - expected.x).abs() < 1e-4
            && (actual.y - expected.y).abs() < 1e-4
            && (actual.z - expected.z).abs() < 1e-4;
        assert!(close, "{actual:?} != {expected:?}");
    }

    #[test]
    fn test_extract_upright() {
        // crop is 96x96 at (100, 50) of a 400x200 image, so model pixels are halved
        let bounds = Rect::from_tl(100, 50, 96, 96);
        let mesh = [0., 0., 0., 96., 96., 10., 192., 192., -4.];

        let landmarks = extract_landmarks(&mesh, bounds, 0., 400, 200);

        assert_eq!(landmarks.len(), 3);
        assert_close(landmarks[0], Landmark::with_depth(0.25, 0.25, 0.));
        assert_close(landmarks[1], Landmark::with_depth(148. / 400., 98. / 200., 5. / 400.));
        assert_close(landmarks[2], Landmark::with_depth(196. / 400., 146. / 200., -2. / 400.));
    }

    #[test]
    fn test_extract_rotates_back() {
        let bounds = Rect::from_tl(0, 0, 192, 192);
        // right of center in the leveled crop
        let mesh = [146., 96., 0.];

        let landmarks = extract_landmarks(&mesh, bounds, FRAC_PI_2, 192, 192);
        assert_close(landmarks[0], Landmark::with_depth(0.5, 146. / 192., 0.));
    }

    #[test]
    fn test_extract_ignores_partial_triple() {
        let bounds = Rect::from_tl(0, 0, 192, 192);
        let landmarks = extract_landmarks(&[1., 2., 3., 4.], bounds, 0., 192, 192);
        assert_eq!(landmarks.len(), 1);
    }
}
