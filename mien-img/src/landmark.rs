use anyhow::Result;
use image::RgbImage;

/// A single face-mesh keypoint in coordinates normalized to the source image.
///
/// `x` and `y` are fractions of the image width and height. `z` is relative depth on roughly
/// the same scale as `x`, and is 0 when the provider doesn't report one.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Landmark {
        Landmark { x, y, z: 0. }
    }

    pub fn with_depth(x: f32, y: f32, z: f32) -> Landmark {
        Landmark { x, y, z }
    }
}

/// Finds the landmarks of at most one face in a still image.
///
/// Implementations follow the MediaPipe face-mesh ordering: index `i` of the returned vec is
/// always the same facial keypoint. `Ok(None)` means no face was found.
pub trait LandmarkProvider: Send {
    fn detect(&mut self, img: &RgbImage) -> Result<Option<Vec<Landmark>>>;
}
