pub mod analysis;
pub mod classify;
pub mod geometry;
pub mod landmark;
pub mod pipeline;
pub mod shapes;

pub use analysis::FaceAnalysis;
pub use landmark::{Landmark, LandmarkProvider};
