use std::io::Cursor;
use std::sync::Arc;

use anyhow::{Error, Result};
use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::QueryRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use image::{DynamicImage, ImageDecoder, ImageReader, ImageResult, RgbImage};
use mien_img::geometry::{FaceGeometry, Frame, GeometrySummary};
use mien_img::{FaceAnalysis, LandmarkProvider};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{Level, debug, error, info, span};

use crate::config::Config;
use crate::pool::LandmarkerPool;
pub use error::ApiError;

mod error;

const IMAGE_FIELD: &str = "image";

pub struct AppState<P> {
    pool: Arc<LandmarkerPool<P>>,
}

impl<P> Clone for AppState<P> {
    fn clone(&self) -> Self {
        AppState {
            pool: Arc::clone(&self.pool),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeParams {
    /// Also report per-contour metrics and keypoints
    #[serde(default)]
    pub geometry: bool,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    #[serde(flatten)]
    pub analysis: FaceAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<GeometrySummary>,
}

pub fn router<P: LandmarkProvider + 'static>(
    pool: LandmarkerPool<P>,
    max_upload_bytes: usize,
) -> Router {
    let state = AppState {
        pool: Arc::new(pool),
    };

    Router::new()
        .route("/api/analyze-face", post(analyze_face::<P>))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve<P: LandmarkProvider + 'static>(
    config: &Config,
    pool: LandmarkerPool<P>,
) -> Result<()> {
    let app = router(pool, config.max_upload_bytes);

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(_) => info!("Shutting down"),
        Err(e) => error!("Failed to listen for shutdown signal: {e:?}"),
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn analyze_face<P: LandmarkProvider + 'static>(
    State(state): State<AppState<P>>,
    params: Result<Query<AnalyzeParams>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Query(params) = params?;
    let data = read_image_field(multipart).await?;

    let img = task::spawn_blocking(move || decode_upload(&data))
        .await
        .map_err(Error::from)?
        .map_err(ApiError::Undecodable)?;
    let frame = Frame::of(&img);
    debug!("Decoded {}x{} image", img.width(), img.height());

    let mut landmarker = state.pool.acquire().await?;
    let landmarks = task::spawn_blocking(move || {
        let span = span!(Level::DEBUG, "detect_landmarks");
        let _guard = span.enter();
        landmarker.detect(&img)
    })
    .await
    .map_err(Error::from)??;

    let Some(landmarks) = landmarks else {
        debug!("No face detected");
        return Ok(Json(AnalyzeResponse {
            analysis: FaceAnalysis::undetected(),
            geometry: None,
        }));
    };

    let geometry = FaceGeometry::from_landmarks(&landmarks, frame);
    let analysis = FaceAnalysis::from_geometry(&geometry);
    info!(
        face_shape = ?analysis.face_shape.label,
        lip_fullness = ?analysis.lip_fullness.label,
        "Analyzed face"
    );

    Ok(Json(AnalyzeResponse {
        analysis,
        geometry: params.geometry.then(|| geometry.summary()),
    }))
}

/// Decode an upload, turned upright according to its EXIF orientation.
fn decode_upload(data: &[u8]) -> ImageResult<RgbImage> {
    let mut decoder = ImageReader::new(Cursor::new(data))
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation()?;

    let mut img = DynamicImage::from_decoder(decoder)?;
    img.apply_orientation(orientation);

    Ok(img.into_rgb8())
}

/// Bytes of the `image` upload, checked for presence, file metadata and content.
async fn read_image_field(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Bytes, ApiError> {
    let mut multipart = match multipart {
        Ok(m) => m,
        Err(e) => {
            debug!("Not a multipart upload: {e}");
            return Err(ApiError::NoImage);
        }
    };

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let has_file_name = field.file_name().is_some_and(|n| !n.is_empty());
        if !has_file_name && field.content_type().is_none() {
            return Err(ApiError::InvalidFile);
        }

        let data = field.bytes().await?;
        if data.is_empty() {
            return Err(ApiError::EmptyImage);
        }

        return Ok(data);
    }

    Err(ApiError::NoImage)
}
