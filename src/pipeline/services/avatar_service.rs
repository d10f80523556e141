use chrono::{DateTime, Utc};
use futures::Future;
use futures::task::{Context, Poll};
use serde::Serialize;
use std::pin::Pin;
use std::sync::Arc;
use tower::{BoxError, Service};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::common::ImageUpload;
use crate::config::Settings;
use crate::error::AppError;
use crate::pipeline::avatar::{
    generate_model, AvatarConfig, AvatarConfigSynthesizer, AvatarMeasurements, AvatarModelBundle,
    PhotoAnalysis, PhotoAnalyzer,
};
use crate::pipeline::fields::FieldMap;
use crate::pipeline::validation::{ImageUse, ImageValidator};

#[derive(Debug, Clone)]
pub struct AvatarCreationRequest {
    pub user_id: String,
    pub photo: ImageUpload,
    pub measurements: Option<AvatarMeasurements>,
    pub preferences: Option<FieldMap>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvatarCreationResponse {
    pub avatar_id: String,
    pub user_id: String,
    pub avatar_url: String,
    pub preview_url: String,
    pub thumbnail_url: String,
    pub config: AvatarConfig,
    pub model: AvatarModelBundle,
    pub created_at: DateTime<Utc>,
}

struct AvatarWorker {
    validator: ImageValidator,
    photos: PhotoAnalyzer,
    synthesizer: AvatarConfigSynthesizer,
}

impl AvatarWorker {
    fn analyze_photo(&self, photo: &ImageUpload) -> Result<PhotoAnalysis, AppError> {
        let image = self.validator.validate_and_decode(photo, ImageUse::Portrait)?;
        Ok(self.photos.analyze(&image))
    }
}

/// Turns a portrait plus optional measurements and preferences into an
/// avatar config and its placeholder model.
#[derive(Clone)]
pub struct AvatarCreationService {
    worker: Arc<AvatarWorker>,
}

impl AvatarCreationService {
    pub fn new(settings: &Settings) -> Self {
        Self {
            worker: Arc::new(AvatarWorker {
                validator: ImageValidator::new(settings.validation.clone()),
                photos: PhotoAnalyzer::new(&settings.avatar),
                synthesizer: AvatarConfigSynthesizer::new(&settings.avatar),
            }),
        }
    }
}

#[instrument(skip_all, fields(user_id = %req.user_id))]
async fn process(
    worker: Arc<AvatarWorker>,
    req: AvatarCreationRequest,
) -> Result<AvatarCreationResponse, AppError> {
    let photo = req.photo.clone();
    let blocking = worker.clone();
    let analysis = tokio::task::spawn_blocking(move || blocking.analyze_photo(&photo))
        .await
        .map_err(|e| AppError::Worker(e.to_string()))??;

    let config = worker.synthesizer.synthesize(
        &analysis,
        req.measurements.as_ref(),
        req.preferences.as_ref(),
    )?;
    let model = generate_model(&config);

    let avatar_id = format!("avatar_{}", Uuid::new_v4());
    info!(
        avatar_id = %avatar_id,
        face_detected = analysis.face_detected,
        skin_tone = %config.skin_tone,
        "Avatar created"
    );

    Ok(AvatarCreationResponse {
        avatar_url: format!("/api/avatars/{avatar_id}/model.gltf"),
        preview_url: format!("/api/avatars/{avatar_id}/preview.jpg"),
        thumbnail_url: format!("/api/avatars/{avatar_id}/thumb.jpg"),
        avatar_id,
        user_id: req.user_id,
        config,
        model,
        created_at: Utc::now(),
    })
}

impl Service<AvatarCreationRequest> for AvatarCreationService {
    type Response = AvatarCreationResponse;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: AvatarCreationRequest) -> Self::Future {
        let worker = self.worker.clone();
        Box::pin(async move { process(worker, req).await.map_err(|e| Box::new(e) as BoxError) })
    }
}
