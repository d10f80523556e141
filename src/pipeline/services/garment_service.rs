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
use crate::pipeline::fields::FieldMap;
use crate::pipeline::garment::{compose_record, GarmentAnalyzer, GarmentAttributes, GarmentRecord};
use crate::pipeline::validation::{ImageUse, ImageValidator};

#[derive(Debug, Clone)]
pub struct GarmentUploadRequest {
    pub user_id: String,
    pub upload: ImageUpload,
    pub metadata: Option<FieldMap>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GarmentUploadResponse {
    pub garment_id: String,
    pub user_id: String,
    pub upload_date: DateTime<Utc>,
    pub image_url: String,
    pub thumbnail_url: String,
    pub garment: GarmentRecord,
    pub analysis: GarmentAttributes,
}

struct GarmentWorker {
    validator: ImageValidator,
    analyzer: GarmentAnalyzer,
}

impl GarmentWorker {
    fn run(&self, upload: &ImageUpload) -> Result<GarmentAttributes, AppError> {
        let image = self.validator.validate_and_decode(upload, ImageUse::Garment)?;
        Ok(self.analyzer.analyze(image))
    }
}

/// Validates, analyzes and composes one garment upload. Decoding and the
/// pixel statistics run on the blocking pool.
#[derive(Clone)]
pub struct GarmentAnalysisService {
    worker: Arc<GarmentWorker>,
}

impl GarmentAnalysisService {
    pub fn new(settings: &Settings) -> Self {
        Self {
            worker: Arc::new(GarmentWorker {
                validator: ImageValidator::new(settings.validation.clone()),
                analyzer: GarmentAnalyzer::new(&settings.garment),
            }),
        }
    }
}

#[instrument(skip_all, fields(user_id = %req.user_id, filename = req.upload.filename()))]
async fn process(
    worker: Arc<GarmentWorker>,
    req: GarmentUploadRequest,
) -> Result<GarmentUploadResponse, AppError> {
    let upload = req.upload.clone();
    let analysis = tokio::task::spawn_blocking(move || worker.run(&upload))
        .await
        .map_err(|e| AppError::Worker(e.to_string()))??;

    let garment = compose_record(&analysis, req.metadata.as_ref())?;
    let garment_id = format!("garment_{}", Uuid::new_v4());
    info!(
        garment_id = %garment_id,
        category = garment.category.as_str(),
        primary_color = %garment.primary_color,
        "Garment analyzed"
    );

    Ok(GarmentUploadResponse {
        image_url: format!("/api/garments/{garment_id}/image.jpg"),
        thumbnail_url: format!("/api/garments/{garment_id}/thumb.jpg"),
        garment_id,
        user_id: req.user_id,
        upload_date: Utc::now(),
        garment,
        analysis,
    })
}

impl Service<GarmentUploadRequest> for GarmentAnalysisService {
    type Response = GarmentUploadResponse;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: GarmentUploadRequest) -> Self::Future {
        let worker = self.worker.clone();
        Box::pin(async move { process(worker, req).await.map_err(|e| Box::new(e) as BoxError) })
    }
}
