use std::time::Duration;
use tower::timeout::TimeoutLayer;
use tower::util::BoxService;
use tower::{BoxError, Service, ServiceBuilder};
use tracing::{error, info};

use super::avatar_service::{AvatarCreationRequest, AvatarCreationResponse, AvatarCreationService};
use super::garment_service::{GarmentAnalysisService, GarmentUploadRequest, GarmentUploadResponse};
use crate::config::{Settings, WorkerSettings};
use crate::error::AppError;

pub type GarmentPipeline = BoxService<GarmentUploadRequest, GarmentUploadResponse, AppError>;
pub type AvatarPipeline = BoxService<AvatarCreationRequest, AvatarCreationResponse, AppError>;

fn into_app_error(err: BoxError) -> AppError {
    let err = AppError::from(err);
    if !err.is_client_error() {
        error!(kind = err.kind(), "Analysis failed: {}", err);
    }
    err
}

fn analysis_timeout(worker: &WorkerSettings) -> Option<Duration> {
    (worker.analysis_timeout_ms > 0).then(|| Duration::from_millis(worker.analysis_timeout_ms))
}

/// Maps errors to `AppError`, bounds concurrency and applies the timeout
/// from `worker` around `service`.
fn with_worker_layers<S, Req>(
    service: S,
    worker: &WorkerSettings,
) -> BoxService<Req, S::Response, AppError>
where
    S: Service<Req, Error = BoxError> + Send + 'static,
    S::Future: Send + 'static,
    S::Response: 'static,
    Req: Send + 'static,
{
    let service = ServiceBuilder::new()
        .map_err(into_app_error)
        .concurrency_limit(worker.max_concurrent_analyses)
        .option_layer(analysis_timeout(worker).map(TimeoutLayer::new))
        .service(service);

    BoxService::new(service)
}

/// Garment analysis behind a concurrency limit and the configured timeout.
pub fn garment_pipeline(settings: &Settings) -> GarmentPipeline {
    let timeout = analysis_timeout(&settings.worker);
    info!(
        max_concurrent = settings.worker.max_concurrent_analyses,
        ?timeout,
        "Building garment pipeline"
    );

    with_worker_layers(GarmentAnalysisService::new(settings), &settings.worker)
}

pub fn avatar_pipeline(settings: &Settings) -> AvatarPipeline {
    let timeout = analysis_timeout(&settings.worker);
    info!(
        max_concurrent = settings.worker.max_concurrent_analyses,
        ?timeout,
        "Building avatar pipeline"
    );

    with_worker_layers(AvatarCreationService::new(settings), &settings.worker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ImageUpload;
    use crate::error::ValidationError;
    use crate::pipeline::garment::GarmentCategory;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;
    use tower::ServiceExt;

    fn jpeg(width: u32, height: u32, color: [u8; 3], filename: &str) -> ImageUpload {
        let img = DynamicImage::ImageRgb8(ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(
            width,
            height,
            Rgb(color),
        ));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg).unwrap();
        ImageUpload::from_bytes(filename, bytes)
    }

    #[test]
    fn zero_timeout_disables_the_layer() {
        let settings = Settings::default().with_analysis_timeout_ms(0);
        assert_eq!(analysis_timeout(&settings.worker), None);
        assert_eq!(
            analysis_timeout(&Settings::default().worker),
            Some(Duration::from_secs(30))
        );
    }

    #[tokio::test]
    async fn slow_analysis_times_out() {
        let worker = WorkerSettings {
            analysis_timeout_ms: 10,
            ..Default::default()
        };
        let slow = tower::service_fn(|_: ()| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, BoxError>(())
        });
        let mut svc = with_worker_layers(slow, &worker);

        let err = svc.ready().await.unwrap().call(()).await.unwrap_err();

        assert!(matches!(err, AppError::Timeout));
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn red_jpeg_through_the_pipeline() {
        let mut pipeline = garment_pipeline(&Settings::default());
        let request = GarmentUploadRequest {
            user_id: "user-1".to_string(),
            upload: jpeg(300, 400, [255, 0, 0], "red.jpg"),
            metadata: None,
        };

        let response = pipeline.ready().await.unwrap().call(request).await.unwrap();

        assert_eq!(response.garment.category, GarmentCategory::Tops);
        assert_eq!(response.garment.garment_type, "t-shirt");
        assert_eq!(response.garment.primary_color, "red");
        assert_eq!(response.garment.metadata.name, "Untitled Garment");
    }

    #[tokio::test]
    async fn pipeline_maps_errors_to_app_error() {
        let mut pipeline = garment_pipeline(&Settings::default().with_analysis_timeout_ms(0));
        let request = GarmentUploadRequest {
            user_id: "user-1".to_string(),
            upload: jpeg(300, 400, [255, 0, 0], "red.gif"),
            metadata: None,
        };

        let err = pipeline.ready().await.unwrap().call(request).await.unwrap_err();

        assert!(err.is_client_error());
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::UnsupportedFormat { .. })
        ));
    }

    #[tokio::test]
    async fn avatar_pipeline_builds_a_model() {
        let mut pipeline = avatar_pipeline(&Settings::default());
        let request = AvatarCreationRequest {
            user_id: "user-1".to_string(),
            photo: jpeg(300, 300, [90, 60, 40], "me.jpg"),
            measurements: None,
            preferences: None,
        };

        let response = pipeline.ready().await.unwrap().call(request).await.unwrap();

        assert_eq!(response.config.skin_tone, "dark");
        assert_eq!(response.model.format, "gltf");
        assert_eq!(response.model.geometry.faces.len(), 15);
    }
}
