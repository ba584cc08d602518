//! HTTP route handlers
//!
//! Thin translation between the HTTP boundary and the pipeline: validation
//! failures map to 400, a missing model to 503, internal pipeline failures
//! to 500. Retraining runs on a blocking worker off the request path.

use crate::data::types::RAW_COLUMNS;
use crate::models::gbm::ModelError;
use crate::models::trainer::ModelTrainer;
use crate::processing::processor::ProcessError;
use crate::serve::schemas::{
    BatchItem, BatchPredictRequest, BatchPredictResponse, FeatureImportance,
    FeatureImportanceResponse, HealthResponse, ModelInfoResponse, PredictRequest, PredictResponse,
    ValidationError,
};
use crate::serve::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;
use tracing::{error, info};

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/model/info", get(model_info))
        .route("/predict", post(predict))
        .route("/predict/batch", post(predict_batch))
        .route("/model/feature-importance", get(feature_importance))
        .route("/model/retrain", post(retrain))
        .with_state(state)
}

/// Error shape returned to clients: a status code plus a `detail` message.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn model_not_loaded() -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: "Model not loaded".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.message }))).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: err.to_string(),
        }
    }
}

impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        let status = match &err {
            ModelError::NotTrained => StatusCode::SERVICE_UNAVAILABLE,
            ModelError::Process(ProcessError::NotFitted(_)) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Crop Recommendation API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "active",
    }))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let model_loaded = state.handle.is_loaded();

    Json(HealthResponse {
        status: if model_loaded { "healthy" } else { "unhealthy" }.to_string(),
        message: if model_loaded {
            "Service is running"
        } else {
            "Model not loaded"
        }
        .to_string(),
        model_loaded,
        timestamp: Utc::now().to_rfc3339(),
    })
}

async fn model_info(State(state): State<AppState>) -> Result<Json<ModelInfoResponse>, ApiError> {
    let trainer = state.handle.current().ok_or_else(ApiError::model_not_loaded)?;

    Ok(Json(ModelInfoResponse {
        model_name: "Gradient Boosting Classifier".to_string(),
        model_version: env!("CARGO_PKG_VERSION").to_string(),
        features: RAW_COLUMNS.iter().map(|c| c.to_string()).collect(),
        supported_crops: trainer.processor().all_crops(),
        accuracy: trainer.metrics().map(|m| m.test_accuracy),
    }))
}

async fn predict(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    let trainer = state.handle.current().ok_or_else(ApiError::model_not_loaded)?;
    request.validate()?;

    let prediction = trainer.predict(&request.to_sample())?;
    Ok(Json(PredictResponse::from(prediction)))
}

async fn predict_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchPredictRequest>,
) -> Result<Json<BatchPredictResponse>, ApiError> {
    let trainer = state.handle.current().ok_or_else(ApiError::model_not_loaded)?;
    request.validate()?;

    let samples: Vec<_> = request.predictions.iter().map(|r| r.to_sample()).collect();

    let predictions: Vec<BatchItem> = trainer
        .predict_batch(&samples)
        .into_iter()
        .map(|result| match result {
            Ok(prediction) => BatchItem::Success(PredictResponse::from(prediction)),
            Err(err) => {
                error!("Batch item failed: {err}");
                BatchItem::Failure {
                    error: err.to_string(),
                }
            }
        })
        .collect();

    let total_predictions = predictions.len();
    Ok(Json(BatchPredictResponse {
        predictions,
        total_predictions,
    }))
}

async fn feature_importance(
    State(state): State<AppState>,
) -> Result<Json<FeatureImportanceResponse>, ApiError> {
    let trainer = state.handle.current().ok_or_else(ApiError::model_not_loaded)?;

    let mut pairs = trainer.feature_importance()?;
    pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    Ok(Json(FeatureImportanceResponse {
        feature_importance: pairs
            .into_iter()
            .map(|(feature, importance)| FeatureImportance {
                feature,
                importance,
            })
            .collect(),
    }))
}

async fn retrain(State(state): State<AppState>) -> Json<serde_json::Value> {
    let _task = tokio::task::spawn_blocking(move || retrain_task(state));
    Json(json!({ "message": "Model retraining started in background" }))
}

/// Build a brand-new pipeline and swap it in only after training and
/// persistence both succeed; any failure leaves the served pipeline as-is.
fn retrain_task(state: AppState) {
    info!("Starting model retraining");

    let mut trainer = ModelTrainer::new();
    let outcome = trainer
        .train(&state.retrain.data_path, &state.retrain.options)
        .and_then(|_| trainer.save(&state.retrain.artifact_dir));

    match outcome {
        Ok(()) => {
            state.handle.replace(trainer);
            info!("Model retraining completed successfully");
        }
        Err(err) => {
            error!("Model retraining failed: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::gbm::GbmParams;
    use crate::models::trainer::TrainingOptions;
    use crate::serve::state::{ModelHandle, RetrainConfig};
    use std::io::Write;

    fn write_training_csv(path: &std::path::Path) {
        let mut file = std::fs::File::create(path).unwrap();
        writeln!(file, "N,P,K,temperature,humidity,ph,rainfall,label").unwrap();
        for i in 0..30 {
            let j = i as f64;
            writeln!(file, "{},45,40,24,82,6.2,{},rice", 80.0 + j, 220.0 + j).unwrap();
            writeln!(file, "{},65,80,17,15,7.8,{},chickpea", 40.0 + j, 70.0 + j).unwrap();
        }
    }

    fn test_state(dir: &std::path::Path) -> AppState {
        let data_path = dir.join("training.csv");
        write_training_csv(&data_path);

        AppState {
            handle: ModelHandle::empty(),
            retrain: RetrainConfig {
                data_path,
                artifact_dir: dir.join("artifact"),
                options: TrainingOptions {
                    params: GbmParams {
                        n_estimators: 10,
                        max_depth: 3,
                        ..GbmParams::default()
                    },
                    ..TrainingOptions::default()
                },
            },
        }
    }

    #[test]
    fn test_retrain_swaps_handle_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        assert!(!state.handle.is_loaded());

        retrain_task(state.clone());

        let trainer = state.handle.current().unwrap();
        assert!(trainer.is_ready());
        assert!(state.retrain.artifact_dir.join("model.json").exists());
    }

    #[test]
    fn test_failed_retrain_keeps_previous_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = test_state(dir.path());

        // load a good pipeline first
        retrain_task(state.clone());
        let previous = state.handle.current().unwrap();

        // point retraining at a missing file; the swap must not happen
        state.retrain.data_path = dir.path().join("absent.csv");
        retrain_task(state.clone());

        let current = state.handle.current().unwrap();
        assert!(std::sync::Arc::ptr_eq(&previous, &current));
    }

    #[test]
    fn test_validation_error_maps_to_bad_request() {
        let err = ApiError::from(ValidationError::BatchSize(101));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_trained_maps_to_service_unavailable() {
        let err = ApiError::from(ModelError::NotTrained);
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);

        let err = ApiError::from(ModelError::InvalidData("boom".to_string()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
