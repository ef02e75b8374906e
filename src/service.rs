use std::io::Read;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use image::DynamicImage;
use serde::Serialize;
use tracing::debug;

use crate::detect::detect;
use crate::error::DetectError;
use crate::model::LoadedModel;
use crate::postprocess::{Prediction, to_predictions};
use crate::preprocess::preprocess;

/// Response envelope in the service's wire shape.
///
/// id/project/iteration stay empty: this deployment does not track model
/// provenance. `predictions` keeps the detector's output order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionResponse {
    pub id: String,
    pub project: String,
    pub iteration: String,
    pub created: String,
    pub predictions: Vec<Prediction>,
}

impl DetectionResponse {
    pub(crate) fn new(predictions: Vec<Prediction>) -> Self {
        Self {
            id: String::new(),
            project: String::new(),
            iteration: String::new(),
            created: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            predictions,
        }
    }
}

/// Facade tying preprocessing, inference and postprocessing into a single
/// `predict` call.
///
/// Holds no per-request state; the loaded model is injected once at startup
/// and shared read-only, so one service value can serve concurrent callers.
/// Every call returns either a complete response or an error — never a
/// partially filled envelope.
#[derive(Debug, Clone)]
pub struct DetectionService {
    model: Arc<LoadedModel>,
}

impl DetectionService {
    pub fn new(model: Arc<LoadedModel>) -> Self {
        Self { model }
    }

    /// Run the full pipeline on a decoded image.
    pub fn predict(&self, image: &DynamicImage) -> Result<DetectionResponse, DetectError> {
        let tensor = preprocess(image, self.model.input_resolution())?;
        let raw = detect(&self.model, &tensor)?;
        let predictions = to_predictions(&raw, self.model.labels())?;
        debug!(predictions = predictions.len(), "prediction complete");
        Ok(DetectionResponse::new(predictions))
    }

    /// Decode raw image bytes, then predict.
    pub fn predict_bytes(&self, bytes: &[u8]) -> Result<DetectionResponse, DetectError> {
        let image = image::load_from_memory(bytes).map_err(|e| DetectError::ImageDecode {
            reason: e.to_string(),
        })?;
        self.predict(&image)
    }

    /// Fetch an image over HTTP, then predict.
    pub fn predict_url(&self, url: &str) -> Result<DetectionResponse, DetectError> {
        let response = ureq::get(url).call().map_err(|e| DetectError::Fetch {
            reason: e.to_string(),
        })?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| DetectError::Fetch {
                reason: e.to_string(),
            })?;
        self.predict_bytes(&bytes)
    }
}
