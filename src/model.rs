use std::fmt;
use std::path::Path;

use ort::execution_providers::CPUExecutionProvider;
use ort::session::Session;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::value::ValueType;
use tracing::info;

use crate::error::DetectError;
use crate::labels::LabelTable;

/// Name of the graph's single image input, shape `[1, H, W, 3]` NHWC.
pub const INPUT_TENSOR: &str = "image_tensor";
/// Per-detection corner boxes, `[x_min, y_min, x_max, y_max]` in [0, 1].
pub const OUTPUT_BOXES: &str = "detected_boxes";
/// Per-detection confidence scores in [0, 1].
pub const OUTPUT_SCORES: &str = "detected_scores";
/// Per-detection class indices into the label table.
pub const OUTPUT_CLASSES: &str = "detected_classes";

/// An exported detection graph plus its label table, loaded once at startup
/// and shared read-only for the life of the process.
///
/// The tensor contract (input/output names, input spatial resolution) is
/// validated here, so per-request code binds pre-validated names and never
/// discovers a mismatch halfway through a forward pass.
pub struct LoadedModel {
    session: Session,
    labels: LabelTable,
    input_width: u32,
    input_height: u32,
}

impl LoadedModel {
    /// Load the serialized graph and the newline-delimited label list.
    pub fn load(
        model_path: impl AsRef<Path>,
        labels_path: impl AsRef<Path>,
    ) -> Result<Self, DetectError> {
        let model_path = model_path.as_ref();
        let labels = LabelTable::from_file(labels_path)?;

        let session = build_session(model_path).map_err(|e| DetectError::ModelLoad {
            reason: format!("cannot load graph {}: {e}", model_path.display()),
        })?;

        let input = session
            .inputs
            .iter()
            .find(|i| i.name == INPUT_TENSOR)
            .ok_or_else(|| DetectError::ModelLoad {
                reason: format!("graph has no input named {INPUT_TENSOR}"),
            })?;
        let dimensions = match &input.input_type {
            ValueType::Tensor { dimensions, .. } => dimensions,
            other => {
                return Err(DetectError::ModelLoad {
                    reason: format!("input {INPUT_TENSOR} is not a tensor: {other:?}"),
                });
            }
        };
        let (input_width, input_height) = spatial_resolution(dimensions)?;

        for name in [OUTPUT_BOXES, OUTPUT_SCORES, OUTPUT_CLASSES] {
            if !session.outputs.iter().any(|o| o.name == name) {
                return Err(DetectError::ModelLoad {
                    reason: format!("graph has no output named {name}"),
                });
            }
        }

        info!(
            model = %model_path.display(),
            input_width,
            input_height,
            tags = labels.len(),
            "detection graph loaded"
        );

        Ok(Self {
            session,
            labels,
            input_width,
            input_height,
        })
    }

    pub(crate) fn session(&self) -> &Session {
        &self.session
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// Required input resolution as (width, height). Every inference call
    /// must resize its image to exactly this size.
    pub fn input_resolution(&self) -> (u32, u32) {
        (self.input_width, self.input_height)
    }
}

impl fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModel")
            .field("input_width", &self.input_width)
            .field("input_height", &self.input_height)
            .field("tags", &self.labels.len())
            .finish()
    }
}

fn build_session(path: &Path) -> Result<Session, ort::Error> {
    SessionBuilder::new()?
        .with_execution_providers([CPUExecutionProvider::default().build()])?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .commit_from_file(path)
}

/// Derive (width, height) from the declared `[1, H, W, 3]` input shape.
/// Symbolic or missing spatial dimensions are a load-time error: the
/// preprocessor needs a concrete target size.
fn spatial_resolution(dimensions: &[i64]) -> Result<(u32, u32), DetectError> {
    if dimensions.len() != 4 {
        return Err(DetectError::ModelLoad {
            reason: format!(
                "input {INPUT_TENSOR} is rank {}, expected rank 4",
                dimensions.len()
            ),
        });
    }
    let (height, width) = (dimensions[1], dimensions[2]);
    if height <= 0 || width <= 0 {
        return Err(DetectError::ModelLoad {
            reason: format!("input {INPUT_TENSOR} has no concrete spatial size: {dimensions:?}"),
        });
    }
    Ok((width as u32, height as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_comes_from_spatial_dims() {
        assert_eq!(spatial_resolution(&[1, 320, 320, 3]).unwrap(), (320, 320));
        // NHWC: dims[1] is height, dims[2] is width
        assert_eq!(spatial_resolution(&[1, 240, 320, 3]).unwrap(), (320, 240));
    }

    #[test]
    fn symbolic_dims_are_rejected() {
        let err = spatial_resolution(&[-1, -1, -1, 3]).unwrap_err();
        assert!(matches!(err, DetectError::ModelLoad { .. }));
    }

    #[test]
    fn wrong_rank_is_rejected() {
        assert!(spatial_resolution(&[1, 320, 320]).is_err());
        assert!(spatial_resolution(&[1, 3, 320, 320, 1]).is_err());
    }
}
