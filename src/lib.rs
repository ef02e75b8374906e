pub mod detect;
pub mod error;
pub mod labels;
pub mod model;
pub mod postprocess;
pub mod preprocess;
pub mod service;

pub use crate::detect::{RawDetection, detect};
pub use crate::error::DetectError;
pub use crate::labels::LabelTable;
pub use crate::model::LoadedModel;
pub use crate::postprocess::{BoundingBox, Prediction, to_predictions};
pub use crate::preprocess::{PreprocessedTensor, preprocess};
pub use crate::service::{DetectionResponse, DetectionService};
