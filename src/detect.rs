use ndarray::{ArrayD, ArrayView2, Axis, Ix2};
use tracing::debug;

use crate::error::DetectError;
use crate::model::{LoadedModel, INPUT_TENSOR, OUTPUT_BOXES, OUTPUT_CLASSES, OUTPUT_SCORES};
use crate::preprocess::PreprocessedTensor;

/// One candidate object exactly as the graph emitted it: corner-format box
/// in normalized coordinates, confidence score, integer class index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDetection {
    /// [x_min, y_min, x_max, y_max], each in [0, 1].
    pub bbox: [f32; 4],
    pub score: f32,
    pub class_id: i64,
}

/// Run one synchronous forward pass and zip the three named outputs into
/// detection tuples.
///
/// The i-th box corresponds to the i-th score and the i-th class — a hard
/// invariant of the exported graph format. The count is whatever the graph
/// emits: nothing is capped, thresholded, or reordered here.
pub fn detect(
    model: &LoadedModel,
    tensor: &PreprocessedTensor,
) -> Result<Vec<RawDetection>, DetectError> {
    let inputs = ort::inputs![INPUT_TENSOR => tensor.view().into_dyn()]
        .map_err(|e| inference_error(format!("cannot bind {INPUT_TENSOR}: {e}")))?;
    let outputs = model
        .session()
        .run(inputs)
        .map_err(|e| inference_error(format!("forward pass failed: {e}")))?;

    let boxes = outputs
        .get(OUTPUT_BOXES)
        .ok_or_else(|| missing_output(OUTPUT_BOXES))?
        .try_extract_tensor::<f32>()
        .map_err(|e| inference_error(format!("{OUTPUT_BOXES} is not f32: {e}")))?
        .into_owned();
    let scores = outputs
        .get(OUTPUT_SCORES)
        .ok_or_else(|| missing_output(OUTPUT_SCORES))?
        .try_extract_tensor::<f32>()
        .map_err(|e| inference_error(format!("{OUTPUT_SCORES} is not f32: {e}")))?
        .into_owned();

    // Frozen-graph exports emit class ids as int64 or float32 depending on
    // the converter; accept both.
    let class_value = outputs
        .get(OUTPUT_CLASSES)
        .ok_or_else(|| missing_output(OUTPUT_CLASSES))?;
    let classes: Vec<i64> = match class_value.try_extract_tensor::<i64>() {
        Ok(v) => v.iter().copied().collect(),
        Err(_) => class_value
            .try_extract_tensor::<f32>()
            .map_err(|e| {
                inference_error(format!("{OUTPUT_CLASSES} is neither i64 nor f32: {e}"))
            })?
            .iter()
            .map(|&c| c as i64)
            .collect(),
    };

    let detections = zip_outputs(&boxes, &scores, &classes)?;
    debug!(count = detections.len(), "graph emitted detections");
    Ok(detections)
}

/// Zip boxes, scores and classes positionally. A leading batch dimension of
/// size 1 is squeezed; any disagreement in length between the three outputs
/// is a configuration inconsistency and fails the request.
pub(crate) fn zip_outputs(
    boxes: &ArrayD<f32>,
    scores: &ArrayD<f32>,
    classes: &[i64],
) -> Result<Vec<RawDetection>, DetectError> {
    let rows = box_rows(boxes)?;
    let scores = flat_scores(scores)?;

    let n = rows.shape()[0];
    if scores.len() != n || classes.len() != n {
        return Err(inference_error(format!(
            "output length mismatch: {n} boxes, {} scores, {} classes",
            scores.len(),
            classes.len()
        )));
    }

    let mut detections = Vec::with_capacity(n);
    for i in 0..n {
        let b = rows.row(i);
        detections.push(RawDetection {
            bbox: [b[0], b[1], b[2], b[3]],
            score: scores[i],
            class_id: classes[i],
        });
    }
    Ok(detections)
}

fn box_rows(boxes: &ArrayD<f32>) -> Result<ArrayView2<'_, f32>, DetectError> {
    let view = if boxes.ndim() == 3 && boxes.shape()[0] == 1 {
        boxes.index_axis(Axis(0), 0)
    } else {
        boxes.view()
    };
    let rows = view.into_dimensionality::<Ix2>().map_err(|_| {
        inference_error(format!(
            "{OUTPUT_BOXES} has shape {:?}, expected [N, 4]",
            boxes.shape()
        ))
    })?;
    if rows.shape()[1] != 4 {
        return Err(inference_error(format!(
            "{OUTPUT_BOXES} rows have {} values, expected 4",
            rows.shape()[1]
        )));
    }
    Ok(rows)
}

fn flat_scores(scores: &ArrayD<f32>) -> Result<Vec<f32>, DetectError> {
    let valid = match scores.ndim() {
        1 => true,
        2 => scores.shape()[0] == 1,
        _ => false,
    };
    if !valid {
        return Err(inference_error(format!(
            "{OUTPUT_SCORES} has shape {:?}, expected [N] or [1, N]",
            scores.shape()
        )));
    }
    Ok(scores.iter().copied().collect())
}

fn inference_error(reason: String) -> DetectError {
    DetectError::Inference { reason }
}

fn missing_output(name: &str) -> DetectError {
    inference_error(format!("graph did not produce output {name}"))
}
