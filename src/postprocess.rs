use serde::Serialize;

use crate::detect::RawDetection;
use crate::error::DetectError;
use crate::labels::LabelTable;

/// Normalized left/top/width/height fractions of the image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Public prediction record, one per raw detection, in detector order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub probability: f64,
    pub tag_id: i64,
    pub tag_name: String,
    pub bounding_box: BoundingBox,
}

/// Convert raw detections into prediction records.
///
/// Pure pass-through: no score threshold, no sorting, no non-max
/// suppression. Width and height are max − min of the raw box and are NOT
/// clamped — a malformed graph producing x_max < x_min yields a negative
/// width, which the caller sees as-is.
pub fn to_predictions(
    raw: &[RawDetection],
    labels: &LabelTable,
) -> Result<Vec<Prediction>, DetectError> {
    raw.iter()
        .map(|det| {
            let tag_name = labels.resolve(det.class_id)?.to_string();
            let [x_min, y_min, x_max, y_max] = det.bbox;
            Ok(Prediction {
                probability: round8(f64::from(det.score)),
                tag_id: det.class_id,
                tag_name,
                bounding_box: BoundingBox {
                    left: round8(f64::from(x_min)),
                    top: round8(f64::from(y_min)),
                    width: round8(f64::from(x_max - x_min)),
                    height: round8(f64::from(y_max - y_min)),
                },
            })
        })
        .collect()
}

/// Round to 8 decimal places, the service's wire precision.
pub(crate) fn round8(value: f64) -> f64 {
    (value * 1e8).round() / 1e8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::RawDetection;
    use crate::labels::LabelTable;

    fn raw(bbox: [f32; 4], score: f32, class_id: i64) -> RawDetection {
        RawDetection {
            bbox,
            score,
            class_id,
        }
    }

    #[test]
    fn resolves_labels_and_box_geometry() {
        let labels = LabelTable::from_lines(["cat", "dog"]);
        let predictions =
            to_predictions(&[raw([0.1, 0.2, 0.5, 0.6], 0.93215, 1)], &labels).unwrap();

        assert_eq!(predictions.len(), 1);
        let p = &predictions[0];
        assert_eq!(p.tag_id, 1);
        assert_eq!(p.tag_name, "dog");
        assert!((p.probability - 0.93215).abs() < 1e-7);
        assert!((p.bounding_box.left - 0.1).abs() < 1e-7);
        assert!((p.bounding_box.top - 0.2).abs() < 1e-7);
        assert!((p.bounding_box.width - 0.4).abs() < 1e-7);
        assert!((p.bounding_box.height - 0.4).abs() < 1e-7);
    }

    #[test]
    fn preserves_length_and_order() {
        let labels = LabelTable::from_lines(["a", "b", "c"]);
        let detections = [
            raw([0.0, 0.0, 0.1, 0.1], 0.2, 2),
            raw([0.5, 0.5, 0.6, 0.6], 0.9, 0),
            raw([0.3, 0.3, 0.4, 0.4], 0.5, 1),
        ];
        let predictions = to_predictions(&detections, &labels).unwrap();

        assert_eq!(predictions.len(), detections.len());
        for (p, d) in predictions.iter().zip(&detections) {
            assert_eq!(p.tag_id, d.class_id);
            assert!((p.bounding_box.left - f64::from(d.bbox[0])).abs() < 1e-7);
        }
    }

    #[test]
    fn rounding_is_idempotent() {
        for value in [0.123456789123, 0.93215, 0.0, 1.0, 0.999999995] {
            let once = round8(value);
            assert_eq!(round8(once), once);
        }
    }

    #[test]
    fn negative_width_passes_through_unclamped() {
        let labels = LabelTable::from_lines(["thing"]);
        let predictions =
            to_predictions(&[raw([0.5, 0.5, 0.3, 0.2], 0.8, 0)], &labels).unwrap();

        let b = &predictions[0].bounding_box;
        assert!(b.width < 0.0);
        assert!(b.height < 0.0);
        assert!((b.width + 0.2).abs() < 1e-7);
        assert!((b.height + 0.3).abs() < 1e-7);
    }

    #[test]
    fn unknown_class_index_propagates() {
        let labels = LabelTable::from_lines(["cat", "dog"]);
        let err = to_predictions(&[raw([0.0, 0.0, 1.0, 1.0], 0.9, 5)], &labels).unwrap_err();
        assert!(matches!(
            err,
            DetectError::LabelIndexOutOfRange { index: 5, len: 2 }
        ));
    }

    #[test]
    fn conversion_is_deterministic() {
        let labels = LabelTable::from_lines(["cat", "dog"]);
        let detections = [raw([0.12, 0.34, 0.56, 0.78], 0.654321, 0)];
        let first = to_predictions(&detections, &labels).unwrap();
        let second = to_predictions(&detections, &labels).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let labels = LabelTable::from_lines(["cat"]);
        let predictions = to_predictions(&[raw([0.1, 0.1, 0.2, 0.2], 0.5, 0)], &labels).unwrap();
        let value = serde_json::to_value(&predictions[0]).unwrap();

        let object = value.as_object().unwrap();
        assert!(object.contains_key("probability"));
        assert!(object.contains_key("tagId"));
        assert!(object.contains_key("tagName"));
        let bbox = object["boundingBox"].as_object().unwrap();
        for key in ["left", "top", "width", "height"] {
            assert!(bbox.contains_key(key));
        }
    }
}
