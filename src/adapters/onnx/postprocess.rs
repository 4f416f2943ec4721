use ndarray::{s, ArrayView2};

use crate::domain::detection::Detection;
use crate::domain::model::YoloParams;

/// Decodes one YOLOv8 output of shape `[4 + num_classes, num_candidates]`
/// (`cx, cy, w, h` in network input pixels, then per-class scores) into
/// detections in source image pixels, then applies class-aware NMS.
///
/// The result is sorted by confidence descending and holds at most
/// `params.max_detections` entries.
pub fn decode_predictions(
    view: ArrayView2<'_, f32>,
    image_size: (u32, u32),
    params: &YoloParams,
    class_names: &[String],
) -> Vec<Detection> {
    if view.shape()[0] <= 4 {
        return Vec::new();
    }

    let (img_w, img_h) = (image_size.0 as f32, image_size.1 as f32);
    let input = params.input_size.max(1) as f32;
    let sx = img_w / input;
    let sy = img_h / input;

    let num_candidates = view.shape()[1];
    let mut candidates = Vec::new();

    for i in 0..num_candidates {
        let scores = view.slice(s![4.., i]);
        let Some((class_id, &max_score)) = scores
            .indexed_iter()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
        else {
            continue;
        };

        if max_score.is_nan() || max_score <= params.conf_threshold {
            continue;
        }

        let cx = view[[0, i]];
        let cy = view[[1, i]];
        let w = view[[2, i]];
        let h = view[[3, i]];

        candidates.push(Detection {
            class_id,
            class_name: class_name(class_names, class_id),
            confidence: max_score.clamp(0.0, 1.0),
            bounding_box: [
                ((cx - w / 2.0) * sx).clamp(0.0, img_w),
                ((cy - h / 2.0) * sy).clamp(0.0, img_h),
                ((cx + w / 2.0) * sx).clamp(0.0, img_w),
                ((cy + h / 2.0) * sy).clamp(0.0, img_h),
            ],
        });
    }

    let mut kept = non_max_suppression(candidates, params.iou_threshold);
    kept.truncate(params.max_detections);
    kept
}

pub fn class_name(class_names: &[String], class_id: usize) -> String {
    class_names
        .get(class_id)
        .cloned()
        .unwrap_or_else(|| format!("class_{class_id}"))
}

/// Greedy per-class suppression: a box is dropped when it overlaps an already
/// kept box of the same class by more than `iou_threshold`.
pub fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for det in detections {
        let suppressed = kept.iter().any(|k| {
            k.class_id == det.class_id && iou(&k.bounding_box, &det.bounding_box) > iou_threshold
        });
        if !suppressed {
            kept.push(det);
        }
    }
    kept
}

pub fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let ix1 = a[0].max(b[0]);
    let iy1 = a[1].max(b[1]);
    let ix2 = a[2].min(b[2]);
    let iy2 = a[3].min(b[3]);
    let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
    let union = area_a + area_b - inter;
    if union <= 0.0 {
        0.0
    } else {
        inter / union
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn names() -> Vec<String> {
        vec!["cat".into(), "dog".into()]
    }

    /// Columns are candidates: cx, cy, w, h, score(cat), score(dog).
    fn output(cols: &[[f32; 6]]) -> Array2<f32> {
        let mut out = Array2::<f32>::zeros((6, cols.len()));
        for (i, col) in cols.iter().enumerate() {
            for (r, v) in col.iter().enumerate() {
                out[[r, i]] = *v;
            }
        }
        out
    }

    fn params() -> YoloParams {
        YoloParams {
            input_size: 100,
            conf_threshold: 0.25,
            iou_threshold: 0.7,
            max_detections: 300,
        }
    }

    #[test]
    fn decodes_and_rescales_boxes() {
        let out = output(&[[50.0, 50.0, 20.0, 40.0, 0.1, 0.9]]);
        let dets = decode_predictions(out.view(), (200, 300), &params(), &names());

        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].class_name, "dog");
        assert_eq!(dets[0].class_id, 1);
        assert_eq!(dets[0].bounding_box, [80.0, 90.0, 120.0, 210.0]);
    }

    #[test]
    fn drops_low_scores_and_clamps_into_image() {
        let out = output(&[
            [50.0, 50.0, 10.0, 10.0, 0.2, 0.1],
            [0.0, 0.0, 40.0, 40.0, 1.3, 0.0],
        ]);
        let dets = decode_predictions(out.view(), (100, 100), &params(), &names());

        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].confidence, 1.0);
        assert_eq!(dets[0].bounding_box, [0.0, 0.0, 20.0, 20.0]);
    }

    #[test]
    fn suppresses_overlaps_within_a_class_only() {
        let out = output(&[
            [50.0, 50.0, 40.0, 40.0, 0.6, 0.0],
            [51.0, 51.0, 40.0, 40.0, 0.8, 0.0],
            [50.0, 50.0, 40.0, 40.0, 0.0, 0.5],
            [10.0, 10.0, 8.0, 8.0, 0.4, 0.0],
        ]);
        let dets = decode_predictions(out.view(), (100, 100), &params(), &names());

        let summary: Vec<_> = dets.iter().map(|d| (d.class_name.as_str(), d.confidence)).collect();
        assert_eq!(summary, [("cat", 0.8), ("dog", 0.5), ("cat", 0.4)]);
    }

    #[test]
    fn truncates_to_max_detections() {
        let out = output(&[
            [10.0, 10.0, 5.0, 5.0, 0.3, 0.0],
            [50.0, 50.0, 5.0, 5.0, 0.9, 0.0],
            [90.0, 90.0, 5.0, 5.0, 0.6, 0.0],
        ]);
        let p = YoloParams { max_detections: 2, ..params() };
        let dets = decode_predictions(out.view(), (100, 100), &p, &names());

        let scores: Vec<_> = dets.iter().map(|d| d.confidence).collect();
        assert_eq!(scores, [0.9, 0.6]);
    }

    #[test]
    fn unknown_class_ids_get_placeholder_names() {
        assert_eq!(class_name(&names(), 7), "class_7");
    }

    #[test]
    fn iou_of_identical_and_disjoint_boxes() {
        let a = [0.0, 0.0, 10.0, 10.0];
        assert_eq!(iou(&a, &a), 1.0);
        assert_eq!(iou(&a, &[20.0, 20.0, 30.0, 30.0]), 0.0);
        assert!((iou(&a, &[5.0, 0.0, 15.0, 10.0]) - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(iou(&[0.0; 4], &[0.0; 4]), 0.0);
    }
}
