use std::collections::BTreeMap;

/// One predicted object instance, in source image pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub class_id: usize,
    pub class_name: String,
    pub confidence: f32,
    /// `[x1, y1, x2, y2]`
    pub bounding_box: [f32; 4],
}

/// Class name -> occurrences, iterated in ascending name order.
pub type ClassTally = BTreeMap<String, usize>;

/// Keeps detections whose confidence is at least `threshold`, preserving order.
pub fn filter_by_confidence(detections: Vec<Detection>, threshold: f32) -> Vec<Detection> {
    detections
        .into_iter()
        .filter(|d| d.confidence >= threshold)
        .collect()
}

pub fn tally_by_class(detections: &[Detection]) -> ClassTally {
    let mut counts = ClassTally::new();
    for det in detections {
        *counts.entry(det.class_name.clone()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
pub(crate) fn det(class_name: &str, confidence: f32) -> Detection {
    Detection {
        class_id: 0,
        class_name: class_name.to_string(),
        confidence,
        bounding_box: [10.0, 20.0, 110.0, 220.0],
    }
}
