use std::fmt::Write;

use super::detection::{tally_by_class, Detection};

const RULE: &str = "========================================";

pub fn analysis_header(image_path: &str) -> String {
    format!("\n🔍 Analyzing image: {image_path}\n{}", "-".repeat(50))
}

/// Summary block printed after detection: totals, per-class counts in name
/// order, then every detection in model order.
pub fn summarize_detections(detections: &[Detection]) -> String {
    let mut out = String::new();
    if detections.is_empty() {
        out.push_str("\n⚠️ No objects detected.\n");
        out.push_str("   Try a different image or lower the confidence threshold.");
        return out;
    }

    let _ = writeln!(out, "\n✅ Total detected objects: {}\n", detections.len());

    let _ = writeln!(out, "📋 Detected objects:");
    let _ = writeln!(out, "{RULE}");
    for (name, count) in &tally_by_class(detections) {
        let _ = writeln!(out, "  • {name}: {count}");
    }

    let _ = writeln!(out, "\n📊 Detailed list:");
    let _ = write!(out, "{RULE}");
    for (i, det) in detections.iter().enumerate() {
        let [x1, y1, x2, y2] = det.bounding_box;
        let _ = write!(
            out,
            "\n  {}. {} (confidence: {:.1}%) [{:.0}, {:.0}, {:.0}, {:.0}]",
            i + 1,
            det.class_name,
            det.confidence * 100.0,
            x1,
            y1,
            x2,
            y2
        );
    }
    out
}
