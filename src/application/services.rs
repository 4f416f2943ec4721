use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::{
    application::ports::{AnnotatorPort, ModelCatalogPort, RuntimeProbePort},
    domain::{
        detection::{filter_by_confidence, Detection},
        errors::DomainError,
        model::ModelId,
        report::{analysis_header, summarize_detections},
    },
};

const OUTPUT_SUFFIX: &str = "_detected";

/// Precondition check run before any detection.
/// Reports every missing piece with a remediation hint; nothing is installed.
#[derive(Clone)]
pub struct EnvironmentService {
    catalog: Arc<dyn ModelCatalogPort>,
    probe: Arc<dyn RuntimeProbePort>,
}

impl EnvironmentService {
    pub fn new(catalog: Arc<dyn ModelCatalogPort>, probe: Arc<dyn RuntimeProbePort>) -> Self {
        Self { catalog, probe }
    }

    /// Returns `true` when the model, the inference runtime and image I/O are all usable.
    pub fn check(&self, model: &ModelId, out: &mut dyn Write) -> bool {
        let mut ready = true;

        if let Err(e) = self.catalog.validate_model(model) {
            warn!(model = %model.onnx_path, "model check failed: {e}");
            let _ = writeln!(out, "❌ Model '{}' is not usable: {e}", model.name);
            let _ = writeln!(
                out,
                "   Export it with `yolo export model={}.pt format=onnx` and place it at '{}',",
                model.name, model.onnx_path
            );
            let _ = writeln!(out, "   or set OBJDET_MODEL to the path of an existing .onnx file.");
            ready = false;
        }

        if let Err(e) = self.probe.check_inference_runtime() {
            warn!("inference runtime check failed: {e}");
            let _ = writeln!(out, "❌ ONNX Runtime is not usable: {e}");
            let _ = writeln!(
                out,
                "   Point ORT_DYLIB_PATH at an existing onnxruntime library, or unset it to use the bundled one."
            );
            ready = false;
        }

        if let Err(e) = self.probe.check_image_io() {
            warn!("image I/O check failed: {e}");
            let _ = writeln!(out, "❌ Image I/O is not usable: {e}");
            ready = false;
        }

        debug!(ready, "environment check finished");
        ready
    }
}

/// Detection and annotated-export stages. Both load the model afresh on every call.
#[derive(Clone)]
pub struct DetectionService {
    catalog: Arc<dyn ModelCatalogPort>,
    annotator: Arc<dyn AnnotatorPort>,
    model: ModelId,
}

impl DetectionService {
    pub fn new(
        catalog: Arc<dyn ModelCatalogPort>,
        annotator: Arc<dyn AnnotatorPort>,
        model: ModelId,
    ) -> Self {
        Self {
            catalog,
            annotator,
            model,
        }
    }

    /// Runs the model on `image_path`, keeps detections with
    /// `confidence >= confidence_threshold` and prints the report.
    /// Every failure is printed and yields an empty list.
    pub fn detect_objects(
        &self,
        image_path: &str,
        confidence_threshold: f32,
        out: &mut dyn Write,
    ) -> Vec<Detection> {
        let path = Path::new(image_path);
        if !path.exists() {
            let _ = writeln!(out, "❌ Error: file '{image_path}' not found!");
            return Vec::new();
        }

        let _ = writeln!(out, "{}", analysis_header(image_path));

        let raw = match self.run_model(path) {
            Ok(raw) => raw,
            Err(e) => {
                error!(image = image_path, "detection failed: {e}");
                let _ = writeln!(out, "❌ Error: detection failed: {e}");
                return Vec::new();
            }
        };

        let total = raw.len();
        let detected = filter_by_confidence(raw, confidence_threshold);
        info!(
            image = image_path,
            total,
            kept = detected.len(),
            threshold = confidence_threshold,
            "detection finished"
        );

        let _ = writeln!(out, "{}", summarize_detections(&detected));
        detected
    }

    /// Writes a copy of the image with every model detection drawn on it.
    /// The caller's confidence threshold is not applied here.
    pub fn save_annotated_image(
        &self,
        image_path: &str,
        output_path: Option<&Path>,
        out: &mut dyn Write,
    ) -> Option<PathBuf> {
        let path = Path::new(image_path);
        if !path.exists() {
            let _ = writeln!(out, "❌ Error: file '{image_path}' not found!");
            return None;
        }

        let output = output_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_output_path(path));

        let saved = self
            .run_model(path)
            .and_then(|dets| self.annotator.save_annotated(path, &dets, &output));

        match saved {
            Ok(()) => {
                info!(output = %output.display(), "annotated image saved");
                let _ = writeln!(out, "\n💾 Annotated image saved: {}", output.display());
                Some(output)
            }
            Err(e) => {
                error!(image = image_path, "export failed: {e}");
                let _ = writeln!(out, "❌ Error: could not save annotated image: {e}");
                None
            }
        }
    }

    fn run_model(&self, image_path: &Path) -> Result<Vec<Detection>, DomainError> {
        debug!(model = %self.model.onnx_path, "loading model");
        let mut detector = self.catalog.load(&self.model)?;
        detector.detect(image_path)
    }
}

/// `<parent>/<stem>_detected<.ext>` for the given input image.
pub fn default_output_path(image_path: &Path) -> PathBuf {
    let stem = image_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = image_path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let file_name = format!("{stem}{OUTPUT_SUFFIX}{suffix}");
    match image_path.parent() {
        Some(parent) => parent.join(file_name),
        None => PathBuf::from(file_name),
    }
}
