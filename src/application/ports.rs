use std::path::Path;

use crate::domain::{detection::Detection, errors::DomainResult, model::ModelId};

/// A loaded model, ready to run on image files.
pub trait DetectorPort {
    /// Every detection the model reports for the image, after its own
    /// post-processing, highest confidence first.
    fn detect(&mut self, image_path: &Path) -> DomainResult<Vec<Detection>>;
}

pub trait ModelCatalogPort: Send + Sync {
    fn validate_model(&self, model: &ModelId) -> DomainResult<()>;
    fn load(&self, model: &ModelId) -> DomainResult<Box<dyn DetectorPort>>;
}

/// Probe for the runtime pieces a model needs beyond its weights.
pub trait RuntimeProbePort: Send + Sync {
    fn check_inference_runtime(&self) -> DomainResult<()>;
    fn check_image_io(&self) -> DomainResult<()>;
}

pub trait AnnotatorPort: Send + Sync {
    fn save_annotated(
        &self,
        image_path: &Path,
        detections: &[Detection],
        output_path: &Path,
    ) -> DomainResult<()>;
}
