//! In-memory port implementations for service and orchestration tests.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::application::ports::{AnnotatorPort, DetectorPort, ModelCatalogPort, RuntimeProbePort};
use crate::domain::{
    detection::Detection,
    errors::{DomainError, DomainResult},
    model::ModelId,
};

pub struct FakeDetector(pub Vec<Detection>);

impl DetectorPort for FakeDetector {
    fn detect(&mut self, _image_path: &Path) -> DomainResult<Vec<Detection>> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
pub struct FakeCatalog {
    pub detections: Vec<Detection>,
    pub missing: bool,
    pub fail_load: bool,
    pub loads: Mutex<usize>,
}

impl ModelCatalogPort for FakeCatalog {
    fn validate_model(&self, model: &ModelId) -> DomainResult<()> {
        if self.missing {
            return Err(DomainError::NotFound(model.onnx_path.clone()));
        }
        Ok(())
    }

    fn load(&self, model: &ModelId) -> DomainResult<Box<dyn DetectorPort>> {
        *self.loads.lock().unwrap() += 1;
        if self.fail_load {
            return Err(DomainError::OperationFailed(format!("cannot load {}", model.name)));
        }
        Ok(Box::new(FakeDetector(self.detections.clone())))
    }
}

#[derive(Default)]
pub struct FakeAnnotator {
    pub saved: Mutex<Vec<(PathBuf, usize)>>,
}

impl AnnotatorPort for FakeAnnotator {
    fn save_annotated(
        &self,
        _image_path: &Path,
        detections: &[Detection],
        output_path: &Path,
    ) -> DomainResult<()> {
        self.saved
            .lock()
            .unwrap()
            .push((output_path.to_path_buf(), detections.len()));
        Ok(())
    }
}

pub struct FakeProbe {
    pub runtime_ok: bool,
    pub image_io_ok: bool,
}

impl FakeProbe {
    pub fn ready() -> Self {
        Self {
            runtime_ok: true,
            image_io_ok: true,
        }
    }
}

impl RuntimeProbePort for FakeProbe {
    fn check_inference_runtime(&self) -> DomainResult<()> {
        if self.runtime_ok {
            Ok(())
        } else {
            Err(DomainError::Environment("libonnxruntime.so missing".into()))
        }
    }

    fn check_image_io(&self) -> DomainResult<()> {
        if self.image_io_ok {
            Ok(())
        } else {
            Err(DomainError::Environment("PNG codec missing".into()))
        }
    }
}
