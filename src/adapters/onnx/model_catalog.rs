use std::fs;
use std::path::Path;

use crate::adapters::onnx::yolo_engine::OnnxYoloEngine;
use crate::application::ports::{DetectorPort, ModelCatalogPort};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::{ModelId, RuntimeOptions, YoloParams};

pub struct OnnxModelCatalog {
    params: YoloParams,
    runtime: RuntimeOptions,
}

impl OnnxModelCatalog {
    pub fn new(params: YoloParams, runtime: RuntimeOptions) -> Self {
        Self { params, runtime }
    }
}

impl ModelCatalogPort for OnnxModelCatalog {
    fn validate_model(&self, model: &ModelId) -> DomainResult<()> {
        if model.onnx_path.trim().is_empty() {
            return Err(DomainError::InvalidInput("onnx_path empty".into()));
        }
        let path = Path::new(&model.onnx_path);
        if !path.exists() {
            return Err(DomainError::NotFound(format!("model file not found: {}", model.onnx_path)));
        }
        let meta = fs::metadata(path).map_err(|e| DomainError::OperationFailed(e.to_string()))?;
        if !meta.is_file() {
            return Err(DomainError::InvalidInput(format!("not a file: {}", model.onnx_path)));
        }
        if meta.len() == 0 {
            return Err(DomainError::InvalidInput(format!("model file is empty: {}", model.onnx_path)));
        }
        Ok(())
    }

    fn load(&self, model: &ModelId) -> DomainResult<Box<dyn DetectorPort>> {
        self.validate_model(model)?;
        let engine = OnnxYoloEngine::load(&model.onnx_path, &self.params, &self.runtime)?;
        Ok(Box::new(engine))
    }
}
