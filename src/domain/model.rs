use std::path::Path;

pub const DEFAULT_MODEL_PATH: &str = "yolov8n.onnx";

#[derive(Debug, Clone, PartialEq)]
pub struct ModelId {
    pub name: String,      // logical name, e.g. "yolov8n"
    pub onnx_path: String, // filesystem path
}

impl ModelId {
    /// Builds an id whose logical name is the file stem of `onnx_path`.
    pub fn from_path(onnx_path: impl Into<String>) -> Self {
        let onnx_path = onnx_path.into();
        let name = Path::new(&onnx_path)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| onnx_path.clone());
        Self { name, onnx_path }
    }
}

impl Default for ModelId {
    fn default() -> Self {
        Self::from_path(DEFAULT_MODEL_PATH)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct YoloParams {
    pub input_size: u32,       // 640 typical
    pub conf_threshold: f32,   // model-level floor, 0..1
    pub iou_threshold: f32,    // 0..1
    pub max_detections: usize, // e.g. 300
}

impl Default for YoloParams {
    fn default() -> Self {
        Self {
            input_size: 640,
            conf_threshold: 0.25,
            iou_threshold: 0.7,
            max_detections: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeOptions {
    pub intra_threads: usize,
    pub use_cuda: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self { intra_threads: 4, use_cuda: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectorConfig {
    pub model: ModelId,
    pub params: YoloParams,
    pub runtime: RuntimeOptions,
}
