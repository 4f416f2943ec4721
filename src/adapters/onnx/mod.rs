pub mod class_names;
pub mod model_catalog;
pub mod postprocess;
pub mod runtime_probe;
pub mod yolo_engine;
