pub mod cli;
pub mod onnx;
pub mod render;
