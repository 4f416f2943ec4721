use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};

use crate::application::ports::RuntimeProbePort;
use crate::domain::errors::{DomainError, DomainResult};

pub const ORT_DYLIB_ENV: &str = "ORT_DYLIB_PATH";

/// Checks that ONNX Runtime and the image codecs can be used.
/// `dylib_path` mirrors `ORT_DYLIB_PATH`; `None` means the bundled runtime.
pub struct OrtRuntimeProbe {
    dylib_path: Option<String>,
}

impl OrtRuntimeProbe {
    pub fn new(dylib_path: Option<String>) -> Self {
        Self { dylib_path }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var(ORT_DYLIB_ENV).ok().filter(|p| !p.trim().is_empty()))
    }
}

impl RuntimeProbePort for OrtRuntimeProbe {
    fn check_inference_runtime(&self) -> DomainResult<()> {
        match &self.dylib_path {
            Some(path) if !Path::new(path).is_file() => Err(DomainError::Environment(format!(
                "{ORT_DYLIB_ENV} points to a missing library: {path}"
            ))),
            _ => Ok(()),
        }
    }

    fn check_image_io(&self) -> DomainResult<()> {
        let probe = RgbImage::from_pixel(1, 1, Rgb([255, 0, 0]));
        let mut buf = Cursor::new(Vec::new());
        probe
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(|e| DomainError::Environment(format!("PNG encoding unavailable: {e}")))?;
        let decoded = image::load_from_memory_with_format(buf.get_ref(), ImageFormat::Png)
            .map_err(|e| DomainError::Environment(format!("PNG decoding unavailable: {e}")))?;
        if decoded.to_rgb8().get_pixel(0, 0) != &Rgb([255, 0, 0]) {
            return Err(DomainError::Environment("PNG round trip altered pixels".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_runtime_is_ready() {
        let probe = OrtRuntimeProbe::new(None);
        assert!(probe.check_inference_runtime().is_ok());
        assert!(probe.check_image_io().is_ok());
    }

    #[test]
    fn missing_dylib_is_reported() {
        let probe = OrtRuntimeProbe::new(Some("/nowhere/libonnxruntime.so".into()));
        let err = probe.check_inference_runtime().unwrap_err();
        assert!(err.to_string().contains(ORT_DYLIB_ENV));
    }

    #[test]
    fn existing_dylib_is_accepted() {
        let lib = tempfile::NamedTempFile::new().unwrap();
        let probe = OrtRuntimeProbe::new(Some(lib.path().to_string_lossy().into_owned()));
        assert!(probe.check_inference_runtime().is_ok());
    }
}
