use std::str::FromStr;

use tracing::warn;

use crate::domain::model::{DetectorConfig, ModelId};

pub const MODEL_ENV: &str = "OBJDET_MODEL";
pub const INPUT_SIZE_ENV: &str = "OBJDET_INPUT_SIZE";
pub const MODEL_CONF_ENV: &str = "OBJDET_MODEL_CONF";
pub const IOU_ENV: &str = "OBJDET_IOU";
pub const MAX_DET_ENV: &str = "OBJDET_MAX_DET";
pub const THREADS_ENV: &str = "OBJDET_THREADS";
pub const CUDA_ENV: &str = "OBJDET_CUDA";

/// Process configuration: defaults overridden by `OBJDET_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    pub detector: DetectorConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        let detector = &mut cfg.detector;

        if let Some(path) = lookup(MODEL_ENV).filter(|p| !p.trim().is_empty()) {
            detector.model = ModelId::from_path(path.trim());
        }

        override_parsed(&lookup, INPUT_SIZE_ENV, &mut detector.params.input_size);
        override_parsed(&lookup, MODEL_CONF_ENV, &mut detector.params.conf_threshold);
        override_parsed(&lookup, IOU_ENV, &mut detector.params.iou_threshold);
        override_parsed(&lookup, MAX_DET_ENV, &mut detector.params.max_detections);
        override_parsed(&lookup, THREADS_ENV, &mut detector.runtime.intra_threads);

        if let Some(raw) = lookup(CUDA_ENV) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => detector.runtime.use_cuda = true,
                "0" | "false" | "no" | "off" => detector.runtime.use_cuda = false,
                other => warn!("{CUDA_ENV}={other:?} is not a boolean, keeping {}", detector.runtime.use_cuda),
            }
        }

        cfg
    }
}

fn override_parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, slot: &mut T)
where
    T: FromStr + std::fmt::Debug,
{
    let Some(raw) = lookup(key) else { return };
    match raw.trim().parse::<T>() {
        Ok(value) => *slot = value,
        Err(_) => warn!("{key}={raw:?} is invalid, keeping {slot:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let cfg = AppConfig::from_lookup(|_| None);
        assert_eq!(cfg.detector.model.onnx_path, "yolov8n.onnx");
        assert_eq!(cfg.detector.params.input_size, 640);
        assert_eq!(cfg.detector.params.conf_threshold, 0.25);
        assert!(cfg.detector.runtime.use_cuda);
    }

    #[test]
    fn environment_overrides_defaults() {
        let cfg = AppConfig::from_lookup(lookup(&[
            (MODEL_ENV, "models/yolov8s.onnx"),
            (INPUT_SIZE_ENV, "320"),
            (MODEL_CONF_ENV, "0.1"),
            (IOU_ENV, "0.5"),
            (MAX_DET_ENV, "50"),
            (THREADS_ENV, "2"),
            (CUDA_ENV, "off"),
        ]));
        let d = &cfg.detector;
        assert_eq!(d.model.name, "yolov8s");
        assert_eq!(d.params.input_size, 320);
        assert_eq!(d.params.conf_threshold, 0.1);
        assert_eq!(d.params.iou_threshold, 0.5);
        assert_eq!(d.params.max_detections, 50);
        assert_eq!(d.runtime.intra_threads, 2);
        assert!(!d.runtime.use_cuda);
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let cfg = AppConfig::from_lookup(lookup(&[
            (MODEL_ENV, "   "),
            (INPUT_SIZE_ENV, "big"),
            (CUDA_ENV, "maybe"),
        ]));
        assert_eq!(cfg, AppConfig::default());
    }
}
