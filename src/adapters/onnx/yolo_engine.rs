use anyhow::{anyhow, Result};
use image::{imageops::FilterType, RgbImage};
use ndarray::{Array4, ArrayViewD, Axis, Ix2, IxDyn};
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use super::class_names::{coco_names, parse_names_metadata};
use super::postprocess::decode_predictions;
use crate::application::ports::DetectorPort;
use crate::domain::detection::Detection;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::{RuntimeOptions, YoloParams};

pub struct OnnxYoloEngine {
    session: Session,
    params: YoloParams,
    class_names: Vec<String>,
}

impl OnnxYoloEngine {
    pub fn load(path: &str, params: &YoloParams, runtime: &RuntimeOptions) -> Result<Self> {
        let mut builder = Session::builder()?.with_intra_threads(runtime.intra_threads.max(1))?;

        // CUDA is optional: registered when available, otherwise we stay on CPU.
        if runtime.use_cuda {
            let cuda = CUDAExecutionProvider::default().build();
            if let Ok(builder_with_cuda) = builder.clone().with_execution_providers([cuda]) {
                builder = builder_with_cuda;
            }
        }

        let model_bytes = fs::read(path)?;
        let session = builder.commit_from_memory(&model_bytes)?;

        let class_names = match read_names_metadata(&session) {
            Some(names) => names,
            None => {
                debug!("model has no usable `names` metadata, using COCO classes");
                coco_names()
            }
        };

        info!(model = path, classes = class_names.len(), "model loaded");

        Ok(Self {
            session,
            params: params.clone(),
            class_names,
        })
    }

    pub fn infer(&mut self, rgb: &RgbImage) -> Result<Vec<Detection>> {
        let imgsz = self.params.input_size as usize;
        if imgsz == 0 {
            return Err(anyhow!("input size must be positive"));
        }
        let resized = image::imageops::resize(rgb, imgsz as u32, imgsz as u32, FilterType::Triangle);

        let mut input = Array4::<f32>::zeros((1, 3, imgsz, imgsz));
        for (x, y, pixel) in resized.enumerate_pixels() {
            input[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
            input[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
            input[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
        }

        let input_shape = vec![1, 3, imgsz as i64, imgsz as i64];
        let (data, _) = input.into_raw_vec_and_offset();
        let input_tensor = Value::from_array((input_shape, data))?;

        let outputs = self.session.run(ort::inputs![input_tensor])?;
        let (shape_out, data_out) = outputs[0].try_extract_tensor::<f32>()?;

        let dims: Vec<usize> = shape_out.iter().map(|&x| x as usize).collect();
        if dims.len() != 3 {
            return Err(anyhow!("unexpected output shape {:?}", dims));
        }
        let array_view = ArrayViewD::from_shape(IxDyn(&dims), data_out)?;
        let view = array_view.index_axis(Axis(0), 0).into_dimensionality::<Ix2>()?;

        let detections = decode_predictions(
            view,
            (rgb.width(), rgb.height()),
            &self.params,
            &self.class_names,
        );
        debug!(candidates = dims[2], kept = detections.len(), "inference finished");
        Ok(detections)
    }
}

impl DetectorPort for OnnxYoloEngine {
    fn detect(&mut self, image_path: &Path) -> DomainResult<Vec<Detection>> {
        let rgb = image::open(image_path)
            .map_err(|e| DomainError::InvalidInput(format!("cannot decode {}: {e}", image_path.display())))?
            .to_rgb8();
        Ok(self.infer(&rgb)?)
    }
}

fn read_names_metadata(session: &Session) -> Option<Vec<String>> {
    let metadata = match session.metadata() {
        Ok(m) => m,
        Err(e) => {
            warn!("cannot read model metadata: {e}");
            return None;
        }
    };
    let raw = metadata.custom("names").ok().flatten()?;
    parse_names_metadata(&raw)
}
