use std::io::Write;

use tracing::{debug, warn};

use crate::application::services::{DetectionService, EnvironmentService};
use crate::config::{CUDA_ENV, MODEL_ENV};
use crate::domain::model::ModelId;

pub const DEFAULT_CONFIDENCE: f32 = 0.5;

const SAVE_FLAG: &str = "--save";
const CONF_PREFIX: &str = "--conf=";
const BANNER_RULE: &str = "============================================================";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Usage,
    Detect(DetectArgs),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectArgs {
    pub image_path: String,
    pub save: bool,
    pub confidence: f32,
    pub warnings: Vec<String>,
}

/// Interprets the full argument vector, program name included.
///
/// The first argument after the program name is always the image path.
/// `--save` and `--conf=X` are recognized anywhere; every other token is
/// ignored. An unparsable `--conf` value keeps the previous threshold.
pub fn parse_args(args: &[String]) -> Command {
    let Some(image_path) = args.get(1) else {
        return Command::Usage;
    };

    let save = args.iter().any(|a| a == SAVE_FLAG);

    let mut confidence = DEFAULT_CONFIDENCE;
    let mut warnings = Vec::new();
    for arg in args {
        let Some(value) = arg.strip_prefix(CONF_PREFIX) else {
            continue;
        };
        let value = value.split('=').next().unwrap_or_default().trim();
        match value.parse::<f32>() {
            Ok(parsed) => confidence = parsed,
            Err(_) => warnings.push(format!(
                "⚠️ Invalid confidence value '{value}', keeping {confidence}."
            )),
        }
    }

    Command::Detect(DetectArgs {
        image_path: image_path.clone(),
        save,
        confidence,
        warnings,
    })
}

pub fn usage() -> String {
    format!(
        "
📖 Usage:
   object-detector <image_path> [--save] [--conf=FLOAT]

📌 Examples:
   object-detector photo.jpg
   object-detector /data/images/test.png --save

🔧 Options:
   --save    : draw the detected objects on the image and save a copy
   --conf=X  : confidence threshold (default: {DEFAULT_CONFIDENCE}, e.g. --conf=0.3)

⚙️ Environment:
   {MODEL_ENV}  : path to the YOLOv8 ONNX weights (default: yolov8n.onnx)
   {CUDA_ENV}   : set to 0 to skip the CUDA execution provider"
    )
}

/// Whole program flow. Every outcome ends normally; problems are reported on `out`.
pub fn run(
    args: &[String],
    environment: &EnvironmentService,
    detection: &DetectionService,
    model: &ModelId,
    out: &mut dyn Write,
) {
    let _ = writeln!(out, "{BANNER_RULE}");
    let _ = writeln!(out, "🖼️  OBJECT DETECTOR - find the objects in an image");
    let _ = writeln!(out, "{BANNER_RULE}");

    if !environment.check(model, out) {
        let _ = writeln!(out, "\n⚠️ Environment is not ready. Fix the issues above and run the program again.");
        return;
    }

    let args = match parse_args(args) {
        Command::Usage => {
            let _ = writeln!(out, "{}", usage());
            return;
        }
        Command::Detect(args) => args,
    };

    for warning in &args.warnings {
        warn!("{warning}");
        let _ = writeln!(out, "{warning}");
    }
    debug!(image = %args.image_path, save = args.save, confidence = args.confidence, "arguments parsed");

    let detected = detection.detect_objects(&args.image_path, args.confidence, out);

    if args.save && !detected.is_empty() {
        detection.save_annotated_image(&args.image_path, None, out);
    }

    let _ = writeln!(out, "\n{BANNER_RULE}");
    let _ = writeln!(out, "✨ Done!");
    let _ = writeln!(out, "{BANNER_RULE}");
}
