use std::path::Path;

use ab_glyph::{FontRef, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use tracing::debug;

use crate::application::ports::AnnotatorPort;
use crate::domain::detection::Detection;
use crate::domain::errors::{DomainError, DomainResult};

static FONT_DATA: &[u8] = include_bytes!("../../../assets/DejaVuSans.ttf");

// Ultralytics colour palette, indexed by class id.
const PALETTE: [[u8; 3]; 20] = [
    [0xFF, 0x38, 0x38], [0xFF, 0x9D, 0x97], [0xFF, 0x70, 0x1F], [0xFF, 0xB2, 0x1D],
    [0xCF, 0xD2, 0x31], [0x48, 0xF9, 0x0A], [0x92, 0xCC, 0x17], [0x3D, 0xDB, 0x86],
    [0x1A, 0x93, 0x34], [0x00, 0xD4, 0xBB], [0x2C, 0x99, 0xA8], [0x00, 0xC2, 0xFF],
    [0x34, 0x45, 0x93], [0x64, 0x73, 0xFF], [0x00, 0x18, 0xEC], [0x84, 0x38, 0xFF],
    [0x52, 0x00, 0x85], [0xCB, 0x38, 0xFF], [0xFF, 0x95, 0xC8], [0xFF, 0x37, 0xC7],
];

const LABEL_PAD: u32 = 2;

/// Draws labelled detection boxes onto a copy of the source image and
/// encodes it in the format implied by the output extension.
#[derive(Default)]
pub struct ImageAnnotator;

impl ImageAnnotator {
    pub fn new() -> Self {
        Self
    }
}

impl AnnotatorPort for ImageAnnotator {
    fn save_annotated(
        &self,
        image_path: &Path,
        detections: &[Detection],
        output_path: &Path,
    ) -> DomainResult<()> {
        let mut img = image::open(image_path)
            .map_err(|e| DomainError::InvalidInput(format!("cannot decode {}: {e}", image_path.display())))?
            .into_rgb8();

        let font = FontRef::try_from_slice(FONT_DATA)
            .map_err(|e| DomainError::OperationFailed(format!("cannot load label font: {e}")))?;
        let thickness = line_width(img.width(), img.height());
        let scale = PxScale::from(font_size(img.width(), img.height()));

        for det in detections {
            let color = class_color(det.class_id);
            draw_rect(&mut img, det.bounding_box, color, thickness);
            draw_label(&mut img, det, color, &font, scale);
        }
        debug!(boxes = detections.len(), thickness, "boxes drawn");

        img.save(output_path).map_err(|e| {
            DomainError::OperationFailed(format!("cannot write {}: {e}", output_path.display()))
        })
    }
}

pub fn class_color(class_id: usize) -> Rgb<u8> {
    Rgb(PALETTE[class_id % PALETTE.len()])
}

/// Box line width scaled to the image, never thinner than 2px.
pub fn line_width(width: u32, height: u32) -> u32 {
    (((width + height) as f32 / 2.0 * 0.003).round() as u32).max(2)
}

/// Label font size in pixels, never smaller than 12px.
pub fn font_size(width: u32, height: u32) -> f32 {
    ((width + height) as f32 / 2.0 * 0.035).round().max(12.0)
}

/// `<class> <confidence>` as printed on the label tab.
pub fn label_text(det: &Detection) -> String {
    format!("{} {:.2}", det.class_name, det.confidence)
}

/// Top-left corner of a label tab of height `label_h` for a box whose top-left
/// corner is `(x0, y0)`: above the box, or just inside it when there is no room.
pub fn label_origin(x0: u32, y0: u32, label_h: u32) -> (u32, u32) {
    if y0 >= label_h {
        (x0, y0 - label_h)
    } else {
        (x0, y0)
    }
}

fn clamp_box(bbox: [f32; 4], w: u32, h: u32) -> Option<[u32; 4]> {
    if w == 0 || h == 0 {
        return None;
    }
    let clamp = |v: f32, max: u32| -> u32 { v.max(0.0).min((max - 1) as f32) as u32 };
    let x0 = clamp(bbox[0], w);
    let y0 = clamp(bbox[1], h);
    let x1 = clamp(bbox[2], w);
    let y1 = clamp(bbox[3], h);
    if x0 > x1 || y0 > y1 {
        return None;
    }
    Some([x0, y0, x1, y1])
}

/// Draw a rectangle border with given thickness; the box is clamped to the image.
pub fn draw_rect(img: &mut RgbImage, bbox: [f32; 4], color: Rgb<u8>, thickness: u32) {
    let (w, h) = img.dimensions();
    let Some([x0, y0, x1, y1]) = clamp_box(bbox, w, h) else {
        return;
    };

    for t in 0..thickness {
        let xx0 = x0.saturating_add(t);
        let yy0 = y0.saturating_add(t);
        let xx1 = x1.saturating_sub(t);
        let yy1 = y1.saturating_sub(t);
        if xx0 > xx1 || yy0 > yy1 {
            break;
        }
        let rect = Rect::at(xx0 as i32, yy0 as i32).of_size(xx1 - xx0 + 1, yy1 - yy0 + 1);
        draw_hollow_rect_mut(img, rect, color);
    }
}

/// Filled tab in the class colour carrying the label text in white.
pub fn draw_label(
    img: &mut RgbImage,
    det: &Detection,
    color: Rgb<u8>,
    font: &FontRef<'_>,
    scale: PxScale,
) {
    let (w, h) = img.dimensions();
    let Some([x0, y0, _, _]) = clamp_box(det.bounding_box, w, h) else {
        return;
    };

    let text = label_text(det);
    let (text_w, text_h) = text_size(scale, font, &text);
    let tab_w = text_w + 2 * LABEL_PAD;
    let tab_h = text_h + 2 * LABEL_PAD;
    let (lx, ly) = label_origin(x0, y0, tab_h);

    draw_filled_rect_mut(img, Rect::at(lx as i32, ly as i32).of_size(tab_w, tab_h), color);
    draw_text_mut(
        img,
        Rgb([255, 255, 255]),
        (lx + LABEL_PAD) as i32,
        (ly + LABEL_PAD) as i32,
        scale,
        font,
        &text,
    );
}
