//! Structured export: the JSON annotation record and the in-memory JPEG
//! encoding of the rendered image.

use chrono::{DateTime, Local};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Annotation, Category, ShapeRecord};

pub const JPEG_QUALITY: u8 = 95;

/// Stamp used in the document header and output file names.
pub const DOC_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
/// Stamp used for each annotation's creation time.
pub const ANNOTATION_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to encode annotated image: {0}")]
    Image(#[from] image::ImageError),
    #[error("failed to serialize annotation record: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write export file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportedAnnotation {
    pub category: Category,
    pub text: String,
    pub timestamp: String,
    pub object_data: ShapeRecord,
}

/// Everything needed to reconstruct the annotated image without the drawing
/// session: source identifier, export stamp, and each annotation's category,
/// note, creation time, and full shape geometry/style in creation order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub image_id: String,
    pub timestamp: String,
    pub annotations: Vec<ExportedAnnotation>,
}

impl ExportDocument {
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn export_record(
    image_id: &str,
    now: DateTime<Local>,
    annotations: &[Annotation],
) -> ExportDocument {
    ExportDocument {
        image_id: image_id.to_owned(),
        timestamp: now.format(DOC_TIMESTAMP_FORMAT).to_string(),
        annotations: annotations
            .iter()
            .map(|ann| ExportedAnnotation {
                category: ann.category,
                text: ann.note.clone(),
                timestamp: ann
                    .created_at
                    .format(ANNOTATION_TIMESTAMP_FORMAT)
                    .to_string(),
                object_data: ann.shape.clone(),
            })
            .collect(),
    }
}

/// Encode the rendered image as a quality-95 JPEG, in memory. JPEG carries
/// no alpha channel, so the buffer is flattened to RGB first.
pub fn encode_jpeg(img: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let rgb = DynamicImage::ImageRgba8(img.clone()).to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY).encode_image(&rgb)?;
    Ok(buf)
}
