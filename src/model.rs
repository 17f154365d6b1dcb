//! Data model: shape geometry, annotation categories, annotation records.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color4 {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color4 {
    pub fn from_rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn to_egui(&self) -> egui::Color32 {
        egui::Color32::from_rgba_unmultiplied(
            (self.r * 255.0) as u8,
            (self.g * 255.0) as u8,
            (self.b * 255.0) as u8,
            (self.a * 255.0) as u8,
        )
    }

    pub fn to_rgba8(&self) -> [u8; 4] {
        [
            (self.r * 255.0) as u8,
            (self.g * 255.0) as u8,
            (self.b * 255.0) as u8,
            (self.a * 255.0) as u8,
        ]
    }
}

impl Default for Color4 {
    fn default() -> Self {
        // Opaque blue, the default stroke.
        Self {
            r: 0.0,
            g: 0.0,
            b: 1.0,
            a: 1.0,
        }
    }
}

/// One shape drawn on the canvas, plus its stroke styling.
///
/// Produced by the drawing surface and never mutated afterwards; structural
/// equality over every field is what the reconciler dedups on. Coordinates
/// are in working-image space (after display downscaling).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeRecord {
    Rect {
        left: f32,
        top: f32,
        width: f32,
        height: f32,
        stroke: Color4,
        stroke_width: f32,
    },
    Line {
        start: (f32, f32),
        end: (f32, f32),
        stroke: Color4,
        stroke_width: f32,
    },
    Circle {
        center: (f32, f32),
        radius: f32,
        stroke: Color4,
        stroke_width: f32,
    },
    Freehand {
        points: Vec<(f32, f32)>,
        stroke: Color4,
        stroke_width: f32,
    },
}

impl ShapeRecord {
    pub fn stroke(&self) -> Color4 {
        match self {
            Self::Rect { stroke, .. }
            | Self::Line { stroke, .. }
            | Self::Circle { stroke, .. }
            | Self::Freehand { stroke, .. } => *stroke,
        }
    }

    pub fn stroke_width(&self) -> f32 {
        match self {
            Self::Rect { stroke_width, .. }
            | Self::Line { stroke_width, .. }
            | Self::Circle { stroke_width, .. }
            | Self::Freehand { stroke_width, .. } => *stroke_width,
        }
    }

    /// Axis-aligned bounding box as `(min_x, min_y, max_x, max_y)`.
    ///
    /// Anchors the exported label; an empty freehand path collapses to the
    /// origin rather than producing infinities.
    pub fn bounding_box(&self) -> (f32, f32, f32, f32) {
        match self {
            Self::Rect {
                left,
                top,
                width,
                height,
                ..
            } => (*left, *top, left + width, top + height),
            Self::Line { start, end, .. } => (
                start.0.min(end.0),
                start.1.min(end.1),
                start.0.max(end.0),
                start.1.max(end.1),
            ),
            Self::Circle { center, radius, .. } => (
                center.0 - radius,
                center.1 - radius,
                center.0 + radius,
                center.1 + radius,
            ),
            Self::Freehand { points, .. } => {
                if points.is_empty() {
                    return (0.0, 0.0, 0.0, 0.0);
                }
                let mut bb = (f32::MAX, f32::MAX, f32::MIN, f32::MIN);
                for p in points {
                    bb.0 = bb.0.min(p.0);
                    bb.1 = bb.1.min(p.1);
                    bb.2 = bb.2.max(p.0);
                    bb.3 = bb.3.max(p.1);
                }
                bb
            }
        }
    }
}

/// What a region of the prescription means.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Medication Name")]
    MedicationName,
    Dosage,
    Frequency,
    Duration,
    #[serde(rename = "Patient Info")]
    PatientInfo,
    #[serde(rename = "Doctor Info")]
    DoctorInfo,
    Other,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::MedicationName,
        Category::Dosage,
        Category::Frequency,
        Category::Duration,
        Category::PatientInfo,
        Category::DoctorInfo,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::MedicationName => "Medication Name",
            Category::Dosage => "Dosage",
            Category::Frequency => "Frequency",
            Category::Duration => "Duration",
            Category::PatientInfo => "Patient Info",
            Category::DoctorInfo => "Doctor Info",
            Category::Other => "Other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identity for an annotation, assigned by the store at creation.
/// List positions shift on deletion; this does not.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AnnotationId(pub(crate) u64);

impl std::fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A shape tagged with a category, free-text note, and creation time.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub id: AnnotationId,
    pub shape: ShapeRecord,
    pub category: Category,
    pub note: String,
    pub created_at: DateTime<Local>,
}

/// Decode a canvas-object payload (`{"objects": [...]}`), dropping records
/// whose kind or geometry is unrecognized instead of failing the refresh.
pub fn decode_shapes(payload: &serde_json::Value) -> Vec<ShapeRecord> {
    let Some(objects) = payload.get("objects").and_then(|v| v.as_array()) else {
        return Vec::new();
    };
    objects
        .iter()
        .filter_map(|obj| match serde_json::from_value(obj.clone()) {
            Ok(shape) => Some(shape),
            Err(err) => {
                log::warn!("dropping unrecognized canvas object: {err}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(left: f32, top: f32) -> ShapeRecord {
        ShapeRecord::Rect {
            left,
            top,
            width: 50.0,
            height: 20.0,
            stroke: Color4::default(),
            stroke_width: 2.0,
        }
    }

    #[test]
    fn structural_equality_covers_every_field() {
        assert_eq!(rect(10.0, 10.0), rect(10.0, 10.0));
        assert_ne!(rect(10.0, 10.0), rect(10.0, 11.0));

        let thick = ShapeRecord::Rect {
            left: 10.0,
            top: 10.0,
            width: 50.0,
            height: 20.0,
            stroke: Color4::default(),
            stroke_width: 3.0,
        };
        assert_ne!(rect(10.0, 10.0), thick);
    }

    #[test]
    fn bounding_box_per_kind() {
        assert_eq!(rect(10.0, 10.0).bounding_box(), (10.0, 10.0, 60.0, 30.0));

        let line = ShapeRecord::Line {
            start: (40.0, 5.0),
            end: (10.0, 25.0),
            stroke: Color4::default(),
            stroke_width: 2.0,
        };
        assert_eq!(line.bounding_box(), (10.0, 5.0, 40.0, 25.0));

        let circle = ShapeRecord::Circle {
            center: (50.0, 50.0),
            radius: 10.0,
            stroke: Color4::default(),
            stroke_width: 2.0,
        };
        assert_eq!(circle.bounding_box(), (40.0, 40.0, 60.0, 60.0));

        let empty = ShapeRecord::Freehand {
            points: Vec::new(),
            stroke: Color4::default(),
            stroke_width: 2.0,
        };
        assert_eq!(empty.bounding_box(), (0.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn category_strings_are_exact() {
        let names: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(
            names,
            [
                "Medication Name",
                "Dosage",
                "Frequency",
                "Duration",
                "Patient Info",
                "Doctor Info",
                "Other"
            ]
        );
        let json = serde_json::to_string(&Category::MedicationName).unwrap();
        assert_eq!(json, "\"Medication Name\"");
    }

    #[test]
    fn decode_shapes_drops_unknown_kinds() {
        let payload = serde_json::json!({
            "objects": [
                { "type": "rect", "left": 10.0, "top": 10.0, "width": 50.0,
                  "height": 20.0,
                  "stroke": { "r": 0.0, "g": 0.0, "b": 1.0, "a": 1.0 },
                  "stroke_width": 2.0 },
                { "type": "triangle", "points": [] },
                { "type": "line", "start": [0.0, 0.0], "end": [5.0, 5.0],
                  "stroke": { "r": 1.0, "g": 0.0, "b": 0.0, "a": 1.0 },
                  "stroke_width": 1.0 },
            ]
        });
        let shapes = decode_shapes(&payload);
        assert_eq!(shapes.len(), 2);
        assert!(matches!(shapes[0], ShapeRecord::Rect { .. }));
        assert!(matches!(shapes[1], ShapeRecord::Line { .. }));
    }

    #[test]
    fn decode_shapes_without_objects_is_empty() {
        assert!(decode_shapes(&serde_json::json!({})).is_empty());
        assert!(decode_shapes(&serde_json::json!({ "objects": 3 })).is_empty());
    }
}
