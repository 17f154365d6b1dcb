//! The drawing surface: paints the working image plus every recorded shape,
//! and turns pointer drags into [`ShapeRecord`]s.
//!
//! This is the shape source the core consumes from. It owns the surface's
//! complete current shape list; the app hands that list to the reconciler
//! after every frame.

use egui::{Pos2, Rect, Sense, Stroke, StrokeKind, Vec2};

use crate::model::{Color4, ShapeRecord};
use crate::session::Tool;

/// Drags shorter than this are treated as slips, not shapes.
const MIN_DRAG: f32 = 5.0;

#[derive(Clone, Debug, Default)]
enum DragShape {
    #[default]
    None,
    Rect {
        start: Pos2,
    },
    Line {
        start: Pos2,
    },
    Circle {
        start: Pos2,
    },
    Freehand {
        points: Vec<(f32, f32)>,
    },
}

#[derive(Default)]
pub struct CanvasState {
    /// Complete current set of shapes on the surface, in draw order.
    pub shapes: Vec<ShapeRecord>,
    drag: DragShape,
}

impl CanvasState {
    pub fn clear(&mut self) {
        self.shapes.clear();
        self.drag = DragShape::None;
    }

    /// Drop the first shape structurally equal to `shape` (undo/delete keep
    /// the surface in step with the store through this).
    pub fn remove_shape(&mut self, shape: &ShapeRecord) -> bool {
        match self.shapes.iter().position(|s| s == shape) {
            Some(pos) => {
                self.shapes.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        texture: &egui::TextureHandle,
        image_size: Vec2,
        tool: Tool,
        stroke_color: Color4,
        stroke_width: f32,
    ) {
        let (response, painter) = ui.allocate_painter(image_size, Sense::click_and_drag());
        let origin = response.rect.min;

        painter.image(
            texture.id(),
            Rect::from_min_size(origin, image_size),
            Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        for shape in &self.shapes {
            paint_shape(&painter, origin, shape);
        }

        let stroke = Stroke::new(stroke_width, stroke_color.to_egui());

        if response.drag_started_by(egui::PointerButton::Primary) {
            if let Some(pos) = response.hover_pos() {
                self.drag = match tool {
                    Tool::Rect => DragShape::Rect { start: pos },
                    Tool::Line => DragShape::Line { start: pos },
                    Tool::Circle => DragShape::Circle { start: pos },
                    Tool::Freehand => DragShape::Freehand {
                        points: vec![to_image(origin, pos)],
                    },
                };
            }
        }

        if response.dragged_by(egui::PointerButton::Primary) {
            if let Some(pos) = response.hover_pos() {
                if let DragShape::Freehand { points } = &mut self.drag {
                    let p = to_image(origin, pos);
                    if points.last() != Some(&p) {
                        points.push(p);
                    }
                }
                self.paint_preview(&painter, origin, pos, stroke);
            }
        }

        if response.drag_stopped_by(egui::PointerButton::Primary) {
            let end = response
                .hover_pos()
                .or(ui.ctx().input(|i| i.pointer.latest_pos()));
            if let Some(shape) =
                self.finish_drag(origin, end, stroke_color, stroke_width)
            {
                self.shapes.push(shape);
            }
        }
    }

    fn paint_preview(&self, painter: &egui::Painter, origin: Pos2, current: Pos2, stroke: Stroke) {
        match &self.drag {
            DragShape::None => {}
            DragShape::Rect { start } => {
                painter.rect_stroke(
                    Rect::from_two_pos(*start, current),
                    0.0,
                    stroke,
                    StrokeKind::Middle,
                );
            }
            DragShape::Line { start } => {
                painter.line_segment([*start, current], stroke);
            }
            DragShape::Circle { start } => {
                painter.circle_stroke(*start, (current - *start).length(), stroke);
            }
            DragShape::Freehand { points } => {
                let screen: Vec<Pos2> = points
                    .iter()
                    .map(|p| origin + egui::vec2(p.0, p.1))
                    .collect();
                painter.add(egui::Shape::line(screen, stroke));
            }
        }
    }

    fn finish_drag(
        &mut self,
        origin: Pos2,
        end: Option<Pos2>,
        stroke: Color4,
        stroke_width: f32,
    ) -> Option<ShapeRecord> {
        match std::mem::take(&mut self.drag) {
            DragShape::None => None,
            DragShape::Rect { start } => {
                let end = end?;
                if (end - start).length() <= MIN_DRAG {
                    return None;
                }
                let rect = Rect::from_two_pos(start, end);
                let min = to_image(origin, rect.min);
                Some(ShapeRecord::Rect {
                    left: min.0,
                    top: min.1,
                    width: rect.width(),
                    height: rect.height(),
                    stroke,
                    stroke_width,
                })
            }
            DragShape::Line { start } => {
                let end = end?;
                if (end - start).length() <= MIN_DRAG {
                    return None;
                }
                Some(ShapeRecord::Line {
                    start: to_image(origin, start),
                    end: to_image(origin, end),
                    stroke,
                    stroke_width,
                })
            }
            DragShape::Circle { start } => {
                let end = end?;
                let radius = (end - start).length();
                if radius <= MIN_DRAG {
                    return None;
                }
                Some(ShapeRecord::Circle {
                    center: to_image(origin, start),
                    radius,
                    stroke,
                    stroke_width,
                })
            }
            DragShape::Freehand { points } => {
                if points.len() < 2 {
                    return None;
                }
                Some(ShapeRecord::Freehand {
                    points,
                    stroke,
                    stroke_width,
                })
            }
        }
    }
}

fn to_image(origin: Pos2, pos: Pos2) -> (f32, f32) {
    (pos.x - origin.x, pos.y - origin.y)
}

fn paint_shape(painter: &egui::Painter, origin: Pos2, shape: &ShapeRecord) {
    let stroke = Stroke::new(shape.stroke_width(), shape.stroke().to_egui());
    match shape {
        ShapeRecord::Rect {
            left,
            top,
            width,
            height,
            ..
        } => {
            let rect = Rect::from_min_size(
                origin + egui::vec2(*left, *top),
                egui::vec2(*width, *height),
            );
            painter.rect_stroke(rect, 0.0, stroke, StrokeKind::Middle);
        }
        ShapeRecord::Line { start, end, .. } => {
            painter.line_segment(
                [
                    origin + egui::vec2(start.0, start.1),
                    origin + egui::vec2(end.0, end.1),
                ],
                stroke,
            );
        }
        ShapeRecord::Circle { center, radius, .. } => {
            painter.circle_stroke(origin + egui::vec2(center.0, center.1), *radius, stroke);
        }
        ShapeRecord::Freehand { points, .. } => {
            let screen: Vec<Pos2> = points
                .iter()
                .map(|p| origin + egui::vec2(p.0, p.1))
                .collect();
            painter.add(egui::Shape::line(screen, stroke));
        }
    }
}
