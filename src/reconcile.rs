//! Turns the drawing surface's shape set into store appends without
//! duplicating what is already recorded.

use chrono::{DateTime, Local};

use crate::model::{Category, ShapeRecord};
use crate::store::AnnotationStore;

/// Reconcile one refresh of the drawing surface against the store.
///
/// `shapes` is the complete current set of shapes on the surface, not a
/// delta. Each one is compared structurally against every active
/// annotation's shape; only unseen shapes become annotations, in the order
/// they appear in `shapes`, tagged with `category` and an empty note.
/// Existing annotations are never removed or mutated here; deleting a shape
/// on the surface does not delete its annotation.
///
/// Returns the number of annotations appended. The quadratic comparison is
/// fine at interactive scale (tens of shapes).
pub fn reconcile(
    store: &mut AnnotationStore,
    shapes: &[ShapeRecord],
    category: Category,
    now: DateTime<Local>,
) -> usize {
    let mut appended = 0;
    for shape in shapes {
        if !store.contains_shape(shape) {
            store.append(shape.clone(), category, now);
            appended += 1;
        }
    }
    appended
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Color4;
    use chrono::TimeZone;

    fn ts() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 11, 5, 10, 30, 0).unwrap()
    }

    fn rect(left: f32) -> ShapeRecord {
        ShapeRecord::Rect {
            left,
            top: 10.0,
            width: 50.0,
            height: 20.0,
            stroke: Color4::default(),
            stroke_width: 2.0,
        }
    }

    #[test]
    fn single_rect_then_undo_then_redo() {
        // The end-to-end flow: one blue 50x20 rectangle at (10,10) drawn
        // with the Dosage category selected.
        let mut store = AnnotationStore::new();
        let shape = rect(10.0);
        let appended = reconcile(&mut store, std::slice::from_ref(&shape), Category::Dosage, ts());
        assert_eq!(appended, 1);
        assert_eq!(store.len(), 1);

        let recorded = store.annotations()[0].clone();
        assert_eq!(recorded.category, Category::Dosage);
        assert_eq!(recorded.note, "");
        assert_eq!(recorded.shape, shape);

        assert!(store.undo());
        assert!(store.is_empty());
        assert!(store.can_redo());

        assert!(store.redo());
        assert_eq!(store.len(), 1);
        assert!(!store.can_redo());
        assert_eq!(store.annotations()[0], recorded);
    }

    #[test]
    fn resubmitting_the_same_set_never_grows_the_store() {
        let mut store = AnnotationStore::new();
        let shapes = vec![rect(10.0), rect(100.0)];

        assert_eq!(reconcile(&mut store, &shapes, Category::Dosage, ts()), 2);
        assert_eq!(reconcile(&mut store, &shapes, Category::Dosage, ts()), 0);
        assert_eq!(reconcile(&mut store, &shapes, Category::Dosage, ts()), 0);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn only_new_shapes_are_appended_in_incoming_order() {
        let mut store = AnnotationStore::new();
        reconcile(&mut store, &[rect(10.0)], Category::Dosage, ts());

        let refreshed = vec![rect(200.0), rect(10.0), rect(300.0)];
        let appended = reconcile(&mut store, &refreshed, Category::Frequency, ts());
        assert_eq!(appended, 2);

        let lefts: Vec<f32> = store
            .annotations()
            .iter()
            .map(|a| match a.shape {
                ShapeRecord::Rect { left, .. } => left,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(lefts, [10.0, 200.0, 300.0]);
        assert_eq!(store.annotations()[1].category, Category::Frequency);
    }

    #[test]
    fn category_is_the_one_selected_at_refresh_time() {
        let mut store = AnnotationStore::new();
        reconcile(&mut store, &[rect(10.0)], Category::Dosage, ts());
        reconcile(&mut store, &[rect(10.0), rect(20.0)], Category::DoctorInfo, ts());

        assert_eq!(store.annotations()[0].category, Category::Dosage);
        assert_eq!(store.annotations()[1].category, Category::DoctorInfo);
    }

    #[test]
    fn quiet_refresh_leaves_redo_buffer_alone() {
        let mut store = AnnotationStore::new();
        let shapes = vec![rect(10.0), rect(20.0)];
        reconcile(&mut store, &shapes, Category::Dosage, ts());
        store.undo();

        // Refresh with nothing new: no append happens, so the pending redo
        // must survive.
        reconcile(&mut store, &shapes[..1], Category::Dosage, ts());
        assert!(store.can_redo());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn mixed_kinds_dedup_independently() {
        let mut store = AnnotationStore::new();
        let line = ShapeRecord::Line {
            start: (0.0, 0.0),
            end: (30.0, 40.0),
            stroke: Color4::default(),
            stroke_width: 2.0,
        };
        let circle = ShapeRecord::Circle {
            center: (50.0, 50.0),
            radius: 12.0,
            stroke: Color4::default(),
            stroke_width: 2.0,
        };
        let set = vec![rect(10.0), line.clone(), circle.clone()];

        assert_eq!(reconcile(&mut store, &set, Category::Other, ts()), 3);
        assert_eq!(reconcile(&mut store, &set, Category::Other, ts()), 0);

        let freehand = ShapeRecord::Freehand {
            points: vec![(0.0, 0.0), (1.0, 2.0), (3.0, 3.0)],
            stroke: Color4::default(),
            stroke_width: 2.0,
        };
        let mut grown = set.clone();
        grown.push(freehand);
        assert_eq!(reconcile(&mut store, &grown, Category::Other, ts()), 1);
        assert_eq!(store.len(), 4);
    }
}
