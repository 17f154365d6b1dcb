//! The annotation store: the canonical ordered list of annotations plus the
//! two-stack undo/redo history over it.

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::model::{Annotation, AnnotationId, Category, ShapeRecord};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("annotation index {0} is out of bounds")]
    IndexOutOfBounds(usize),
    #[error("no annotation with id {0}")]
    UnknownId(AnnotationId),
}

/// Owns every annotation of a session.
///
/// `active` holds the visible annotations in creation order; `redo_buffer`
/// holds annotations removed by [`undo`](Self::undo), most recent last. The
/// two never share an element, and no two shapes in `active` are
/// structurally equal (the reconciler only appends unseen shapes).
#[derive(Debug, Default)]
pub struct AnnotationStore {
    active: Vec<Annotation>,
    redo_buffer: Vec<Annotation>,
    next_id: u64,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an annotation for `shape` and push it onto the active list.
    ///
    /// A fresh append invalidates the redo buffer: once the list has moved
    /// on, redoing an older removal could resurrect a shape that has since
    /// been re-annotated, so the buffer is dropped instead.
    pub fn append(
        &mut self,
        shape: ShapeRecord,
        category: Category,
        created_at: DateTime<Local>,
    ) -> AnnotationId {
        let id = AnnotationId(self.next_id);
        self.next_id += 1;
        self.active.push(Annotation {
            id,
            shape,
            category,
            note: String::new(),
            created_at,
        });
        self.redo_buffer.clear();
        id
    }

    /// Remove and return the annotation with `id`. The redo buffer is left
    /// untouched; an explicit removal is not undoable.
    pub fn remove(&mut self, id: AnnotationId) -> Result<Annotation, StoreError> {
        let pos = self
            .active
            .iter()
            .position(|a| a.id == id)
            .ok_or(StoreError::UnknownId(id))?;
        Ok(self.active.remove(pos))
    }

    /// Index convenience over [`remove`](Self::remove).
    pub fn remove_at(&mut self, index: usize) -> Result<Annotation, StoreError> {
        let id = self.id_at(index)?;
        self.remove(id)
    }

    pub fn update_note(&mut self, id: AnnotationId, note: String) -> Result<(), StoreError> {
        let ann = self
            .active
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::UnknownId(id))?;
        ann.note = note;
        Ok(())
    }

    pub fn update_note_at(&mut self, index: usize, note: String) -> Result<(), StoreError> {
        let id = self.id_at(index)?;
        self.update_note(id, note)
    }

    /// Move the most recent annotation onto the redo buffer. Returns `false`
    /// (and does nothing) when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.active.pop() {
            Some(ann) => {
                self.redo_buffer.push(ann);
                true
            }
            None => false,
        }
    }

    /// Restore the most recently undone annotation, identical to the moment
    /// it was undone. Returns `false` when the buffer is empty.
    pub fn redo(&mut self) -> bool {
        match self.redo_buffer.pop() {
            Some(ann) => {
                self.active.push(ann);
                true
            }
            None => false,
        }
    }

    pub fn clear_all(&mut self) {
        self.active.clear();
        self.redo_buffer.clear();
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.active
    }

    /// The annotation a `redo` would restore next.
    pub fn last_undone(&self) -> Option<&Annotation> {
        self.redo_buffer.last()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        !self.active.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_buffer.is_empty()
    }

    /// Structural membership test, the reconciler's dedup primitive.
    pub fn contains_shape(&self, shape: &ShapeRecord) -> bool {
        self.active.iter().any(|a| &a.shape == shape)
    }

    fn id_at(&self, index: usize) -> Result<AnnotationId, StoreError> {
        self.active
            .get(index)
            .map(|a| a.id)
            .ok_or(StoreError::IndexOutOfBounds(index))
    }
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
    fn append_preserves_creation_order() {
        let mut store = AnnotationStore::new();
        store.append(rect(1.0), Category::Dosage, ts());
        store.append(rect(2.0), Category::Frequency, ts());
        store.append(rect(3.0), Category::Other, ts());

        let lefts: Vec<f32> = store
            .annotations()
            .iter()
            .map(|a| match a.shape {
                ShapeRecord::Rect { left, .. } => left,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(lefts, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn ids_are_stable_across_removal() {
        let mut store = AnnotationStore::new();
        let a = store.append(rect(1.0), Category::Dosage, ts());
        let b = store.append(rect(2.0), Category::Dosage, ts());
        let c = store.append(rect(3.0), Category::Dosage, ts());

        store.remove(b).unwrap();
        // c still resolves even though its index shifted
        assert_eq!(store.annotations()[1].id, c);
        store.update_note(c, "third".into()).unwrap();
        assert_eq!(store.annotations()[1].note, "third");
        assert_eq!(store.annotations()[0].id, a);
    }

    #[test]
    fn undo_then_redo_restores_exact_state() {
        let mut store = AnnotationStore::new();
        store.append(rect(1.0), Category::Dosage, ts());
        store.append(rect(2.0), Category::Frequency, ts());
        store.update_note_at(1, "second".into()).unwrap();
        let before: Vec<Annotation> = store.annotations().to_vec();

        assert!(store.undo());
        assert_eq!(store.len(), 1);
        assert!(store.can_redo());
        assert!(store.redo());

        assert_eq!(store.annotations(), before.as_slice());
        assert!(!store.can_redo());
    }

    #[test]
    fn undo_redo_on_empty_are_silent_noops() {
        let mut store = AnnotationStore::new();
        assert!(!store.undo());
        assert!(!store.redo());
        assert!(store.is_empty());
    }

    #[test]
    fn redo_restores_created_at_unchanged() {
        let mut store = AnnotationStore::new();
        store.append(rect(1.0), Category::Dosage, ts());
        let created = store.annotations()[0].created_at;

        store.undo();
        assert_eq!(store.last_undone().unwrap().created_at, created);
        store.redo();
        assert_eq!(store.annotations()[0].created_at, created);
    }

    #[test]
    fn append_clears_redo_buffer() {
        let mut store = AnnotationStore::new();
        store.append(rect(1.0), Category::Dosage, ts());
        store.undo();
        assert!(store.can_redo());

        store.append(rect(2.0), Category::Dosage, ts());
        assert!(!store.can_redo());
        assert!(!store.redo());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_does_not_touch_redo_buffer() {
        let mut store = AnnotationStore::new();
        store.append(rect(1.0), Category::Dosage, ts());
        store.append(rect(2.0), Category::Dosage, ts());
        store.undo();

        store.remove_at(0).unwrap();
        assert!(store.can_redo());
        assert!(store.is_empty());
    }

    #[test]
    fn out_of_bounds_and_unknown_ids_are_errors() {
        let mut store = AnnotationStore::new();
        assert_eq!(store.remove_at(0), Err(StoreError::IndexOutOfBounds(0)));
        assert_eq!(
            store.update_note_at(3, "x".into()),
            Err(StoreError::IndexOutOfBounds(3))
        );

        let id = store.append(rect(1.0), Category::Dosage, ts());
        store.remove(id).unwrap();
        assert_eq!(store.remove(id), Err(StoreError::UnknownId(id)));
    }

    #[test]
    fn clear_all_is_idempotent() {
        let mut store = AnnotationStore::new();
        store.append(rect(1.0), Category::Dosage, ts());
        store.append(rect(2.0), Category::Dosage, ts());
        store.undo();

        store.clear_all();
        assert!(store.is_empty());
        assert!(!store.can_redo());

        store.clear_all();
        assert!(store.is_empty());
        assert!(!store.can_redo());
    }

    #[test]
    fn contains_shape_is_structural() {
        let mut store = AnnotationStore::new();
        store.append(rect(1.0), Category::Dosage, ts());
        assert!(store.contains_shape(&rect(1.0)));
        assert!(!store.contains_shape(&rect(2.0)));
        // undone annotations no longer count as present
        store.undo();
        assert!(!store.contains_shape(&rect(1.0)));
    }
}
