//! Region annotation for prescription images: an annotation store with
//! two-stack undo/redo, a reconciler that dedups freshly drawn canvas shapes
//! against recorded annotations, and an exporter that burns the annotations
//! into a JPEG copy and a JSON record. The egui shell lives in [`app`].

pub mod app;
pub mod canvas;
pub mod export;
pub mod model;
pub mod reconcile;
pub mod render;
pub mod session;
pub mod store;
