//! Per-session state: one annotation store plus the user's current tool and
//! style selection, created at session start and reset explicitly.

use crate::model::{Category, Color4};
use crate::store::AnnotationStore;

const USERNAME: &str = "alyse";
const PASSWORD: &str = "pharmacie";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tool {
    Rect,
    Line,
    Circle,
    Freehand,
}

impl Tool {
    pub const ALL: [Tool; 4] = [Tool::Rect, Tool::Line, Tool::Circle, Tool::Freehand];

    pub fn label(&self) -> &'static str {
        match self {
            Tool::Rect => "Rectangle Box",
            Tool::Line => "Line",
            Tool::Circle => "Circle",
            Tool::Freehand => "Free Draw",
        }
    }
}

pub struct Session {
    pub store: AnnotationStore,
    pub tool: Tool,
    pub category: Category,
    pub stroke_color: Color4,
    pub stroke_width: f32,
    pub authenticated: bool,
}

impl Session {
    pub fn new() -> Self {
        Self {
            store: AnnotationStore::new(),
            tool: Tool::Rect,
            category: Category::MedicationName,
            stroke_color: Color4::default(),
            stroke_width: 2.0,
            authenticated: false,
        }
    }

    /// Static credential gate. A session starts with zero annotations, so a
    /// fresh login always sees an empty store.
    pub fn login(&mut self, username: &str, password: &str) -> bool {
        self.authenticated = username == USERNAME && password == PASSWORD;
        self.authenticated
    }

    /// "Clear All": drops the annotations and history, keeps the tool,
    /// category, and stroke selection.
    pub fn clear_annotations(&mut self) {
        self.store.clear_all();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
