//! The eframe application: login gate, image loading, annotation controls,
//! and the export actions. All annotation semantics live in the core
//! modules; this layer wires them to widgets.

use std::path::{Path, PathBuf};

use ab_glyph::FontArc;
use chrono::Local;
use image::RgbaImage;

use crate::canvas::CanvasState;
use crate::export::{self, ExportError};
use crate::model::{AnnotationId, Category, Color4};
use crate::reconcile::reconcile;
use crate::render::{fit_to_display, label_font, render_annotated};
use crate::session::{Session, Tool};

pub struct AnnotateApp {
    session: Session,
    canvas: CanvasState,

    image_path: Option<PathBuf>,
    working: Option<RgbaImage>,
    texture: Option<egui::TextureHandle>,
    label_font: Option<FontArc>,

    login_username: String,
    login_password: String,
    login_failed: bool,

    load_error: Option<String>,
    status: Option<String>,
}

impl AnnotateApp {
    pub fn new(image_path: Option<PathBuf>) -> Self {
        let label_font = label_font();
        if label_font.is_none() {
            log::warn!("no system font found; exported images will carry outlines only");
        }
        let mut app = Self {
            session: Session::new(),
            canvas: CanvasState::default(),
            image_path: None,
            working: None,
            texture: None,
            label_font,
            login_username: String::new(),
            login_password: String::new(),
            login_failed: false,
            load_error: None,
            status: None,
        };
        if let Some(path) = image_path {
            app.load_image(path);
        }
        app
    }

    fn load_image(&mut self, path: PathBuf) {
        match image::open(&path) {
            Ok(img) => {
                self.working = Some(fit_to_display(img).to_rgba8());
                self.texture = None;
                self.canvas.clear();
                self.session.clear_annotations();
                self.image_path = Some(path);
                self.load_error = None;
                self.status = None;
            }
            Err(err) => {
                // No image, no annotating: fatal for this session's load.
                log::error!("failed to decode {}: {err}", path.display());
                self.load_error = Some(format!("Could not open {}: {err}", path.display()));
            }
        }
    }

    fn open_image_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Image", &["jpg", "jpeg", "png"])
            .pick_file()
        {
            self.load_image(path);
        }
    }

    fn ensure_texture(&mut self, ctx: &egui::Context) {
        if self.texture.is_some() {
            return;
        }
        if let Some(img) = &self.working {
            let size = [img.width() as usize, img.height() as usize];
            let color_image =
                egui::ColorImage::from_rgba_unmultiplied(size, img.as_flat_samples().as_slice());
            self.texture =
                Some(ctx.load_texture("working-image", color_image, egui::TextureOptions::LINEAR));
        }
    }

    fn undo(&mut self) {
        if self.session.store.undo() {
            // Keep the surface in step, or the next reconcile pass would
            // immediately re-record the undone shape.
            let shape = self.session.store.last_undone().map(|a| a.shape.clone());
            if let Some(shape) = shape {
                self.canvas.remove_shape(&shape);
            }
        }
    }

    fn redo(&mut self) {
        let shape = self.session.store.last_undone().map(|a| a.shape.clone());
        if self.session.store.redo() {
            if let Some(shape) = shape {
                if !self.canvas.shapes.contains(&shape) {
                    self.canvas.shapes.push(shape);
                }
            }
        }
    }

    fn clear_all(&mut self) {
        self.session.clear_annotations();
        self.canvas.clear();
    }

    fn delete_annotation(&mut self, id: AnnotationId) {
        match self.session.store.remove(id) {
            Ok(ann) => {
                self.canvas.remove_shape(&ann.shape);
            }
            Err(err) => log::warn!("delete failed: {err}"),
        }
    }

    fn export(&mut self) {
        match self.try_export() {
            Ok(Some(msg)) => {
                log::info!("{msg}");
                self.status = Some(msg);
            }
            Ok(None) => {}
            Err(err) => {
                log::error!("export failed: {err}");
                self.status = Some(format!("Export failed: {err}"));
            }
        }
    }

    /// Write `annotated_{stamp}.jpg` and `annotations_{stamp}.json` next to
    /// the source image. Failures leave the store untouched.
    fn try_export(&self) -> Result<Option<String>, ExportError> {
        let (Some(working), Some(path)) = (&self.working, &self.image_path) else {
            return Ok(None);
        };
        let now = Local::now();
        let stamp = now.format(export::DOC_TIMESTAMP_FORMAT).to_string();
        let dir = path.parent().unwrap_or(Path::new("."));
        let image_id = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_owned());

        let annotated = render_annotated(
            working,
            self.session.store.annotations(),
            self.label_font.as_ref(),
        );
        let jpg_path = dir.join(format!("annotated_{stamp}.jpg"));
        std::fs::write(&jpg_path, export::encode_jpeg(&annotated)?)?;

        let doc = export::export_record(&image_id, now, self.session.store.annotations());
        let json_path = dir.join(format!("annotations_{stamp}.json"));
        std::fs::write(&json_path, doc.to_json()?)?;

        Ok(Some(format!(
            "Saved {} and {}",
            jpg_path.display(),
            json_path.display()
        )))
    }

    fn login_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(80.0);
                ui.heading("Prescription Annotation Tool");
                ui.add_space(12.0);
                ui.label("Please enter your credentials to access the tool.");
                ui.add_space(12.0);

                ui.scope(|ui| {
                    ui.set_max_width(260.0);
                    ui.label("Username:");
                    ui.text_edit_singleline(&mut self.login_username);
                    ui.label("Password:");
                    ui.add(egui::TextEdit::singleline(&mut self.login_password).password(true));
                });
                ui.add_space(8.0);

                let submitted =
                    ui.button("Login").clicked() || ui.input(|i| i.key_pressed(egui::Key::Enter));
                if submitted {
                    self.login_failed = !self
                        .session
                        .login(&self.login_username, &self.login_password);
                    self.login_password.clear();
                }
                if self.login_failed {
                    ui.colored_label(
                        egui::Color32::RED,
                        "Invalid credentials. Please try again.",
                    );
                }
            });
        });
    }

    fn toolbar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Open Image…").clicked() {
                    self.open_image_dialog();
                }
                ui.separator();

                let can_undo = self.session.store.can_undo();
                if ui.add_enabled(can_undo, egui::Button::new("Undo")).clicked() {
                    self.undo();
                }
                let can_redo = self.session.store.can_redo();
                if ui.add_enabled(can_redo, egui::Button::new("Redo")).clicked() {
                    self.redo();
                }
                if ui.button("Clear All").clicked() {
                    self.clear_all();
                }
                ui.separator();

                let exportable = self.working.is_some();
                if ui
                    .add_enabled(exportable, egui::Button::new("Save & Export"))
                    .clicked()
                {
                    self.export();
                }
                if let Some(status) = &self.status {
                    ui.separator();
                    ui.label(status);
                }
            });
        });
    }

    fn controls(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("controls")
            .default_width(280.0)
            .show(ctx, |ui| {
                ui.heading("Annotation Controls");
                ui.separator();

                ui.label("Drawing tool:");
                for tool in Tool::ALL {
                    ui.selectable_value(&mut self.session.tool, tool, tool.label());
                }
                ui.separator();

                ui.horizontal(|ui| {
                    ui.label("Stroke color:");
                    let c = self.session.stroke_color;
                    let mut rgb = [c.r, c.g, c.b];
                    ui.color_edit_button_rgb(&mut rgb);
                    self.session.stroke_color = Color4::from_rgb(rgb[0], rgb[1], rgb[2]);
                });
                ui.horizontal(|ui| {
                    ui.label("Stroke width:");
                    ui.add(egui::Slider::new(&mut self.session.stroke_width, 1.0..=10.0));
                });

                egui::ComboBox::from_label("Category")
                    .selected_text(self.session.category.as_str())
                    .show_ui(ui, |ui| {
                        for cat in Category::ALL {
                            ui.selectable_value(&mut self.session.category, cat, cat.as_str());
                        }
                    });

                ui.separator();
                ui.heading("Current Annotations");
                self.annotation_list(ui);
            });
    }

    fn annotation_list(&mut self, ui: &mut egui::Ui) {
        // Snapshot first: the list is edited through the store while the
        // widgets iterate over it.
        let entries: Vec<(AnnotationId, String, String, String)> = self
            .session
            .store
            .annotations()
            .iter()
            .enumerate()
            .map(|(i, ann)| {
                (
                    ann.id,
                    format!("Annotation {} - {}", i + 1, ann.category),
                    ann.note.clone(),
                    ann.created_at
                        .format(export::ANNOTATION_TIMESTAMP_FORMAT)
                        .to_string(),
                )
            })
            .collect();

        let mut note_edits: Vec<(AnnotationId, String)> = Vec::new();
        let mut deleted: Option<AnnotationId> = None;

        egui::ScrollArea::vertical().show(ui, |ui| {
            for (id, header, note, created) in entries {
                egui::CollapsingHeader::new(header)
                    .id_salt(id)
                    .show(ui, |ui| {
                        ui.label("Description:");
                        let mut text = note;
                        if ui.text_edit_multiline(&mut text).changed() {
                            note_edits.push((id, text));
                        }
                        ui.label(format!("Created: {created}"));
                        if ui.button("Delete").clicked() {
                            deleted = Some(id);
                        }
                    });
            }
        });

        for (id, text) in note_edits {
            if let Err(err) = self.session.store.update_note(id, text) {
                log::warn!("note update failed: {err}");
            }
        }
        if let Some(id) = deleted {
            self.delete_annotation(id);
        }
    }

    fn central(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(err) = &self.load_error {
                ui.colored_label(egui::Color32::RED, err);
                return;
            }
            let (Some(texture), Some(img)) = (self.texture.clone(), &self.working) else {
                ui.label("Open a prescription image to start annotating.");
                return;
            };
            let size = egui::vec2(img.width() as f32, img.height() as f32);

            egui::ScrollArea::both().show(ui, |ui| {
                self.canvas.show(
                    ui,
                    &texture,
                    size,
                    self.session.tool,
                    self.session.stroke_color,
                    self.session.stroke_width,
                );
            });

            // Every interaction refreshes the full surface set; only shapes
            // the store has not seen become annotations.
            let appended = reconcile(
                &mut self.session.store,
                &self.canvas.shapes,
                self.session.category,
                Local::now(),
            );
            if appended > 0 {
                log::debug!("recorded {appended} new annotation(s)");
            }
        });
    }
}

impl eframe::App for AnnotateApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.session.authenticated {
            self.login_screen(ctx);
            return;
        }

        self.ensure_texture(ctx);
        self.toolbar(ctx);
        self.controls(ctx);
        self.central(ctx);
    }
}
