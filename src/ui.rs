use crate::editor::Editor;
use crate::image_store;
use crate::state::{Command, EditorSettings, Keybindings, ToolMode};
use crate::tools::CropPhase;
use eframe::egui::{
    self, Color32, Context, PointerButton, Pos2, Rect, Sense, TextureHandle, TextureOptions, Ui, Vec2,
};
use eframe::Frame;
use image::Rgba;
use std::path::{Path, PathBuf};

pub struct SnapfixApp {
    editor: Editor,
    keybindings: Keybindings,
    surface_texture: Option<TextureHandle>,
    surface_dirty: bool,
    last_pointer: Option<Pos2>,
    status: String,
}

impl SnapfixApp {
    pub fn new(cc: &eframe::CreationContext<'_>, initial_image: Option<PathBuf>) -> Self {
        let mut visuals = egui::Visuals::dark();
        visuals.window_fill = Color32::from_rgb(26, 27, 38);
        visuals.panel_fill = Color32::from_rgb(26, 27, 38);
        visuals.extreme_bg_color = Color32::from_rgb(22, 22, 30);
        cc.egui_ctx.set_visuals(visuals);

        let mut app = Self {
            editor: Editor::new(EditorSettings::default()),
            keybindings: Keybindings::default(),
            surface_texture: None,
            surface_dirty: true,
            last_pointer: None,
            status: "Open a photo to start annotating".to_string(),
        };
        if let Some(path) = initial_image {
            app.open_path(&path);
        }
        app
    }

    fn open_path(&mut self, path: &Path) {
        match image_store::open(path) {
            Ok(image) => {
                if self.editor.load_image(image) {
                    self.status = format!("Opened {}", path.display());
                    self.surface_dirty = true;
                }
            }
            Err(e) => {
                log::error!("Failed to open: {:#}", e);
                self.status = format!("{e:#}");
            }
        }
    }

    fn export_to(&mut self, path: &Path) {
        let result = self
            .editor
            .export_png()
            .and_then(|bytes| match bytes {
                Some(bytes) => image_store::save_png(&bytes, path).map(|_| true),
                None => Ok(false),
            });
        self.status = match result {
            Ok(true) => format!("Exported {}", path.display()),
            Ok(false) => "Nothing to export yet".to_string(),
            Err(e) => {
                log::error!("Failed to export: {:#}", e);
                format!("{e:#}")
            }
        };
    }

    fn set_tool(&mut self, tool: ToolMode) {
        self.surface_dirty |= self.editor.set_tool(tool);
    }

    fn undo(&mut self) {
        self.surface_dirty |= self.editor.undo();
    }

    fn redo(&mut self) {
        self.surface_dirty |= self.editor.redo();
    }

    fn apply_crop(&mut self) {
        if self.editor.apply_crop() {
            self.surface_dirty = true;
            self.status = "Cropped".to_string();
        } else if self.editor.crop_rect().is_some() {
            self.status = "Selection does not cover the photo".to_string();
        }
    }

    fn handle_shortcuts(&mut self, ctx: &Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let pressed = ctx.input_mut(|i| self.keybindings.take_pressed(i));
        for command in pressed {
            match command {
                Command::Undo => self.undo(),
                Command::Redo => self.redo(),
                Command::Tool(tool) => self.set_tool(tool),
                Command::ApplyCrop => {
                    if self.editor.tool() == ToolMode::Crop {
                        self.apply_crop();
                    }
                }
                Command::Cancel => self.set_tool(ToolMode::None),
            }
        }
    }

    fn update_texture(&mut self, ctx: &Context) {
        if !self.surface_dirty && self.surface_texture.is_some() {
            return;
        }
        let surface = self.editor.render_surface();
        let color_image = egui::ColorImage::from_rgba_unmultiplied(
            [surface.width() as usize, surface.height() as usize],
            surface.as_raw(),
        );
        match &mut self.surface_texture {
            Some(texture) => texture.set(color_image, TextureOptions::LINEAR),
            None => {
                self.surface_texture =
                    Some(ctx.load_texture("editor_surface", color_image, TextureOptions::LINEAR));
            }
        }
        self.surface_dirty = false;
    }

    fn toolbar(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.heading("Snapfix");
            ui.separator();

            if ui.button("Open").clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("Image", &["png", "jpg", "jpeg", "bmp"])
                    .pick_file()
                {
                    self.open_path(&path);
                }
            }
            if ui
                .add_enabled(self.editor.has_image(), egui::Button::new("Export"))
                .clicked()
            {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("PNG", &["png"])
                    .set_file_name("annotated.png")
                    .save_file()
                {
                    self.export_to(&path);
                }
            }

            ui.separator();

            let undo_hint = self.keybindings.hint(ui.ctx(), Command::Undo);
            let redo_hint = self.keybindings.hint(ui.ctx(), Command::Redo);
            if ui
                .add_enabled(self.editor.can_undo(), egui::Button::new("Undo"))
                .on_hover_text(undo_hint)
                .clicked()
            {
                self.undo();
            }
            if ui
                .add_enabled(self.editor.can_redo(), egui::Button::new("Redo"))
                .on_hover_text(redo_hint)
                .clicked()
            {
                self.redo();
            }

            ui.separator();
            ui.label("Tool:");

            for tool in ToolMode::ALL {
                if ui
                    .selectable_label(self.editor.tool() == tool, tool.label())
                    .clicked()
                {
                    self.set_tool(tool);
                }
            }

            if self.editor.tool() == ToolMode::Crop {
                let ready = self.editor.crop_rect().is_some();
                if ui
                    .add_enabled(ready, egui::Button::new("Apply crop"))
                    .on_hover_text(self.keybindings.hint(ui.ctx(), Command::ApplyCrop))
                    .clicked()
                {
                    self.apply_crop();
                }
            }

            ui.separator();
            ui.label("Size:");
            let mut size = self.editor.settings().brush_size;
            if ui
                .add(egui::DragValue::new(&mut size).range(1.0..=40.0))
                .changed()
            {
                self.editor.set_brush_size(size);
            }

            ui.label("Color:");
            let current = self.editor.settings().color;
            let mut color = [current[0], current[1], current[2]];
            if ui.color_edit_button_srgb(&mut color).changed() {
                self.editor.set_color(Rgba([color[0], color[1], color[2], 255]));
            }
        });
    }

    fn status_bar(&self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.label(&self.status);
            ui.separator();
            if let Some(image) = self.editor.image() {
                ui.label(format!("{}x{}", image.width(), image.height()));
                ui.separator();
            }
            ui.label(format!("{} strokes", self.editor.strokes().len()));
            let history = self.editor.history();
            if let Some(last) = history.undo_stack().last() {
                ui.separator();
                ui.label(format!("Last edit: {} #{}", last.name(), last.id()));
            }
            if history.can_redo() {
                ui.label(format!("({} to redo)", history.redo_stack().len()));
            }
            if self.editor.tool() == ToolMode::Crop {
                ui.separator();
                ui.label(match self.editor.crop_phase() {
                    CropPhase::Idle => "Drag to select the area to keep",
                    CropPhase::Drawing { .. } => "Selecting",
                    CropPhase::Defined => "Drag handles to adjust, Enter to apply",
                    CropPhase::Dragging { .. } => "Moving selection",
                    CropPhase::Resizing { .. } => "Resizing selection",
                });
            }
        });
    }

    fn render_canvas(&mut self, ui: &mut Ui) {
        let (sw, sh) = self.editor.surface_size();
        let (response, painter) = ui.allocate_painter(Vec2::new(sw, sh), Sense::drag());
        let origin = response.rect.min;

        if let Some(texture) = &self.surface_texture {
            painter.image(
                texture.id(),
                response.rect,
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }
        painter.rect_stroke(
            response.rect,
            0.0,
            egui::Stroke::new(1.0, Color32::from_gray(60)),
        );

        let to_surface = |pos: Pos2| Pos2::new(pos.x - origin.x, pos.y - origin.y);

        if let (Some(hover), Some(layout)) = (response.hover_pos(), self.editor.layout()) {
            if layout.contains(to_surface(hover)) {
                ui.ctx().set_cursor_icon(match self.editor.tool() {
                    ToolMode::Crop => egui::CursorIcon::Crosshair,
                    _ => egui::CursorIcon::PointingHand,
                });
            }
        }

        if response.drag_started_by(PointerButton::Primary) {
            let press = ui
                .input(|i| i.pointer.press_origin())
                .or(response.interact_pointer_pos());
            if let Some(pos) = press.map(to_surface) {
                self.surface_dirty |= self.editor.pointer_down(pos);
                self.last_pointer = Some(pos);
            }
        }

        if response.dragged_by(PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos().map(to_surface) {
                if self.last_pointer != Some(pos) {
                    self.surface_dirty |= self.editor.pointer_move(pos);
                    self.last_pointer = Some(pos);
                }
            }
        }

        if response.drag_stopped_by(PointerButton::Primary) {
            let pos = response
                .interact_pointer_pos()
                .map(to_surface)
                .or(self.last_pointer);
            if let Some(pos) = pos {
                self.surface_dirty |= self.editor.pointer_up(pos);
            }
            self.last_pointer = None;
        }
    }
}

impl eframe::App for SnapfixApp {
    fn update(&mut self, ctx: &Context, _frame: &mut Frame) {
        self.handle_shortcuts(ctx);

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            self.toolbar(ui);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.status_bar(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_canvas(ui);
        });

        self.update_texture(ctx);
    }
}
