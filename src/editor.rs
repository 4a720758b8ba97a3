use crate::annotations::{Stroke, StrokeKind};
use crate::commands::{CropAction, Document, EditAction, History};
use crate::image_store;
use crate::render;
use crate::state::{EditorSettings, ToolMode};
use crate::tools::crop;
use crate::tools::{CropPhase, CropRect, CropTool};
use crate::viewport::{self, ImagePoint, Layout};
use anyhow::Result;
use egui::Pos2;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use std::sync::Arc;

/// One editing session over a single base image.
///
/// All input arrives through direct method calls from the owning UI; every
/// mutating call returns whether anything changed so the caller knows when to
/// re-render.
pub struct Editor {
    settings: EditorSettings,
    tool: ToolMode,
    doc: Document,
    history: History,
    crop: CropTool,
    next_action_id: u64,
    /// Base image pre-scaled to its letterbox rect.
    display_base: Option<RgbaImage>,
}

impl Editor {
    pub fn new(settings: EditorSettings) -> Self {
        let crop = CropTool::new(settings.handle_tolerance);
        Self {
            settings,
            tool: ToolMode::default(),
            doc: Document::default(),
            history: History::new(),
            crop,
            next_action_id: 1,
            display_base: None,
        }
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn tool(&self) -> ToolMode {
        self.tool
    }

    pub fn has_image(&self) -> bool {
        self.doc.image.is_some()
    }

    pub fn image(&self) -> Option<&RgbaImage> {
        self.doc.image.as_deref()
    }

    pub fn strokes(&self) -> &[Stroke] {
        self.doc.annotations.strokes()
    }

    pub fn crop_rect(&self) -> Option<CropRect> {
        self.crop.rect()
    }

    pub fn crop_phase(&self) -> CropPhase {
        self.crop.phase()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn surface_size(&self) -> (f32, f32) {
        (self.settings.surface_width, self.settings.surface_height)
    }

    pub fn layout(&self) -> Option<Layout> {
        let image = self.doc.image.as_ref()?;
        Some(viewport::layout(
            image.width(),
            image.height(),
            self.settings.surface_width,
            self.settings.surface_height,
        ))
    }

    fn to_image_space(&self, pos: Pos2) -> Option<(ImagePoint, Layout)> {
        let image = self.doc.image.as_ref()?;
        let layout = self.layout()?;
        Some((viewport::to_image_space(pos, &layout, image.width(), image.height()), layout))
    }

    /// Replaces the base image and starts a fresh edit history for it.
    pub fn load_image(&mut self, image: RgbaImage) -> bool {
        if image.width() == 0 || image.height() == 0 {
            log::warn!("Ignoring empty {}x{} image", image.width(), image.height());
            return false;
        }
        log::info!("Loaded {}x{} image", image.width(), image.height());
        self.doc.image = Some(Arc::new(image));
        self.doc.annotations.replace(Vec::new());
        self.history.clear();
        self.crop.reset();
        self.refresh_display_base();
        true
    }

    pub fn load_image_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let image = image_store::decode(bytes)?;
        self.load_image(image);
        Ok(())
    }

    fn refresh_display_base(&mut self) {
        self.display_base = match (&self.doc.image, self.layout()) {
            (Some(image), Some(layout)) => {
                let width = (layout.draw_width.round() as u32).max(1);
                let height = (layout.draw_height.round() as u32).max(1);
                if image.dimensions() == (width, height) {
                    Some((**image).clone())
                } else {
                    Some(imageops::resize(&**image, width, height, FilterType::Triangle))
                }
            }
            _ => None,
        };
    }

    /// Switching tools cancels whatever gesture was running.
    pub fn set_tool(&mut self, tool: ToolMode) -> bool {
        if tool == self.tool {
            return false;
        }
        log::debug!("Tool {:?} -> {:?}", self.tool, tool);
        self.doc.annotations.cancel_stroke();
        self.crop.reset();
        self.tool = tool;
        true
    }

    /// Affects strokes begun from now on.
    pub fn set_color(&mut self, color: Rgba<u8>) {
        self.settings.color = color;
    }

    pub fn set_brush_size(&mut self, size: f32) {
        if size > 0.0 {
            self.settings.brush_size = size;
        }
    }

    fn stroke_kind(&self) -> Option<StrokeKind> {
        match self.tool {
            ToolMode::None => Some(StrokeKind::Freehand),
            ToolMode::Arrow => Some(StrokeKind::Arrow),
            ToolMode::Crop => None,
        }
    }

    pub fn begin_stroke(&mut self, kind: StrokeKind, pos: Pos2) -> bool {
        if self.tool == ToolMode::Crop {
            return false;
        }
        let Some((point, layout)) = self.to_image_space(pos) else {
            return false;
        };
        let width = self.doc.image.as_ref().map_or(1, |image| image.width());
        let size = self.settings.brush_size * layout.scale_x(width);
        self.doc
            .annotations
            .begin_stroke(kind, point, self.settings.color, size)
    }

    pub fn extend_stroke(&mut self, pos: Pos2) -> bool {
        if !self.doc.annotations.is_drawing() {
            return false;
        }
        let Some((point, _)) = self.to_image_space(pos) else {
            return false;
        };
        self.doc.annotations.extend_stroke(point);
        true
    }

    pub fn commit_stroke(&mut self) -> Option<Stroke> {
        let id = self.next_action_id;
        let stroke = self.doc.annotations.commit_stroke(id)?;
        self.next_action_id += 1;
        log::debug!("Committed {:?} stroke #{} ({} points)", stroke.kind, id, stroke.points.len());
        self.history.record(EditAction::Stroke(stroke.clone()));
        Some(stroke)
    }

    pub fn pointer_down(&mut self, pos: Pos2) -> bool {
        if !self.has_image() {
            return false;
        }
        match self.stroke_kind() {
            Some(kind) => self.begin_stroke(kind, pos),
            None => {
                self.crop.pointer_down(pos);
                true
            }
        }
    }

    pub fn pointer_move(&mut self, pos: Pos2) -> bool {
        if self.tool == ToolMode::Crop {
            self.crop.pointer_move(pos);
            self.crop.rect().is_some()
        } else {
            self.extend_stroke(pos)
        }
    }

    /// Ends the current gesture. Strokes end at the last moved-to point.
    pub fn pointer_up(&mut self, pos: Pos2) -> bool {
        if self.tool == ToolMode::Crop {
            self.crop.pointer_up(pos);
            true
        } else if self.doc.annotations.is_drawing() {
            self.commit_stroke();
            true
        } else {
            false
        }
    }

    /// Commits the defined crop rectangle. Degenerate or missing selections
    /// leave everything untouched, including the selection itself.
    pub fn apply_crop(&mut self) -> bool {
        let (Some(image), Some(layout), Some(rect)) =
            (self.doc.image.clone(), self.layout(), self.crop.committable())
        else {
            return false;
        };
        let Some(cropped) = crop::resample(&image, rect, &layout) else {
            log::warn!("Crop {:?} does not cover any of the image", rect);
            return false;
        };

        let id = self.next_action_id;
        self.next_action_id += 1;
        log::info!(
            "Crop #{}: {}x{} -> {}x{}",
            id,
            image.width(),
            image.height(),
            cropped.width(),
            cropped.height()
        );

        let prior_strokes = self.doc.annotations.replace(Vec::new());
        let action = CropAction {
            id,
            prior_image: image,
            prior_strokes,
            prior_history: self.history.take_undo_stack(),
            rect,
            layout,
        };
        self.history.record(EditAction::Crop(action));
        self.doc.image = Some(Arc::new(cropped));
        self.crop.reset();
        self.refresh_display_base();
        true
    }

    fn cancel_gesture(&mut self) {
        self.doc.annotations.cancel_stroke();
        self.crop.reset();
    }

    pub fn undo(&mut self) -> bool {
        self.cancel_gesture();
        let changed = self.history.undo(&mut self.doc);
        if changed {
            self.refresh_display_base();
        }
        changed
    }

    pub fn redo(&mut self) -> bool {
        self.cancel_gesture();
        let changed = self.history.redo(&mut self.doc);
        if changed {
            self.refresh_display_base();
        }
        changed
    }

    /// Renders the display surface: letterboxed image, strokes, the stroke in
    /// progress and the crop overlay.
    pub fn render_surface(&self) -> RgbaImage {
        let (sw, sh) = self.surface_size();
        let mut canvas = RgbaImage::from_pixel(
            (sw.round() as u32).max(1),
            (sh.round() as u32).max(1),
            render::SURFACE_BACKGROUND,
        );

        if let (Some(image), Some(layout), Some(scaled)) =
            (self.doc.image.as_ref(), self.layout(), self.display_base.as_ref())
        {
            imageops::replace(
                &mut canvas,
                scaled,
                layout.offset_x.round() as i64,
                layout.offset_y.round() as i64,
            );

            let (iw, ih) = (image.width(), image.height());
            let scale = layout.scale_x(iw);
            let to_display = |points: &[ImagePoint]| -> Vec<Pos2> {
                points
                    .iter()
                    .map(|p| viewport::to_display_space(*p, &layout, iw, ih))
                    .collect()
            };

            for stroke in self.doc.annotations.strokes() {
                render::draw_stroke(
                    &mut canvas,
                    stroke.kind,
                    &to_display(&stroke.points),
                    stroke.color,
                    stroke.size / scale,
                    1.0,
                );
            }
            if let Some(pending) = self.doc.annotations.in_progress() {
                render::draw_stroke(
                    &mut canvas,
                    pending.kind,
                    &to_display(&pending.points),
                    pending.color,
                    pending.size / scale,
                    1.0,
                );
            }
        }

        if let Some(rect) = self.crop.rect() {
            render::draw_crop_overlay(&mut canvas, rect);
        }
        canvas
    }

    /// Base image with committed strokes, at native resolution.
    pub fn export_image(&self) -> Option<RgbaImage> {
        let image = self.doc.image.as_ref()?;
        let scale = self.layout()?.scale_x(image.width());
        Some(render::compose(image, self.doc.annotations.strokes(), scale))
    }

    pub fn export_png(&self) -> Result<Option<Vec<u8>>> {
        match self.export_image() {
            Some(image) => Ok(Some(image_store::encode_png(&image)?)),
            None => Ok(None),
        }
    }
}
