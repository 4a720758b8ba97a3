use crate::annotations::{Annotations, Stroke};
use crate::tools::crop;
use crate::tools::CropRect;
use crate::viewport::Layout;
use image::RgbaImage;
use std::sync::Arc;

/// The parts of the editor that history actions rewrite.
#[derive(Default)]
pub struct Document {
    pub image: Option<Arc<RgbaImage>>,
    pub annotations: Annotations,
}

/// Everything needed to reverse (and redo) a destructive crop.
#[derive(Clone, Debug)]
pub struct CropAction {
    pub id: u64,
    pub prior_image: Arc<RgbaImage>,
    pub prior_strokes: Vec<Stroke>,
    /// Owned copy of the undo stack as it was before the crop.
    pub prior_history: Vec<EditAction>,
    pub rect: CropRect,
    pub layout: Layout,
}

impl CropAction {
    pub fn apply(&self) -> Option<RgbaImage> {
        crop::resample(&self.prior_image, self.rect, &self.layout)
    }
}

#[derive(Clone, Debug)]
pub enum EditAction {
    Stroke(Stroke),
    Crop(CropAction),
}

impl EditAction {
    pub fn name(&self) -> &str {
        match self {
            EditAction::Stroke(_) => "Stroke",
            EditAction::Crop(_) => "Crop",
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            EditAction::Stroke(stroke) => stroke.id,
            EditAction::Crop(action) => action.id,
        }
    }
}

#[derive(Default)]
pub struct History {
    undo_stack: Vec<EditAction>,
    redo_stack: Vec<EditAction>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// New actions drop whatever could have been redone.
    pub fn record(&mut self, action: EditAction) {
        self.redo_stack.clear();
        self.undo_stack.push(action);
    }

    /// Hands the current undo stack to a crop about to be recorded; the crop
    /// then starts a fresh history on the new image.
    pub fn take_undo_stack(&mut self) -> Vec<EditAction> {
        std::mem::take(&mut self.undo_stack)
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_stack(&self) -> &[EditAction] {
        &self.undo_stack
    }

    pub fn redo_stack(&self) -> &[EditAction] {
        &self.redo_stack
    }

    pub fn undo(&mut self, doc: &mut Document) -> bool {
        let Some(action) = self.undo_stack.pop() else {
            return false;
        };

        match &action {
            EditAction::Stroke(stroke) => {
                if !doc.annotations.remove_stroke(stroke.id) {
                    log::error!("Undo: stroke {} is not in the annotation list", stroke.id);
                }
            }
            EditAction::Crop(crop) => {
                doc.image = Some(Arc::clone(&crop.prior_image));
                doc.annotations.replace(crop.prior_strokes.clone());
                if !self.undo_stack.is_empty() {
                    log::error!(
                        "Undo: {} actions above crop {} were still on the stack",
                        self.undo_stack.len(),
                        crop.id
                    );
                }
                self.undo_stack = crop.prior_history.clone();
            }
        }

        log::debug!("Undo {} #{}", action.name(), action.id());
        self.redo_stack.push(action);
        true
    }

    pub fn redo(&mut self, doc: &mut Document) -> bool {
        let Some(action) = self.redo_stack.pop() else {
            return false;
        };

        match &action {
            EditAction::Stroke(stroke) => doc.annotations.push(stroke.clone()),
            EditAction::Crop(crop) => {
                let Some(cropped) = crop.apply() else {
                    log::error!("Redo: crop {} no longer yields an image", crop.id);
                    self.redo_stack.push(action);
                    return false;
                };
                doc.image = Some(Arc::new(cropped));
                doc.annotations.replace(Vec::new());
                self.undo_stack.clear();
            }
        }

        log::debug!("Redo {} #{}", action.name(), action.id());
        self.undo_stack.push(action);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{CropAction, Document, EditAction, History};
    use crate::annotations::{Stroke, StrokeKind};
    use crate::tools::crop::CropRect;
    use crate::viewport::{layout, ImagePoint};
    use image::{Rgba, RgbaImage};
    use std::sync::Arc;

    fn stroke(id: u64) -> Stroke {
        Stroke {
            id,
            kind: StrokeKind::Freehand,
            points: vec![ImagePoint::new(0.0, id as f32), ImagePoint::new(10.0, id as f32)],
            color: Rgba([0, 0, 0, 255]),
            size: 2.0,
        }
    }

    fn record_stroke(history: &mut History, doc: &mut Document, id: u64) {
        let s = stroke(id);
        doc.annotations.push(s.clone());
        history.record(EditAction::Stroke(s));
    }

    #[test]
    fn stroke_undo_redo_flow() {
        let mut history = History::new();
        let mut doc = Document::default();
        record_stroke(&mut history, &mut doc, 1);
        record_stroke(&mut history, &mut doc, 2);

        assert!(history.undo(&mut doc));
        assert_eq!(doc.annotations.strokes(), &[stroke(1)]);
        assert!(history.undo(&mut doc));
        assert!(!history.undo(&mut doc));
        assert!(doc.annotations.strokes().is_empty());

        assert!(history.redo(&mut doc));
        assert!(history.redo(&mut doc));
        assert!(!history.redo(&mut doc));
        assert_eq!(doc.annotations.strokes(), &[stroke(1), stroke(2)]);
    }

    #[test]
    fn recording_clears_redo() {
        let mut history = History::new();
        let mut doc = Document::default();
        record_stroke(&mut history, &mut doc, 1);
        history.undo(&mut doc);
        assert!(history.can_redo());

        record_stroke(&mut history, &mut doc, 2);
        assert!(!history.can_redo());
        assert!(history.redo_stack().is_empty());
    }

    #[test]
    fn crop_undo_restores_prior_history_snapshot() {
        let original = Arc::new(RgbaImage::from_fn(20, 10, |x, y| Rgba([x as u8, y as u8, 0, 255])));
        let mut history = History::new();
        let mut doc = Document {
            image: Some(Arc::clone(&original)),
            ..Default::default()
        };
        record_stroke(&mut history, &mut doc, 1);

        let rect = CropRect {
            x: 2.0,
            y: 2.0,
            width: 5.0,
            height: 5.0,
        };
        let action = CropAction {
            id: 2,
            prior_image: Arc::clone(&original),
            prior_strokes: doc.annotations.strokes().to_vec(),
            prior_history: history.take_undo_stack(),
            rect,
            layout: layout(20, 10, 20.0, 10.0),
        };
        let cropped = action.apply().expect("crop inside image");
        doc.image = Some(Arc::new(cropped.clone()));
        doc.annotations.replace(Vec::new());
        history.record(EditAction::Crop(action));

        // Drawing on the cropped image must not leak into the stored snapshot.
        record_stroke(&mut history, &mut doc, 3);
        history.undo(&mut doc);
        history.undo(&mut doc);

        assert_eq!(doc.image.as_deref(), Some(&*original));
        assert_eq!(doc.annotations.strokes(), &[stroke(1)]);
        assert_eq!(history.undo_stack().len(), 1);
        assert_eq!(history.undo_stack()[0].id(), 1);

        history.redo(&mut doc);
        assert_eq!(doc.image.as_deref(), Some(&cropped));
        assert!(doc.annotations.strokes().is_empty());
        assert_eq!(history.undo_stack().len(), 1);
        assert_eq!(history.undo_stack()[0].id(), 2);

        history.redo(&mut doc);
        assert_eq!(doc.annotations.strokes(), &[stroke(3)]);
    }
}
