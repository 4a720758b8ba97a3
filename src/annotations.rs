use crate::viewport::ImagePoint;
use image::Rgba;

pub type StrokeId = u64;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StrokeKind {
    Freehand,
    /// Only the first and last points matter.
    Arrow,
}

/// A committed annotation. Points and size are in image pixels.
#[derive(Clone, PartialEq, Debug)]
pub struct Stroke {
    pub id: StrokeId,
    pub kind: StrokeKind,
    pub points: Vec<ImagePoint>,
    pub color: Rgba<u8>,
    pub size: f32,
}

/// The stroke being drawn between pointer-down and pointer-up.
#[derive(Clone, PartialEq, Debug)]
pub struct PendingStroke {
    pub kind: StrokeKind,
    pub points: Vec<ImagePoint>,
    pub color: Rgba<u8>,
    pub size: f32,
}

impl PendingStroke {
    fn into_stroke(self, id: StrokeId) -> Stroke {
        Stroke {
            id,
            kind: self.kind,
            points: self.points,
            color: self.color,
            size: self.size,
        }
    }
}

#[derive(Clone, Default, Debug)]
pub struct Annotations {
    strokes: Vec<Stroke>,
    in_progress: Option<PendingStroke>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn in_progress(&self) -> Option<&PendingStroke> {
        self.in_progress.as_ref()
    }

    pub fn is_drawing(&self) -> bool {
        self.in_progress.is_some()
    }

    /// Starts a stroke with a single point. Color and size are captured here so
    /// later setting changes never touch strokes already begun.
    pub fn begin_stroke(&mut self, kind: StrokeKind, point: ImagePoint, color: Rgba<u8>, size: f32) -> bool {
        if self.in_progress.is_some() {
            return false;
        }
        self.in_progress = Some(PendingStroke {
            kind,
            points: vec![point],
            color,
            size,
        });
        true
    }

    pub fn extend_stroke(&mut self, point: ImagePoint) {
        if let Some(stroke) = &mut self.in_progress {
            stroke.points.push(point);
        }
    }

    /// Moves the pending stroke into the committed list under `id`. Strokes with
    /// fewer than two points are dropped.
    pub fn commit_stroke(&mut self, id: StrokeId) -> Option<Stroke> {
        let pending = self.in_progress.take()?;
        if pending.points.len() < 2 {
            log::debug!("Discarding {:?} stroke with a single point", pending.kind);
            return None;
        }
        let stroke = pending.into_stroke(id);
        self.strokes.push(stroke.clone());
        Some(stroke)
    }

    pub fn cancel_stroke(&mut self) {
        self.in_progress = None;
    }

    pub fn remove_stroke(&mut self, id: StrokeId) -> bool {
        match self.strokes.iter().position(|s| s.id == id) {
            Some(index) => {
                self.strokes.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn push(&mut self, stroke: Stroke) {
        self.strokes.push(stroke);
    }

    /// Swaps the committed list wholesale, returning the old one.
    pub fn replace(&mut self, strokes: Vec<Stroke>) -> Vec<Stroke> {
        self.in_progress = None;
        std::mem::replace(&mut self.strokes, strokes)
    }
}
