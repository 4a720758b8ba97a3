use crate::viewport::Layout;
use egui::Pos2;
use image::RgbaImage;

/// Crop selection in display space. Width and height may be negative while
/// the rectangle is being dragged out.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct CropRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CropRect {
    pub fn normalized(self) -> Self {
        let mut rect = self;
        if rect.width < 0.0 {
            rect.x += rect.width;
            rect.width = -rect.width;
        }
        if rect.height < 0.0 {
            rect.y += rect.height;
            rect.height = -rect.height;
        }
        rect
    }

    pub fn contains(&self, pos: Pos2) -> bool {
        let r = self.normalized();
        pos.x >= r.x && pos.x <= r.x + r.width && pos.y >= r.y && pos.y <= r.y + r.height
    }

    pub fn handle_pos(&self, handle: Handle) -> Pos2 {
        let (x, y, w, h) = (self.x, self.y, self.width, self.height);
        match handle {
            Handle::NorthWest => Pos2::new(x, y),
            Handle::North => Pos2::new(x + w / 2.0, y),
            Handle::NorthEast => Pos2::new(x + w, y),
            Handle::East => Pos2::new(x + w, y + h / 2.0),
            Handle::SouthEast => Pos2::new(x + w, y + h),
            Handle::South => Pos2::new(x + w / 2.0, y + h),
            Handle::SouthWest => Pos2::new(x, y + h),
            Handle::West => Pos2::new(x, y + h / 2.0),
        }
    }

    pub fn handle_at(&self, pos: Pos2, tolerance: f32) -> Option<Handle> {
        Handle::ALL.into_iter().find(|&handle| {
            let p = self.handle_pos(handle);
            (pos.x - p.x).abs() <= tolerance && (pos.y - p.y).abs() <= tolerance
        })
    }

    /// Applies a handle drag with the pointer at `pos`. The handle opposite the
    /// dragged one stays fixed.
    pub fn resize(&mut self, handle: Handle, pos: Pos2) {
        match handle {
            Handle::NorthWest => {
                self.width += self.x - pos.x;
                self.height += self.y - pos.y;
                self.x = pos.x;
                self.y = pos.y;
            }
            Handle::North => {
                self.height += self.y - pos.y;
                self.y = pos.y;
            }
            Handle::NorthEast => {
                self.width = pos.x - self.x;
                self.height += self.y - pos.y;
                self.y = pos.y;
            }
            Handle::East => {
                self.width = pos.x - self.x;
            }
            Handle::SouthEast => {
                self.width = pos.x - self.x;
                self.height = pos.y - self.y;
            }
            Handle::South => {
                self.height = pos.y - self.y;
            }
            Handle::SouthWest => {
                self.width += self.x - pos.x;
                self.x = pos.x;
                self.height = pos.y - self.y;
            }
            Handle::West => {
                self.width += self.x - pos.x;
                self.x = pos.x;
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Handle {
    NorthWest,
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
}

impl Handle {
    /// Corners first so they win over edge midpoints on tiny rects.
    pub const ALL: [Handle; 8] = [
        Handle::NorthWest,
        Handle::NorthEast,
        Handle::SouthEast,
        Handle::SouthWest,
        Handle::North,
        Handle::East,
        Handle::South,
        Handle::West,
    ];
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum CropPhase {
    Idle,
    Drawing { origin: Pos2 },
    Defined,
    Dragging { last: Pos2 },
    Resizing { handle: Handle },
}

/// Pixel rectangle inside the source image.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Maps a display-space crop rectangle onto image pixels. The origin goes
/// through the inverse layout transform, the size is scaled directly. Returns
/// `None` when nothing of the image remains after clamping.
pub fn crop_region(rect: CropRect, layout: &Layout, image_width: u32, image_height: u32) -> Option<CropRegion> {
    let rect = rect.normalized();
    let scale_x = layout.scale_x(image_width);
    let scale_y = layout.scale_y(image_height);

    let mut x = (rect.x - layout.offset_x) * scale_x;
    let mut y = (rect.y - layout.offset_y) * scale_y;
    let mut width = rect.width * scale_x;
    let mut height = rect.height * scale_y;

    if x < 0.0 {
        width += x;
        x = 0.0;
    }
    if y < 0.0 {
        height += y;
        y = 0.0;
    }
    let (iw, ih) = (image_width as f32, image_height as f32);
    x = x.min(iw);
    y = y.min(ih);
    width = width.min(iw - x);
    height = height.min(ih - y);

    let left = x.round();
    let top = y.round();
    let right = (x + width).round();
    let bottom = (y + height).round();
    if !(right > left && bottom > top) {
        return None;
    }

    Some(CropRegion {
        x: left as u32,
        y: top as u32,
        width: (right - left) as u32,
        height: (bottom - top) as u32,
    })
}

/// Samples the crop rectangle of `image` into a new buffer. Used both for the
/// first commit and for redo, so the two always agree pixel for pixel.
pub fn resample(image: &RgbaImage, rect: CropRect, layout: &Layout) -> Option<RgbaImage> {
    let region = crop_region(rect, layout, image.width(), image.height())?;
    Some(image::imageops::crop_imm(image, region.x, region.y, region.width, region.height).to_image())
}

/// Interactive crop selection: drag out, move, resize via eight handles.
pub struct CropTool {
    rect: Option<CropRect>,
    phase: CropPhase,
    handle_tolerance: f32,
}

impl CropTool {
    pub fn new(handle_tolerance: f32) -> Self {
        Self {
            rect: None,
            phase: CropPhase::Idle,
            handle_tolerance,
        }
    }

    pub fn rect(&self) -> Option<CropRect> {
        self.rect
    }

    pub fn phase(&self) -> CropPhase {
        self.phase
    }

    pub fn reset(&mut self) {
        self.rect = None;
        self.phase = CropPhase::Idle;
    }

    pub fn pointer_down(&mut self, pos: Pos2) {
        if let (CropPhase::Defined, Some(rect)) = (self.phase, self.rect) {
            if let Some(handle) = rect.handle_at(pos, self.handle_tolerance) {
                self.phase = CropPhase::Resizing { handle };
                return;
            }
            if rect.contains(pos) {
                self.phase = CropPhase::Dragging { last: pos };
                return;
            }
        }

        self.rect = Some(CropRect {
            x: pos.x,
            y: pos.y,
            width: 0.0,
            height: 0.0,
        });
        self.phase = CropPhase::Drawing { origin: pos };
    }

    pub fn pointer_move(&mut self, pos: Pos2) {
        let Some(rect) = &mut self.rect else {
            return;
        };
        match self.phase {
            CropPhase::Drawing { origin } => {
                rect.width = pos.x - origin.x;
                rect.height = pos.y - origin.y;
            }
            CropPhase::Dragging { last } => {
                rect.x += pos.x - last.x;
                rect.y += pos.y - last.y;
                self.phase = CropPhase::Dragging { last: pos };
            }
            CropPhase::Resizing { handle } => rect.resize(handle, pos),
            CropPhase::Idle | CropPhase::Defined => {}
        }
    }

    pub fn pointer_up(&mut self, pos: Pos2) {
        self.pointer_move(pos);
        match self.phase {
            CropPhase::Drawing { .. } | CropPhase::Dragging { .. } | CropPhase::Resizing { .. } => {
                match self.rect.map(CropRect::normalized) {
                    Some(rect) if rect.width > 0.0 && rect.height > 0.0 => {
                        self.rect = Some(rect);
                        self.phase = CropPhase::Defined;
                    }
                    _ => self.reset(),
                }
            }
            CropPhase::Idle | CropPhase::Defined => {}
        }
    }

    /// The rectangle ready to commit, only while no gesture is running.
    pub fn committable(&self) -> Option<CropRect> {
        match self.phase {
            CropPhase::Defined => self.rect.map(CropRect::normalized),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{crop_region, resample, CropPhase, CropRect, CropRegion, CropTool, Handle};
    use crate::viewport::layout;
    use egui::Pos2;
    use image::{Rgba, RgbaImage};

    fn rect(x: f32, y: f32, width: f32, height: f32) -> CropRect {
        CropRect { x, y, width, height }
    }

    #[test]
    fn drag_to_create_normalizes_negative_size() {
        let mut tool = CropTool::new(6.0);
        tool.pointer_down(Pos2::new(100.0, 80.0));
        tool.pointer_move(Pos2::new(40.0, 20.0));
        assert_eq!(tool.rect(), Some(rect(100.0, 80.0, -60.0, -60.0)));

        tool.pointer_up(Pos2::new(40.0, 20.0));
        assert_eq!(tool.phase(), CropPhase::Defined);
        assert_eq!(tool.rect(), Some(rect(40.0, 20.0, 60.0, 60.0)));
    }

    #[test]
    fn click_without_drag_leaves_no_rect() {
        let mut tool = CropTool::new(6.0);
        tool.pointer_down(Pos2::new(10.0, 10.0));
        tool.pointer_up(Pos2::new(10.0, 10.0));
        assert_eq!(tool.phase(), CropPhase::Idle);
        assert_eq!(tool.rect(), None);
    }

    #[test]
    fn drag_inside_translates() {
        let mut tool = CropTool::new(6.0);
        tool.pointer_down(Pos2::new(10.0, 10.0));
        tool.pointer_up(Pos2::new(110.0, 60.0));

        tool.pointer_down(Pos2::new(50.0, 30.0));
        assert!(matches!(tool.phase(), CropPhase::Dragging { .. }));
        tool.pointer_move(Pos2::new(55.0, 40.0));
        tool.pointer_up(Pos2::new(60.0, 45.0));
        assert_eq!(tool.rect(), Some(rect(20.0, 25.0, 100.0, 50.0)));
        assert_eq!(tool.phase(), CropPhase::Defined);
    }

    #[test]
    fn press_outside_starts_a_new_rect() {
        let mut tool = CropTool::new(6.0);
        tool.pointer_down(Pos2::new(10.0, 10.0));
        tool.pointer_up(Pos2::new(50.0, 50.0));
        tool.pointer_down(Pos2::new(200.0, 200.0));
        assert_eq!(tool.phase(), CropPhase::Drawing { origin: Pos2::new(200.0, 200.0) });
        assert_eq!(tool.committable(), None);
    }

    #[test]
    fn handle_hit_uses_tolerance() {
        let r = rect(100.0, 100.0, 200.0, 100.0);
        assert_eq!(r.handle_at(Pos2::new(104.0, 95.0), 6.0), Some(Handle::NorthWest));
        assert_eq!(r.handle_at(Pos2::new(200.0, 201.0), 6.0), Some(Handle::South));
        assert_eq!(r.handle_at(Pos2::new(306.0, 150.0), 6.0), Some(Handle::East));
        assert_eq!(r.handle_at(Pos2::new(307.0, 150.0), 6.0), None);
        assert_eq!(r.handle_at(Pos2::new(150.0, 130.0), 6.0), None);
    }

    #[test]
    fn handle_algebra_keeps_opposite_side_fixed() {
        let base = rect(100.0, 100.0, 200.0, 100.0);
        let p = Pos2::new(90.0, 80.0);

        let mut r = base;
        r.resize(Handle::NorthWest, p);
        assert_eq!(r, rect(90.0, 80.0, 210.0, 120.0));

        let mut r = base;
        r.resize(Handle::North, p);
        assert_eq!(r, rect(100.0, 80.0, 200.0, 120.0));

        let mut r = base;
        r.resize(Handle::NorthEast, Pos2::new(320.0, 90.0));
        assert_eq!(r, rect(100.0, 90.0, 220.0, 110.0));

        let mut r = base;
        r.resize(Handle::East, Pos2::new(250.0, 999.0));
        assert_eq!(r, rect(100.0, 100.0, 150.0, 100.0));

        let mut r = base;
        r.resize(Handle::SouthEast, Pos2::new(310.0, 220.0));
        assert_eq!(r, rect(100.0, 100.0, 210.0, 120.0));

        let mut r = base;
        r.resize(Handle::South, Pos2::new(0.0, 150.0));
        assert_eq!(r, rect(100.0, 100.0, 200.0, 50.0));

        let mut r = base;
        r.resize(Handle::SouthWest, Pos2::new(120.0, 230.0));
        assert_eq!(r, rect(120.0, 100.0, 180.0, 130.0));

        let mut r = base;
        r.resize(Handle::West, Pos2::new(150.0, 0.0));
        assert_eq!(r, rect(150.0, 100.0, 150.0, 100.0));
    }

    #[test]
    fn resize_past_opposite_edge_normalizes_on_release() {
        let mut tool = CropTool::new(6.0);
        tool.pointer_down(Pos2::new(100.0, 100.0));
        tool.pointer_up(Pos2::new(200.0, 200.0));

        tool.pointer_down(Pos2::new(200.0, 150.0));
        assert_eq!(tool.phase(), CropPhase::Resizing { handle: Handle::East });
        tool.pointer_up(Pos2::new(60.0, 150.0));
        assert_eq!(tool.rect(), Some(rect(60.0, 100.0, 40.0, 100.0)));
    }

    #[test]
    fn region_scales_size_and_clamps_to_image() {
        // 400x300 image shown at half size, centred with no letterbox bars.
        let l = layout(400, 300, 200.0, 150.0);
        let region = crop_region(rect(-10.0, 20.0, 60.0, 200.0), &l, 400, 300);
        assert_eq!(
            region,
            Some(CropRegion {
                x: 0,
                y: 40,
                width: 100,
                height: 260,
            })
        );
    }

    #[test]
    fn region_outside_image_is_rejected() {
        let l = layout(300, 600, 800.0, 600.0);
        // Left letterbox bar only.
        assert_eq!(crop_region(rect(10.0, 10.0, 100.0, 100.0), &l, 300, 600), None);
    }

    #[test]
    fn resample_copies_exact_pixels() {
        let image = RgbaImage::from_fn(40, 30, |x, y| Rgba([x as u8, y as u8, 7, 255]));
        let l = layout(40, 30, 40.0, 30.0);
        let out = resample(&image, rect(5.0, 6.0, 10.0, 4.0), &l).expect("region inside image");
        assert_eq!(out.dimensions(), (10, 4));
        assert_eq!(out.get_pixel(0, 0), &Rgba([5, 6, 7, 255]));
        assert_eq!(out.get_pixel(9, 3), &Rgba([14, 9, 7, 255]));
    }
}
