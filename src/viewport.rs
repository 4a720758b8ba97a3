use egui::Pos2;

/// A point in source-image pixel coordinates.
///
/// Display-space points are plain `egui::Pos2` values relative to the top-left
/// corner of the drawing surface; the two are never mixed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImagePoint {
    pub x: f32,
    pub y: f32,
}

impl ImagePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Where the image lands on the surface after aspect-preserving letterboxing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Layout {
    pub draw_width: f32,
    pub draw_height: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Layout {
    pub fn scale_x(&self, image_width: u32) -> f32 {
        image_width as f32 / self.draw_width
    }

    pub fn scale_y(&self, image_height: u32) -> f32 {
        image_height as f32 / self.draw_height
    }

    pub fn contains(&self, pos: Pos2) -> bool {
        pos.x >= self.offset_x
            && pos.x <= self.offset_x + self.draw_width
            && pos.y >= self.offset_y
            && pos.y <= self.offset_y + self.draw_height
    }
}

/// Fits an image into the surface. Wider-than-surface images fit the width and
/// are centred vertically, everything else fits the height.
pub fn layout(image_width: u32, image_height: u32, surface_width: f32, surface_height: f32) -> Layout {
    let image_aspect = image_width as f32 / image_height as f32;
    let surface_aspect = surface_width / surface_height;

    if image_aspect > surface_aspect {
        let draw_width = surface_width;
        let draw_height = image_height as f32 * surface_width / image_width as f32;
        Layout {
            draw_width,
            draw_height,
            offset_x: 0.0,
            offset_y: (surface_height - draw_height) / 2.0,
        }
    } else {
        let draw_height = surface_height;
        let draw_width = image_width as f32 * surface_height / image_height as f32;
        Layout {
            draw_width,
            draw_height,
            offset_x: (surface_width - draw_width) / 2.0,
            offset_y: 0.0,
        }
    }
}

/// Screen to image. Results are clamped to the image bounds.
///
/// Callers must not pass a layout produced from a zero-sized image.
pub fn to_image_space(pos: Pos2, layout: &Layout, image_width: u32, image_height: u32) -> ImagePoint {
    let scale_x = layout.scale_x(image_width);
    let scale_y = layout.scale_y(image_height);
    ImagePoint {
        x: ((pos.x - layout.offset_x) * scale_x).clamp(0.0, image_width as f32),
        y: ((pos.y - layout.offset_y) * scale_y).clamp(0.0, image_height as f32),
    }
}

/// Image to screen, the forward direction of [`to_image_space`].
pub fn to_display_space(point: ImagePoint, layout: &Layout, image_width: u32, image_height: u32) -> Pos2 {
    Pos2::new(
        point.x / layout.scale_x(image_width) + layout.offset_x,
        point.y / layout.scale_y(image_height) + layout.offset_y,
    )
}
