use crate::annotations::{Stroke, StrokeKind};
use crate::tools::{CropRect, Handle};
use egui::{Pos2, Vec2};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut, draw_polygon_mut};
use imageproc::point::Point;

pub const SURFACE_BACKGROUND: Rgba<u8> = Rgba([38, 39, 52, 255]);
const OVERLAY_BORDER: Rgba<u8> = Rgba([255, 255, 255, 255]);
const OVERLAY_DIM_ALPHA: f32 = 0.5;
const HANDLE_SIZE: u32 = 8;

/// Shape of a rendered arrow, in whatever space the endpoints were given.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ArrowGeometry {
    pub shaft_width: f32,
    pub head_len: f32,
    /// Where the shaft stops: `head_len` back from the tip along the arrow.
    pub shaft_end: Pos2,
    pub shaft: [Pos2; 4],
    /// Apex first, then the two base corners.
    pub head: [Pos2; 3],
}

/// Thin strokes still get a readable arrow: the shaft is at least 12 display
/// pixels wide and the head at least 25 long. `unit` is the length of one
/// display pixel in the space `from`, `to` and `size` are given in, so the
/// minimums hold on screen and in the export alike. Zero-length arrows have
/// no direction and yield `None`.
pub fn arrow_geometry(from: Pos2, to: Pos2, size: f32, unit: f32) -> Option<ArrowGeometry> {
    let delta = to - from;
    let length = delta.length();
    if length < f32::EPSILON {
        return None;
    }
    let dir = delta / length;
    let normal = Vec2::new(-dir.y, dir.x);

    let shaft_width = (4.0 * size).max(12.0 * unit);
    let head_len = (2.5 * shaft_width).max(25.0 * unit);
    let shaft_end = to - dir * head_len;

    let half_shaft = normal * (shaft_width / 2.0);
    let half_head = normal * (head_len / 2.0);

    Some(ArrowGeometry {
        shaft_width,
        head_len,
        shaft_end,
        shaft: [
            from + half_shaft,
            shaft_end + half_shaft,
            shaft_end - half_shaft,
            from - half_shaft,
        ],
        head: [to, shaft_end + half_head, shaft_end - half_head],
    })
}

fn fill_polygon(canvas: &mut RgbaImage, polygon: &[Pos2], color: Rgba<u8>) {
    let mut points: Vec<Point<i32>> = Vec::with_capacity(polygon.len());
    for p in polygon {
        let point = Point::new(p.x.round() as i32, p.y.round() as i32);
        if points.last() != Some(&point) {
            points.push(point);
        }
    }
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    if points.len() < 3 {
        return;
    }
    draw_polygon_mut(canvas, &points, color);
}

fn stamp(canvas: &mut RgbaImage, center: Pos2, radius: f32, color: Rgba<u8>) {
    draw_filled_circle_mut(
        canvas,
        (center.x.round() as i32, center.y.round() as i32),
        radius.round() as i32,
        color,
    );
}

/// Round-capped polyline, stamped along each segment.
fn draw_polyline(canvas: &mut RgbaImage, points: &[Pos2], color: Rgba<u8>, width: f32) {
    let radius = (width / 2.0).max(0.5);
    let step = (radius * 0.5).max(1.0);

    if let [only] = points {
        stamp(canvas, *only, radius, color);
        return;
    }
    for pair in points.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        let steps = (start.distance(end) / step).max(1.0) as u32;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            stamp(canvas, start.lerp(end, t), radius, color);
        }
    }
}

pub fn draw_arrow(canvas: &mut RgbaImage, from: Pos2, to: Pos2, color: Rgba<u8>, size: f32, unit: f32) {
    if let Some(arrow) = arrow_geometry(from, to, size, unit) {
        fill_polygon(canvas, &arrow.shaft, color);
        fill_polygon(canvas, &arrow.head, color);
    }
}

/// Draws one stroke whose points are already in `canvas` coordinates. `unit`
/// is one display pixel measured in canvas pixels.
pub fn draw_stroke(
    canvas: &mut RgbaImage,
    kind: StrokeKind,
    points: &[Pos2],
    color: Rgba<u8>,
    size: f32,
    unit: f32,
) {
    match kind {
        StrokeKind::Freehand => draw_polyline(canvas, points, color, size),
        StrokeKind::Arrow => {
            if let (Some(first), Some(last)) = (points.first(), points.last()) {
                draw_arrow(canvas, *first, *last, color, size, unit);
            }
        }
    }
}

/// Flattens strokes onto a copy of the image at native resolution. `scale` is
/// image pixels per display pixel, as used while the strokes were drawn.
pub fn compose(image: &RgbaImage, strokes: &[Stroke], scale: f32) -> RgbaImage {
    let mut canvas = image.clone();
    for stroke in strokes {
        let points: Vec<Pos2> = stroke.points.iter().map(|p| Pos2::new(p.x, p.y)).collect();
        draw_stroke(&mut canvas, stroke.kind, &points, stroke.color, stroke.size, scale);
    }
    canvas
}

fn darken(pixel: &mut Rgba<u8>) {
    for channel in pixel.0.iter_mut().take(3) {
        *channel = (*channel as f32 * (1.0 - OVERLAY_DIM_ALPHA)).round() as u8;
    }
}

/// Dims everything outside the selection and marks its border and handles.
pub fn draw_crop_overlay(canvas: &mut RgbaImage, rect: CropRect) {
    let r = rect.normalized();
    let (left, top) = (r.x.round() as i64, r.y.round() as i64);
    let (right, bottom) = ((r.x + r.width).round() as i64, (r.y + r.height).round() as i64);

    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        let (x, y) = (x as i64, y as i64);
        if x < left || x >= right || y < top || y >= bottom {
            darken(pixel);
        }
    }

    let (width, height) = ((right - left).max(0) as u32, (bottom - top).max(0) as u32);
    if width > 0 && height > 0 {
        draw_hollow_rect_mut(
            canvas,
            imageproc::rect::Rect::at(left as i32, top as i32).of_size(width, height),
            OVERLAY_BORDER,
        );
    }

    for handle in Handle::ALL {
        let p = r.handle_pos(handle);
        let half = (HANDLE_SIZE / 2) as f32;
        draw_filled_rect_mut(
            canvas,
            imageproc::rect::Rect::at((p.x - half).round() as i32, (p.y - half).round() as i32)
                .of_size(HANDLE_SIZE, HANDLE_SIZE),
            OVERLAY_BORDER,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{arrow_geometry, compose, draw_crop_overlay, SURFACE_BACKGROUND};
    use crate::annotations::{Stroke, StrokeKind};
    use crate::tools::crop::CropRect;
    use crate::viewport::ImagePoint;
    use egui::Pos2;
    use image::{Rgba, RgbaImage};

    #[test]
    fn thin_arrow_gets_minimum_geometry() {
        let arrow = arrow_geometry(Pos2::new(0.0, 50.0), Pos2::new(100.0, 50.0), 1.0, 1.0)
            .expect("arrow has length");
        assert_eq!(arrow.shaft_width, 12.0);
        assert_eq!(arrow.head_len, 30.0);
        assert_eq!(arrow.head[0], Pos2::new(100.0, 50.0));
        assert_eq!(arrow.shaft_end, Pos2::new(70.0, 50.0));
        assert_eq!(arrow.shaft[0], Pos2::new(0.0, 56.0));
        assert_eq!(arrow.shaft[3], Pos2::new(0.0, 44.0));
    }

    #[test]
    fn thick_arrow_scales_with_size() {
        let arrow = arrow_geometry(Pos2::new(0.0, 0.0), Pos2::new(0.0, 200.0), 5.0, 1.0)
            .expect("arrow has length");
        assert_eq!(arrow.shaft_width, 20.0);
        assert_eq!(arrow.head_len, 50.0);
        assert_eq!(arrow.head[0], Pos2::new(0.0, 200.0));
    }

    #[test]
    fn minimums_scale_with_display_unit() {
        // Same thin arrow as shown on screen, expressed in a 2x image.
        let screen = arrow_geometry(Pos2::new(0.0, 50.0), Pos2::new(100.0, 50.0), 1.0, 1.0)
            .expect("arrow has length");
        let image = arrow_geometry(Pos2::new(0.0, 100.0), Pos2::new(200.0, 100.0), 2.0, 2.0)
            .expect("arrow has length");
        assert_eq!(image.shaft_width, 2.0 * screen.shaft_width);
        assert_eq!(image.head_len, 2.0 * screen.head_len);
        assert_eq!(image.shaft_end, Pos2::new(140.0, 100.0));
    }

    #[test]
    fn zero_length_arrow_has_no_geometry() {
        assert!(arrow_geometry(Pos2::new(3.0, 3.0), Pos2::new(3.0, 3.0), 2.0, 1.0).is_none());
    }

    #[test]
    fn compose_paints_strokes_without_touching_source() {
        let white = Rgba([255, 255, 255, 255]);
        let red = Rgba([255, 0, 0, 255]);
        let image = RgbaImage::from_pixel(120, 100, white);
        let strokes = vec![
            Stroke {
                id: 1,
                kind: StrokeKind::Arrow,
                points: vec![ImagePoint::new(10.0, 50.0), ImagePoint::new(110.0, 50.0)],
                color: red,
                size: 1.0,
            },
            Stroke {
                id: 2,
                kind: StrokeKind::Freehand,
                points: vec![ImagePoint::new(10.0, 10.0), ImagePoint::new(40.0, 10.0)],
                color: red,
                size: 4.0,
            },
        ];

        let out = compose(&image, &strokes, 1.0);
        assert_eq!(out.dimensions(), (120, 100));
        assert_eq!(out.get_pixel(40, 50), &red);
        assert_eq!(out.get_pixel(105, 50), &red);
        assert_eq!(out.get_pixel(25, 10), &red);
        assert_eq!(out.get_pixel(60, 90), &white);
        assert_eq!(image.get_pixel(40, 50), &white);
    }

    #[test]
    fn overlay_dims_outside_only() {
        let mut canvas = RgbaImage::from_pixel(100, 100, Rgba([200, 200, 200, 255]));
        draw_crop_overlay(
            &mut canvas,
            CropRect {
                x: 20.0,
                y: 20.0,
                width: 60.0,
                height: 60.0,
            },
        );
        assert_eq!(canvas.get_pixel(2, 50), &Rgba([100, 100, 100, 255]));
        assert_eq!(canvas.get_pixel(50, 50), &Rgba([200, 200, 200, 255]));
        assert_eq!(canvas.get_pixel(20, 50), &Rgba([255, 255, 255, 255]));
        assert_ne!(canvas.get_pixel(2, 50), &SURFACE_BACKGROUND);
    }
}
