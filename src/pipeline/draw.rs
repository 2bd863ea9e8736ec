use std::convert::Infallible;

use embedded_graphics::{
    mono_font::{MonoTextStyle, ascii::FONT_10X20},
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle, Rectangle},
    text::{Baseline, Text},
};

use crate::types::Frame;

/// Joint pairs of the 21-point hand model.
pub const HAND_CONNECTIONS: &[(usize, usize)] = &[
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4),
    (0, 5),
    (5, 6),
    (6, 7),
    (7, 8),
    (5, 9),
    (9, 10),
    (10, 11),
    (11, 12),
    (9, 13),
    (13, 14),
    (14, 15),
    (15, 16),
    (13, 17),
    (0, 17),
    (17, 18),
    (18, 19),
    (19, 20),
];

pub const WHITE: Rgb888 = Rgb888::new(255, 255, 255);
pub const RED: Rgb888 = Rgb888::new(255, 0, 0);
pub const GREEN: Rgb888 = Rgb888::new(0, 255, 0);
pub const BLUE: Rgb888 = Rgb888::new(0, 0, 255);
pub const MAGENTA: Rgb888 = Rgb888::new(255, 0, 255);

const CONNECTION_THICKNESS: u32 = 2;
const JOINT_RADIUS: i32 = 4;

/// Adapts a frame's RGBA buffer to an embedded-graphics draw target.
struct FrameCanvas<'a>(&'a mut Frame);

impl OriginDimensions for FrameCanvas<'_> {
    fn size(&self) -> Size {
        Size::new(self.0.width, self.0.height)
    }
}

impl DrawTarget for FrameCanvas<'_> {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let (width, height) = (self.0.width as i32, self.0.height as i32);
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 || point.x >= width || point.y >= height {
                continue;
            }
            let idx = (point.y as usize * width as usize + point.x as usize) * 4;
            if let Some(px) = self.0.rgba.get_mut(idx..idx + 4) {
                px.copy_from_slice(&[color.r(), color.g(), color.b(), 255]);
            }
        }
        Ok(())
    }
}

fn render<T>(frame: &mut Frame, item: &T)
where
    T: Drawable<Color = Rgb888>,
{
    match item.draw(&mut FrameCanvas(frame)) {
        Ok(_) => {}
        Err(infallible) => match infallible {},
    }
}

fn point((x, y): (i32, i32)) -> Point {
    Point::new(x, y)
}

pub fn filled_circle(frame: &mut Frame, center: (i32, i32), radius: i32, color: Rgb888) {
    let diameter = (radius.max(0) * 2 + 1) as u32;
    render(
        frame,
        &Circle::with_center(point(center), diameter).into_styled(PrimitiveStyle::with_fill(color)),
    );
}

pub fn line(frame: &mut Frame, from: (i32, i32), to: (i32, i32), color: Rgb888, thickness: u32) {
    render(
        frame,
        &Line::new(point(from), point(to)).into_styled(PrimitiveStyle::with_stroke(color, thickness)),
    );
}

/// Axis-aligned rectangle between two inclusive corners.
pub fn rect(frame: &mut Frame, a: (i32, i32), b: (i32, i32), color: Rgb888, thickness: u32) {
    render(
        frame,
        &Rectangle::with_corners(point(a), point(b))
            .into_styled(PrimitiveStyle::with_stroke(color, thickness)),
    );
}

pub fn filled_rect(frame: &mut Frame, a: (i32, i32), b: (i32, i32), color: Rgb888) {
    render(
        frame,
        &Rectangle::with_corners(point(a), point(b)).into_styled(PrimitiveStyle::with_fill(color)),
    );
}

/// Draws `text` with its baseline starting at `origin`.
pub fn text(frame: &mut Frame, origin: (i32, i32), text: &str, color: Rgb888) {
    let style = MonoTextStyle::new(&FONT_10X20, color);
    render(
        frame,
        &Text::with_baseline(text, point(origin), style, Baseline::Alphabetic),
    );
}

/// Connections in white, joints in red.
pub fn hand_skeleton(frame: &mut Frame, points: &[(i32, i32)]) {
    if points.len() < 2 {
        return;
    }

    for &(a, b) in HAND_CONNECTIONS {
        if let (Some(&pa), Some(&pb)) = (points.get(a), points.get(b)) {
            line(frame, pa, pb, WHITE, CONNECTION_THICKNESS);
        }
    }

    for &p in points {
        filled_circle(frame, p, JOINT_RADIUS, RED);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is(frame: &Frame, x: u32, y: u32, color: Rgb888) -> bool {
        frame.pixel(x, y) == Some([color.r(), color.g(), color.b(), 255])
    }

    #[test]
    fn filled_circle_covers_center_not_corners() {
        let mut frame = Frame::blank(40, 40);
        filled_circle(&mut frame, (20, 20), 7, WHITE);
        assert!(is(&frame, 20, 20, WHITE));
        assert!(is(&frame, 26, 20, WHITE));
        assert!(!is(&frame, 13, 13, WHITE));
    }

    #[test]
    fn drawing_off_frame_is_clipped() {
        let mut frame = Frame::blank(10, 10);
        filled_circle(&mut frame, (-5, -5), 8, GREEN);
        line(&mut frame, (-20, 5), (30, 5), BLUE, 3);
        assert_eq!(frame.rgba.len(), 10 * 10 * 4);
        assert!(is(&frame, 0, 0, GREEN));
        assert!(is(&frame, 9, 5, BLUE));
    }

    #[test]
    fn filled_rect_is_inclusive() {
        let mut frame = Frame::blank(100, 100);
        filled_rect(&mut frame, (50, 60), (85, 90), BLUE);
        assert!(is(&frame, 50, 60, BLUE));
        assert!(is(&frame, 85, 90, BLUE));
        assert!(!is(&frame, 86, 90, BLUE));
        assert!(!is(&frame, 50, 59, BLUE));
    }

    #[test]
    fn text_touches_pixels_above_baseline() {
        let mut frame = Frame::blank(120, 40);
        text(&mut frame, (5, 30), "FPS: 30", GREEN);
        let lit = (0..40)
            .flat_map(|y| (0..120).map(move |x| (x, y)))
            .filter(|&(x, y)| is(&frame, x, y, GREEN))
            .collect::<Vec<_>>();
        assert!(!lit.is_empty());
        assert!(lit.iter().all(|&(_, y)| y <= 35));
    }

    #[test]
    fn skeleton_ignores_short_lists() {
        let mut frame = Frame::blank(8, 8);
        let before = frame.rgba.clone();
        hand_skeleton(&mut frame, &[(4, 4)]);
        assert_eq!(frame.rgba, before);
    }
}
