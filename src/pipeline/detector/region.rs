use super::palm::PalmDetection;

// Palm keypoints emitted by the palm detector.
const PALM_WRIST: usize = 0;
const PALM_MIDDLE_MCP: usize = 2;

// Hand landmarks used to orient a tracked crop.
const HAND_WRIST: usize = 0;
const HAND_MIDDLE_MCP: usize = 9;

const PALM_CROP_SCALE: f32 = 2.4;
const LANDMARK_CROP_SCALE: f32 = 2.0;
const MIN_CROP_SIDE: f32 = 80.0;

/// Rotated square area of a frame handed to the landmark model.
///
/// `angle` rotates crop axes into frame axes, so the crop's "up" points from
/// the wrist towards the fingers.
#[derive(Clone, Debug, PartialEq)]
pub struct HandRegion {
    pub center: (f32, f32),
    pub side: f32,
    pub angle: f32,
}

impl HandRegion {
    pub fn from_palm(palm: &PalmDetection) -> Self {
        let [x1, y1, x2, y2] = palm.bbox;
        let center = mean(&palm.landmarks).unwrap_or(((x1 + x2) * 0.5, (y1 + y2) * 0.5));

        let landmark_span = span(&palm.landmarks);
        let side = (x2 - x1)
            .abs()
            .max((y2 - y1).abs())
            .max(landmark_span)
            .max(MIN_CROP_SIDE)
            * PALM_CROP_SCALE;

        let angle = match (
            palm.landmarks.get(PALM_WRIST),
            palm.landmarks.get(PALM_MIDDLE_MCP),
        ) {
            (Some(&wrist), Some(&middle)) => upright_angle(wrist, middle),
            _ => 0.0,
        };

        Self {
            center,
            side,
            angle,
        }
    }

    /// Region enclosing a full set of projected hand landmarks, used to follow
    /// the hand into the next frame.
    pub fn from_landmarks(points: &[(f32, f32)]) -> Option<Self> {
        let (min_x, max_x, min_y, max_y) = bounds(points)?;
        let angle = match (points.get(HAND_WRIST), points.get(HAND_MIDDLE_MCP)) {
            (Some(&wrist), Some(&middle)) => upright_angle(wrist, middle),
            _ => 0.0,
        };

        Some(Self {
            center: ((min_x + max_x) * 0.5, (min_y + max_y) * 0.5),
            side: (max_x - min_x).max(max_y - min_y).max(MIN_CROP_SIDE / LANDMARK_CROP_SCALE)
                * LANDMARK_CROP_SCALE,
            angle,
        })
    }

    /// Rotates a crop-space offset into frame space and adds the center.
    pub fn rotate_offset(&self, dx: f32, dy: f32) -> (f32, f32) {
        let (sin, cos) = self.angle.sin_cos();
        (
            self.center.0 + dx * cos - dy * sin,
            self.center.1 + dx * sin + dy * cos,
        )
    }

    pub fn contains(&self, (x, y): (f32, f32)) -> bool {
        let (dx, dy) = (x - self.center.0, y - self.center.1);
        let (sin, cos) = self.angle.sin_cos();
        let local_x = dx * cos + dy * sin;
        let local_y = -dx * sin + dy * cos;
        let half = self.side * 0.5;
        local_x.abs() <= half && local_y.abs() <= half
    }
}

fn upright_angle(wrist: (f32, f32), middle: (f32, f32)) -> f32 {
    let (vx, vy) = (middle.0 - wrist.0, middle.1 - wrist.1);
    if vx.abs() < f32::EPSILON && vy.abs() < f32::EPSILON {
        return 0.0;
    }
    vx.atan2(-vy)
}

fn mean(points: &[(f32, f32)]) -> Option<(f32, f32)> {
    if points.is_empty() {
        return None;
    }
    let (sx, sy) = points
        .iter()
        .fold((0.0_f32, 0.0_f32), |acc, p| (acc.0 + p.0, acc.1 + p.1));
    let n = points.len() as f32;
    Some((sx / n, sy / n))
}

fn bounds(points: &[(f32, f32)]) -> Option<(f32, f32, f32, f32)> {
    if points.is_empty() {
        return None;
    }
    Some(points.iter().fold(
        (f32::MAX, f32::MIN, f32::MAX, f32::MIN),
        |acc, &(x, y)| (acc.0.min(x), acc.1.max(x), acc.2.min(y), acc.3.max(y)),
    ))
}

fn span(points: &[(f32, f32)]) -> f32 {
    bounds(points)
        .map(|(min_x, max_x, min_y, max_y)| (max_x - min_x).max(max_y - min_y))
        .unwrap_or(0.0)
}
