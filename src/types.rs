use std::time::Instant;

/// Number of joints the hand landmark model reports per hand.
pub const NUM_LANDMARKS: usize = 21;

pub const THUMB_TIP: usize = 4;
pub const INDEX_FINGER_TIP: usize = 8;

#[derive(Clone, Debug)]
pub struct Frame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: Instant,
}

impl Frame {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            rgba,
            width,
            height,
            timestamp: Instant::now(),
        }
    }

    /// Opaque black frame, mostly useful as a drawing canvas.
    pub fn blank(width: u32, height: u32) -> Self {
        let mut rgba = vec![0u8; width as usize * height as usize * 4];
        for px in rgba.chunks_exact_mut(4) {
            px[3] = 255;
        }
        Self::new(width, height, rgba)
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        self.rgba
            .get(idx..idx + 4)
            .map(|px| [px[0], px[1], px[2], px[3]])
    }
}

/// A landmark in model space: x and y are fractions of the frame size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedLandmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// A landmark in pixel space, tagged with its joint index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Landmark {
    pub id: usize,
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn from_score(score: f32) -> Self {
        if score >= 0.5 {
            Handedness::Right
        } else {
            Handedness::Left
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Handedness::Left => "Left",
            Handedness::Right => "Right",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Hand {
    pub landmarks: Vec<NormalizedLandmark>,
    pub handedness: Handedness,
    pub score: f32,
}

#[derive(Clone, Debug, Default)]
pub enum DetectionResult {
    #[default]
    NoHandsDetected,
    Hands(Vec<Hand>),
}

impl DetectionResult {
    /// Builds a result from the engine output, folding an empty list into
    /// `NoHandsDetected` so `Hands` always carries at least one hand.
    pub fn from_hands(hands: Vec<Hand>) -> Self {
        if hands.is_empty() {
            DetectionResult::NoHandsDetected
        } else {
            DetectionResult::Hands(hands)
        }
    }

    pub fn hands(&self) -> &[Hand] {
        match self {
            DetectionResult::NoHandsDetected => &[],
            DetectionResult::Hands(hands) => hands,
        }
    }

    pub fn hand(&self, index: usize) -> Option<&Hand> {
        self.hands().get(index)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, DetectionResult::NoHandsDetected)
    }
}

/// Detection result together with the size of the frame it was computed on.
#[derive(Clone, Debug)]
pub struct FrameDetection {
    pub result: DetectionResult,
    pub width: u32,
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_hand_list_is_no_detection() {
        assert!(DetectionResult::from_hands(Vec::new()).is_empty());
        assert!(DetectionResult::default().hand(0).is_none());
    }

    #[test]
    fn blank_frame_is_opaque_black() {
        let frame = Frame::blank(4, 3);
        assert_eq!(frame.rgba.len(), 4 * 3 * 4);
        assert_eq!(frame.pixel(3, 2), Some([0, 0, 0, 255]));
        assert_eq!(frame.pixel(4, 0), None);
    }

    #[test]
    fn handedness_threshold() {
        assert_eq!(Handedness::from_score(0.9), Handedness::Right);
        assert_eq!(Handedness::from_score(0.1), Handedness::Left);
        assert_eq!(Handedness::from_score(0.5).label(), "Right");
        assert_eq!(Handedness::Left.label(), "Left");
    }
}
