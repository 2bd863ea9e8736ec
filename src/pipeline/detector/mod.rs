mod common;
mod ort;
mod palm;
mod region;
mod tracker;

use thiserror::Error;

use super::draw;
use crate::{
    config::{DetectorConfig, ModelPaths},
    types::{DetectionResult, Frame, FrameDetection, Hand, Landmark},
};

pub use self::ort::OrtEngine;

const POSITION_MARKER_RADIUS: i32 = 7;

/// Inference backend behind [`HandDetector`]; returns hands with landmarks
/// normalized to the frame it was given.
pub trait LandmarkEngine {
    fn detect(&mut self, frame: &Frame) -> anyhow::Result<Vec<Hand>>;
}

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error(
        "frame is {frame_width}x{frame_height} but the detection was computed on {detection_width}x{detection_height}"
    )]
    FrameMismatch {
        frame_width: u32,
        frame_height: u32,
        detection_width: u32,
        detection_height: u32,
    },
    #[error("hand landmark inference failed: {0:#}")]
    Inference(anyhow::Error),
}

pub struct HandDetector<E: LandmarkEngine = OrtEngine> {
    engine: E,
}

impl HandDetector<OrtEngine> {
    /// Loads (and if needed downloads) the ONNX models and configures tracking.
    pub fn new(config: DetectorConfig, models: &ModelPaths) -> anyhow::Result<Self> {
        log::info!("creating hand detector with {config:?}");
        Ok(Self::with_engine(OrtEngine::new(config, models)?))
    }
}

impl<E: LandmarkEngine> HandDetector<E> {
    pub fn with_engine(engine: E) -> Self {
        Self { engine }
    }

    /// Runs the model on `frame`. With `draw`, every detected hand's skeleton
    /// is painted onto the frame. Finding no hand is not an error.
    pub fn find_hands(
        &mut self,
        frame: &mut Frame,
        draw: bool,
    ) -> Result<FrameDetection, DetectorError> {
        let hands = self
            .engine
            .detect(frame)
            .map_err(DetectorError::Inference)?;
        let result = DetectionResult::from_hands(hands);

        if draw {
            let (w, h) = frame.size();
            for hand in result.hands() {
                let points: Vec<(i32, i32)> = pixel_positions(hand, w, h)
                    .map(|lm| (lm.x, lm.y))
                    .collect();
                draw::hand_skeleton(frame, &points);
            }
        }

        Ok(FrameDetection {
            result,
            width: frame.width,
            height: frame.height,
        })
    }

    /// Pixel landmarks of hand `hand_index`; empty when there is no such hand.
    /// With `draw`, a white marker is painted on each landmark.
    pub fn find_position(
        &self,
        frame: &mut Frame,
        detection: &FrameDetection,
        hand_index: usize,
        draw: bool,
    ) -> Result<Vec<Landmark>, DetectorError> {
        find_position(frame, detection, hand_index, draw)
    }
}

pub fn find_position(
    frame: &mut Frame,
    detection: &FrameDetection,
    hand_index: usize,
    draw: bool,
) -> Result<Vec<Landmark>, DetectorError> {
    if frame.size() != (detection.width, detection.height) {
        return Err(DetectorError::FrameMismatch {
            frame_width: frame.width,
            frame_height: frame.height,
            detection_width: detection.width,
            detection_height: detection.height,
        });
    }

    let Some(hand) = detection.result.hand(hand_index) else {
        return Ok(Vec::new());
    };

    let landmarks: Vec<Landmark> = pixel_positions(hand, frame.width, frame.height).collect();
    if draw {
        for lm in &landmarks {
            draw::filled_circle(frame, (lm.x, lm.y), POSITION_MARKER_RADIUS, draw::WHITE);
        }
    }
    Ok(landmarks)
}

fn pixel_positions(hand: &Hand, width: u32, height: u32) -> impl Iterator<Item = Landmark> + '_ {
    hand.landmarks.iter().enumerate().map(move |(id, lm)| Landmark {
        id,
        // Truncation, matching integer pixel conversion of the model output.
        x: (lm.x * width as f32) as i32,
        y: (lm.y * height as f32) as i32,
    })
}


#[cfg(test)]
mod tests {
    use super::testing::{ScriptedEngine, hand_at};
    use super::*;
    use crate::types::NUM_LANDMARKS;

    #[test]
    fn no_hands_is_a_normal_outcome() {
        let mut detector = HandDetector::with_engine(ScriptedEngine::default());
        let mut frame = Frame::blank(64, 48);
        let before = frame.rgba.clone();

        let detection = detector.find_hands(&mut frame, true).unwrap();
        assert!(detection.result.is_empty());
        assert_eq!(frame.rgba, before);

        let landmarks = detector.find_position(&mut frame, &detection, 0, true).unwrap();
        assert!(landmarks.is_empty());
    }

    #[test]
    fn positions_are_truncated_pixels() {
        let mut engine = ScriptedEngine::default();
        engine.push(vec![hand_at((0.5, 0.5), &[(4, (0.2599, 0.999)), (8, (0.0, 0.0))])]);
        let mut detector = HandDetector::with_engine(engine);
        let mut frame = Frame::blank(100, 50);

        let detection = detector.find_hands(&mut frame, false).unwrap();
        let landmarks = detector.find_position(&mut frame, &detection, 0, false).unwrap();

        assert_eq!(landmarks.len(), NUM_LANDMARKS);
        assert_eq!(landmarks[4], Landmark { id: 4, x: 25, y: 49 });
        assert_eq!(landmarks[8], Landmark { id: 8, x: 0, y: 0 });
        assert_eq!(landmarks[0], Landmark { id: 0, x: 50, y: 25 });
        assert!(landmarks.iter().enumerate().all(|(i, lm)| lm.id == i));
    }

    #[test]
    fn out_of_range_hand_index_is_empty() {
        let mut engine = ScriptedEngine::default();
        engine.push(vec![hand_at((0.5, 0.5), &[])]);
        let mut detector = HandDetector::with_engine(engine);
        let mut frame = Frame::blank(32, 32);

        let detection = detector.find_hands(&mut frame, false).unwrap();
        assert_eq!(detector.find_position(&mut frame, &detection, 0, false).unwrap().len(), 21);
        assert!(detector.find_position(&mut frame, &detection, 1, false).unwrap().is_empty());
    }

    #[test]
    fn detection_from_another_frame_size_is_rejected() {
        let mut engine = ScriptedEngine::default();
        engine.push(vec![hand_at((0.5, 0.5), &[])]);
        let mut detector = HandDetector::with_engine(engine);

        let mut small = Frame::blank(32, 32);
        let detection = detector.find_hands(&mut small, false).unwrap();

        let mut large = Frame::blank(64, 32);
        let err = detector.find_position(&mut large, &detection, 0, false).unwrap_err();
        assert!(matches!(err, DetectorError::FrameMismatch { frame_width: 64, detection_width: 32, .. }));
    }

    #[test]
    fn drawing_marks_landmarks() {
        let mut engine = ScriptedEngine::default();
        engine.push(vec![hand_at((0.25, 0.5), &[(8, (0.75, 0.5))])]);
        let mut detector = HandDetector::with_engine(engine);
        let mut frame = Frame::blank(80, 40);

        let detection = detector.find_hands(&mut frame, true).unwrap();
        // Skeleton line between the two clusters of joints.
        assert_ne!(frame.pixel(40, 20), Some([0, 0, 0, 255]));

        detector.find_position(&mut frame, &detection, 0, true).unwrap();
        assert_eq!(frame.pixel(60, 20), Some([255, 255, 255, 255]));
        assert_eq!(frame.pixel(20, 20), Some([255, 255, 255, 255]));
    }

    #[test]
    fn inference_errors_surface() {
        let mut engine = ScriptedEngine::default();
        engine.frames.push_back(Err(anyhow::anyhow!("session exploded")));
        let mut detector = HandDetector::with_engine(engine);
        let mut frame = Frame::blank(8, 8);

        let err = detector.find_hands(&mut frame, true).unwrap_err();
        assert!(err.to_string().contains("session exploded"));
    }
}
