use anyhow::{Context, Result};

use crate::{
    config::MapperConfig,
    fps::FpsCounter,
    mapping::{DistanceMapper, Pinch, VolumeMapping},
    pipeline::{
        detector::{HandDetector, LandmarkEngine},
        draw,
    },
    types::{Frame, INDEX_FINGER_TIP, THUMB_TIP},
    volume::VolumeControl,
};

const PINCH_MARKER_RADIUS: i32 = 15;
const PINCH_LINE_THICKNESS: u32 = 3;
const BAR_LEFT: i32 = 50;
const BAR_RIGHT: i32 = 85;
const BAR_THICKNESS: u32 = 3;
const PERCENT_ORIGIN: (i32, i32) = (40, 450);
const FPS_ORIGIN: (i32, i32) = (40, 50);

/// What happened on one processed frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    pub pinch: Option<Pinch>,
    pub mapping: Option<VolumeMapping>,
    pub fps: f32,
}

/// Per-frame detect → map → apply → annotate step of the volume demo.
pub struct VolumeController<E: LandmarkEngine, V: VolumeControl> {
    detector: HandDetector<E>,
    volume: V,
    mapper: DistanceMapper,
    bar_height: f32,
    percent: f32,
    fps: FpsCounter,
}

impl<E: LandmarkEngine, V: VolumeControl> VolumeController<E, V> {
    pub fn new(detector: HandDetector<E>, volume: V, config: MapperConfig) -> Self {
        let range = volume.range();
        log::info!("volume range {:.2}..{:.2}", range.min, range.max);
        let bar_height = config.bar_range[0];
        let percent = config.percent_range[0];

        Self {
            detector,
            volume,
            mapper: DistanceMapper::new(config, range),
            bar_height,
            percent,
            fps: FpsCounter::new(),
        }
    }

    pub fn volume(&self) -> &V {
        &self.volume
    }

    /// Detects the pinch on `frame`, applies the mapped volume and draws the
    /// overlays. A frame without a hand leaves the volume and bar untouched.
    pub fn process_frame(&mut self, frame: &mut Frame) -> Result<FrameReport> {
        let pinch = self.detect_pinch(frame);

        let mapping = match pinch {
            Some(pinch) => {
                let mapping = self.mapper.map(pinch.distance);
                self.volume
                    .set_level(mapping.level)
                    .context("failed to apply volume level")?;
                self.bar_height = mapping.bar_height;
                self.percent = mapping.percent;
                self.draw_pinch(frame, &pinch);
                Some(mapping)
            }
            None => None,
        };

        let fps = self.fps.tick(frame.timestamp);
        self.draw_status(frame, fps);

        Ok(FrameReport {
            pinch,
            mapping,
            fps,
        })
    }

    fn detect_pinch(&mut self, frame: &mut Frame) -> Option<Pinch> {
        let landmarks = self
            .detector
            .find_hands(frame, true)
            .and_then(|detection| self.detector.find_position(frame, &detection, 0, false));

        match landmarks {
            Ok(landmarks) => match (landmarks.get(THUMB_TIP), landmarks.get(INDEX_FINGER_TIP)) {
                (Some(thumb), Some(index)) => Some(Pinch::between(thumb, index)),
                _ => None,
            },
            Err(err) => {
                log::warn!("hand detection failed: {err}");
                None
            }
        }
    }

    fn draw_pinch(&self, frame: &mut Frame, pinch: &Pinch) {
        for point in [pinch.thumb, pinch.index, pinch.center] {
            draw::filled_circle(frame, point, PINCH_MARKER_RADIUS, draw::MAGENTA);
        }
        draw::line(frame, pinch.thumb, pinch.index, draw::MAGENTA, PINCH_LINE_THICKNESS);

        if self.mapper.is_pinched(pinch.distance) {
            draw::filled_circle(frame, pinch.center, PINCH_MARKER_RADIUS, draw::GREEN);
        }
    }

    fn draw_status(&self, frame: &mut Frame, fps: f32) {
        let [bottom, top] = self.mapper.config().bar_range.map(|v| v as i32);
        draw::rect(frame, (BAR_LEFT, top), (BAR_RIGHT, bottom), draw::BLUE, BAR_THICKNESS);
        draw::filled_rect(
            frame,
            (BAR_LEFT, self.bar_height as i32),
            (BAR_RIGHT, bottom),
            draw::BLUE,
        );
        draw::text(
            frame,
            PERCENT_ORIGIN,
            &format!("{} %", self.percent as i32),
            draw::BLUE,
        );
        draw::text(frame, FPS_ORIGIN, &format!("FPS: {}", fps as i32), draw::BLUE);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use approx::assert_relative_eq;

    use super::*;
    use crate::{
        pipeline::detector::testing::{ScriptedEngine, hand_at},
        volume::testing::RecordingVolume,
    };

    const BLUE: [u8; 4] = [0, 0, 255, 255];
    const GREEN: [u8; 4] = [0, 255, 0, 255];
    const MAGENTA: [u8; 4] = [255, 0, 255, 255];

    fn controller(engine: ScriptedEngine) -> VolumeController<ScriptedEngine, RecordingVolume> {
        VolumeController::new(
            HandDetector::with_engine(engine),
            RecordingVolume::new(-65.25, 0.0),
            MapperConfig::default(),
        )
    }

    /// Thumb and index tips at the given pixels of a 640x480 frame.
    fn pinch_hand(thumb: (f32, f32), index: (f32, f32)) -> Vec<crate::types::Hand> {
        let norm = |(x, y): (f32, f32)| (x / 640.0, y / 480.0);
        vec![hand_at(
            norm((320.0, 400.0)),
            &[(THUMB_TIP, norm(thumb)), (INDEX_FINGER_TIP, norm(index))],
        )]
    }

    #[test]
    fn separated_fingers_set_sixty_percent() {
        let mut engine = ScriptedEngine::default();
        engine.push(pinch_hand((100.0, 100.0), (300.0, 100.0)));
        let mut ctl = controller(engine);
        let mut frame = Frame::blank(640, 480);

        let report = ctl.process_frame(&mut frame).unwrap();
        let pinch = report.pinch.unwrap();
        assert_eq!(pinch.thumb, (100, 100));
        assert_eq!(pinch.index, (300, 100));
        assert_relative_eq!(pinch.distance, 200.0);

        let mapping = report.mapping.unwrap();
        assert_relative_eq!(mapping.percent, 60.0, epsilon = 1e-4);
        assert_relative_eq!(mapping.bar_height, 250.0, epsilon = 1e-3);
        assert_eq!(ctl.volume().applied, vec![mapping.level]);

        assert_eq!(frame.pixel(200, 100), Some(MAGENTA));
        // Filled bar from y=250 down to 400.
        assert_eq!(frame.pixel(67, 300), Some(BLUE));
        assert_ne!(frame.pixel(67, 200), Some(BLUE));
    }

    #[test]
    fn pinched_fingers_mark_center_green_and_mute() {
        let mut engine = ScriptedEngine::default();
        engine.push(pinch_hand((200.0, 200.0), (220.0, 200.0)));
        let mut ctl = controller(engine);
        let mut frame = Frame::blank(640, 480);

        let report = ctl.process_frame(&mut frame).unwrap();
        assert_eq!(report.mapping.unwrap().percent, 0.0);
        assert_eq!(ctl.volume().applied, vec![-65.25]);
        assert_eq!(frame.pixel(210, 200), Some(GREEN));
    }

    #[test]
    fn missing_hand_keeps_previous_state() {
        let mut engine = ScriptedEngine::default();
        engine.push(pinch_hand((100.0, 100.0), (400.0, 100.0)));
        engine.push(Vec::new());
        let mut ctl = controller(engine);

        let mut first = Frame::blank(640, 480);
        ctl.process_frame(&mut first).unwrap();

        let mut second = Frame::blank(640, 480);
        second.timestamp = first.timestamp + Duration::from_millis(50);
        let report = ctl.process_frame(&mut second).unwrap();

        assert!(report.pinch.is_none());
        assert!(report.mapping.is_none());
        assert_relative_eq!(report.fps, 20.0, epsilon = 1e-2);
        assert_eq!(ctl.volume().applied.len(), 1);
        // Bar still full from the previous frame.
        assert_eq!(second.pixel(67, 160), Some(BLUE));
    }

    #[test]
    fn initial_bar_is_empty() {
        let mut ctl = controller(ScriptedEngine::default());
        let mut frame = Frame::blank(640, 480);
        let report = ctl.process_frame(&mut frame).unwrap();

        assert!(report.mapping.is_none());
        assert!(ctl.volume().applied.is_empty());
        // Outline drawn, inside left empty.
        assert_eq!(frame.pixel(50, 300), Some(BLUE));
        assert_eq!(frame.pixel(67, 300), Some([0, 0, 0, 255]));
    }

    #[test]
    fn inference_failure_is_a_handless_frame() {
        let mut engine = ScriptedEngine::default();
        engine.frames.push_back(Err(anyhow::anyhow!("model crashed")));
        let mut ctl = controller(engine);
        let mut frame = Frame::blank(320, 240);

        let report = ctl.process_frame(&mut frame).unwrap();
        assert!(report.pinch.is_none());
        assert!(ctl.volume().applied.is_empty());
    }
}
