use anyhow::{Context, Result};

use crate::{
    config::{CameraConfig, DetectorConfig, MapperConfig, ModelPaths},
    controller::VolumeController,
    display::Display,
    fps::FpsCounter,
    pipeline::{
        camera::CameraCapture,
        detector::{HandDetector, OrtEngine},
        draw,
    },
    types::THUMB_TIP,
    volume::{self, VolumeControl},
};

pub const VOLUME_WINDOW_TITLE: &str = "Hand Volume Control";
pub const TRACKING_WINDOW_TITLE: &str = "Hand Tracking";

/// Camera, detector, audio endpoint and window of the volume demo. Every
/// resource is released when the session is dropped.
pub struct VolumeSession {
    camera: CameraCapture,
    display: Display,
    controller: VolumeController<OrtEngine, Box<dyn VolumeControl>>,
}

impl VolumeSession {
    pub fn open(camera: &CameraConfig, detector: DetectorConfig, models: &ModelPaths) -> Result<Self> {
        let volume = volume::default_output().context("failed to open the default audio output")?;
        let detector = HandDetector::new(detector, models)?;
        let camera_capture = CameraCapture::open(camera)?;
        let display = Display::open(VOLUME_WINDOW_TITLE, camera.width, camera.height)?;

        Ok(Self {
            camera: camera_capture,
            display,
            controller: VolumeController::new(detector, volume, MapperConfig::default()),
        })
    }

    /// Runs until the window is closed, `q` is pressed, or capture fails.
    pub fn run(&mut self) -> Result<()> {
        loop {
            let mut frame = self.camera.read()?;
            let report = self.controller.process_frame(&mut frame)?;
            if let Some(mapping) = report.mapping {
                log::debug!(
                    "distance {:.1}px -> level {:.2} ({:.0}%)",
                    report.pinch.map(|p| p.distance).unwrap_or_default(),
                    mapping.level,
                    mapping.percent
                );
            }

            self.display.show(&frame)?;
            if self.display.should_close() {
                log::info!("quit requested");
                return Ok(());
            }
        }
    }
}

/// Landmark tracking preview: skeleton, landmark markers and FPS, printing
/// the thumb tip of the first hand every frame.
pub struct TrackingSession {
    camera: CameraCapture,
    display: Display,
    detector: HandDetector<OrtEngine>,
    fps: FpsCounter,
}

impl TrackingSession {
    pub fn open(camera: &CameraConfig, detector: DetectorConfig, models: &ModelPaths) -> Result<Self> {
        let detector = HandDetector::new(detector, models)?;
        let camera_capture = CameraCapture::open(camera)?;
        let display = Display::open(TRACKING_WINDOW_TITLE, camera.width, camera.height)?;

        Ok(Self {
            camera: camera_capture,
            display,
            detector,
            fps: FpsCounter::new(),
        })
    }

    pub fn run(&mut self) -> Result<()> {
        loop {
            let mut frame = self.camera.read()?;

            let landmarks = self
                .detector
                .find_hands(&mut frame, true)
                .and_then(|detection| self.detector.find_position(&mut frame, &detection, 0, true));
            match landmarks {
                Ok(landmarks) => {
                    if let Some(thumb) = landmarks.get(THUMB_TIP) {
                        println!("[{}, {}, {}]", thumb.id, thumb.x, thumb.y);
                    }
                }
                Err(err) => log::warn!("hand detection failed: {err}"),
            }

            let fps = self.fps.tick(frame.timestamp);
            draw::text(&mut frame, (10, 30), &format!("FPS: {}", fps as i32), draw::GREEN);

            self.display.show(&frame)?;
            if self.display.should_close() {
                log::info!("quit requested");
                return Ok(());
            }
        }
    }
}
