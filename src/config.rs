use std::{env, path::PathBuf};

/// Overrides the directory the ONNX models are read from and downloaded to.
pub const MODEL_DIR_ENV: &str = "HAND_VOLUME_MODEL_DIR";
const DEFAULT_MODEL_DIR: &str = "models";

/// Options forwarded to the hand landmark engine. Fixed for a detector's lifetime.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectorConfig {
    /// Treat every frame independently instead of tracking hands from the previous one.
    pub static_image_mode: bool,
    pub max_hands: usize,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            static_image_mode: false,
            max_hands: 2,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
        }
    }
}

impl DetectorConfig {
    pub fn with_static_image_mode(mut self, static_image_mode: bool) -> Self {
        self.static_image_mode = static_image_mode;
        self
    }

    pub fn with_max_hands(mut self, max_hands: usize) -> Self {
        self.max_hands = max_hands.max(1);
        self
    }

    pub fn with_min_detection_confidence(mut self, confidence: f32) -> Self {
        self.min_detection_confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_min_tracking_confidence(mut self, confidence: f32) -> Self {
        self.min_tracking_confidence = confidence.clamp(0.0, 1.0);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CameraConfig {
    pub index: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            width: 1280,
            height: 720,
            fps: 30,
        }
    }
}

impl CameraConfig {
    pub fn with_index(mut self, index: u32) -> Self {
        self.index = index;
        self
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// Ranges used to turn a thumb/index distance into volume, bar height and percentage.
#[derive(Clone, Debug, PartialEq)]
pub struct MapperConfig {
    /// Pixel distances mapped onto the output ranges; values outside clamp.
    pub distance_domain: [f32; 2],
    pub bar_range: [f32; 2],
    pub percent_range: [f32; 2],
    /// Below this distance the pinch midpoint is highlighted.
    pub pinch_threshold: f32,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            distance_domain: [50.0, 300.0],
            bar_range: [400.0, 150.0],
            percent_range: [0.0, 100.0],
            pinch_threshold: 50.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelPaths {
    pub palm_detector: PathBuf,
    pub handpose_estimator: PathBuf,
}

impl ModelPaths {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            palm_detector: dir.join(crate::model_download::PALM_DETECTOR_MODEL_FILENAME),
            handpose_estimator: dir.join(crate::model_download::HANDPOSE_ESTIMATOR_MODEL_FILENAME),
        }
    }

    /// Model locations, honouring `HAND_VOLUME_MODEL_DIR` when set.
    pub fn from_env() -> Self {
        let dir = env::var_os(MODEL_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR));
        Self::in_dir(dir)
    }
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self::in_dir(DEFAULT_MODEL_DIR)
    }
}
