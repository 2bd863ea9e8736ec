use std::path::Path;

use anyhow::{Context, Result, anyhow};
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;

use super::{
    LandmarkEngine,
    common::{self, HANDPOSE_INPUT_SIZE},
    palm::{PalmDetection, PalmDetector, PalmDetectorConfig},
    region::HandRegion,
    tracker::{HandEstimate, HandModels, HandTracker},
};
use crate::{
    config::{DetectorConfig, ModelPaths},
    model_download::ensure_models_ready,
    types::{Frame, Hand},
};

/// Palm detector + landmark estimator pair running on ONNX Runtime.
pub struct OrtEngine {
    models: OrtModels,
    tracker: HandTracker,
}

struct OrtModels {
    handpose: Session,
    palm_detector: PalmDetector,
}

impl OrtEngine {
    pub fn new(config: DetectorConfig, models: &ModelPaths) -> Result<Self> {
        ensure_models_ready(models)?;

        let handpose = load_session(&models.handpose_estimator)?;
        let palm_detector = PalmDetector::new(
            &models.palm_detector,
            PalmDetectorConfig {
                score_threshold: config.min_detection_confidence,
                top_k: config.max_hands,
                ..PalmDetectorConfig::default()
            },
        )?;

        log::info!(
            "handpose ORT backend ready using {} and palm detector {}",
            models.handpose_estimator.display(),
            models.palm_detector.display()
        );

        Ok(Self {
            models: OrtModels {
                handpose,
                palm_detector,
            },
            tracker: HandTracker::new(config),
        })
    }
}

impl HandModels for OrtModels {
    fn detect_palms(&mut self, frame: &Frame) -> Result<Vec<PalmDetection>> {
        self.palm_detector.detect(frame)
    }

    fn estimate(&mut self, frame: &Frame, region: &HandRegion) -> Result<HandEstimate> {
        let (input, transform) = common::prepare_rotated_crop(frame, region, HANDPOSE_INPUT_SIZE)?;
        let tensor = Tensor::from_array(input)?;
        let outputs = self
            .handpose
            .run(ort::inputs![tensor])
            .context("failed to run ORT session")?;

        if outputs.len() < 1 {
            return Err(anyhow!("model returned no outputs"));
        }

        let coords = outputs[0].try_extract_array::<f32>()?;
        let flattened: Vec<f32> = coords.iter().copied().collect();
        let raw = common::decode_landmarks(&flattened)?;

        let scalar = |idx: usize| -> f32 {
            if outputs.len() > idx {
                outputs[idx]
                    .try_extract_array::<f32>()
                    .ok()
                    .and_then(|arr| arr.iter().next().copied())
                    .unwrap_or(0.0)
            } else {
                0.0
            }
        };

        Ok(HandEstimate {
            projected: raw.iter().map(|[x, y, _]| transform.project(*x, *y)).collect(),
            crop_scale: transform.scale(),
            confidence: scalar(1).clamp(0.0, 1.0),
            handedness: scalar(2),
            raw,
        })
    }
}

impl LandmarkEngine for OrtEngine {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Hand>> {
        self.tracker.detect(&mut self.models, frame)
    }
}

fn load_session(model_path: &Path) -> Result<Session> {
    Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(2)?
        .commit_from_file(model_path)
        .with_context(|| format!("failed to load ORT session from {}", model_path.display()))
}
