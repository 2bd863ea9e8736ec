use anyhow::Result;

use super::{palm::PalmDetection, region::HandRegion};
use crate::{
    config::DetectorConfig,
    types::{Frame, Hand, Handedness, NormalizedLandmark},
};

/// Landmark model output for one crop, already projected to frame pixels.
pub struct HandEstimate {
    pub projected: Vec<(f32, f32)>,
    pub raw: Vec<[f32; 3]>,
    pub crop_scale: f32,
    pub confidence: f32,
    pub handedness: f32,
}

/// The two networks the tracker drives.
pub trait HandModels {
    fn detect_palms(&mut self, frame: &Frame) -> Result<Vec<PalmDetection>>;

    fn estimate(&mut self, frame: &Frame, region: &HandRegion) -> Result<HandEstimate>;
}

struct Candidate {
    region: HandRegion,
    min_confidence: f32,
}

/// Chooses crop regions per frame and carries kept hands into the next one.
pub struct HandTracker {
    config: DetectorConfig,
    tracked: Vec<HandRegion>,
}

impl HandTracker {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            tracked: Vec::new(),
        }
    }

    pub fn detect<M: HandModels>(&mut self, models: &mut M, frame: &Frame) -> Result<Vec<Hand>> {
        if self.config.static_image_mode {
            self.tracked.clear();
        }

        let (w, h) = (frame.width as f32, frame.height as f32);
        let mut hands = Vec::new();
        for candidate in self.candidates(models, frame)? {
            let estimate = models.estimate(frame, &candidate.region)?;
            if estimate.confidence < candidate.min_confidence {
                continue;
            }

            if !self.config.static_image_mode {
                if let Some(next) = HandRegion::from_landmarks(&estimate.projected) {
                    // Two crops that converged on one hand.
                    if self.tracked.iter().any(|kept| kept.contains(next.center)) {
                        continue;
                    }
                    self.tracked.push(next);
                }
            }

            let landmarks = estimate
                .projected
                .iter()
                .zip(&estimate.raw)
                .map(|(&(px, py), raw)| NormalizedLandmark {
                    x: px / w,
                    y: py / h,
                    z: raw[2] * estimate.crop_scale / w,
                })
                .collect();

            hands.push(Hand {
                landmarks,
                handedness: Handedness::from_score(estimate.handedness),
                score: estimate.confidence,
            });
        }

        Ok(hands)
    }

    /// Tracked regions first; palm detection fills the remaining slots.
    fn candidates<M: HandModels>(&mut self, models: &mut M, frame: &Frame) -> Result<Vec<Candidate>> {
        let mut candidates: Vec<Candidate> = std::mem::take(&mut self.tracked)
            .into_iter()
            .map(|region| Candidate {
                region,
                min_confidence: self.config.min_tracking_confidence,
            })
            .collect();

        if candidates.len() >= self.config.max_hands {
            return Ok(candidates);
        }

        for palm in models.detect_palms(frame)? {
            if candidates.len() >= self.config.max_hands {
                break;
            }
            let region = HandRegion::from_palm(&palm);
            if candidates.iter().any(|c| c.region.contains(region.center)) {
                continue;
            }
            candidates.push(Candidate {
                region,
                min_confidence: self.config.min_detection_confidence,
            });
        }

        Ok(candidates)
    }
}
