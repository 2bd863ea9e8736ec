mod anchors;

use std::{cmp::Ordering, path::Path};

use anchors::{NUM_ANCHORS, generate_anchors};
use anyhow::{Context, Result, anyhow};
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;

use super::common::{LetterboxInfo, PALM_INPUT_SIZE, prepare_letterboxed};
use crate::types::Frame;

const PALM_LANDMARKS: usize = 7;
const BOX_FEATURES: usize = 4 + PALM_LANDMARKS * 2;

#[derive(Clone, Debug)]
pub struct PalmDetectorConfig {
    pub score_threshold: f32,
    pub nms_threshold: f32,
    pub top_k: usize,
}

impl Default for PalmDetectorConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.5,
            nms_threshold: 0.3,
            top_k: 2,
        }
    }
}

/// One palm in frame pixels: `[x1, y1, x2, y2]` box plus seven keypoints.
#[derive(Clone, Debug, PartialEq)]
pub struct PalmDetection {
    pub bbox: [f32; 4],
    pub landmarks: Vec<(f32, f32)>,
    pub score: f32,
}

pub struct PalmDetector {
    session: Session,
    anchors: Vec<[f32; 2]>,
    cfg: PalmDetectorConfig,
}

impl PalmDetector {
    pub fn new(model_path: &Path, cfg: PalmDetectorConfig) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(2)?
            .commit_from_file(model_path)
            .with_context(|| {
                format!("failed to load palm detector from {}", model_path.display())
            })?;

        Ok(Self {
            session,
            anchors: generate_anchors(),
            cfg,
        })
    }

    /// Palms sorted by descending score, at most `top_k` of them.
    pub fn detect(&mut self, frame: &Frame) -> Result<Vec<PalmDetection>> {
        let (input, letterbox) = prepare_letterboxed(frame, PALM_INPUT_SIZE)?;
        let tensor = Tensor::from_array(input)?;

        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .context("failed to run palm detector session")?;

        if outputs.len() < 2 {
            return Err(anyhow!(
                "palm detector returned {} outputs, expected at least 2",
                outputs.len()
            ));
        }

        let boxes = outputs[0].try_extract_array::<f32>()?;
        let scores = outputs[1].try_extract_array::<f32>()?;
        let raw = RawPalmOutput {
            boxes: boxes
                .as_slice()
                .ok_or_else(|| anyhow!("palm boxes not contiguous"))?,
            box_shape: boxes.shape(),
            scores: scores
                .as_slice()
                .ok_or_else(|| anyhow!("palm scores not contiguous"))?,
            score_shape: scores.shape(),
        };

        decode_palms(&raw, &self.anchors, &letterbox, &self.cfg)
    }
}

struct RawPalmOutput<'a> {
    boxes: &'a [f32],
    box_shape: &'a [usize],
    scores: &'a [f32],
    score_shape: &'a [usize],
}

/// `[.., anchors, features]` dimensions of an output tensor.
fn trailing_dims(shape: &[usize], what: &str) -> Result<(usize, usize)> {
    match shape {
        [.., anchors, features] if shape.len() >= 3 => Ok((*anchors, *features)),
        _ => Err(anyhow!(
            "unexpected palm {what} shape {shape:?}, need [batch, anchors, features]"
        )),
    }
}

fn decode_palms(
    raw: &RawPalmOutput<'_>,
    anchors: &[[f32; 2]],
    letterbox: &LetterboxInfo,
    cfg: &PalmDetectorConfig,
) -> Result<Vec<PalmDetection>> {
    let (anchor_dim, feature_dim) = trailing_dims(raw.box_shape, "box")?;
    let (score_anchor_dim, score_dim) = trailing_dims(raw.score_shape, "score")?;

    if feature_dim < BOX_FEATURES {
        return Err(anyhow!("palm box feature dimension too small: {feature_dim}"));
    }
    if anchor_dim != score_anchor_dim {
        return Err(anyhow!(
            "anchor dimension mismatch between boxes ({anchor_dim}) and scores ({score_anchor_dim})"
        ));
    }
    if raw.boxes.len() < anchor_dim * feature_dim || raw.scores.len() < anchor_dim * score_dim {
        return Err(anyhow!("palm output shorter than its shape"));
    }

    let input = PALM_INPUT_SIZE as f32;
    let scale = letterbox.orig_w.max(letterbox.orig_h) as f32;
    let bias_x = letterbox.pad_x / letterbox.scale;
    let bias_y = letterbox.pad_y / letterbox.scale;
    let to_frame = |nx: f32, ny: f32| (nx * scale - bias_x, ny * scale - bias_y);
    let max_x = letterbox.orig_w.saturating_sub(1) as f32;
    let max_y = letterbox.orig_h.saturating_sub(1) as f32;

    let mut candidates = Vec::new();
    for (idx, anchor) in anchors.iter().enumerate().take(anchor_dim.min(NUM_ANCHORS)) {
        let score = sigmoid(raw.scores[idx * score_dim]);
        if score < cfg.score_threshold {
            continue;
        }

        let f = &raw.boxes[idx * feature_dim..idx * feature_dim + BOX_FEATURES];
        let (cx, cy) = (f[0] / input + anchor[0], f[1] / input + anchor[1]);
        let (hw, hh) = (f[2] / input / 2.0, f[3] / input / 2.0);
        let (x1, y1) = to_frame(cx - hw, cy - hh);
        let (x2, y2) = to_frame(cx + hw, cy + hh);
        if x2 <= x1 || y2 <= y1 {
            continue;
        }

        let landmarks = f[4..]
            .chunks_exact(2)
            .map(|p| to_frame(p[0] / input + anchor[0], p[1] / input + anchor[1]))
            .collect();

        candidates.push(PalmDetection {
            bbox: [
                x1.clamp(0.0, max_x),
                y1.clamp(0.0, max_y),
                x2.clamp(0.0, max_x),
                y2.clamp(0.0, max_y),
            ],
            landmarks,
            score,
        });
    }

    Ok(nms(candidates, cfg.nms_threshold, cfg.top_k))
}

fn nms(mut candidates: Vec<PalmDetection>, threshold: f32, top_k: usize) -> Vec<PalmDetection> {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let mut keep: Vec<PalmDetection> = Vec::new();
    for candidate in candidates {
        if keep.len() >= top_k {
            break;
        }
        if keep
            .iter()
            .all(|kept| iou(&candidate.bbox, &kept.bbox) < threshold)
        {
            keep.push(candidate);
        }
    }
    keep
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let inter_w = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let inter_h = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let inter = inter_w * inter_h;
    if inter <= 0.0 {
        return 0.0;
    }

    let area = |r: &[f32; 4]| (r[2] - r[0]).max(0.0) * (r[3] - r[1]).max(0.0);
    let union = area(a) + area(b) - inter;
    if union <= 0.0 { 0.0 } else { inter / union }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
