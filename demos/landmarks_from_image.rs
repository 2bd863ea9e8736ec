//! Runs the hand detector on a still image, prints every landmark of the
//! first hand and writes an annotated copy next to the input.
//!
//! ```text
//! cargo run --example landmarks_from_image -- hand.jpg
//! ```

use std::{env, path::PathBuf};

use anyhow::{Context, Result, bail};
use hand_volume::{
    config::{DetectorConfig, ModelPaths},
    pipeline::HandDetector,
    types::Frame,
};
use image::RgbaImage;

fn main() -> Result<()> {
    env_logger::init();

    let Some(input) = env::args().nth(1).map(PathBuf::from) else {
        bail!("usage: landmarks_from_image <image>");
    };

    let image = image::open(&input)
        .with_context(|| format!("failed to open {}", input.display()))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    let mut frame = Frame::new(width, height, image.into_raw());

    let config = DetectorConfig::default().with_static_image_mode(true);
    let mut detector = HandDetector::new(config, &ModelPaths::from_env())?;

    let detection = detector.find_hands(&mut frame, true)?;
    println!("{} hand(s) detected", detection.result.hands().len());
    for (i, hand) in detection.result.hands().iter().enumerate() {
        println!("hand {i}: {} ({:.2})", hand.handedness.label(), hand.score);
    }

    let landmarks = detector.find_position(&mut frame, &detection, 0, true)?;
    for lm in &landmarks {
        println!("[{}, {}, {}]", lm.id, lm.x, lm.y);
    }

    let output = input.with_file_name(format!(
        "{}_landmarks.png",
        input
            .file_stem()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default()
    ));
    RgbaImage::from_raw(frame.width, frame.height, frame.rgba)
        .context("annotated frame has an unexpected buffer size")?
        .save(&output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    log::info!("annotated image written to {}", output.display());

    Ok(())
}
