use anyhow::Result;
use hand_volume::{
    config::{CameraConfig, DetectorConfig, ModelPaths},
    session::VolumeSession,
};

fn main() -> Result<()> {
    env_logger::init();

    let detector = DetectorConfig::default().with_min_detection_confidence(0.7);
    let mut session = VolumeSession::open(&CameraConfig::default(), detector, &ModelPaths::from_env())?;
    session.run()
}
