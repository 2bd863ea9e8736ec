use anyhow::Result;
use hand_volume::{
    config::{CameraConfig, DetectorConfig, ModelPaths},
    session::TrackingSession,
};

fn main() -> Result<()> {
    env_logger::init();

    let mut session = TrackingSession::open(
        &CameraConfig::default(),
        DetectorConfig::default(),
        &ModelPaths::from_env(),
    )?;
    session.run()
}
