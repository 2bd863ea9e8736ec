pub mod config;
pub mod controller;
pub mod display;
pub mod fps;
pub mod mapping;
pub mod model_download;
pub mod pipeline;
#[cfg(feature = "camera-nokhwa")]
pub mod session;
pub mod types;
pub mod volume;
