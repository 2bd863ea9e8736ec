#[cfg(feature = "camera-nokhwa")]
pub mod camera;
pub mod detector;
pub mod draw;
pub mod rgba_converter;

#[cfg(feature = "camera-nokhwa")]
pub use camera::CameraCapture;
pub use detector::{DetectorError, HandDetector, LandmarkEngine, OrtEngine};
pub use rgba_converter::{PixelFormat, convert_to_frame};
