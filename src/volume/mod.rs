#[cfg(target_os = "linux")]
mod pulse;

use thiserror::Error;

#[cfg(target_os = "linux")]
pub use pulse::PulseVolume;

/// Lowest and highest level the output device accepts, in its native unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VolumeRange {
    pub min: f32,
    pub max: f32,
}

impl VolumeRange {
    /// Never panics, even for an inverted or NaN range reported by a backend.
    pub fn clamp(&self, level: f32) -> f32 {
        level.max(self.min).min(self.max)
    }
}

#[derive(Debug, Error)]
pub enum VolumeError {
    #[error("audio server unavailable: {0}")]
    Connection(String),
    #[error("no default output device")]
    NoOutputDevice,
    #[error("audio operation failed: {0}")]
    Operation(String),
    #[error("master volume control is not supported on this platform")]
    Unsupported,
}

/// Master volume of one output endpoint.
pub trait VolumeControl {
    fn range(&self) -> VolumeRange;

    /// Sets the master level; values outside [`VolumeControl::range`] are clamped.
    fn set_level(&mut self, level: f32) -> Result<(), VolumeError>;
}

impl<V: VolumeControl + ?Sized> VolumeControl for Box<V> {
    fn range(&self) -> VolumeRange {
        (**self).range()
    }

    fn set_level(&mut self, level: f32) -> Result<(), VolumeError> {
        (**self).set_level(level)
    }
}

/// Connects to the system's default output device.
pub fn default_output() -> Result<Box<dyn VolumeControl>, VolumeError> {
    #[cfg(target_os = "linux")]
    let output: Result<Box<dyn VolumeControl>, VolumeError> =
        PulseVolume::connect_default().map(|volume| Box::new(volume) as Box<dyn VolumeControl>);
    #[cfg(not(target_os = "linux"))]
    let output: Result<Box<dyn VolumeControl>, VolumeError> = Err(VolumeError::Unsupported);

    output
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Records every level it is asked to apply.
    #[derive(Debug)]
    pub struct RecordingVolume {
        pub range: VolumeRange,
        pub applied: Vec<f32>,
    }

    impl RecordingVolume {
        pub fn new(min: f32, max: f32) -> Self {
            Self {
                range: VolumeRange { min, max },
                applied: Vec::new(),
            }
        }
    }

    impl VolumeControl for RecordingVolume {
        fn range(&self) -> VolumeRange {
            self.range
        }

        fn set_level(&mut self, level: f32) -> Result<(), VolumeError> {
            self.applied.push(self.range.clamp(level));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingVolume;
    use super::*;

    #[test]
    fn boxed_control_forwards_calls() {
        let mut boxed: Box<RecordingVolume> = Box::new(RecordingVolume::new(0.0, 10.0));
        boxed.set_level(12.0).unwrap();
        assert_eq!(boxed.range(), VolumeRange { min: 0.0, max: 10.0 });
        assert_eq!(boxed.applied, vec![10.0]);
    }

    #[test]
    fn clamp_tolerates_malformed_ranges() {
        let inverted = VolumeRange { min: 10.0, max: 0.0 };
        assert_eq!(inverted.clamp(5.0), 0.0);

        let nan_min = VolumeRange { min: f32::NAN, max: 1.0 };
        assert_eq!(nan_min.clamp(3.0), 1.0);
        assert_eq!(nan_min.clamp(-3.0), -3.0);

        let regular = VolumeRange { min: -65.25, max: 0.0 };
        assert_eq!(regular.clamp(-100.0), -65.25);
        assert_eq!(regular.clamp(-20.0), -20.0);
    }
}
