use std::time::Instant;

/// Instantaneous frame rate from the gap between consecutive ticks.
#[derive(Debug, Default)]
pub struct FpsCounter {
    previous: Option<Instant>,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a frame at `now`. The first tick, and any tick that does not
    /// advance the clock, reports 0.
    pub fn tick(&mut self, now: Instant) -> f32 {
        let fps = match self.previous {
            Some(prev) => {
                let dt = now.saturating_duration_since(prev).as_secs_f32();
                if dt > 0.0 { 1.0 / dt } else { 0.0 }
            }
            None => 0.0,
        };
        self.previous = Some(now);
        fps
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn reciprocal_of_frame_gap() {
        let start = Instant::now();
        let mut fps = FpsCounter::new();
        assert_eq!(fps.tick(start), 0.0);
        assert_relative_eq!(fps.tick(start + Duration::from_millis(40)), 25.0, epsilon = 1e-3);
        assert_relative_eq!(fps.tick(start + Duration::from_millis(50)), 100.0, epsilon = 1e-2);
    }

    #[test]
    fn repeated_instant_is_zero() {
        let now = Instant::now();
        let mut fps = FpsCounter::new();
        fps.tick(now);
        assert_eq!(fps.tick(now), 0.0);
    }
}
