//! Thumb/index distance to volume mapping.

use crate::{config::MapperConfig, types::Landmark, volume::VolumeRange};

/// Linear interpolation of `x` from `xp` onto `fp`, clamped to the end values
/// outside `xp`. `xp` must be increasing; `fp` may run in either direction.
pub fn interp(x: f32, xp: [f32; 2], fp: [f32; 2]) -> f32 {
    let ([x0, x1], [y0, y1]) = (xp, fp);
    if x <= x0 {
        y0
    } else if x >= x1 {
        y1
    } else {
        y0 + (x - x0) * (y1 - y0) / (x1 - x0)
    }
}

/// Thumb tip, index tip, their integer midpoint and the distance between them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pinch {
    pub thumb: (i32, i32),
    pub index: (i32, i32),
    pub center: (i32, i32),
    pub distance: f32,
}

impl Pinch {
    pub fn between(thumb: &Landmark, index: &Landmark) -> Self {
        let (x1, y1) = (thumb.x, thumb.y);
        let (x2, y2) = (index.x, index.y);
        Self {
            thumb: (x1, y1),
            index: (x2, y2),
            center: ((x1 + x2).div_euclid(2), (y1 + y2).div_euclid(2)),
            distance: ((x2 - x1) as f32).hypot((y2 - y1) as f32),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VolumeMapping {
    pub level: f32,
    pub bar_height: f32,
    pub percent: f32,
}

#[derive(Clone, Debug)]
pub struct DistanceMapper {
    config: MapperConfig,
    range: VolumeRange,
}

impl DistanceMapper {
    pub fn new(config: MapperConfig, range: VolumeRange) -> Self {
        Self { config, range }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn map(&self, distance: f32) -> VolumeMapping {
        let domain = self.config.distance_domain;
        VolumeMapping {
            level: interp(distance, domain, [self.range.min, self.range.max]),
            bar_height: interp(distance, domain, self.config.bar_range),
            percent: interp(distance, domain, self.config.percent_range),
        }
    }

    pub fn is_pinched(&self, distance: f32) -> bool {
        distance < self.config.pinch_threshold
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const RANGE: VolumeRange = VolumeRange {
        min: -65.25,
        max: 0.0,
    };

    fn mapper() -> DistanceMapper {
        DistanceMapper::new(MapperConfig::default(), RANGE)
    }

    #[test]
    fn short_distances_clamp_to_minimum() {
        for d in [0.0, 12.5, 49.9, 50.0] {
            let m = mapper().map(d);
            assert_eq!(m.level, RANGE.min);
            assert_eq!(m.bar_height, 400.0);
            assert_eq!(m.percent, 0.0);
        }
    }

    #[test]
    fn long_distances_clamp_to_maximum() {
        for d in [300.0, 300.1, 1000.0] {
            let m = mapper().map(d);
            assert_eq!(m.level, RANGE.max);
            assert_eq!(m.bar_height, 150.0);
            assert_eq!(m.percent, 100.0);
        }
    }

    #[test]
    fn midpoint_maps_to_midpoints() {
        let m = mapper().map(175.0);
        assert_relative_eq!(m.percent, 50.0, epsilon = 1e-4);
        assert_relative_eq!(m.bar_height, 275.0, epsilon = 1e-4);
        assert_relative_eq!(m.level, (RANGE.min + RANGE.max) / 2.0, epsilon = 1e-4);
    }

    #[test]
    fn separated_fingers_scenario() {
        let thumb = Landmark { id: 4, x: 100, y: 100 };
        let index = Landmark { id: 8, x: 300, y: 100 };
        let pinch = Pinch::between(&thumb, &index);
        assert_eq!(pinch.distance, 200.0);
        assert_eq!(pinch.center, (200, 100));

        let m = mapper().map(pinch.distance);
        assert_relative_eq!(m.percent, 60.0, epsilon = 1e-4);
        assert_relative_eq!(m.level, interp(200.0, [50.0, 300.0], [RANGE.min, RANGE.max]));
        assert_relative_eq!(m.level, -26.1, epsilon = 1e-4);
    }

    #[test]
    fn level_stays_inside_range() {
        let m = mapper();
        for d in (0..500).map(|d| d as f32 * 0.9) {
            let level = m.map(d).level;
            assert!((RANGE.min..=RANGE.max).contains(&level), "{d} -> {level}");
        }
    }

    #[test]
    fn pinch_midpoint_and_threshold() {
        let pinch = Pinch::between(&Landmark { id: 4, x: 3, y: 4 }, &Landmark { id: 8, x: 0, y: 0 });
        assert_eq!(pinch.distance, 5.0);
        assert_eq!(pinch.center, (1, 2));
        assert!(mapper().is_pinched(pinch.distance));
        assert!(!mapper().is_pinched(50.0));
    }
}
