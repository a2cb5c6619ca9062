/// Range a normalized `[0, 1]` control value is mapped onto.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SliderRange {
    pub min: f32,
    pub max: f32,
}

impl SliderRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// `min + value * (max - min)`, clamped to the range.
    pub fn map(&self, value: f32) -> f32 {
        (self.min + value * (self.max - self.min)).clamp(self.min, self.max)
    }

    /// As [`map`](Self::map), rounded to the nearest integer.
    pub fn map_u32(&self, value: f32) -> u32 {
        self.map(value).round().max(0.0) as u32
    }

    /// Inverse of [`map`](Self::map), for initial slider positions.
    pub fn normalize(&self, value: f32) -> f32 {
        if self.max == self.min {
            return 0.0;
        }
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

/// Values bound to the viewer's controls.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlState {
    pub particle_count: u32,
    pub field_samples: [u32; 3],
    pub tightness: f32,
    pub paused: bool,
    pub rotating: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNT: SliderRange = SliderRange::new(1.0, 1_000_000.0);

    #[test]
    fn endpoints_map_to_range_bounds() {
        assert_eq!(COUNT.map_u32(0.0), 1);
        assert_eq!(COUNT.map_u32(1.0), 1_000_000);
    }

    #[test]
    fn values_round_to_nearest() {
        let v = COUNT.normalize(1000.0);
        assert_eq!(COUNT.map_u32(v), 1000);
        assert_eq!(SliderRange::new(1.0, 20.0).map_u32(0.5), 11);
    }

    #[test]
    fn out_of_range_inputs_clamp() {
        assert_eq!(COUNT.map_u32(-0.5), 1);
        assert_eq!(COUNT.map_u32(3.0), 1_000_000);
        assert_eq!(SliderRange::new(0.0, 1.0).map(2.0), 1.0);
    }
}
