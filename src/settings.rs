/// Per-frame render tunables, edited live from the overlay.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderSettings {
    /// Clear color of the lit pass, RGBA.
    pub clear_color: [f32; 4],
    /// Output gamma; the final pass writes `pow(color, 1 / gamma)`.
    pub gamma: f32,
    /// Attach the light to the camera.
    pub flashlight: bool,
    /// Blinn-Phong instead of Phong specular.
    pub blinn: bool,
    /// Spin the boxes.
    pub animation: bool,
    pub depth_test: bool,
    /// Draw the mirror box.
    pub reflective: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            clear_color: [1.0, 0.85, 0.89, 1.0],
            gamma: 1.0,
            flashlight: false,
            blinn: true,
            animation: true,
            depth_test: true,
            reflective: true,
        }
    }
}

impl RenderSettings {
    pub const GAMMA_RANGE: std::ops::RangeInclusive<f32> = 0.5..=3.0;

    /// Animation time to feed placements, `None` while animation is off.
    pub fn animation_time(&self, seconds: f32) -> Option<f32> {
        self.animation.then_some(seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = RenderSettings::default();
        assert_eq!(settings.gamma, 1.0);
        assert_eq!(settings.clear_color, [1.0, 0.85, 0.89, 1.0]);
        assert!(settings.blinn && settings.animation && settings.depth_test);
        assert!(!settings.flashlight);
    }

    #[test]
    fn animation_time_follows_toggle() {
        let mut settings = RenderSettings::default();
        assert_eq!(settings.animation_time(3.0), Some(3.0));
        settings.animation = false;
        assert_eq!(settings.animation_time(3.0), None);
    }
}
