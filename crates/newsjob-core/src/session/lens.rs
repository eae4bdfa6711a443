use serde::{Deserialize, Serialize};

use crate::config::LensConfig;
use crate::world::LensView;

/// Zoom camera state while the broadcast is on air.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomLens {
    fov: f32,
    pitch: f32,
    yaw: f32,
}

impl ZoomLens {
    pub fn new(config: &LensConfig) -> Self {
        Self {
            fov: config.default_fov,
            pitch: 0.0,
            yaw: 0.0,
        }
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// Narrows the field of view by one step.
    pub fn zoom_in(&mut self, config: &LensConfig) {
        self.fov = (self.fov - config.fov_step).clamp(config.min_fov, config.max_fov);
    }

    pub fn zoom_out(&mut self, config: &LensConfig) {
        self.fov = (self.fov + config.fov_step).clamp(config.min_fov, config.max_fov);
    }

    /// Yaw turns freely, pitch stays within the configured bounds.
    pub fn look(&mut self, dx: f32, dy: f32, config: &LensConfig) {
        self.yaw = (self.yaw + dx).rem_euclid(360.0);
        self.pitch = (self.pitch + dy).clamp(config.min_pitch, config.max_pitch);
    }

    pub fn view(&self) -> LensView {
        LensView {
            fov: self.fov,
            pitch: self.pitch,
            yaw: self.yaw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_stays_within_bounds() {
        let config = LensConfig::default();
        let mut lens = ZoomLens::new(&config);
        assert_eq!(lens.fov(), 16.0);

        for _ in 0..500 {
            lens.zoom_in(&config);
        }
        assert_eq!(lens.fov(), config.min_fov);

        for _ in 0..500 {
            lens.zoom_out(&config);
        }
        assert_eq!(lens.fov(), config.max_fov);
    }

    #[test]
    fn test_look_clamps_pitch_and_wraps_yaw() {
        let config = LensConfig::default();
        let mut lens = ZoomLens::new(&config);

        lens.look(370.0, 90.0, &config);
        let view = lens.view();
        assert!((view.yaw - 10.0).abs() < 1e-3);
        assert_eq!(view.pitch, config.max_pitch);

        lens.look(0.0, -200.0, &config);
        assert_eq!(lens.view().pitch, config.min_pitch);
    }
}
