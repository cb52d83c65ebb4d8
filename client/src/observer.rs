use glam::Vec3;

use engine::voxels::coord::WorldPosF;

use crate::config::ClientConfig;

/// Moves the observer around a horizontal circle centered on the world origin.
pub struct ObserverPath {
    radius: f32,
    speed: f32,
    height: f32,
}

impl ObserverPath {
    pub fn from_config(config: &ClientConfig) -> Self {
        ObserverPath {
            radius: config.observer_path_radius,
            speed: config.observer_speed,
            height: config.observer_height,
        }
    }

    pub fn position_at(&self, seconds: f32) -> WorldPosF {
        let angle = seconds * self.speed / self.radius;
        WorldPosF(Vec3::new(
            self.radius * angle.cos(),
            self.height,
            self.radius * angle.sin(),
        ))
    }
}
