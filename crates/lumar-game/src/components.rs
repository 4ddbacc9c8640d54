//! ECS components for rainline entities.

use bevy_ecs::prelude::*;
use lumar_world::SporeType;

/// Network identity of a rainline.
#[derive(Component, Debug, Clone, Copy)]
pub struct RainlineId {
    pub runtime_id: u64,
}

/// Horizontal position in block coordinates.
#[derive(Component, Debug, Clone, Copy)]
pub struct Position {
    pub x: f64,
    pub z: f64,
}

impl Position {
    pub fn distance_sq(&self, x: f64, z: f64) -> f64 {
        let dx = self.x - x;
        let dz = self.z - z;
        dx * dx + dz * dz
    }
}

/// Spore type this rainline drops.
#[derive(Component, Debug, Clone, Copy)]
pub struct SporeKind(pub SporeType);

/// Trajectory across a lunagree: approach, linger overhead, recede.
#[derive(Component, Debug, Clone, Copy)]
pub struct RainlinePath {
    pub target_x: f64,
    pub target_z: f64,
    /// Unit heading vector.
    pub heading_x: f64,
    pub heading_z: f64,
    /// Distance covered from start to end of the path.
    pub span: f64,
    /// Lifetime in ticks.
    pub lifetime: u32,
}

impl RainlinePath {
    /// Position at `age` ticks: `target + heading * span * 4(s - 1/2)^3`.
    pub fn position_at(&self, age: u32) -> Position {
        let s = if self.lifetime == 0 {
            1.0
        } else {
            (age as f64 / self.lifetime as f64).min(1.0)
        };
        let t = s - 0.5;
        let offset = self.span * 4.0 * t * t * t;
        Position {
            x: self.target_x + self.heading_x * offset,
            z: self.target_z + self.heading_z * offset,
        }
    }

    /// Where the rainline first appears.
    pub fn origin(&self) -> Position {
        self.position_at(0)
    }
}

/// Ticks since spawn.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Age(pub u32);

/// Radius (blocks) within which this rainline drops spores.
#[derive(Component, Debug, Clone, Copy)]
pub struct InfluenceRadius(pub f32);

/// The lunagree this rainline was spawned from, by coordinates.
#[derive(Component, Debug, Clone, Copy)]
pub struct SourceLunagree {
    pub key: (i32, i32),
    /// Activation window the spawn belongs to.
    pub window: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> RainlinePath {
        RainlinePath {
            target_x: 100.0,
            target_z: -50.0,
            heading_x: 1.0,
            heading_z: 0.0,
            span: 400.0,
            lifetime: 100,
        }
    }

    #[test]
    fn midpoint_is_over_target() {
        let p = path().position_at(50);
        assert!((p.x - 100.0).abs() < 1e-9);
        assert!((p.z + 50.0).abs() < 1e-9);
    }

    #[test]
    fn endpoints_are_half_span_away() {
        let p = path();
        assert!((p.origin().x - -100.0).abs() < 1e-9);
        assert!((p.position_at(100).x - 300.0).abs() < 1e-9);
    }

    #[test]
    fn lingers_near_target() {
        let p = path();
        let near = (p.position_at(55).x - p.position_at(45).x).abs();
        let far = (p.position_at(10).x - p.position_at(0).x).abs();
        assert!(near < far);
    }

    #[test]
    fn monotonic_along_heading() {
        let p = path();
        let mut last = f64::MIN;
        for age in 0..=100 {
            let x = p.position_at(age).x;
            assert!(x >= last);
            last = x;
        }
    }

    #[test]
    fn age_past_lifetime_clamps() {
        let p = path();
        assert_eq!(p.position_at(500).x, p.position_at(100).x);
    }
}
