//! Stateless force contributions, summed into a particle's acceleration
//! before each integration step.
//!
//! Gravity is a true acceleration; drag, viscosity, and the pointer force
//! are forces applied under an implicit unit mass.

use crate::core::particle::Particle;
use glam::DVec2;
use std::f64::consts::PI;

/// Overwrite the vertical acceleration component with `g` (y points down).
/// Runs first in the force order, so a disabled field writes plain zero.
#[inline]
pub fn apply_gravity(p: &mut Particle, g: f64) {
    p.acc.y = g;
}

/// Quadratic drag opposing motion, component-wise: `-0.5 · c · v · |v|`.
#[inline]
pub fn apply_drag(p: &mut Particle, coefficient: f64) {
    p.acc += -0.5 * coefficient * p.vel * p.vel.abs();
}

/// Stokes drag for a disc in a viscous medium: `-6π · r · η · v`.
#[inline]
pub fn apply_viscosity(p: &mut Particle, viscosity: f64) {
    p.acc += -6.0 * PI * p.radius * viscosity * p.vel;
}

/// Radial point force with a smooth quadratic falloff inside
/// `effect_radius`: magnitude `(1 - d/R)² · strength`, directed toward
/// `origin` for positive `strength` and away from it for negative. A
/// particle exactly at the origin is skipped rather than divided by zero;
/// one outside the effect radius is unaffected.
pub fn apply_point_force(p: &mut Particle, origin: DVec2, effect_radius: f64, strength: f64) {
    let direction = origin - p.pos;
    let distance = direction.length();
    if distance == 0.0 {
        return;
    }
    if distance < effect_radius {
        let falloff = (1.0 - distance / effect_radius).powi(2);
        p.acc += direction / distance * (falloff * strength);
    }
}
