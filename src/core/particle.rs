use crate::error::{Error, Result};
use glam::DVec2;

/// A circular particle advanced by position-Verlet integration.
///
/// `vel` is re-derived from the last two positions at the start of every
/// `update`; between updates it is ordinary state that collision impulses
/// and boundary reflection may overwrite. Whoever rewrites it after an
/// impulse must also resynchronize `old_pos = pos - vel`, or the next
/// update derives the pre-impulse velocity instead.
#[derive(Debug, Clone)]
pub struct Particle {
    /// Current position.
    pub pos: DVec2,
    /// Position at the start of the previous sub-step.
    pub old_pos: DVec2,
    /// Displacement covered in the last sub-step (the integrator's native
    /// velocity unit).
    pub vel: DVec2,
    /// Acceleration accumulator, zeroed after every integration.
    pub acc: DVec2,
    /// Disc radius (> 0).
    pub radius: f64,
}

impl Particle {
    /// Create a particle with the given initial velocity, expressed as the
    /// displacement to cover in the first sub-step. `old_pos` is seeded as
    /// `pos - vel` so the first derived velocity matches.
    ///
    /// Errors: `Error::InvalidParam` if `radius` is non-positive or any
    /// component is NaN/inf.
    pub fn new(pos: DVec2, vel: DVec2, radius: f64) -> Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(Error::InvalidParam("radius must be finite and > 0".into()));
        }
        if !pos.is_finite() {
            return Err(Error::InvalidParam("position must be finite".into()));
        }
        if !vel.is_finite() {
            return Err(Error::InvalidParam("velocity must be finite".into()));
        }
        Ok(Self {
            pos,
            old_pos: pos - vel,
            vel,
            acc: DVec2::ZERO,
            radius,
        })
    }

    /// Advance one sub-step of length `dt`.
    ///
    /// Störmer–Verlet in position form: velocity is recovered implicitly
    /// from the last two positions, which keeps the trajectory stable under
    /// stiff collision impulses where explicit Euler blows up.
    pub fn update(&mut self, dt: f64) {
        self.vel = self.pos - self.old_pos;
        self.old_pos = self.pos;
        self.pos += self.vel + self.acc * dt * dt;
        self.acc = DVec2::ZERO;
    }

    /// Mass proxy: disc area under uniform density, `radius²`. The π factor
    /// cancels everywhere masses are compared.
    #[inline]
    pub fn mass(&self) -> f64 {
        self.radius * self.radius
    }

    /// Kinetic energy `0.5 · m · |v|²` with the area mass proxy.
    #[inline]
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass() * self.vel.length_squared()
    }
}
