use crate::core::forces;
use crate::core::particle::Particle;
use crate::core::quadtree::{QuadTree, Region};
use crate::error::{Error, Result};
use glam::DVec2;
use rand::{rng, rngs::StdRng, Rng, SeedableRng};

/// Flat set of named numeric parameters supplied at construction time.
///
/// Kept as one explicit struct (rather than process-wide mutable state) so
/// the core stays independently testable.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Container width in world units.
    pub width: f64,
    /// Container height in world units; y grows downward.
    pub height: f64,
    /// Fixed particle count for the lifetime of a run.
    pub num_particles: usize,
    /// Upper bound on particle radius, and the grid half-pitch of the
    /// initial layout. Radii sample uniformly from [max_radius/2, max_radius].
    pub max_radius: f64,
    /// Downward acceleration applied while gravity is enabled.
    pub gravity: f64,
    /// Quadratic drag coefficient (>= 0).
    pub drag: f64,
    /// Viscous (Stokes) drag coefficient (>= 0).
    pub viscosity: f64,
    /// Fixed sub-steps per frame (> 0).
    pub sub_steps: u32,
    /// Spatial-index node capacity before subdivision (> 0).
    pub capacity: usize,
    /// Collision restitution in [0, 1]; 1 is perfectly elastic.
    pub restitution: f64,
    /// Pairs closer than this squared centre distance are degenerate and
    /// skipped by the narrow phase.
    pub min_distance_sq: f64,
    /// Approach speeds at or below this threshold get no impulse
    /// (anti-jitter for resting contacts).
    pub min_velocity: f64,
    /// Pointer-force effect radius.
    pub pointer_radius: f64,
    /// Pointer-force strength; the primary button attracts with
    /// `+strength`, the secondary repels with `-strength`.
    pub pointer_strength: f64,
    /// RNG seed for the initial layout; `None` draws entropy.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            num_particles: 500,
            max_radius: 5.0,
            gravity: 980.0,
            drag: 0.002,
            viscosity: 0.003,
            sub_steps: 8,
            capacity: 4,
            restitution: 0.5,
            min_distance_sq: 1e-6,
            min_velocity: 0.01,
            pointer_radius: 250.0,
            pointer_strength: 6000.0,
            seed: None,
        }
    }
}

impl SimConfig {
    fn validate(&self) -> Result<()> {
        if self.num_particles == 0 {
            return Err(Error::InvalidParam("num_particles must be > 0".into()));
        }
        if !(self.width.is_finite() && self.width > 0.0)
            || !(self.height.is_finite() && self.height > 0.0)
        {
            return Err(Error::InvalidParam(
                "container extents must be finite and > 0".into(),
            ));
        }
        if !self.max_radius.is_finite() || self.max_radius <= 0.0 {
            return Err(Error::InvalidParam(
                "max_radius must be finite and > 0".into(),
            ));
        }
        if self.width < 2.0 * self.max_radius || self.height < 2.0 * self.max_radius {
            return Err(Error::InvalidParam(
                "container must be at least 2 * max_radius in each extent".into(),
            ));
        }
        if !self.gravity.is_finite() {
            return Err(Error::InvalidParam("gravity must be finite".into()));
        }
        if !self.drag.is_finite() || self.drag < 0.0 {
            return Err(Error::InvalidParam("drag must be finite and >= 0".into()));
        }
        if !self.viscosity.is_finite() || self.viscosity < 0.0 {
            return Err(Error::InvalidParam(
                "viscosity must be finite and >= 0".into(),
            ));
        }
        if self.sub_steps == 0 {
            return Err(Error::InvalidParam("sub_steps must be > 0".into()));
        }
        if self.capacity == 0 {
            return Err(Error::InvalidParam("capacity must be > 0".into()));
        }
        if !self.restitution.is_finite() || !(0.0..=1.0).contains(&self.restitution) {
            return Err(Error::InvalidParam(
                "restitution must lie in [0, 1]".into(),
            ));
        }
        if !self.min_distance_sq.is_finite() || self.min_distance_sq < 0.0 {
            return Err(Error::InvalidParam(
                "min_distance_sq must be finite and >= 0".into(),
            ));
        }
        if !self.min_velocity.is_finite() || self.min_velocity < 0.0 {
            return Err(Error::InvalidParam(
                "min_velocity must be finite and >= 0".into(),
            ));
        }
        if !self.pointer_radius.is_finite() || self.pointer_radius <= 0.0 {
            return Err(Error::InvalidParam(
                "pointer_radius must be finite and > 0".into(),
            ));
        }
        if !self.pointer_strength.is_finite() {
            return Err(Error::InvalidParam(
                "pointer_strength must be finite".into(),
            ));
        }
        Ok(())
    }
}

/// Pointer input fed in from the windowing collaborator each frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerState {
    pub pos: DVec2,
    pub primary_down: bool,
    pub secondary_down: bool,
}

/// Single-threaded, frame-driven particle simulation.
///
/// Each frame is split into fixed sub-steps; within one sub-step the order
/// is: force accumulation + integration for every particle, one full
/// collision-resolution pass, then boundary reflection. The spatial index
/// is transient: cleared and rebuilt from current positions once per
/// sub-step and only queried within that same pass.
#[derive(Debug)]
pub struct Simulation {
    config: SimConfig,
    gravity_enabled: bool,
    pointer: PointerState,
    pub particles: Vec<Particle>,
    tree: QuadTree,
}

impl Simulation {
    /// Build a simulation from `config`: particles on a jittered grid
    /// centred in the container, zero initial velocity, and an index rooted
    /// at the full container region.
    ///
    /// Errors: `Error::InvalidParam` for out-of-range configuration.
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = seeded_rng(config.seed);
        let particles = spawn_grid(&config, &mut rng)?;
        let tree = QuadTree::new(container_region(&config), config.capacity);
        Ok(Self {
            config,
            gravity_enabled: true,
            pointer: PointerState::default(),
            particles,
            tree,
        })
    }

    /// The configuration this simulation was built with.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Number of particles (fixed for the lifetime of a run).
    pub fn num_particles(&self) -> usize {
        self.particles.len()
    }

    /// Total kinetic energy with the disc-area mass proxy (diagnostic).
    pub fn kinetic_energy(&self) -> f64 {
        self.particles.iter().map(Particle::kinetic_energy).sum()
    }

    /// Discard the particle set and rebuild the initial grid. A stored
    /// seed makes this reproduce the original layout exactly.
    pub fn reset(&mut self) -> Result<()> {
        let mut rng = seeded_rng(self.config.seed);
        self.particles = spawn_grid(&self.config, &mut rng)?;
        self.tree.clear();
        Ok(())
    }

    pub fn set_gravity_enabled(&mut self, enabled: bool) {
        self.gravity_enabled = enabled;
    }

    pub fn gravity_enabled(&self) -> bool {
        self.gravity_enabled
    }

    /// Feed pointer position and button state, consumed by the pointer
    /// force on subsequent sub-steps.
    pub fn set_pointer(&mut self, pos: DVec2, primary_down: bool, secondary_down: bool) {
        self.pointer = PointerState {
            pos,
            primary_down,
            secondary_down,
        };
    }

    /// Advance one frame of `dt` seconds, split into the configured number
    /// of fixed sub-steps.
    ///
    /// Errors: `Error::InvalidParam` if `dt` is negative or not finite.
    pub fn step(&mut self, dt: f64) -> Result<()> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(Error::InvalidParam("dt must be finite and >= 0".into()));
        }
        let sub_dt = dt / f64::from(self.config.sub_steps);
        for _ in 0..self.config.sub_steps {
            for i in 0..self.particles.len() {
                self.accumulate_forces(i);
                self.particles[i].update(sub_dt);
            }
            self.resolve_collisions();
            for p in &mut self.particles {
                reflect_boundary(p, self.config.width, self.config.height);
            }
        }
        Ok(())
    }

    /// One full broad-phase + narrow-phase pass over all particles.
    ///
    /// Rebuilds the index from current positions, then for each particle
    /// queries a region of half-extent `radius + max_radius` (wide enough
    /// to capture any neighbor that could touch it regardless of the
    /// neighbor's own radius) and hands every candidate pair to the narrow
    /// phase. A pair visited from both sides is harmless: the first visit
    /// separates it and the second fails the overlap test.
    pub fn resolve_collisions(&mut self) {
        self.tree.clear();
        for i in 0..self.particles.len() {
            // A particle that overshot the container this sub-step is
            // simply absent from the index until boundary reflection pulls
            // it back before the next build.
            self.tree.insert(i as u32, &self.particles);
        }

        let mut found: Vec<u32> = Vec::new();
        for i in 0..self.particles.len() {
            let reach = self.particles[i].radius + self.config.max_radius;
            let range = Region::new(self.particles[i].pos, DVec2::splat(reach));
            found.clear();
            self.tree.query(&range, &self.particles, &mut found);
            for &j in &found {
                if j as usize == i {
                    continue;
                }
                collide_pair(&mut self.particles, i, j as usize, &self.config);
            }
        }
    }

    /// Snapshot of every index-node region from the most recent build, in
    /// traversal order starting at the container root.
    pub fn index_regions(&self) -> Vec<Region> {
        let mut out = Vec::new();
        self.tree.collect_regions(&mut out);
        out
    }

    /// Region of the deepest index leaf containing `point`, from the most
    /// recent build; `None` if `point` lies outside the container.
    pub fn leaf_region_at(&self, point: DVec2) -> Option<Region> {
        self.tree.leaf_region_at(point)
    }

    /// Indices of particles inside `range` according to the most recent
    /// index build.
    pub fn query_region(&self, range: &Region) -> Vec<u32> {
        let mut found = Vec::new();
        self.tree.query(range, &self.particles, &mut found);
        found
    }

    /// Gravity, drag, viscosity, then at most one pointer force, summed
    /// into the particle's acceleration. Gravity runs first and overwrites
    /// the vertical component.
    fn accumulate_forces(&mut self, i: usize) {
        let gravity = if self.gravity_enabled {
            self.config.gravity
        } else {
            0.0
        };
        let drag = self.config.drag;
        let viscosity = self.config.viscosity;
        let effect_radius = self.config.pointer_radius;
        let strength = self.config.pointer_strength;
        let pointer = self.pointer;

        let p = &mut self.particles[i];
        forces::apply_gravity(p, gravity);
        forces::apply_drag(p, drag);
        forces::apply_viscosity(p, viscosity);
        if pointer.primary_down {
            forces::apply_point_force(p, pointer.pos, effect_radius, strength);
        } else if pointer.secondary_down {
            forces::apply_point_force(p, pointer.pos, effect_radius, -strength);
        }
    }
}

// ============ Collision and boundary helpers ============

/// Narrow-phase handling for one candidate pair.
///
/// AABB reject, exact overlap test with a degenerate-distance guard,
/// mass-ratio separation that exactly closes the penetration gap, then an
/// impulse along the contact normal unless the pair is already separating.
/// After an impulse both particles' `old_pos` is resynchronized so the
/// next Verlet step derives the corrected velocity.
fn collide_pair(particles: &mut [Particle], i: usize, j: usize, config: &SimConfig) {
    let d = particles[i].pos - particles[j].pos;
    let min_dist = particles[i].radius + particles[j].radius;
    if d.x.abs() > min_dist || d.y.abs() > min_dist {
        return;
    }

    let dist_sq = d.length_squared();
    if dist_sq >= min_dist * min_dist || dist_sq < config.min_distance_sq {
        return;
    }

    let dist = dist_sq.sqrt();
    // Unit contact normal from j toward i.
    let normal = d / dist;

    // Mass proxied by disc area; each particle moves by the other's share,
    // conserving the mass-weighted midpoint.
    let mass_i = particles[i].mass();
    let mass_j = particles[j].mass();
    let total_mass = mass_i + mass_j;
    let share_i = mass_j / total_mass;
    let share_j = mass_i / total_mass;

    let gap = min_dist - dist;
    particles[i].pos += normal * (gap * share_i);
    particles[j].pos -= normal * (gap * share_j);

    let relative = particles[i].vel - particles[j].vel;
    let approach = relative.dot(normal);
    // Already separating (or only weakly approaching): no impulse.
    if approach > -config.min_velocity {
        return;
    }

    let impulse = -(1.0 + config.restitution) * approach;
    particles[i].vel += normal * (impulse * share_i);
    particles[j].vel -= normal * (impulse * share_j);

    let (pos_i, vel_i) = (particles[i].pos, particles[i].vel);
    particles[i].old_pos = pos_i - vel_i;
    let (pos_j, vel_j) = (particles[j].pos, particles[j].vel);
    particles[j].old_pos = pos_j - vel_j;
}

/// Clamp a penetrating particle back to the container wall and negate the
/// corresponding velocity component. `old_pos` is deliberately left alone:
/// the next update re-derives velocity from the clamped position, which
/// bleeds energy out of wall contacts and lets particles come to rest on
/// the floor instead of bouncing forever.
fn reflect_boundary(p: &mut Particle, width: f64, height: f64) {
    if p.pos.x - p.radius < 0.0 {
        p.pos.x = p.radius;
        p.vel.x = -p.vel.x;
    }
    if p.pos.x + p.radius > width {
        p.pos.x = width - p.radius;
        p.vel.x = -p.vel.x;
    }
    if p.pos.y - p.radius < 0.0 {
        p.pos.y = p.radius;
        p.vel.y = -p.vel.y;
    }
    if p.pos.y + p.radius > height {
        p.pos.y = height - p.radius;
        p.vel.y = -p.vel.y;
    }
}

// ============ Construction helpers ============

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => SeedableRng::seed_from_u64(s),
        None => SeedableRng::seed_from_u64(rng().random()),
    }
}

fn container_region(config: &SimConfig) -> Region {
    Region::new(
        DVec2::new(config.width / 2.0, config.height / 2.0),
        DVec2::new(config.width / 2.0, config.height / 2.0),
    )
}

/// Lay particles out row-major on a near-square grid of pitch
/// `2 * max_radius`, centred in the container, each position jittered a
/// little so columns do not start perfectly stacked.
fn spawn_grid(config: &SimConfig, rng: &mut StdRng) -> Result<Vec<Particle>> {
    let total = config.num_particles;
    let cols = (total as f64).sqrt().ceil() as usize;
    let rows = total.div_ceil(cols);
    let pitch = 2.0 * config.max_radius;

    let origin = DVec2::new(
        config.width / 2.0 - cols as f64 * config.max_radius,
        config.height / 2.0 - rows as f64 * config.max_radius,
    );

    let mut particles = Vec::with_capacity(total);
    'rows: for r in 0..rows {
        for c in 0..cols {
            if particles.len() >= total {
                break 'rows;
            }
            let jitter = DVec2::new(
                rng.random_range(-0.1..=0.1),
                rng.random_range(-0.1..=0.1),
            );
            let pos = origin + DVec2::new(c as f64 * pitch, r as f64 * pitch) + jitter;
            let radius = rng.random_range(config.max_radius / 2.0..=config.max_radius);
            particles.push(Particle::new(pos, DVec2::ZERO, radius)?);
        }
    }
    Ok(particles)
}
