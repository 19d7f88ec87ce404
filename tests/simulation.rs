use fluidsim::core::{Particle, Region, SimConfig, Simulation};
use fluidsim::error::Result;
use glam::DVec2;

const DT: f64 = 1.0 / 60.0;

fn base_config(n: usize) -> SimConfig {
    SimConfig {
        num_particles: n,
        seed: Some(20240601),
        ..SimConfig::default()
    }
}

/// A lone particle with no forces and no velocity never moves.
#[test]
fn equilibrium_particle_stays_put() -> Result<()> {
    let mut sim = Simulation::new(SimConfig {
        drag: 0.0,
        viscosity: 0.0,
        ..base_config(1)
    })?;
    sim.set_gravity_enabled(false);
    let start = sim.particles[0].pos;
    for _ in 0..120 {
        sim.step(DT)?;
    }
    assert_eq!(sim.particles[0].pos, start);
    Ok(())
}

/// No particle ends a frame penetrating the container, no matter how hard
/// it was driven at a wall.
#[test]
fn boundary_penetration_never_survives_a_step() -> Result<()> {
    let mut sim = Simulation::new(SimConfig {
        drag: 0.0,
        viscosity: 0.0,
        ..base_config(1)
    })?;
    sim.set_gravity_enabled(false);

    // A per-sub-step displacement of 40 units crosses the whole container
    // in a handful of sub-steps.
    sim.particles[0] = Particle::new(DVec2::new(780.0, 580.0), DVec2::new(40.0, 40.0), 5.0)?;
    for _ in 0..30 {
        sim.step(DT)?;
        let p = &sim.particles[0];
        let (width, height) = (sim.config().width, sim.config().height);
        assert!(
            p.pos.x >= p.radius && p.pos.x <= width - p.radius,
            "x out of bounds: {}",
            p.pos.x
        );
        assert!(
            p.pos.y >= p.radius && p.pos.y <= height - p.radius,
            "y out of bounds: {}",
            p.pos.y
        );
    }
    Ok(())
}

/// A single particle released above the floor with gravity on comes to
/// rest sitting exactly on the floor instead of oscillating.
#[test]
fn particle_settles_on_the_floor() -> Result<()> {
    let mut sim = Simulation::new(base_config(1))?;
    for _ in 0..600 {
        sim.step(DT)?;
    }
    let p = &sim.particles[0];
    let floor = sim.config().height - p.radius;
    assert!(
        (p.pos.y - floor).abs() < 1e-6,
        "expected to rest at y = {floor}, got {}",
        p.pos.y
    );
    assert!(
        p.vel.length() < 1e-3,
        "expected negligible residual velocity, got {:?}",
        p.vel
    );
    Ok(())
}

/// The primary pointer button pulls particles toward the pointer.
#[test]
fn primary_pointer_attracts_particles() -> Result<()> {
    let mut sim = Simulation::new(base_config(9))?;
    sim.set_gravity_enabled(false);
    let pointer = DVec2::new(500.0, 300.0);

    let mean_dist = |sim: &Simulation| {
        sim.particles
            .iter()
            .map(|p| (p.pos - pointer).length())
            .sum::<f64>()
            / sim.num_particles() as f64
    };
    let before = mean_dist(&sim);

    // Few enough frames that the swarm is still on its first infall and
    // has not yet overshot the pointer.
    sim.set_pointer(pointer, true, false);
    for _ in 0..6 {
        sim.step(DT)?;
    }
    let after = mean_dist(&sim);
    assert!(
        after < before,
        "attraction should shrink the mean pointer distance ({before} -> {after})"
    );
    Ok(())
}

/// The secondary pointer button pushes particles away.
#[test]
fn secondary_pointer_repels_particles() -> Result<()> {
    let mut sim = Simulation::new(base_config(9))?;
    sim.set_gravity_enabled(false);
    let pointer = DVec2::new(400.0, 300.0);

    let mean_dist = |sim: &Simulation| {
        sim.particles
            .iter()
            .map(|p| (p.pos - pointer).length())
            .sum::<f64>()
            / sim.num_particles() as f64
    };
    let before = mean_dist(&sim);

    sim.set_pointer(pointer, false, true);
    for _ in 0..10 {
        sim.step(DT)?;
    }
    let after = mean_dist(&sim);
    assert!(
        after > before,
        "repulsion should grow the mean pointer distance ({before} -> {after})"
    );
    Ok(())
}

/// After a frame, the index from the last resolution pass still holds
/// every particle exactly once, and the debug surface agrees.
#[test]
fn debug_surface_reflects_last_index_build() -> Result<()> {
    let mut sim = Simulation::new(SimConfig {
        drag: 0.0,
        viscosity: 0.0,
        ..base_config(50)
    })?;
    sim.set_gravity_enabled(false);
    sim.step(DT)?;

    let container = Region::new(DVec2::new(400.0, 300.0), DVec2::new(400.0, 300.0));
    let mut found = sim.query_region(&container);
    found.sort_unstable();
    assert_eq!(
        found,
        (0..50).collect::<Vec<u32>>(),
        "container-wide query must return every particle exactly once"
    );

    let regions = sim.index_regions();
    assert_eq!(regions[0], container, "first snapshot entry is the root");
    assert!(
        regions.len() > 1,
        "50 particles at capacity 4 must have forced subdivision"
    );

    // The leaf under a particle is a region containing that particle.
    let target = sim.particles[0].pos;
    let leaf = sim.leaf_region_at(target).expect("particle is inside");
    assert!(leaf.contains(target));
    assert!(sim.leaf_region_at(DVec2::new(-10.0, -10.0)).is_none());
    Ok(())
}

/// Lifecycle controls: the gravity toggle reads back, and a seeded reset
/// restores the initial layout bit for bit.
#[test]
fn lifecycle_controls_round_trip() -> Result<()> {
    let mut sim = Simulation::new(base_config(16))?;
    assert!(sim.gravity_enabled());
    sim.set_gravity_enabled(false);
    assert!(!sim.gravity_enabled());

    let initial: Vec<(DVec2, f64)> = sim.particles.iter().map(|p| (p.pos, p.radius)).collect();
    sim.set_gravity_enabled(true);
    for _ in 0..20 {
        sim.step(DT)?;
    }
    sim.reset()?;
    for (p, &(pos, radius)) in sim.particles.iter().zip(&initial) {
        assert_eq!(p.pos, pos);
        assert_eq!(p.radius, radius);
    }
    Ok(())
}

/// Construction-time validation mirrors the core's parameter rules.
#[test]
fn invalid_parameters_are_rejected() {
    let cases = [
        SimConfig {
            num_particles: 0,
            ..SimConfig::default()
        },
        SimConfig {
            width: -100.0,
            ..SimConfig::default()
        },
        SimConfig {
            restitution: 2.0,
            ..SimConfig::default()
        },
        SimConfig {
            drag: f64::NAN,
            ..SimConfig::default()
        },
        SimConfig {
            capacity: 0,
            ..SimConfig::default()
        },
    ];
    for config in cases {
        assert!(
            Simulation::new(config.clone()).is_err(),
            "config should have been rejected: {config:?}"
        );
    }
}
