use glam::DVec2;
use numpy::ndarray::{Array1, Array2};
use numpy::{IntoPyArray, PyArray1, PyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

pub mod core;
pub mod error;

use crate::core::{Region, SimConfig, Simulation};

fn py_err<E: ToString>(e: E) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// FluidSim Python-facing wrapper around the Rust simulation core.
///
/// The Python side owns the window, input polling, and rendering; this
/// class owns particle state and physics. Per frame: feed pointer state,
/// call `step(dt)`, then read positions and radii (and velocities, if
/// coloring by speed) back as NumPy arrays.
#[pyclass]
pub struct FluidSim {
    sim: Simulation,
}

#[pymethods]
impl FluidSim {
    /// Initialize a particle simulation inside a width × height container.
    ///
    /// Parameters
    /// - num_particles: fixed particle count (> 0)
    /// - width, height: container extents (> 0, y grows downward)
    /// - max_radius: upper radius bound; radii sample from [max_radius/2, max_radius]
    /// - gravity: downward acceleration while gravity is enabled
    /// - drag, viscosity: damping coefficients (>= 0)
    /// - sub_steps: fixed sub-steps per frame (> 0)
    /// - capacity: spatial-index node capacity (> 0)
    /// - restitution: collision energy retention in [0, 1]
    /// - seed: RNG seed for reproducible layouts; None for nondeterministic
    ///
    /// Errors: raises ValueError on invalid parameters.
    #[new]
    #[pyo3(signature = (
        num_particles,
        width = 800.0,
        height = 600.0,
        max_radius = 5.0,
        gravity = 980.0,
        drag = 0.002,
        viscosity = 0.003,
        sub_steps = 8,
        capacity = 4,
        restitution = 0.5,
        seed = None
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        num_particles: usize,
        width: f64,
        height: f64,
        max_radius: f64,
        gravity: f64,
        drag: f64,
        viscosity: f64,
        sub_steps: u32,
        capacity: usize,
        restitution: f64,
        seed: Option<u64>,
    ) -> PyResult<Self> {
        let config = SimConfig {
            width,
            height,
            num_particles,
            max_radius,
            gravity,
            drag,
            viscosity,
            sub_steps,
            capacity,
            restitution,
            seed,
            ..SimConfig::default()
        };
        let sim = Simulation::new(config).map_err(py_err)?;
        Ok(Self { sim })
    }

    /// Advance the simulation by one frame of `dt` seconds (sub-stepped
    /// internally; releases the interpreter during computation).
    fn step(&mut self, py: Python<'_>, dt: f64) -> PyResult<()> {
        py.detach(|| self.sim.step(dt)).map_err(py_err)
    }

    /// Return positions as a NumPy array of shape (N, 2), dtype=float64.
    fn get_positions<'py>(&self, py: Python<'py>) -> PyResult<Py<PyArray2<f64>>> {
        let n = self.sim.num_particles();
        let mut arr = Array2::<f64>::zeros((n, 2));
        for (i, p) in self.sim.particles.iter().enumerate() {
            arr[[i, 0]] = p.pos.x;
            arr[[i, 1]] = p.pos.y;
        }
        Ok(arr.into_pyarray(py).to_owned().into())
    }

    /// Return per-sub-step displacement vectors ("velocities" in the
    /// integrator's native unit) as a NumPy array of shape (N, 2).
    fn get_velocities<'py>(&self, py: Python<'py>) -> PyResult<Py<PyArray2<f64>>> {
        let n = self.sim.num_particles();
        let mut arr = Array2::<f64>::zeros((n, 2));
        for (i, p) in self.sim.particles.iter().enumerate() {
            arr[[i, 0]] = p.vel.x;
            arr[[i, 1]] = p.vel.y;
        }
        Ok(arr.into_pyarray(py).to_owned().into())
    }

    /// Return radii as a NumPy array of shape (N,), dtype=float64.
    fn get_radii<'py>(&self, py: Python<'py>) -> PyResult<Py<PyArray1<f64>>> {
        let mut arr = Array1::<f64>::zeros(self.sim.num_particles());
        for (i, p) in self.sim.particles.iter().enumerate() {
            arr[i] = p.radius;
        }
        Ok(arr.into_pyarray(py).to_owned().into())
    }

    /// Feed pointer position and button state for the next frame. The
    /// primary button attracts particles toward the pointer, the secondary
    /// repels them.
    fn set_pointer(&mut self, x: f64, y: f64, primary: bool, secondary: bool) {
        self.sim.set_pointer(DVec2::new(x, y), primary, secondary);
    }

    /// Enable or disable gravity.
    fn set_gravity_enabled(&mut self, enabled: bool) {
        self.sim.set_gravity_enabled(enabled);
    }

    /// Whether gravity is currently enabled.
    fn gravity_enabled(&self) -> bool {
        self.sim.gravity_enabled()
    }

    /// Discard the particle set and rebuild the initial grid layout.
    fn reset(&mut self) -> PyResult<()> {
        self.sim.reset().map_err(py_err)
    }

    /// Total kinetic energy (diagnostic).
    fn kinetic_energy(&self) -> f64 {
        self.sim.kinetic_energy()
    }

    /// Number of particles.
    fn num_particles(&self) -> usize {
        self.sim.num_particles()
    }

    /// Debug: node rectangles of the spatial index from the most recent
    /// collision pass, as a NumPy array of shape (M, 4) with rows
    /// [center_x, center_y, half_w, half_h] in traversal order.
    fn get_index_regions<'py>(&self, py: Python<'py>) -> PyResult<Py<PyArray2<f64>>> {
        let regions = self.sim.index_regions();
        let mut arr = Array2::<f64>::zeros((regions.len(), 4));
        for (i, r) in regions.iter().enumerate() {
            arr[[i, 0]] = r.center.x;
            arr[[i, 1]] = r.center.y;
            arr[[i, 2]] = r.half.x;
            arr[[i, 3]] = r.half.y;
        }
        Ok(arr.into_pyarray(py).to_owned().into())
    }

    /// Debug: rectangle of the deepest index leaf containing (x, y) as
    /// (center_x, center_y, half_w, half_h), or None if the point lies
    /// outside the container.
    fn leaf_region_at(&self, x: f64, y: f64) -> Option<(f64, f64, f64, f64)> {
        self.sim
            .leaf_region_at(DVec2::new(x, y))
            .map(|r| (r.center.x, r.center.y, r.half.x, r.half.y))
    }

    /// Debug: indices of particles inside the given rectangle according to
    /// the most recent index build.
    ///
    /// Errors: raises ValueError if the half-extents are negative or not
    /// finite.
    fn query_region(&self, cx: f64, cy: f64, hw: f64, hh: f64) -> PyResult<Vec<u32>> {
        if !(hw.is_finite() && hh.is_finite()) || hw < 0.0 || hh < 0.0 {
            return Err(py_err("half-extents must be finite and >= 0"));
        }
        let range = Region::new(DVec2::new(cx, cy), DVec2::new(hw, hh));
        Ok(self.sim.query_region(&range))
    }
}

/// The fluidsim Python module entry point.
#[pymodule]
fn fluidsim(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<FluidSim>()?;
    Ok(())
}
