//! Core simulation data structures for fluidsim: the spatial index, the
//! particle integrator, the force model, and the sub-stepped frame loop.

pub mod forces;
pub mod particle;
pub mod quadtree;
pub mod sim;

pub use particle::Particle;
pub use quadtree::{QuadTree, Region};
pub use sim::{PointerState, SimConfig, Simulation};
