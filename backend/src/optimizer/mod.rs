//! Optimization engine
//!
//! Builds one hour's mixed-integer program from a plan and solves it with an
//! exact branch-and-bound solver.
//!
//! See `model.rs` for the formulation and `solver.rs` for the solve loop.

mod model;
pub mod solver;

pub use solver::{solve_hour, HourSolution};
