//! Constraint Programming (CP) framework.
//!
//! Provides a boolean model for expressing the placement problem as
//! decision variables, constraints and a linear objective, and the solver
//! contract used to hand that model to an optimizing backend.
//!
//! # Key Components
//!
//! - **Variables**: [`BoolVar`], addressed by [`VarId`]; [`Literal`] for negation
//! - **Constraints**: [`Constraint`]: ExactlyOne, Conflict, Or/And equality
//! - **Model**: [`CpModel`]: container for variables, constraints, objective
//! - **Solver**: [`CpSolver`] trait: interface for solver implementations
//!
//! # Design
//!
//! The model is a plain value passed by reference; no solver state lives in
//! it. [`CpSolver`] allows plugging in external engines (e.g. CP-SAT). The
//! bundled [`ExhaustiveSolver`] is an exact depth-first reference backend
//! meant for tests and small rosters, not a general SAT/ILP engine.

mod exhaustive;
mod model;
mod solver;
mod variables;

pub use exhaustive::ExhaustiveSolver;
pub use model::{Constraint, CpModel, Objective};
pub use solver::{CpSolution, CpSolver, SolverConfig, SolverStatus};
pub(crate) use solver::{Budget, Interrupt};
pub use variables::{BoolVar, Literal, VarId};
