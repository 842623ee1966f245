//! Master problem: a small LP interface, a dense simplex backend and the restricted
//! set-partitioning master over route columns.
use anyhow::Result;

mod simplex;
mod restricted;

pub use simplex::DenseSimplex;
pub use restricted::{Column, RestrictedMaster, VehicleBounds};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
  Le,
  Ge,
  Eq,
}

/// `coefs · x (sense) rhs`, with one coefficient per variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
  pub coefs: Vec<f64>,
  pub sense: Sense,
  pub rhs: f64,
}

/// `min objective · x` subject to `rows`, `x >= 0`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearProgram {
  pub objective: Vec<f64>,
  pub rows: Vec<Row>,
}

impl LinearProgram {
  pub fn new(objective: Vec<f64>) -> Self {
    LinearProgram { objective, rows: Vec::new() }
  }

  pub fn add_row(&mut self, coefs: Vec<f64>, sense: Sense, rhs: f64) -> usize {
    self.rows.push(Row { coefs, sense, rhs });
    self.rows.len() - 1
  }

  pub fn num_vars(&self) -> usize { self.objective.len() }

  pub fn num_rows(&self) -> usize { self.rows.len() }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LpStatus {
  Optimal,
  Infeasible,
  Unbounded,
  IterationLimit,
}

#[derive(Debug, Clone)]
pub struct LpSolution {
  pub status: LpStatus,
  pub x: Vec<f64>,
  pub objective: f64,
  /// One value per row, in the sign convention of the row as written (`y = c_B B^-1`).
  pub duals: Vec<f64>,
}

impl LpSolution {
  pub fn failed(status: LpStatus) -> Self {
    LpSolution { status, x: Vec::new(), objective: f64::INFINITY, duals: Vec::new() }
  }

  pub fn is_optimal(&self) -> bool { self.status == LpStatus::Optimal }
}

/// Anything that can solve the master LP and report row duals.
pub trait MasterSolver {
  fn solve(&mut self, lp: &LinearProgram) -> Result<LpSolution>;
}

impl<S: MasterSolver + ?Sized> MasterSolver for &mut S {
  fn solve(&mut self, lp: &LinearProgram) -> Result<LpSolution> { (**self).solve(lp) }
}
