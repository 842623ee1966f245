use tracing::*;
use super::*;
use crate::Set;
use crate::data::*;
use crate::espprc::{Elementary, Label};

const PENALTY_FACTOR: f64 = 10.0;

/// A route offered to the master problem.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
  pub path: Vec<usize>,
  pub cost: Cost,
}

impl Column {
  /// Number of times customer `i` is served by this route.
  pub fn coverage(&self, i: usize) -> f64 {
    let body: &[usize] = if self.path.len() > 2 { &self.path[1..self.path.len() - 1] } else { &[] };
    body.iter().filter(|&&c| c == i).count() as f64
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleBounds {
  pub lo: usize,
  pub hi: usize,
}

/// Set-partitioning master over the columns generated so far.
///
/// LP variables are the route columns followed by one penalty column per customer. Rows are laid out as:
/// one covering row per customer (`i - 1`), the vehicle upper bound (`n`), the vehicle lower bound
/// (`n + 1`, only if positive) and finally one row per fixed column.
#[derive(Debug, Clone)]
pub struct RestrictedMaster<'a> {
  problem: &'a Problem,
  columns: Vec<Column>,
  known: Set<Vec<usize>>,
  penalty: Cost,
  vehicles: VehicleBounds,
  fixed: Vec<(usize, f64)>,
}

impl<'a> RestrictedMaster<'a> {
  /// Master holding every resource-feasible single-customer round trip.
  pub fn new(problem: &'a Problem) -> Self {
    let zero = vec![0.0; problem.customers.len()];
    let singles = (1..=problem.n())
      .map(|i| vec![DEPOT, i, DEPOT])
      .filter(|path| Label::replay(path, problem, &zero, &Elementary).is_some())
      .map(|path| Column { cost: problem.route_cost(&path), path })
      .collect();
    Self::with_columns(problem, singles)
  }

  pub fn with_columns(problem: &'a Problem, columns: Vec<Column>) -> Self {
    let max_cost = problem.costs.iter().cloned().fold(0.0, f64::max);
    let penalty = PENALTY_FACTOR * (problem.n() + 1) as f64 * max_cost + 1.0;
    let mut master = RestrictedMaster {
      problem,
      columns: Vec::with_capacity(columns.len()),
      known: Set::default(),
      penalty,
      vehicles: VehicleBounds { lo: 0, hi: problem.vehicles },
      fixed: Vec::new(),
    };
    for c in columns {
      if master.known.insert(c.path.clone()) {
        master.columns.push(c);
      }
    }
    master
  }

  pub fn problem(&self) -> &'a Problem { self.problem }

  pub fn columns(&self) -> &[Column] { &self.columns }

  pub fn num_columns(&self) -> usize { self.columns.len() }

  /// Objective coefficient of the penalty column of each customer.
  pub fn penalty(&self) -> Cost { self.penalty }

  pub fn vehicles(&self) -> VehicleBounds { self.vehicles }

  pub fn set_vehicles(&mut self, bounds: VehicleBounds) { self.vehicles = bounds }

  pub fn fixed(&self) -> &[(usize, f64)] { &self.fixed }

  /// Forces route column `col` to `value`, replacing an earlier fixing of the same column.
  pub fn fix(&mut self, col: usize, value: f64) {
    debug_assert!(col < self.columns.len());
    match self.fixed.iter_mut().find(|(c, _)| *c == col) {
      Some(f) => f.1 = value,
      None => self.fixed.push((col, value)),
    }
  }

  pub fn contains(&self, path: &[usize]) -> bool { self.known.contains(path) }

  /// Adds the route `path`, returning `false` if it is already present.
  pub fn add_column(&mut self, path: Vec<usize>) -> bool {
    if self.known.contains(&path) {
      return false;
    }
    let cost = self.problem.route_cost(&path);
    trace!(?path, cost, "new column");
    self.known.insert(path.clone());
    self.columns.push(Column { path, cost });
    true
  }

  pub fn to_lp(&self) -> LinearProgram {
    let n = self.problem.n();
    let r = self.columns.len();
    let num_vars = r + n;

    let mut objective: Vec<f64> = self.columns.iter().map(|c| c.cost).collect();
    objective.extend(std::iter::repeat(self.penalty).take(n));
    let mut lp = LinearProgram::new(objective);

    for i in 1..=n {
      let mut coefs: Vec<f64> = self.columns.iter().map(|c| c.coverage(i)).collect();
      coefs.resize(num_vars, 0.0);
      coefs[r + i - 1] = 1.0;
      lp.add_row(coefs, Sense::Eq, 1.0);
    }

    let mut vehicle_row = vec![1.0; r];
    vehicle_row.resize(num_vars, 0.0);
    lp.add_row(vehicle_row.clone(), Sense::Le, self.vehicles.hi as f64);
    if self.vehicles.lo > 0 {
      lp.add_row(vehicle_row, Sense::Ge, self.vehicles.lo as f64);
    }

    for &(col, value) in &self.fixed {
      let mut coefs = vec![0.0; num_vars];
      coefs[col] = 1.0;
      lp.add_row(coefs, Sense::Eq, value);
    }
    lp
  }

  /// Dual vector for pricing: entry 0 collects the vehicle rows, entry `i` the covering row of customer `i`.
  pub fn pricing_duals(&self, lp_duals: &[f64]) -> Vec<f64> {
    let n = self.problem.n();
    let mut duals = Vec::with_capacity(n + 1);
    let mut depot = lp_duals[n];
    if self.vehicles.lo > 0 {
      depot += lp_duals[n + 1];
    }
    duals.push(depot);
    duals.extend_from_slice(&lp_duals[..n]);
    duals
  }

  /// Values of the route columns in an LP solution of `to_lp()`.
  pub fn route_values<'s>(&self, x: &'s [f64]) -> &'s [f64] { &x[..self.columns.len()] }

  pub fn uses_penalty(&self, x: &[f64], tol: f64) -> bool {
    x[self.columns.len()..].iter().any(|&v| v > tol)
  }

  pub fn vehicle_count(&self, x: &[f64]) -> f64 { self.route_values(x).iter().sum() }

  /// `cost - duals · coverage`, with `duals` as returned by [`pricing_duals`](Self::pricing_duals).
  pub fn reduced_cost(&self, col: &Column, duals: &[f64]) -> Cost {
    col.cost - duals[DEPOT] - (1..=self.problem.n()).map(|i| col.coverage(i) * duals[i]).sum::<f64>()
  }
}
