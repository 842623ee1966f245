use anyhow::{bail, ensure, Result};
use ndarray::Array2;
use tracing::*;
use super::*;

/// Two-phase dense tableau simplex with Bland's rule. Every row gets an artificial column, which
/// is also what the row duals are read from at the end.
#[derive(Debug, Clone)]
pub struct DenseSimplex {
  pub max_iterations: usize,
  /// Pivot and optimality tolerance.
  pub tolerance: f64,
  /// Largest phase-one objective still treated as feasible.
  pub feasibility_tolerance: f64,
}

impl Default for DenseSimplex {
  fn default() -> Self {
    DenseSimplex { max_iterations: 100_000, tolerance: 1e-9, feasibility_tolerance: 1e-7 }
  }
}

enum Phase {
  Optimal,
  Unbounded,
  IterationLimit,
}

struct Tableau {
  /// `m x (cols + 1)`, the last column holds the basic variable values.
  a: Array2<f64>,
  d: Vec<f64>,
  basis: Vec<usize>,
  flipped: Vec<bool>,
  num_vars: usize,
  first_artificial: usize,
  cols: usize,
  iterations: usize,
}

impl Tableau {
  fn new(lp: &LinearProgram) -> Tableau {
    let n = lp.num_vars();
    let m = lp.num_rows();
    let num_slacks = lp.rows.iter().filter(|r| r.sense != Sense::Eq).count();
    let first_artificial = n + num_slacks;
    let cols = first_artificial + m;

    let mut a = Array2::zeros((m, cols + 1));
    let mut flipped = vec![false; m];
    let mut slack = n;
    for (i, row) in lp.rows.iter().enumerate() {
      let sign = if row.rhs < 0.0 { -1.0 } else { 1.0 };
      flipped[i] = row.rhs < 0.0;
      for (j, &c) in row.coefs.iter().enumerate() {
        a[[i, j]] = sign * c;
      }
      match row.sense {
        Sense::Le => { a[[i, slack]] = sign; slack += 1; }
        Sense::Ge => { a[[i, slack]] = -sign; slack += 1; }
        Sense::Eq => {}
      }
      a[[i, first_artificial + i]] = 1.0;
      a[[i, cols]] = sign * row.rhs;
    }

    Tableau {
      a,
      d: vec![0.0; cols],
      basis: (first_artificial..cols).collect(),
      flipped,
      num_vars: n,
      first_artificial,
      cols,
      iterations: 0,
    }
  }

  #[inline]
  fn rhs(&self, i: usize) -> f64 { self.a[[i, self.cols]] }

  fn price_out(&mut self, costs: &[f64]) {
    for j in 0..self.cols {
      let z: f64 = self.basis.iter().enumerate().map(|(i, &b)| costs[b] * self.a[[i, j]]).sum();
      self.d[j] = costs[j] - z;
    }
  }

  fn objective(&self, costs: &[f64]) -> f64 {
    self.basis.iter().enumerate().map(|(i, &b)| costs[b] * self.rhs(i)).sum()
  }

  fn pivot(&mut self, r: usize, c: usize) {
    let m = self.basis.len();
    let p = self.a[[r, c]];
    for j in 0..=self.cols {
      self.a[[r, j]] /= p;
    }
    for i in (0..m).filter(|&i| i != r) {
      let f = self.a[[i, c]];
      if f != 0.0 {
        for j in 0..=self.cols {
          let v = self.a[[r, j]];
          self.a[[i, j]] -= f * v;
        }
      }
    }
    let f = self.d[c];
    if f != 0.0 {
      for j in 0..self.cols {
        self.d[j] -= f * self.a[[r, j]];
      }
    }
    self.basis[r] = c;
    self.iterations += 1;
  }

  fn run(&mut self, allowed: usize, tol: f64, max_iterations: usize) -> Phase {
    loop {
      if self.iterations >= max_iterations {
        return Phase::IterationLimit;
      }
      let c = match (0..allowed).find(|&j| self.d[j] < -tol) {
        Some(c) => c,
        None => return Phase::Optimal,
      };

      let mut leave: Option<(usize, f64)> = None;
      for i in 0..self.basis.len() {
        let aic = self.a[[i, c]];
        if aic <= tol {
          continue;
        }
        let ratio = self.rhs(i) / aic;
        leave = match leave {
          Some((k, best)) if ratio > best + tol || (ratio >= best - tol && self.basis[k] < self.basis[i]) => Some((k, best)),
          _ => Some((i, ratio)),
        };
      }
      match leave {
        Some((r, _)) => self.pivot(r, c),
        None => return Phase::Unbounded,
      }
    }
  }

  /// Pivots basic artificials at zero level out of the basis where some structural or slack column allows it.
  fn drive_out_artificials(&mut self, tol: f64) {
    for i in 0..self.basis.len() {
      if self.basis[i] < self.first_artificial {
        continue;
      }
      if let Some(j) = (0..self.first_artificial).find(|&j| self.a[[i, j]].abs() > tol) {
        self.pivot(i, j);
      }
    }
  }
}

impl MasterSolver for DenseSimplex {
  #[instrument(level="trace", skip(self, lp))]
  fn solve(&mut self, lp: &LinearProgram) -> Result<LpSolution> {
    for (i, row) in lp.rows.iter().enumerate() {
      ensure!(row.coefs.len() == lp.num_vars(), "row {} has {} coefficients, expected {}", i, row.coefs.len(), lp.num_vars());
    }
    let mut t = Tableau::new(lp);

    let phase_one: Vec<f64> = (0..t.cols).map(|j| if j >= t.first_artificial { 1.0 } else { 0.0 }).collect();
    t.price_out(&phase_one);
    match t.run(t.cols, self.tolerance, self.max_iterations) {
      Phase::Optimal => {}
      Phase::IterationLimit => return Ok(LpSolution::failed(LpStatus::IterationLimit)),
      Phase::Unbounded => bail!("phase one reported an unbounded ray"),
    }
    let infeasibility = t.objective(&phase_one);
    if infeasibility > self.feasibility_tolerance {
      trace!(infeasibility, "phase one failed");
      return Ok(LpSolution::failed(LpStatus::Infeasible));
    }
    t.drive_out_artificials(self.tolerance);

    let mut costs = vec![0.0; t.cols];
    costs[..t.num_vars].copy_from_slice(&lp.objective);
    t.price_out(&costs);
    match t.run(t.first_artificial, self.tolerance, self.max_iterations) {
      Phase::Optimal => {}
      Phase::IterationLimit => return Ok(LpSolution::failed(LpStatus::IterationLimit)),
      Phase::Unbounded => return Ok(LpSolution::failed(LpStatus::Unbounded)),
    }

    let mut x = vec![0.0; t.num_vars];
    for (i, &b) in t.basis.iter().enumerate() {
      if b < t.num_vars {
        x[b] = t.rhs(i);
      }
    }
    let objective: f64 = lp.objective.iter().zip(&x).map(|(c, v)| c * v).sum();
    let duals = (0..t.basis.len())
      .map(|i| {
        let y = -t.d[t.first_artificial + i];
        if t.flipped[i] { -y } else { y }
      })
      .collect();
    trace!(rows=lp.num_rows(), vars=lp.num_vars(), iterations=t.iterations, objective);
    Ok(LpSolution { status: LpStatus::Optimal, x, objective, duals })
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  fn close(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-7)
  }

  #[test]
  fn covering_lp() -> Result<()> {
    let mut lp = LinearProgram::new(vec![2.0, 3.0]);
    lp.add_row(vec![1.0, 1.0], Sense::Ge, 4.0);
    lp.add_row(vec![1.0, 3.0], Sense::Ge, 6.0);
    let sol = DenseSimplex::default().solve(&lp)?;
    assert_eq!(sol.status, LpStatus::Optimal);
    assert!(close(&sol.x, &[3.0, 1.0]));
    assert!((sol.objective - 9.0).abs() < 1e-7);
    assert!(close(&sol.duals, &[1.5, 0.5]));
    Ok(())
  }

  #[test]
  fn negative_rhs_dual_sign() -> Result<()> {
    let mut lp = LinearProgram::new(vec![1.0]);
    lp.add_row(vec![-1.0], Sense::Le, -2.0);
    let sol = DenseSimplex::default().solve(&lp)?;
    assert!(sol.is_optimal());
    assert!(close(&sol.x, &[2.0]));
    assert!(close(&sol.duals, &[-1.0]));
    Ok(())
  }

  #[test]
  fn redundant_equalities() -> Result<()> {
    let mut lp = LinearProgram::new(vec![1.0, 1.0]);
    lp.add_row(vec![1.0, 1.0], Sense::Eq, 2.0);
    lp.add_row(vec![2.0, 2.0], Sense::Eq, 4.0);
    let sol = DenseSimplex::default().solve(&lp)?;
    assert!(sol.is_optimal());
    assert!((sol.objective - 2.0).abs() < 1e-7);
    // any dual split is optimal, but it must price the columns out
    let y = &sol.duals;
    assert!((y[0] + 2.0 * y[1] - 1.0).abs() < 1e-7);
    Ok(())
  }

  #[test]
  fn infeasible() -> Result<()> {
    let mut lp = LinearProgram::new(vec![1.0, 1.0]);
    lp.add_row(vec![1.0, 1.0], Sense::Le, 1.0);
    lp.add_row(vec![1.0, 1.0], Sense::Ge, 3.0);
    assert_eq!(DenseSimplex::default().solve(&lp)?.status, LpStatus::Infeasible);
    Ok(())
  }

  #[test]
  fn unbounded() -> Result<()> {
    let mut lp = LinearProgram::new(vec![-1.0, 0.0]);
    lp.add_row(vec![1.0, -1.0], Sense::Le, 1.0);
    assert_eq!(DenseSimplex::default().solve(&lp)?.status, LpStatus::Unbounded);
    Ok(())
  }

  #[test]
  fn iteration_limit() -> Result<()> {
    let mut lp = LinearProgram::new(vec![2.0, 3.0]);
    lp.add_row(vec![1.0, 1.0], Sense::Ge, 4.0);
    let mut solver = DenseSimplex { max_iterations: 0, ..DenseSimplex::default() };
    assert_eq!(solver.solve(&lp)?.status, LpStatus::IterationLimit);
    Ok(())
  }

  #[test]
  fn shape_mismatch() {
    let mut lp = LinearProgram::new(vec![1.0, 1.0]);
    lp.add_row(vec![1.0], Sense::Le, 1.0);
    assert!(DenseSimplex::default().solve(&lp).is_err());
  }
}
