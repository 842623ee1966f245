//! Column generation: alternate between the restricted master LP and the labeling pricer until no
//! route with negative reduced cost is left.
use std::fmt;
use std::str::FromStr;
use anyhow::Result;
use tracing::*;

use crate::data::*;
use crate::espprc::*;
use crate::master::{MasterSolver, RestrictedMaster};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relaxation {
  Exact,
  Ssr,
  Dssr,
}

impl FromStr for Relaxation {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.to_ascii_lowercase().as_str() {
      "exact" | "espprc" => Ok(Relaxation::Exact),
      "ssr" => Ok(Relaxation::Ssr),
      "dssr" => Ok(Relaxation::Dssr),
      other => Err(anyhow::anyhow!("unknown relaxation `{}` (expected exact, ssr or dssr)", other)),
    }
  }
}

impl fmt::Display for Relaxation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Relaxation::Exact => "exact",
      Relaxation::Ssr => "ssr",
      Relaxation::Dssr => "dssr",
    };
    f.write_str(s)
  }
}

/// One labeling engine configured for a relaxation level.
pub enum Pricer<'a> {
  Exact(LabelingEngine<'a, Elementary>),
  Ssr(LabelingEngine<'a, VisitCount>),
  Dssr(LabelingEngine<'a, CriticalVisit>),
}

impl<'a> Pricer<'a> {
  pub fn new(problem: &'a Problem, relaxation: Relaxation) -> Self {
    match relaxation {
      Relaxation::Exact => Pricer::Exact(LabelingEngine::new(problem, Elementary)),
      Relaxation::Ssr => Pricer::Ssr(LabelingEngine::new(problem, VisitCount)),
      Relaxation::Dssr => Pricer::Dssr(LabelingEngine::new(problem, CriticalVisit::default())),
    }
  }

  pub fn relaxation(&self) -> Relaxation {
    match self {
      Pricer::Exact(_) => Relaxation::Exact,
      Pricer::Ssr(_) => Relaxation::Ssr,
      Pricer::Dssr(_) => Relaxation::Dssr,
    }
  }

  /// Critical customers learned so far (always empty unless decremental).
  pub fn critical(&self) -> CustomerSet {
    match self {
      Pricer::Dssr(e) => e.policy().critical,
      _ => CustomerSet::new(),
    }
  }

  pub fn set_critical(&mut self, critical: CustomerSet) {
    if let Pricer::Dssr(e) = self {
      e.policy_mut().critical = critical;
    }
  }

  pub fn price(&mut self, duals: &[f64]) -> Result<Vec<PricedPath>> {
    match self {
      Pricer::Exact(e) => e.solve(duals),
      Pricer::Ssr(e) => e.solve(duals),
      Pricer::Dssr(e) => solve_dssr(e, duals),
    }
  }
}

#[derive(Debug, Clone)]
pub struct ColGenSettings {
  pub relaxation: Relaxation,
  pub max_iterations: usize,
  pub max_columns_per_iteration: usize,
  /// Columns are only added below `-reduced_cost_tolerance`; also the threshold for penalty use.
  pub reduced_cost_tolerance: f64,
}

impl Default for ColGenSettings {
  fn default() -> Self {
    ColGenSettings {
      relaxation: Relaxation::Dssr,
      max_iterations: 1000,
      max_columns_per_iteration: 50,
      reduced_cost_tolerance: 1e-6,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColGenOutcome {
  Optimal {
    objective: Cost,
    /// LP value of each column of the master, in column order.
    values: Vec<f64>,
    /// Pricing duals of the final LP (entry 0 for the vehicle rows).
    duals: Vec<f64>,
    vehicles: f64,
    iterations: usize,
  },
  Infeasible,
}

pub struct ColumnGeneration<'a, S> {
  pricer: Pricer<'a>,
  solver: S,
  settings: ColGenSettings,
}

impl<'a, S: MasterSolver> ColumnGeneration<'a, S> {
  pub fn new(problem: &'a Problem, solver: S, settings: ColGenSettings) -> Self {
    ColumnGeneration { pricer: Pricer::new(problem, settings.relaxation), solver, settings }
  }

  pub fn pricer(&self) -> &Pricer<'a> { &self.pricer }

  pub fn pricer_mut(&mut self) -> &mut Pricer<'a> { &mut self.pricer }

  #[instrument(level="debug", skip(self, master))]
  pub fn solve(&mut self, master: &mut RestrictedMaster<'a>) -> Result<ColGenOutcome> {
    let tol = self.settings.reduced_cost_tolerance;
    let mut iterations = 0;
    loop {
      iterations += 1;
      let sol = self.solver.solve(&master.to_lp())?;
      if !sol.is_optimal() {
        debug!(status=?sol.status, iterations, "master LP not solved to optimality");
        return Ok(ColGenOutcome::Infeasible);
      }
      let duals = master.pricing_duals(&sol.duals);

      let mut added = 0;
      for p in self.pricer.price(&duals)? {
        if p.reduced_cost >= -tol || added >= self.settings.max_columns_per_iteration {
          break;
        }
        if p.is_elementary() && master.add_column(p.path) {
          added += 1;
        }
      }
      debug!(iterations, objective=sol.objective, added, columns=master.num_columns());

      let out_of_iterations = iterations >= self.settings.max_iterations;
      if added == 0 || out_of_iterations {
        if out_of_iterations && added > 0 {
          warn!(iterations, "column generation stopped before convergence");
        }
        if master.uses_penalty(&sol.x, tol) {
          debug!(iterations, "penalty columns in final LP");
          return Ok(ColGenOutcome::Infeasible);
        }
        let vehicles = master.vehicle_count(&sol.x);
        let mut values = master.route_values(&sol.x).to_vec();
        values.resize(master.num_columns(), 0.0);
        info!(relaxation=%self.settings.relaxation, iterations, objective=sol.objective, vehicles, columns=master.num_columns(), "column generation finished");
        return Ok(ColGenOutcome::Optimal { objective: sol.objective, values, duals, vehicles, iterations });
      }
    }
  }
}
