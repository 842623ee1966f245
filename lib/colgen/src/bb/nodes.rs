use anyhow::Result;
use tracing::*;
use super::BbNode;
use crate::colgen::{ColGenOutcome, ColGenSettings, ColumnGeneration};
use crate::data::*;
use crate::espprc::CustomerSet;
use crate::master::{LpSolution, MasterSolver, RestrictedMaster, VehicleBounds};

const INTEGRALITY_TOL: f64 = 1e-6;

#[inline]
fn is_integral(v: f64) -> bool { (v - v.round()).abs() <= INTEGRALITY_TOL }

/// Node of the vehicle-count search. Solves the master by column generation under its vehicle bounds
/// and branches on the number of vehicles.
#[derive(Debug, Clone)]
pub struct VehicleNode<'a, S> {
  master: RestrictedMaster<'a>,
  solver: S,
  settings: ColGenSettings,
  critical: CustomerSet,
  outcome: Option<ColGenOutcome>,
}

impl<'a, S: MasterSolver + Clone> VehicleNode<'a, S> {
  pub fn new(problem: &'a Problem, solver: S, settings: ColGenSettings) -> Self {
    VehicleNode {
      master: RestrictedMaster::new(problem),
      solver,
      settings,
      critical: CustomerSet::new(),
      outcome: None,
    }
  }

  pub fn master(&self) -> &RestrictedMaster<'a> { &self.master }

  pub fn outcome(&self) -> Option<&ColGenOutcome> { self.outcome.as_ref() }

  fn child(&self, bounds: VehicleBounds) -> Self {
    let mut master = self.master.clone();
    master.set_vehicles(bounds);
    VehicleNode {
      master,
      solver: self.solver.clone(),
      settings: self.settings.clone(),
      critical: self.critical,
      outcome: None,
    }
  }

  fn vehicles(&self) -> Option<f64> {
    match self.outcome {
      Some(ColGenOutcome::Optimal { vehicles, .. }) => Some(vehicles),
      _ => None,
    }
  }
}

impl<'a, S: MasterSolver + Clone> BbNode for VehicleNode<'a, S> {
  fn solve(&mut self) -> Result<()> {
    let problem = self.master.problem();
    let mut cg = ColumnGeneration::new(problem, &mut self.solver, self.settings.clone());
    cg.pricer_mut().set_critical(self.critical);
    let outcome = cg.solve(&mut self.master)?;
    self.critical = cg.pricer().critical();
    debug!(bounds=?self.master.vehicles(), ?outcome, "vehicle node solved");
    self.outcome = Some(outcome);
    Ok(())
  }

  fn objective(&self) -> f64 {
    match self.outcome {
      Some(ColGenOutcome::Optimal { objective, .. }) => objective,
      _ => f64::INFINITY,
    }
  }

  fn is_infeasible(&self) -> bool { self.vehicles().is_none() }

  fn is_integer(&self) -> bool { self.vehicles().map_or(false, is_integral) }

  fn split(&self) -> Result<(Self, Self)> {
    let v = self.vehicles().ok_or_else(|| anyhow::anyhow!("cannot branch on an unsolved or infeasible node"))?;
    let bounds = self.master.vehicles();
    let down = VehicleBounds { lo: bounds.lo, hi: v.floor() as usize };
    let up = VehicleBounds { lo: v.ceil() as usize, hi: bounds.hi };
    trace!(v, ?down, ?up, "branching on vehicle count");
    Ok((self.child(down), self.child(up)))
  }
}


/// Node of the route-selection search over a fixed column pool. Branches by fixing the most
/// fractional route to 0 or 1.
#[derive(Debug, Clone)]
pub struct SelectionNode<'a, S> {
  master: RestrictedMaster<'a>,
  solver: S,
  solution: Option<LpSolution>,
}

impl<'a, S: MasterSolver + Clone> SelectionNode<'a, S> {
  pub fn new(master: RestrictedMaster<'a>, solver: S) -> Self {
    SelectionNode { master, solver, solution: None }
  }

  pub fn master(&self) -> &RestrictedMaster<'a> { &self.master }

  /// LP value of each route column.
  pub fn values(&self) -> Option<&[f64]> {
    self.solution.as_ref().map(|s| self.master.route_values(&s.x))
  }

  /// Pricing duals of the node LP.
  pub fn duals(&self) -> Option<Vec<f64>> {
    self.solution.as_ref().map(|s| self.master.pricing_duals(&s.duals))
  }

  fn most_fractional(&self) -> Option<usize> {
    let values = self.values()?;
    values.iter()
      .enumerate()
      .filter(|(_, &v)| !is_integral(v))
      .min_by(|(_, a), (_, b)| (*a - 0.5).abs().partial_cmp(&(*b - 0.5).abs()).unwrap_or(std::cmp::Ordering::Equal))
      .map(|(j, _)| j)
  }
}

impl<'a, S: MasterSolver + Clone> BbNode for SelectionNode<'a, S> {
  fn solve(&mut self) -> Result<()> {
    let sol = self.solver.solve(&self.master.to_lp())?;
    self.solution = if sol.is_optimal() && !self.master.uses_penalty(&sol.x, INTEGRALITY_TOL) {
      Some(sol)
    } else {
      None
    };
    Ok(())
  }

  fn objective(&self) -> f64 {
    self.solution.as_ref().map_or(f64::INFINITY, |s| s.objective)
  }

  fn is_infeasible(&self) -> bool { self.solution.is_none() }

  fn is_integer(&self) -> bool {
    self.values().map_or(false, |vals| vals.iter().all(|&v| is_integral(v)))
  }

  fn split(&self) -> Result<(Self, Self)> {
    let j = self.most_fractional().ok_or_else(|| anyhow::anyhow!("no fractional route to branch on"))?;
    trace!(column=j, path=?self.master.columns()[j].path, "branching on route");
    let mut zero = SelectionNode::new(self.master.clone(), self.solver.clone());
    zero.master.fix(j, 0.0);
    let mut one = SelectionNode::new(self.master.clone(), self.solver.clone());
    one.master.fix(j, 1.0);
    Ok((zero, one))
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::bb::{branch_and_bound, SearchLimits};
  use crate::colgen::tests::FOUR_NODES_OPT;
  use crate::colgen::Relaxation;
  use crate::data::tests::four_nodes;
  use crate::init_test_logging;
  use crate::master::{Column, DenseSimplex};

  #[test]
  fn vehicle_search_on_four_nodes() -> Result<()> {
    let _g = init_test_logging(None::<&str>);
    let p = four_nodes();
    let settings = ColGenSettings { relaxation: Relaxation::Exact, ..ColGenSettings::default() };
    let root = VehicleNode::new(&p, DenseSimplex::default(), settings);
    let out = branch_and_bound(root, &SearchLimits::default())?;
    let best = out.incumbent.unwrap();
    assert!(best.is_integer());
    assert!((best.objective() - FOUR_NODES_OPT).abs() < 1e-6);
    Ok(())
  }

  #[test]
  fn vehicle_split_bounds() -> Result<()> {
    let p = four_nodes();
    let mut node = VehicleNode::new(&p, DenseSimplex::default(), ColGenSettings::default());
    node.outcome = Some(ColGenOutcome::Optimal { objective: 1.0, values: vec![], duals: vec![], vehicles: 1.5, iterations: 1 });
    assert!(!node.is_integer());
    let (down, up) = node.split()?;
    assert_eq!(down.master().vehicles(), VehicleBounds { lo: 0, hi: 1 });
    assert_eq!(up.master().vehicles(), VehicleBounds { lo: 2, hi: 2 });
    assert!(down.outcome().is_none());
    Ok(())
  }

  /// Three customers, every pair of them forms a route: the LP picks all pairs at 1/2.
  #[test]
  fn selection_resolves_odd_cycle() -> Result<()> {
    let _g = init_test_logging(None::<&str>);
    let customers = vec![
      Customer::new(0, (0., 0.), 0, (0., 1000.), 0.),
      Customer::new(1, (10., 0.), 1, (0., 1000.), 0.),
      Customer::new(2, (-5., 8.66), 1, (0., 1000.), 0.),
      Customer::new(3, (-5., -8.66), 1, (0., 1000.), 0.),
    ];
    let p = Problem::euclidean("triangle", 3, 2, customers)?;
    let columns: Vec<_> = vec![vec![0, 1, 2, 0], vec![0, 2, 3, 0], vec![0, 3, 1, 0], vec![0, 1, 0], vec![0, 2, 0], vec![0, 3, 0]]
      .into_iter()
      .map(|path| Column { cost: p.route_cost(&path), path })
      .collect();
    let master = RestrictedMaster::with_columns(&p, columns);
    let mut root = SelectionNode::new(master, DenseSimplex::default());
    root.solve()?;
    assert!(!root.is_integer());
    let lp_bound = root.objective();

    let out = branch_and_bound(SelectionNode::new(root.master().clone(), DenseSimplex::default()), &SearchLimits::default())?;
    let best = out.incumbent.unwrap();
    assert!(best.is_integer());
    assert!(best.objective() >= lp_bound - 1e-9);
    // one pair plus the remaining singleton
    let integer_opt = [([0, 1, 2, 0], [0, 3, 0]), ([0, 2, 3, 0], [0, 1, 0]), ([0, 3, 1, 0], [0, 2, 0])]
      .iter()
      .map(|(pair, single)| p.route_cost(pair) + p.route_cost(single))
      .fold(f64::INFINITY, f64::min);
    assert!((best.objective() - integer_opt).abs() < 1e-6);
    let used = best.values().unwrap().iter().filter(|&&v| v > 0.5).count();
    assert_eq!(used, 2);
    Ok(())
  }
}
