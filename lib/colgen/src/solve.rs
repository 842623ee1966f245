use std::path::PathBuf;
use anyhow::{bail, Result};
use tracing::*;
use instances::dataset::{Dataset, SOLOMON};
use instances::dataset::solomon::{truncate_customers, VrptwInstance};
use instances::modify::DSetModify;

use crate::bb::{branch_and_bound, BbNode, SearchLimits, SelectionNode, VehicleNode};
use crate::colgen::{ColGenOutcome, ColGenSettings, ColumnGeneration};
use crate::data::*;
use crate::master::{DenseSimplex, RestrictedMaster, VehicleBounds};

const WEIGHT_TOL: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub enum InstanceSource {
  /// A Solomon-format file.
  Path(PathBuf),
  /// Index into the `SOLOMON` dataset.
  Solomon(usize),
}

#[derive(Debug, Clone)]
pub struct Config {
  pub instance: InstanceSource,
  /// Keep only the first `n` customers.
  pub customers: Option<usize>,
  pub vehicles: Option<usize>,
  pub capacity: Option<Demand>,
  pub colgen: ColGenSettings,
  /// If false, stop after column generation at the root and report the LP solution.
  pub branch_and_bound: bool,
  /// Applied to each of the two search phases separately.
  pub limits: SearchLimits,
}

impl Config {
  pub fn new(instance: InstanceSource) -> Self {
    Config {
      instance,
      customers: None,
      vehicles: None,
      capacity: None,
      colgen: ColGenSettings::default(),
      branch_and_bound: true,
      limits: SearchLimits::default(),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
  pub path: Vec<usize>,
  pub cost: Cost,
  /// Reduced cost under the duals of the final LP.
  pub reduced_cost: Cost,
  pub weight: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
  pub instance: String,
  pub objective: Cost,
  pub lower_bound: Cost,
  /// Routes with positive weight, cheapest first.
  pub routes: Vec<Route>,
  /// Every route weight is 0 or 1.
  pub integral: bool,
  /// Size of the column pool the solution was picked from.
  pub columns: usize,
  pub nodes_explored: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
  Solved(Solution),
  Infeasible,
}

/// Loads the instance named by `config` and applies its overrides.
pub fn load_problem(config: &Config) -> Result<Problem> {
  let data = match (&config.instance, config.customers) {
    (InstanceSource::Path(p), Some(n)) => truncate_customers(VrptwInstance::load(p)?, n),
    (InstanceSource::Path(p), None) => VrptwInstance::load(p)?,
    (InstanceSource::Solomon(idx), Some(n)) => (&*SOLOMON).truncated(n).load_instance(*idx)?,
    (InstanceSource::Solomon(idx), None) => SOLOMON.load_instance(*idx)?,
  };
  let mut problem = Problem::from_instance(&data)?;
  if let Some(v) = config.vehicles {
    problem.vehicles = v;
  }
  if let Some(q) = config.capacity {
    problem.capacity = q;
  }
  info!(id=%problem.id, customers=problem.n(), vehicles=problem.vehicles, capacity=problem.capacity, "loaded instance");
  Ok(problem)
}

pub fn run(config: &Config) -> Result<Outcome> {
  let problem = load_problem(config)?;
  solve(&problem, config)
}

fn is_integral(values: &[f64]) -> bool {
  values.iter().all(|v| (v - v.round()).abs() <= WEIGHT_TOL)
}

fn collect_solution(master: &RestrictedMaster, values: &[f64], duals: &[f64], objective: Cost, lower_bound: Cost, nodes_explored: usize) -> Solution {
  let mut routes: Vec<_> = master.columns().iter()
    .zip(values)
    .filter(|(_, &w)| w > WEIGHT_TOL)
    .map(|(col, &weight)| Route {
      path: col.path.clone(),
      cost: col.cost,
      reduced_cost: master.reduced_cost(col, duals),
      weight,
    })
    .collect();
  routes.sort_by(|a, b| a.cost.partial_cmp(&b.cost).unwrap_or(std::cmp::Ordering::Equal));
  Solution {
    instance: master.problem().id.clone(),
    objective,
    lower_bound,
    routes,
    integral: is_integral(values),
    columns: master.num_columns(),
    nodes_explored,
  }
}

/// Solves `problem` with the relaxation and search settings of `config`; the instance fields of
/// `config` are ignored.
///
/// With branching, a search on the vehicle count first closes the column pool, then a second search
/// fixes routes of that pool to 0 or 1 until every weight is integral.
#[instrument(level="info", skip(problem, config))]
pub fn solve(problem: &Problem, config: &Config) -> Result<Outcome> {
  if !config.branch_and_bound {
    let mut master = RestrictedMaster::new(problem);
    let mut cg = ColumnGeneration::new(problem, DenseSimplex::default(), config.colgen.clone());
    return match cg.solve(&mut master)? {
      ColGenOutcome::Infeasible => Ok(Outcome::Infeasible),
      ColGenOutcome::Optimal { objective, values, duals, .. } =>
        Ok(Outcome::Solved(collect_solution(&master, &values, &duals, objective, objective, 0))),
    };
  }

  let root = VehicleNode::new(problem, DenseSimplex::default(), config.colgen.clone());
  let search = branch_and_bound(root, &config.limits)?;
  let node = match search.incumbent {
    Some(node) => node,
    None if search.stats.limit_reached => bail!("search limit reached before an integral vehicle count was found"),
    None => {
      info!("instance is infeasible");
      return Ok(Outcome::Infeasible);
    }
  };
  let lower_bound = if search.stats.limit_reached {
    search.stats.root_bound.unwrap_or_else(|| node.objective())
  } else {
    node.objective()
  };
  let nodes_explored = search.stats.nodes_explored;
  debug!(lower_bound, columns=node.master().num_columns(), "vehicle search finished");

  let mut master = node.master().clone();
  master.set_vehicles(VehicleBounds { lo: 0, hi: problem.vehicles });
  let sol = select_routes(master, &config.limits, lower_bound, nodes_explored)?;
  Ok(Outcome::Solved(sol))
}

/// Branch-and-bound over the columns of `master` alone. Fails if no integral selection is found,
/// so a fractional point is never reported as a solution.
fn select_routes(master: RestrictedMaster, limits: &SearchLimits, lower_bound: Cost, nodes_explored: usize) -> Result<Solution> {
  let selection = branch_and_bound(SelectionNode::new(master, DenseSimplex::default()), limits)?;
  let nodes_explored = nodes_explored + selection.stats.nodes_explored;
  let best = match selection.incumbent {
    Some(best) => best,
    None if selection.stats.limit_reached => bail!("search limit reached before an integral route selection was found"),
    None => bail!("no integral route selection found"),
  };
  let (values, duals) = match (best.values(), best.duals()) {
    (Some(v), Some(d)) => (v.to_vec(), d),
    _ => bail!("selection incumbent has no LP solution"),
  };
  Ok(collect_solution(best.master(), &values, &duals, best.objective(), lower_bound, nodes_explored))
}
