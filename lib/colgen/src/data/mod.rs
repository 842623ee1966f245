use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use anyhow::Result;
use ndarray::Array2;
use itertools::Itertools;
use instances::dataset::solomon::{CustomerRecord, VrptwInstance};
use instances::raw::metrics::{dist_matrix, Euclidean};

use crate::{Error, Set};
use crate::espprc::MAX_LOCATIONS;

pub use instances::dataset::solomon::{Time, Demand};
pub type Cost = f64;

pub const DEPOT: usize = 0;

/// A location of the routing graph. Customers are ordered, compared and hashed by `index` only.
#[derive(Debug, Clone)]
pub struct Customer {
  pub index: usize,
  pub coords: (f64, f64),
  pub demand: Demand,
  pub tw_start: Time,
  pub tw_end: Time,
  pub service_time: Time,
}

impl Customer {
  pub fn new(index: usize, coords: (f64, f64), demand: Demand, time_window: (Time, Time), service_time: Time) -> Self {
    Customer { index, coords, demand, tw_start: time_window.0, tw_end: time_window.1, service_time }
  }
}

impl From<&CustomerRecord> for Customer {
  fn from(r: &CustomerRecord) -> Self {
    Customer::new(r.index, r.coords, r.demand, (r.ready_time, r.due_date), r.service_time)
  }
}

impl PartialEq for Customer {
  fn eq(&self, other: &Self) -> bool { self.index == other.index }
}

impl Eq for Customer {}

impl PartialOrd for Customer {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for Customer {
  fn cmp(&self, other: &Self) -> Ordering { self.index.cmp(&other.index) }
}

impl Hash for Customer {
  fn hash<H: Hasher>(&self, state: &mut H) { self.index.hash(state) }
}


/// Read-only data of one VRPTW instance. `times[[i, j]]` already includes the service time at `i`.
#[derive(Debug, Clone)]
pub struct Problem {
  pub id: String,
  pub vehicles: usize,
  pub capacity: Demand,
  pub customers: Vec<Customer>,
  pub costs: Array2<Cost>,
  pub times: Array2<Time>,
}

impl Problem {
  pub fn new(id: impl Into<String>,
             vehicles: usize,
             capacity: Demand,
             customers: Vec<Customer>,
             costs: Array2<Cost>,
             times: Array2<Time>) -> Result<Problem> {
    let locations = customers.len();
    if locations > MAX_LOCATIONS {
      return Err(Error::TooManyLocations { locations, max: MAX_LOCATIONS }.into());
    }
    if let Some((position, c)) = customers.iter().enumerate().find(|(k, c)| c.index != *k) {
      return Err(Error::LocationIndex { position, index: c.index }.into());
    }
    for m in &[&costs, &times] {
      if m.dim() != (locations, locations) {
        return Err(Error::MatrixShape { locations, shape: m.dim() }.into());
      }
    }
    Ok(Problem { id: id.into(), vehicles, capacity, customers, costs, times })
  }

  /// Costs are Euclidean distances; travel times are distances plus the service time at the origin.
  pub fn euclidean(id: impl Into<String>, vehicles: usize, capacity: Demand, customers: Vec<Customer>) -> Result<Problem> {
    let coords = customers.iter().map(|c| c.coords).collect_vec();
    let dist = dist_matrix(Euclidean(), &coords);
    let n = customers.len();
    let costs = Array2::from_shape_fn((n, n), |(i, j)| dist[&(i, j)]);
    let times = Array2::from_shape_fn((n, n), |(i, j)| dist[&(i, j)] + customers[i].service_time);
    Problem::new(id, vehicles, capacity, customers, costs, times)
  }

  pub fn from_instance(data: &VrptwInstance) -> Result<Problem> {
    let customers = data.customers.iter().map(Customer::from).collect_vec();
    let n = customers.len();
    let mut costs = Array2::zeros((n, n));
    for ((i, j), &d) in &data.distance {
      if *i < n && *j < n {
        costs[[*i, *j]] = d;
      }
    }
    let times = Array2::from_shape_fn((n, n), |(i, j)| costs[[i, j]] + customers[i].service_time);
    Problem::new(data.id.clone(), data.vehicles, data.capacity, customers, costs, times)
  }

  /// Number of customers, excluding the depot.
  #[inline]
  pub fn n(&self) -> usize { self.customers.len() - 1 }

  #[inline]
  pub fn depot(&self) -> &Customer { &self.customers[DEPOT] }

  /// Sum of arc costs along `path`.
  pub fn route_cost(&self, path: &[usize]) -> Cost {
    path.iter().tuple_windows().map(|(&i, &j)| self.costs[[i, j]]).sum()
  }
}

/// Customers that occur more than once in `path`, ignoring the closing depot.
pub fn repeated_customers(path: &[usize]) -> Vec<usize> {
  let body = match path.split_last() {
    Some((_, body)) => body,
    None => return Vec::new(),
  };
  let mut seen = Set::default();
  let mut repeated = Set::default();
  for &i in body {
    if !seen.insert(i) {
      repeated.insert(i);
    }
  }
  repeated.into_iter().sorted().collect()
}

#[inline]
pub fn is_elementary(path: &[usize]) -> bool {
  repeated_customers(path).is_empty()
}
