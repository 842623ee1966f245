use super::*;
use anyhow::Context;
use crate::parsers::{ParseInstance, SolomonFmt};
use crate::raw::solomon::{Solomon, SolomonRow};
use crate::Map;
use crate::raw::{
  metrics::{dist_matrix, Euclidean},
  FromRaw
};

pub use crate::raw::solomon::{Time, Demand};

/// A location of a VRPTW instance. The location at position 0 is the depot.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRecord {
  pub index: usize,
  pub coords: (f64, f64),
  pub demand: Demand,
  pub ready_time: Time,
  pub due_date: Time,
  pub service_time: Time,
}

impl From<SolomonRow> for CustomerRecord {
  fn from(row: SolomonRow) -> Self {
    CustomerRecord {
      index: row.id,
      coords: row.coords,
      demand: row.demand,
      ready_time: row.ready_time,
      due_date: row.due_date,
      service_time: row.service_time,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VrptwInstance {
  pub id: String,
  pub vehicles: usize,
  pub capacity: Demand,
  pub customers: Vec<CustomerRecord>,
  /// Euclidean distance between locations, keyed by `(from, to)` index.
  pub distance: Map<(usize, usize), f64>,
}

impl FromRaw<Solomon> for VrptwInstance {
  fn from_raw(raw: Solomon, id: Cow<str>) -> Result<VrptwInstance> {
    if raw.rows.is_empty() {
      return Err(Error::MissingDepot.into());
    }
    if raw.rows.iter().enumerate().any(|(k, row)| row.id != k) {
      return Err(Error::NonSequentialIds.into());
    }

    let coords: Vec<_> = raw.rows.iter().map(|r| r.coords).collect();
    let distance = dist_matrix(Euclidean(), &coords);

    Ok(VrptwInstance {
      id: id.into_owned(),
      vehicles: raw.num_vehicles,
      capacity: raw.vehicle_capacity,
      customers: raw.rows.into_iter().map(CustomerRecord::from).collect(),
      distance,
    })
  }
}

impl VrptwInstance {
  pub fn load(path: impl AsRef<Path>) -> Result<VrptwInstance> {
    let path = path.as_ref();
    let raw = Solomon::parse(SolomonFmt(path)).with_context(|| format!("failed to load {:?}", path))?;
    let id = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or(Cow::Borrowed(""));
    VrptwInstance::from_raw(raw, id)
  }

  /// Number of customers, excluding the depot.
  pub fn n(&self) -> usize { self.customers.len() - 1 }
}

/// Keep the depot and the first `n` customers (the `R101.25` convention).
pub fn truncate_customers(mut data: VrptwInstance, n: usize) -> VrptwInstance {
  if n >= data.n() {
    return data;
  }
  data.customers.truncate(n + 1);
  data.distance.retain(|&(i, j), _| i <= n && j <= n);
  data.id = format!("{}.{}", data.id, n);
  data
}

pub enum SolomonTxt {}

impl Dataset for DynLayout<SolomonTxt> {
  type Instance = VrptwInstance;

  fn load_instance(&self, idx: usize) -> Result<Self::Instance> {
    VrptwInstance::load(self.path(idx)?)
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;

  pub(crate) const TOY: &str = "TOY4

VEHICLE
NUMBER     CAPACITY
   2          50

CUSTOMER
CUST NO.  XCOORD.   YCOORD.    DEMAND   READY TIME  DUE DATE   SERVICE   TIME

    0       0          0          0          0         20          0
    1       0          1         20          5          6          0
    2       2          0         20          1          3          0
    3       3          3         30          6         11          0
";

  fn toy() -> Result<VrptwInstance> {
    VrptwInstance::from_raw(Solomon::parse_str(TOY)?, Cow::Borrowed("toy"))
  }

  #[test]
  fn from_raw() -> Result<()> {
    let data = toy()?;
    assert_eq!(data.n(), 3);
    assert_eq!(data.vehicles, 2);
    assert_eq!(data.customers[2].ready_time, 1.0);
    assert!((data.distance[&(0, 3)] - 18f64.sqrt()).abs() < 1e-9);
    Ok(())
  }

  #[test]
  fn truncate() -> Result<()> {
    let data = truncate_customers(toy()?, 2);
    assert_eq!(data.id, "toy.2");
    assert_eq!(data.n(), 2);
    assert_eq!(data.distance.len(), 9);
    assert!(!data.distance.contains_key(&(0, 3)));

    let data = truncate_customers(toy()?, 10);
    assert_eq!(data.n(), 3);
    Ok(())
  }

  #[test]
  fn reject_gaps_in_ids() -> Result<()> {
    let mut raw = Solomon::parse_str(TOY)?;
    raw.rows.remove(1);
    assert!(VrptwInstance::from_raw(raw, Cow::Borrowed("gap")).is_err());
    Ok(())
  }
}
