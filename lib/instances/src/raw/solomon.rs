pub type Time = f64;
pub type Demand = u32;

/// One location row of a Solomon file, in file order. Row 0 is the depot.
#[derive(Debug, Clone, PartialEq)]
pub struct SolomonRow {
  pub id: usize,
  pub coords: (f64, f64),
  pub demand: Demand,
  pub ready_time: Time,
  pub due_date: Time,
  pub service_time: Time,
}

pub struct Solomon {
  pub name: String,
  pub num_vehicles: usize,
  pub vehicle_capacity: Demand,
  pub rows: Vec<SolomonRow>,
}
