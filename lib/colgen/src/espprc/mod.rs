//! Resource-constrained shortest path pricing: the exact elementary labeling algorithm and its
//! state-space relaxations.
use crate::data::*;

mod custset;
mod label;
mod policy;
mod engine;
mod dssr;

pub use custset::{CustomerSet, MAX_LOCATIONS};
pub use label::{Label, LabelArena, LabelId, ExtraResource};
pub use policy::{ResourceExtensionPolicy, Elementary, VisitCount, CriticalVisit};
pub use engine::{LabelingEngine, EngineStats};
pub use dssr::solve_dssr;

/// A depot-to-depot path found by the labeling engine.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedPath {
  pub path: Vec<usize>,
  pub reduced_cost: Cost,
  pub load: Demand,
  pub time: Time,
}

impl PricedPath {
  pub fn is_elementary(&self) -> bool { is_elementary(&self.path) }
}
