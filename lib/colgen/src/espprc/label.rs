use std::ops::{Index, IndexMut};
use super::*;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct LabelId(u32);

impl LabelId {
  #[inline]
  pub fn raw(&self) -> u32 { self.0 }
}

/// Variant-specific resource carried by a label next to cost, load and time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExtraResource {
  /// Elementarity is enforced through the label's unreachable set.
  None,
  VisitCount(u32),
  Critical { visited: u32, critical_visited: CustomerSet },
}

/// A partial path from the depot to `customer` and its resource consumption.
#[derive(Debug, Clone)]
pub struct Label {
  pub customer: usize,
  pub cost: Cost,
  pub load: Demand,
  pub time: Time,
  pub prev: Option<LabelId>,
  /// Customers that can no longer be reached from this state.
  pub unreachable: CustomerSet,
  pub extra: ExtraResource,
  alive: bool,
}

impl Label {
  /// Zero-resource label at the start depot.
  pub fn depot<P: ResourceExtensionPolicy + ?Sized>(policy: &P) -> Label {
    Label {
      customer: DEPOT,
      cost: 0.0,
      load: 0,
      time: 0.0,
      prev: None,
      unreachable: CustomerSet::new(),
      extra: policy.initial_resource(),
      alive: true,
    }
  }

  #[inline]
  pub fn is_alive(&self) -> bool { self.alive }

  #[inline]
  pub(crate) fn kill(&mut self) { self.alive = false }

  /// A label which has returned to the depot.
  #[inline]
  pub fn is_terminal(&self) -> bool { self.customer == DEPOT && self.prev.is_some() }

  /// Extends this label (stored as `id`) to `to`. Returns `None` if capacity, the time window at `to`
  /// or the policy resource is violated.
  ///
  /// The unreachable set of the result only holds what the move itself rules out; the caller merges in
  /// this label's set.
  pub fn extend<P: ResourceExtensionPolicy + ?Sized>(
    &self,
    id: Option<LabelId>,
    to: &Customer,
    problem: &Problem,
    duals: &[f64],
    policy: &P,
  ) -> Option<Label> {
    let from = self.customer;
    let load = self.load.checked_add(to.demand).filter(|&q| q <= problem.capacity)?;
    let time = (self.time + problem.times[[from, to.index]]).max(to.tw_start);
    if time > to.tw_end {
      return None;
    }
    let extra = policy.extend_resource(self, to.index, problem.n())?;
    let cost = self.cost + problem.costs[[from, to.index]] - duals[from];

    let unreachable = if to.index == DEPOT {
      CustomerSet::first_n(problem.customers.len())
    } else if policy.marks_visited() {
      let mut s = CustomerSet::new();
      s.insert(to.index);
      s
    } else {
      CustomerSet::new()
    };

    Some(Label { customer: to.index, cost, load, time, prev: id, unreachable, extra, alive: true })
  }

  /// `self` is no worse than `other` in every resource. Labels with identical resources dominate each other.
  pub fn dominates(&self, other: &Label) -> bool {
    if !(self.cost <= other.cost && self.load <= other.load && self.time <= other.time) {
      return false;
    }
    match (&self.extra, &other.extra) {
      (ExtraResource::None, ExtraResource::None) =>
        self.unreachable.is_subset(&other.unreachable),
      (ExtraResource::VisitCount(a), ExtraResource::VisitCount(b)) =>
        a <= b,
      (ExtraResource::Critical { visited: a, critical_visited: ca },
        ExtraResource::Critical { visited: b, critical_visited: cb }) =>
        a <= b && ca.is_subset(cb),
      _ => false,
    }
  }

  /// Re-extends `path` from a fresh depot label. `None` if the path does not start at the depot or
  /// some step is infeasible.
  pub fn replay<P: ResourceExtensionPolicy + ?Sized>(path: &[usize], problem: &Problem, duals: &[f64], policy: &P) -> Option<Label> {
    let (&first, rest) = path.split_first()?;
    if first != DEPOT {
      return None;
    }
    let mut label = Label::depot(policy);
    for &i in rest {
      if i == label.customer || label.unreachable.contains(i) {
        return None;
      }
      let mut next = label.extend(None, problem.customers.get(i)?, problem, duals, policy)?;
      next.unreachable.union_inplace(&label.unreachable);
      label = next;
    }
    Some(label)
  }
}

/// Owns every label created during one pricing run. `prev` links index into it.
#[derive(Debug, Clone, Default)]
pub struct LabelArena {
  labels: Vec<Label>,
}

impl LabelArena {
  pub fn new() -> Self { Self::default() }

  pub fn push(&mut self, label: Label) -> LabelId {
    debug_assert!(self.labels.len() < u32::MAX as usize, "label arena full");
    let id = LabelId(self.labels.len() as u32);
    self.labels.push(label);
    id
  }

  pub fn clear(&mut self) { self.labels.clear() }

  pub fn len(&self) -> usize { self.labels.len() }

  pub fn is_empty(&self) -> bool { self.labels.is_empty() }

  /// Customer sequence from the depot to the label `id`.
  pub fn path(&self, id: LabelId) -> Vec<usize> {
    let mut path = Vec::new();
    let mut cur = Some(id);
    while let Some(k) = cur {
      let label = &self[k];
      path.push(label.customer);
      cur = label.prev;
    }
    path.reverse();
    path
  }
}

impl Index<LabelId> for LabelArena {
  type Output = Label;

  #[inline]
  fn index(&self, id: LabelId) -> &Label { &self.labels[id.0 as usize] }
}

impl IndexMut<LabelId> for LabelArena {
  #[inline]
  fn index_mut(&mut self, id: LabelId) -> &mut Label { &mut self.labels[id.0 as usize] }
}
