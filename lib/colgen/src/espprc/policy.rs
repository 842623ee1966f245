use super::*;

/// Decides the variant-specific part of a label extension: what extra resource the new label carries,
/// whether the move is allowed at all, and whether arriving at a customer closes it off for the rest
/// of the path.
pub trait ResourceExtensionPolicy {
  fn initial_resource(&self) -> ExtraResource;

  /// `None` if moving from `from` to `to` is forbidden by the policy's resource.
  fn extend_resource(&self, from: &Label, to: usize, num_customers: usize) -> Option<ExtraResource>;

  /// Visiting a customer makes it unreachable afterwards.
  fn marks_visited(&self) -> bool { false }
}

/// Exact pricing: the unreachable set doubles as the visited set.
#[derive(Debug, Clone, Copy, Default)]
pub struct Elementary;

impl ResourceExtensionPolicy for Elementary {
  fn initial_resource(&self) -> ExtraResource { ExtraResource::None }

  fn extend_resource(&self, _from: &Label, _to: usize, _num_customers: usize) -> Option<ExtraResource> {
    Some(ExtraResource::None)
  }

  fn marks_visited(&self) -> bool { true }
}

#[inline]
fn next_count(count: u32, to: usize, num_customers: usize) -> Option<u32> {
  if to == DEPOT {
    Some(count)
  } else if count as usize >= num_customers {
    None
  } else {
    Some(count + 1)
  }
}

/// State-space relaxation: only the number of customer visits is tracked, bounded by the number of customers.
#[derive(Debug, Clone, Copy, Default)]
pub struct VisitCount;

impl ResourceExtensionPolicy for VisitCount {
  fn initial_resource(&self) -> ExtraResource { ExtraResource::VisitCount(0) }

  fn extend_resource(&self, from: &Label, to: usize, num_customers: usize) -> Option<ExtraResource> {
    match from.extra {
      ExtraResource::VisitCount(c) => next_count(c, to, num_customers).map(ExtraResource::VisitCount),
      _ => None,
    }
  }
}

/// Visit counting plus elementarity restricted to the customers in `critical`.
#[derive(Debug, Clone, Default)]
pub struct CriticalVisit {
  pub critical: CustomerSet,
}

impl CriticalVisit {
  pub fn new(critical: CustomerSet) -> Self { CriticalVisit { critical } }
}

impl ResourceExtensionPolicy for CriticalVisit {
  fn initial_resource(&self) -> ExtraResource {
    ExtraResource::Critical { visited: 0, critical_visited: CustomerSet::new() }
  }

  fn extend_resource(&self, from: &Label, to: usize, num_customers: usize) -> Option<ExtraResource> {
    match from.extra {
      ExtraResource::Critical { visited, mut critical_visited } => {
        let visited = next_count(visited, to, num_customers)?;
        if self.critical.contains(to) {
          if critical_visited.contains(to) {
            return None;
          }
          critical_visited.insert(to);
        }
        Some(ExtraResource::Critical { visited, critical_visited })
      }
      _ => None,
    }
  }
}
