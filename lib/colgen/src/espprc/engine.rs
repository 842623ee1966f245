use std::collections::VecDeque;
use anyhow::Result;
use tracing::*;
use super::*;
use crate::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
  pub labels_created: usize,
  pub extensions_failed: usize,
  pub dominated_on_arrival: usize,
  pub removed_by_dominance: usize,
  pub skipped_dead: usize,
  pub depot_labels: usize,
}

/// Label-setting algorithm over the customers of `problem`. The extra resource and its extension
/// rule come from the policy `P`.
pub struct LabelingEngine<'a, P> {
  problem: &'a Problem,
  policy: P,
  arena: LabelArena,
  pools: Vec<Vec<LabelId>>,
  queue: VecDeque<LabelId>,
  stats: EngineStats,
}

impl<'a, P: ResourceExtensionPolicy> LabelingEngine<'a, P> {
  pub fn new(problem: &'a Problem, policy: P) -> Self {
    LabelingEngine {
      problem,
      policy,
      arena: LabelArena::new(),
      pools: vec![Vec::new(); problem.customers.len()],
      queue: VecDeque::new(),
      stats: EngineStats::default(),
    }
  }

  pub fn problem(&self) -> &'a Problem { self.problem }

  pub fn policy(&self) -> &P { &self.policy }

  pub fn policy_mut(&mut self) -> &mut P { &mut self.policy }

  /// Counters of the last `solve` call.
  pub fn stats(&self) -> &EngineStats { &self.stats }

  /// Labels retained at `customer` by the last `solve` call.
  pub fn retained(&self, customer: usize) -> impl Iterator<Item=&Label> + '_ {
    self.pools[customer].iter().map(move |&id| &self.arena[id])
  }

  /// Computes every non-dominated depot-to-depot path under `duals` (one per location, `duals[0]`
  /// being charged when leaving the depot), cheapest first.
  #[instrument(level="debug", skip(self, duals))]
  pub fn solve(&mut self, duals: &[f64]) -> Result<Vec<PricedPath>> {
    let locations = self.problem.customers.len();
    if duals.len() != locations {
      return Err(Error::DualLength { expected: locations, got: duals.len() }.into());
    }

    self.arena.clear();
    self.pools.iter_mut().for_each(Vec::clear);
    self.queue.clear();
    self.stats = EngineStats::default();

    let start = self.arena.push(Label::depot(&self.policy));
    self.queue.push_back(start);
    let mut extended = Vec::with_capacity(locations);

    while let Some(id) = self.queue.pop_front() {
      let from = &self.arena[id];
      if !from.is_alive() {
        self.stats.skipped_dead += 1;
        continue;
      }

      let mut unreachable = from.unreachable;
      for to in &self.problem.customers {
        if to.index == from.customer || unreachable.contains(to.index) {
          continue;
        }
        match from.extend(Some(id), to, self.problem, duals, &self.policy) {
          Some(label) => extended.push(label),
          None => {
            self.stats.extensions_failed += 1;
            unreachable.insert(to.index);
          }
        }
      }
      let grown = unreachable != self.arena[id].unreachable;
      self.arena[id].unreachable = unreachable;
      if grown && self.prune_if_dominated(id) {
        extended.clear();
        continue;
      }

      for mut label in extended.drain(..) {
        label.unreachable.union_inplace(&unreachable);
        self.insert(label);
      }
    }

    let arena = &self.arena;
    let mut paths: Vec<_> = self.pools[DEPOT].iter()
      .map(|&id| {
        let l = &arena[id];
        PricedPath { path: arena.path(id), reduced_cost: l.cost, load: l.load, time: l.time }
      })
      .collect();
    paths.sort_by(|a, b| a.reduced_cost.partial_cmp(&b.reduced_cost).unwrap_or(std::cmp::Ordering::Equal));

    self.stats.labels_created = self.arena.len();
    self.stats.depot_labels = paths.len();
    debug!(problem=%self.problem.id, stats=?self.stats, best=?paths.first().map(|p| p.reduced_cost), "labeling finished");
    Ok(paths)
  }

  /// Drops the retained label `id` from its pool if another retained label dominates it. Needed once
  /// its unreachable set has grown.
  fn prune_if_dominated(&mut self, id: LabelId) -> bool {
    let c = self.arena[id].customer;
    let arena = &self.arena;
    let label = &arena[id];
    if !self.pools[c].iter().any(|&k| k != id && arena[k].dominates(label)) {
      return false;
    }
    self.pools[c].retain(|&k| k != id);
    self.arena[id].kill();
    self.stats.removed_by_dominance += 1;
    true
  }

  /// Adds `label` to the pool of its customer unless a retained label dominates it. Retained labels
  /// dominated by the newcomer are flagged dead and dropped from the pool.
  fn insert(&mut self, label: Label) {
    let c = label.customer;
    let arena = &mut self.arena;
    if self.pools[c].iter().any(|&k| arena[k].dominates(&label)) {
      self.stats.dominated_on_arrival += 1;
      return;
    }

    let removed = &mut self.stats.removed_by_dominance;
    self.pools[c].retain(|&k| {
      if label.dominates(&arena[k]) {
        arena[k].kill();
        *removed += 1;
        false
      } else {
        true
      }
    });

    let terminal = label.is_terminal();
    let id = arena.push(label);
    self.pools[c].push(id);
    if !terminal {
      self.queue.push_back(id);
    }
  }
}
