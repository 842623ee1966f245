//! Best-first branch-and-bound over nodes which know how to solve their own relaxation and split
//! themselves in two.
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::time::{Duration, Instant};
use anyhow::Result;
use tracing::*;

mod nodes;
pub use nodes::{VehicleNode, SelectionNode};

/// Two objectives closer than this are treated as equal when pruning.
const BOUND_EPS: f64 = 1e-9;

pub trait BbNode: Sized {
  /// Solves the node's relaxation. Called exactly once per node, before any other method.
  fn solve(&mut self) -> Result<()>;

  /// Relaxation value, a lower bound for every integer point below this node.
  fn objective(&self) -> f64;

  fn is_infeasible(&self) -> bool;

  fn is_integer(&self) -> bool;

  /// Two children partitioning the node's remaining search space.
  fn split(&self) -> Result<(Self, Self)>;
}

#[derive(Debug, Clone, Default)]
pub struct SearchLimits {
  pub max_nodes: Option<usize>,
  pub time_limit: Option<Duration>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchStats {
  /// Nodes popped from the queue and processed.
  pub nodes_explored: usize,
  pub nodes_solved: usize,
  pub pruned_bound: usize,
  pub pruned_infeasible: usize,
  pub incumbent_updates: usize,
  pub root_bound: Option<f64>,
  pub limit_reached: bool,
  pub time_total: Duration,
}

impl fmt::Display for SearchStats {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "Branch-and-bound statistics:")?;
    writeln!(f, "  Nodes explored:        {}", self.nodes_explored)?;
    writeln!(f, "  Nodes solved:          {}", self.nodes_solved)?;
    writeln!(f, "  Pruned (bound):        {}", self.pruned_bound)?;
    writeln!(f, "  Pruned (infeasible):   {}", self.pruned_infeasible)?;
    writeln!(f, "  Incumbent updates:     {}", self.incumbent_updates)?;
    match self.root_bound {
      Some(b) => writeln!(f, "  Root bound:            {}", b)?,
      None => writeln!(f, "  Root bound:            infeasible")?,
    }
    writeln!(f, "  Limit reached:         {}", self.limit_reached)?;
    writeln!(f, "  Total time:            {:.2?}", self.time_total)
  }
}

#[derive(Debug)]
pub struct BbOutcome<N> {
  pub incumbent: Option<N>,
  pub stats: SearchStats,
}

struct Queued<N> {
  bound: f64,
  seq: u64,
  node: N,
}

impl<N> PartialEq for Queued<N> {
  fn eq(&self, other: &Self) -> bool { self.cmp(other) == Ordering::Equal }
}

impl<N> Eq for Queued<N> {}

impl<N> PartialOrd for Queued<N> {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl<N> Ord for Queued<N> {
  // BinaryHeap is a max-heap: smallest bound first, then oldest first.
  fn cmp(&self, other: &Self) -> Ordering {
    other.bound.partial_cmp(&self.bound)
      .unwrap_or(Ordering::Equal)
      .then_with(|| other.seq.cmp(&self.seq))
  }
}

struct Search<N> {
  heap: BinaryHeap<Queued<N>>,
  seq: u64,
  stats: SearchStats,
}

impl<N: BbNode> Search<N> {
  fn solve_and_push(&mut self, mut node: N) -> Result<()> {
    node.solve()?;
    self.stats.nodes_solved += 1;
    if node.is_infeasible() {
      self.stats.pruned_infeasible += 1;
      trace!("infeasible node discarded");
      return Ok(());
    }
    let bound = node.objective();
    self.heap.push(Queued { bound, seq: self.seq, node });
    self.seq += 1;
    Ok(())
  }
}

/// Best-first search from `root`. Each node is solved before it is queued; children of a popped
/// node are only created if its bound is below the incumbent. Stops when the queue is empty or a
/// limit is hit and returns the best integer node found.
#[instrument(level="info", skip(root, limits))]
pub fn branch_and_bound<N: BbNode>(root: N, limits: &SearchLimits) -> Result<BbOutcome<N>> {
  let start = Instant::now();
  let mut search = Search { heap: BinaryHeap::new(), seq: 0, stats: SearchStats::default() };
  let mut incumbent: Option<N> = None;
  let mut best = f64::INFINITY;

  search.solve_and_push(root)?;
  search.stats.root_bound = search.heap.peek().map(|q| q.bound);

  while !search.heap.is_empty() {
    if limits.max_nodes.map_or(false, |m| search.stats.nodes_explored >= m)
      || limits.time_limit.map_or(false, |t| start.elapsed() >= t) {
      search.stats.limit_reached = true;
      warn!(explored=search.stats.nodes_explored, open=search.heap.len(), "search limit reached");
      break;
    }
    let Queued { bound, node, .. } = match search.heap.pop() {
      Some(q) => q,
      None => break,
    };
    search.stats.nodes_explored += 1;

    if node.is_integer() {
      if bound < best {
        debug!(objective=bound, previous=best, "new incumbent");
        best = bound;
        incumbent = Some(node);
        search.stats.incumbent_updates += 1;
      } else {
        search.stats.pruned_bound += 1;
      }
      continue;
    }
    if bound >= best - BOUND_EPS {
      search.stats.pruned_bound += 1;
      continue;
    }

    let (left, right) = node.split()?;
    search.solve_and_push(left)?;
    search.solve_and_push(right)?;
  }

  search.stats.time_total = start.elapsed();
  info!(best, stats=?search.stats, "branch-and-bound finished");
  Ok(BbOutcome { incumbent, stats: search.stats })
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::init_test_logging;
  use proptest::prelude::*;

  /// 0/1 knapsack as minimisation of negative value; the relaxation is the greedy fractional fill.
  #[derive(Debug, Clone)]
  struct Knapsack {
    values: Vec<f64>,
    weights: Vec<f64>,
    capacity: f64,
    fixed: Vec<Option<bool>>,
    x: Vec<f64>,
    objective: f64,
    infeasible: bool,
  }

  impl Knapsack {
    fn new(values: Vec<f64>, weights: Vec<f64>, capacity: f64) -> Self {
      let n = values.len();
      Knapsack { values, weights, capacity, fixed: vec![None; n], x: vec![0.0; n], objective: 0.0, infeasible: false }
    }

    fn fractional(&self) -> Option<usize> {
      self.x.iter().position(|&v| v > 1e-9 && v < 1.0 - 1e-9)
    }

    fn with_fixed(&self, i: usize, value: bool) -> Self {
      let mut child = self.clone();
      child.fixed[i] = Some(value);
      child
    }
  }

  impl BbNode for Knapsack {
    fn solve(&mut self) -> Result<()> {
      let n = self.values.len();
      self.x = vec![0.0; n];
      let mut room = self.capacity;
      for i in 0..n {
        if self.fixed[i] == Some(true) {
          self.x[i] = 1.0;
          room -= self.weights[i];
        }
      }
      self.infeasible = room < 0.0;
      let mut free: Vec<usize> = (0..n).filter(|&i| self.fixed[i].is_none()).collect();
      free.sort_by(|&a, &b| (self.values[b] / self.weights[b]).partial_cmp(&(self.values[a] / self.weights[a])).unwrap());
      for i in free {
        if room <= 0.0 { break; }
        let take = (room / self.weights[i]).min(1.0);
        self.x[i] = take;
        room -= take * self.weights[i];
      }
      self.objective = -self.x.iter().zip(&self.values).map(|(x, v)| x * v).sum::<f64>();
      Ok(())
    }

    fn objective(&self) -> f64 { self.objective }

    fn is_infeasible(&self) -> bool { self.infeasible }

    fn is_integer(&self) -> bool { self.fractional().is_none() }

    fn split(&self) -> Result<(Self, Self)> {
      let i = self.fractional().ok_or_else(|| anyhow::anyhow!("nothing to branch on"))?;
      Ok((self.with_fixed(i, false), self.with_fixed(i, true)))
    }
  }

  fn enumerate(values: &[f64], weights: &[f64], capacity: f64) -> f64 {
    let n = values.len();
    (0..1u32 << n)
      .filter(|s| (0..n).filter(|i| s & (1 << i) != 0).map(|i| weights[i]).sum::<f64>() <= capacity)
      .map(|s| -(0..n).filter(|i| s & (1 << i) != 0).map(|i| values[i]).sum::<f64>())
      .fold(f64::INFINITY, f64::min)
  }

  #[test]
  fn small_knapsack() -> Result<()> {
    let _g = init_test_logging(None::<&str>);
    let values = vec![10.0, 13.0, 7.0, 8.0];
    let weights = vec![5.0, 7.0, 4.0, 3.0];
    let out = branch_and_bound(Knapsack::new(values.clone(), weights.clone(), 10.0), &SearchLimits::default())?;
    let best = out.incumbent.expect("knapsack always has the empty solution");
    assert_eq!(best.objective(), enumerate(&values, &weights, 10.0));
    assert_eq!(best.objective(), -21.0);
    assert!(out.stats.root_bound.unwrap() <= -21.0);
    assert!(!out.stats.limit_reached);
    assert!(out.stats.incumbent_updates >= 1);
    Ok(())
  }

  #[test]
  fn infeasible_root() -> Result<()> {
    let mut root = Knapsack::new(vec![1.0], vec![2.0], 1.0);
    root.fixed[0] = Some(true);
    let out = branch_and_bound(root, &SearchLimits::default())?;
    assert!(out.incumbent.is_none());
    assert_eq!(out.stats.root_bound, None);
    assert_eq!(out.stats.pruned_infeasible, 1);
    assert_eq!(out.stats.nodes_explored, 0);
    Ok(())
  }

  #[test]
  fn node_limit() -> Result<()> {
    let root = Knapsack::new(vec![10.0, 13.0, 7.0, 8.0], vec![5.0, 7.0, 4.0, 3.0], 10.0);
    let out = branch_and_bound(root, &SearchLimits { max_nodes: Some(0), time_limit: None })?;
    assert!(out.stats.limit_reached);
    assert!(out.incumbent.is_none());
    assert_eq!(out.stats.nodes_solved, 1);
    Ok(())
  }

  #[test]
  fn queue_order() {
    let mut heap = BinaryHeap::new();
    for (seq, &bound) in [3.0, 1.0, 2.0, 1.0].iter().enumerate() {
      heap.push(Queued { bound, seq: seq as u64, node: () });
    }
    let order: Vec<_> = std::iter::from_fn(|| heap.pop()).map(|q| (q.bound, q.seq)).collect();
    assert_eq!(order, vec![(1.0, 1), (1.0, 3), (2.0, 2), (3.0, 0)]);
  }

  proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]
    #[test]
    fn matches_enumeration(items in prop::collection::vec((1u32..30, 1u32..20), 1..9), capacity in 1u32..60) {
      let values: Vec<f64> = items.iter().map(|&(v, _)| v as f64).collect();
      let weights: Vec<f64> = items.iter().map(|&(_, w)| w as f64).collect();
      let out = branch_and_bound(Knapsack::new(values.clone(), weights.clone(), capacity as f64), &SearchLimits::default()).unwrap();
      let best = out.incumbent.unwrap();
      prop_assert!((best.objective() - enumerate(&values, &weights, capacity as f64)).abs() < 1e-9);
      prop_assert!(out.stats.root_bound.unwrap() <= best.objective() + 1e-9);
    }
  }
}
