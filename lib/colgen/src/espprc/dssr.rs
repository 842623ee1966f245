use anyhow::Result;
use tracing::*;
use super::*;
use crate::Error;

/// Decremental state-space relaxation. Solves the relaxed problem, makes the customers repeated on
/// the cheapest path critical and solves again until that path is elementary.
///
/// The critical set of the engine's policy persists, so later calls (with other duals) start from
/// what earlier calls learned.
#[instrument(level="debug", skip(engine, duals))]
pub fn solve_dssr(engine: &mut LabelingEngine<CriticalVisit>, duals: &[f64]) -> Result<Vec<PricedPath>> {
  let n = engine.problem().n();
  let mut rounds = 0;
  loop {
    rounds += 1;
    let paths = engine.solve(duals)?;
    let repeated = match paths.first() {
      Some(best) => repeated_customers(&best.path),
      None => return Ok(paths),
    };
    if repeated.is_empty() {
      debug!(rounds, critical=?engine.policy().critical, "elementary path found");
      return Ok(paths);
    }

    let critical = &mut engine.policy_mut().critical;
    let before = critical.len();
    critical.extend(repeated.iter().copied());
    if critical.len() == before || rounds > n {
      return Err(Error::PricingStalled { repeated }.into());
    }
    trace!(?repeated, critical=?critical, "cycle found");
  }
}


#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use crate::init_test_logging;
  use proptest::prelude::*;

  /// Customers 1 and 2 next to the depot, 3 far away.
  fn cycle_bait() -> Problem {
    let customers = vec![
      Customer::new(0, (0., 0.), 0, (0., 1000.), 0.),
      Customer::new(1, (1., 0.), 1, (0., 1000.), 0.),
      Customer::new(2, (0., 1.), 1, (0., 1000.), 0.),
      Customer::new(3, (30., 30.), 1, (0., 1000.), 0.),
    ];
    Problem::euclidean("cycle", 3, 100, customers).unwrap()
  }

  #[test]
  fn critical_set_breaks_cycle() -> Result<()> {
    let _g = init_test_logging(None::<&str>);
    let p = cycle_bait();
    let duals = [0.0, 100.0, 1.0, 0.0];

    let relaxed = LabelingEngine::new(&p, VisitCount).solve(&duals)?;
    assert_eq!(relaxed[0].path, vec![0, 1, 2, 1, 0]);

    let mut engine = LabelingEngine::new(&p, CriticalVisit::default());
    let paths = solve_dssr(&mut engine, &duals)?;
    assert_eq!(paths[0].path, vec![0, 1, 0]);
    assert_eq!(engine.policy().critical.to_vec(), vec![1]);
    assert!((paths[0].reduced_cost - (-98.0)).abs() < 1e-9);

    let exact = LabelingEngine::new(&p, Elementary).solve(&duals)?;
    assert!((exact[0].reduced_cost - paths[0].reduced_cost).abs() < 1e-9);

    // already critical: one round suffices
    let again = solve_dssr(&mut engine, &duals)?;
    assert_eq!(again[0].reduced_cost, paths[0].reduced_cost);
    Ok(())
  }

  fn brute_force_min(p: &Problem, duals: &[f64]) -> Option<Cost> {
    fn dfs(p: &Problem, duals: &[f64], path: &mut Vec<usize>, best: &mut Option<Cost>) {
      if path.len() > 1 {
        path.push(DEPOT);
        if let Some(l) = Label::replay(path, p, duals, &Elementary) {
          if best.map_or(true, |b| l.cost < b) {
            *best = Some(l.cost);
          }
        }
        path.pop();
      }
      for i in 1..=p.n() {
        if !path.contains(&i) {
          path.push(i);
          dfs(p, duals, path, best);
          path.pop();
        }
      }
    }
    let mut best = None;
    dfs(p, duals, &mut vec![DEPOT], &mut best);
    best
  }

  pub(crate) fn random_instance() -> impl Strategy<Value=(Problem, Vec<f64>)> {
    let customer = (0u8..20, 0u8..20, 1u32..10, 0u32..40, 5u32..40, 0u32..3);
    (prop::collection::vec(customer, 3..=5), 10u32..30, prop::collection::vec(0u32..30, 6), -10i32..=0)
      .prop_map(|(rows, capacity, customer_duals, depot_dual)| {
        let mut customers = vec![Customer::new(0, (10., 10.), 0, (0., 200.), 0.)];
        for (k, (x, y, q, a, w, s)) in rows.into_iter().enumerate() {
          customers.push(Customer::new(k + 1, (x as f64, y as f64), q, (a as f64, (a + w) as f64), s as f64));
        }
        let n = customers.len();
        let mut duals = vec![depot_dual as f64];
        duals.extend(customer_duals.into_iter().take(n - 1).map(|d| d as f64));
        (Problem::euclidean("random", n, capacity, customers).unwrap(), duals)
      })
  }

  proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]
    #[test]
    fn relaxation_ordering((p, duals) in random_instance()) {
      init_test_logging(None::<&str>);
      let exact = LabelingEngine::new(&p, Elementary).solve(&duals).unwrap();
      let ssr = LabelingEngine::new(&p, VisitCount).solve(&duals).unwrap();
      let mut dssr_engine = LabelingEngine::new(&p, CriticalVisit::default());
      let dssr = solve_dssr(&mut dssr_engine, &duals).unwrap();

      match brute_force_min(&p, &duals) {
        None => {
          prop_assert!(exact.is_empty());
          prop_assert!(dssr.is_empty());
        }
        Some(best) => {
          prop_assert!((exact[0].reduced_cost - best).abs() < 1e-6);
          prop_assert!(ssr[0].reduced_cost <= exact[0].reduced_cost + 1e-6);
          prop_assert!(dssr[0].is_elementary());
          prop_assert!((dssr[0].reduced_cost - exact[0].reduced_cost).abs() < 1e-6);
        }
      }

      for path in &exact {
        prop_assert!(path.is_elementary());
        let l = Label::replay(&path.path, &p, &duals, &Elementary).unwrap();
        prop_assert_eq!((l.cost, l.load, l.time), (path.reduced_cost, path.load, path.time));
      }
      for path in &ssr {
        let l = Label::replay(&path.path, &p, &duals, &VisitCount).unwrap();
        prop_assert_eq!((l.cost, l.load, l.time), (path.reduced_cost, path.load, path.time));
      }
    }
  }
}
