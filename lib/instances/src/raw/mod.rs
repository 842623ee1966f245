pub mod solomon;
use std::borrow::Cow;

pub trait FromRaw<T> where Self: Sized {
  fn from_raw(raw: T, id: Cow<str>) -> crate::Result<Self>;
}


pub mod metrics {
  use num_traits::{AsPrimitive, Num};
  use fnv::FnvHashMap;

  pub trait Metric {
    const SYM: bool = false;

    fn compute<T: Num + AsPrimitive<f64>>(p1: (T, T), p2: (T, T)) -> f64;
  }


  pub struct Euclidean();

  impl Metric for Euclidean {
    const SYM: bool = true;

    fn compute<T: Num + AsPrimitive<f64>>(p1: (T, T), p2: (T, T)) -> f64 {
      let a = p1.0.as_() - p2.0.as_();
      let b = p1.1.as_() - p2.1.as_();
      (a*a + b*b).sqrt()
    }
  }

  /// Compute the distance-matrix for the given coordinates, keyed by `(from, to)` position.
  pub fn dist_matrix<M, T>(_metric: M, coords: &[(T, T)]) -> FnvHashMap<(usize, usize), f64>
    where
      M: Metric,
      T: Num + AsPrimitive<f64> + Copy,
  {
    let n = coords.len();
    let mut matrix = FnvHashMap::with_capacity_and_hasher(n * n, Default::default());
    for i in 0..n {
      let p1 = coords[i];
      let start = if M::SYM { i } else { 0 };
      for j in start..n {
        let d = M::compute(p1, coords[j]);
        matrix.insert((i, j), d);
        if M::SYM {
          matrix.insert((j, i), d);
        }
      }
    }
    matrix
  }

}
