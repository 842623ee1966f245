use std::fmt;
use std::iter::FromIterator;
use crate::utils::Biterator;

const CUSTSET_WORDS: usize = 2;

/// Largest number of locations (depot included) a [`CustomerSet`] can hold.
pub const MAX_LOCATIONS: usize = CUSTSET_WORDS * 128;

/// Fixed-size bitset over location indices.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Default)]
pub struct CustomerSet([u128; CUSTSET_WORDS]);

impl CustomerSet {
  pub fn new() -> Self {
    Self([0u128; CUSTSET_WORDS])
  }

  /// The set `{0, 1, ..., n - 1}`.
  pub fn first_n(n: usize) -> Self {
    debug_assert!(n <= MAX_LOCATIONS);
    let mut words = [0u128; CUSTSET_WORDS];
    for (k, w) in words.iter_mut().enumerate() {
      let lo = k * 128;
      if n >= lo + 128 {
        *w = u128::MAX;
      } else if n > lo {
        *w = (1u128 << (n - lo)) - 1;
      }
    }
    Self(words)
  }

  #[inline]
  fn word_bit_index(i: usize) -> (usize, u32) {
    (i >> 7, (i & 0x7f) as u32)
  }

  #[inline]
  pub fn insert(&mut self, i: usize) {
    let (word_index, bit_index) = Self::word_bit_index(i);
    self.0[word_index] |= 1 << bit_index;
  }

  #[inline]
  pub fn remove(&mut self, i: usize) {
    let (word_index, bit_index) = Self::word_bit_index(i);
    self.0[word_index] &= !(1 << bit_index);
  }

  #[inline]
  pub fn contains(&self, i: usize) -> bool {
    let (word_index, bit_index) = Self::word_bit_index(i);
    (self.0[word_index] & (1 << bit_index)) != 0
  }

  #[inline]
  pub fn is_subset(&self, other: &Self) -> bool {
    self.0.iter().zip(other.0.iter()).all(|(x, y)| x & !y == 0)
  }

  pub fn union_inplace(&mut self, other: &Self) {
    self.0.iter_mut().zip(other.0.iter()).for_each(|(x, y)| *x |= y);
  }

  pub fn len(&self) -> usize {
    self.0.iter().map(|w| w.count_ones() as usize).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.0.iter().all(|&w| w == 0)
  }

  pub fn iter<'a>(&'a self) -> impl Iterator<Item=usize> + 'a {
    self.0.iter()
      .enumerate()
      .map(|(k, &bits)| Biterator::new(bits).map(move |i| i as usize + (k << 7)))
      .flatten()
  }

  pub fn to_vec(&self) -> Vec<usize> {
    self.iter().collect()
  }
}

impl fmt::Debug for CustomerSet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_set()
      .entries(self.iter())
      .finish()
  }
}

impl FromIterator<usize> for CustomerSet {
  fn from_iter<I: IntoIterator<Item=usize>>(iter: I) -> Self {
    let mut set = Self::new();
    set.extend(iter);
    set
  }
}

impl Extend<usize> for CustomerSet {
  fn extend<I: IntoIterator<Item=usize>>(&mut self, iter: I) {
    for i in iter {
      self.insert(i);
    }
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;

  #[test]
  fn first_n() {
    assert!(CustomerSet::first_n(0).is_empty());
    assert_eq!(CustomerSet::first_n(3).to_vec(), vec![0, 1, 2]);
    assert_eq!(CustomerSet::first_n(128).len(), 128);
    assert_eq!(CustomerSet::first_n(130).len(), 130);
    assert!(CustomerSet::first_n(130).contains(129));
    assert!(!CustomerSet::first_n(130).contains(130));
    assert_eq!(CustomerSet::first_n(MAX_LOCATIONS).len(), MAX_LOCATIONS);
  }

  #[test]
  fn subset_and_union() {
    let a: CustomerSet = vec![1, 5, 200].into_iter().collect();
    let mut b: CustomerSet = vec![5].into_iter().collect();
    assert!(b.is_subset(&a));
    assert!(!a.is_subset(&b));
    assert!(a.is_subset(&a));
    b.union_inplace(&a);
    assert_eq!(b, a);
    b.remove(200);
    assert_eq!(b.to_vec(), vec![1, 5]);
    assert_eq!(format!("{:?}", b), "{1, 5}");
  }

  proptest! {
    #[test]
    fn matches_sorted_vec(mut vec in prop::collection::vec(0..MAX_LOCATIONS, 0..40)) {
      let set: CustomerSet = vec.iter().cloned().collect();
      vec.sort();
      vec.dedup();
      prop_assert_eq!(set.len(), vec.len());
      prop_assert_eq!(set.to_vec(), vec);
    }
  }
}
