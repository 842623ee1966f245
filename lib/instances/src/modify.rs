use anyhow::Result;
use super::dataset::*;
use super::dataset::solomon::{truncate_customers, VrptwInstance};
use std::borrow::Cow;

pub trait DSetModify: Sized {
  /// Keep the depot and the first `customers` customers of every instance.
  fn truncated(self, customers: usize) -> Truncated<Self>;
}

impl<D: Dataset<Instance=VrptwInstance>> DSetModify for D {
  fn truncated(self, customers: usize) -> Truncated<D> { Truncated { input: self, customers } }
}

/// Names follow the `R101.25` convention: `<name>.<customers>`.
pub struct Truncated<D> {
  input: D,
  customers: usize,
}

impl<D: IdxNameMap> IdxNameMap for Truncated<D> {
  fn index_to_name(&self, idx: usize) -> Result<Cow<str>> {
    let name = self.input.index_to_name(idx)?;
    Ok(Cow::Owned(format!("{}.{}", name, self.customers)))
  }

  fn name_to_index(&self, name: &str) -> Result<usize> {
    let suffix = format!(".{}", self.customers);
    let base = name.strip_suffix(suffix.as_str()).unwrap_or(name);
    self.input.name_to_index(base)
  }

  #[inline]
  fn len(&self) -> usize { self.input.len() }
}

impl<D: Dataset<Instance=VrptwInstance>> Dataset for Truncated<D> {
  type Instance = VrptwInstance;

  fn load_instance(&self, idx: usize) -> Result<VrptwInstance> {
    Ok(truncate_customers(self.input.load_instance(idx)?, self.customers))
  }
}
