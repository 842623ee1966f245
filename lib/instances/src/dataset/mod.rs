use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use anyhow::Result;
use lazy_static::lazy_static;
use crate::Error;
use std::borrow::Cow;


pub trait IdxNameMap {
  fn index_to_name(&self, idx: usize) -> Result<Cow<str>>;

  fn name_to_index(&self, name: &str) -> Result<usize>;

  fn len(&self) -> usize;

  fn check_idx(&self, idx: usize) -> Result<()> {
    if self.len() <= idx {
      Err(Error::IndexOutOfRange.into())
    } else {
      Ok(())
    }
  }
}


impl<'a, D: IdxNameMap> IdxNameMap for &'a D {
  fn index_to_name(&self, idx: usize) -> Result<Cow<str>> {
    D::index_to_name(self, idx)
  }

  fn name_to_index(&self, name: &str) -> Result<usize> {
    D::name_to_index(self, name)
  }

  fn len(&self) -> usize {
    D::len(self)
  }
}

pub trait Dataset: IdxNameMap + Sync {
  type Instance;
  fn load_instance(&self, idx: usize) -> Result<Self::Instance>;
}


impl<'a, D: Dataset> Dataset for &'a D {
  type Instance = D::Instance;

  fn load_instance(&self, idx: usize) -> Result<Self::Instance> {
    D::load_instance(self, idx)
  }
}


/// A dataset made of every file under `$DATA_ROOT/<dir>` matching a glob pattern.
/// Instances are indexed in the (sorted) order the glob yields them and named by file stem.
pub struct DynLayout<D> {
  _marker: PhantomData<D>,
  name_order: Vec<PathBuf>,
  name_to_idx_map: HashMap<String, usize>,
}

impl<D> DynLayout<D> {
  fn new(dir: impl AsRef<Path>, patt: &str) -> Result<Self> {
    let root = std::env::var("DATA_ROOT").expect("environment variable DATA_ROOT must be defined");
    Self::from_dir(Path::new(&root).join(dir), patt)
  }

  pub fn from_dir(dir: impl AsRef<Path>, patt: &str) -> Result<Self> {
    let mut p = dir.as_ref().to_string_lossy().into_owned();
    p.push('/');
    p.push_str(patt);

    let names : std::result::Result<Vec<PathBuf>, _> = glob::glob(&p)?.collect();
    let name_order = names?;
    let name_to_idx_map: Result<HashMap<_, _>> = name_order.iter()
      .enumerate()
      .map(|(k, p)| {
        let n = p.file_stem().ok_or_else(|| anyhow::anyhow!("missing file stem: {:?}", p))?;
        Ok((n.to_string_lossy().into_owned(), k))
      })
      .collect();
    let name_to_idx_map = name_to_idx_map?;
    Ok(DynLayout {
      _marker: Default::default(),
      name_order,
      name_to_idx_map
    })
  }

  pub fn path(&self, idx: usize) -> Result<&Path> {
    self.check_idx(idx)?;
    Ok(&self.name_order[idx])
  }
}

impl<D> IdxNameMap for DynLayout<D> {
  fn index_to_name(&self, idx: usize) -> Result<Cow<str>> {
    self.check_idx(idx)?;
    let name = self.name_order[idx].file_stem()
      .ok_or_else(|| anyhow::anyhow!("missing file stem for idx {}", idx))?;
    Ok(name.to_string_lossy())
  }

  fn name_to_index(&self, name: &str) -> Result<usize> {
    let idx = *self.name_to_idx_map.get(name).ok_or(Error::UnkownInstanceName)?;
    Ok(idx)
  }

  fn len(&self) -> usize { self.name_order.len() }
}


pub mod solomon;


fn pretty_unwrap<T>(r: Result<T>) -> T {
  match r {
    Err(e) => panic!("{:?}", e),
    Ok(t) => t
  }
}

lazy_static!{
  /// Solomon benchmark files, `$DATA_ROOT/solomon/*.txt`.
  pub static ref SOLOMON: DynLayout<solomon::SolomonTxt> = {
    pretty_unwrap(DynLayout::new("solomon", "*.txt"))
  };
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn layout_from_dir() -> Result<()> {
    let dir = std::env::temp_dir().join(format!("instances-layout-{}", std::process::id()));
    std::fs::create_dir_all(&dir)?;
    for name in &["b", "a"] {
      let mut f = std::fs::File::create(dir.join(format!("{}.txt", name)))?;
      f.write_all(solomon::tests::TOY.as_bytes())?;
    }
    std::fs::File::create(dir.join("ignored.csv"))?;

    let layout = DynLayout::<solomon::SolomonTxt>::from_dir(&dir, "*.txt")?;
    assert_eq!(layout.len(), 2);
    assert_eq!(layout.index_to_name(0)?, "a");
    assert_eq!(layout.name_to_index("b")?, 1);
    assert!(layout.name_to_index("ignored").is_err());
    assert!(layout.index_to_name(2).is_err());

    let inst = layout.load_instance(1)?;
    assert_eq!(inst.id, "b");
    assert_eq!(inst.customers.len(), 4);

    std::fs::remove_dir_all(&dir)?;
    Ok(())
  }
}
