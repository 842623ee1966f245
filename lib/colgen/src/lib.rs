use std::fmt;
use std::path::Path;
use fnv::{FnvHashMap, FnvHashSet};

pub mod data;
pub mod espprc;
pub mod master;
pub mod colgen;
pub mod bb;
mod solve;
pub use solve::*;

pub type Map<K, V> = FnvHashMap<K, V>;
pub type Set<T> = FnvHashSet<T>;


/// Internal-logic and input-shape failures. Infeasible extensions and infeasible instances are
/// ordinary results and never show up here.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    TooManyLocations { locations: usize, max: usize },
    MatrixShape { locations: usize, shape: (usize, usize) },
    LocationIndex { position: usize, index: usize },
    DualLength { expected: usize, got: usize },
    PricingStalled { repeated: Vec<usize> },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TooManyLocations { locations, max } =>
                write!(f, "instance has {} locations, at most {} are supported", locations, max),
            Error::MatrixShape { locations, shape } =>
                write!(f, "expected a {0}x{0} matrix, got {1}x{2}", locations, shape.0, shape.1),
            Error::LocationIndex { position, index } =>
                write!(f, "location at position {} has index {}", position, index),
            Error::DualLength { expected, got } =>
                write!(f, "expected {} dual values, got {}", expected, got),
            Error::PricingStalled { repeated } =>
                write!(f, "bug - decremental relaxation repeated a cycle on {:?} without growing the critical set", repeated),
        }
    }
}

impl std::error::Error for Error {}


mod logging_setup {
    use super::*;
    use tracing_subscriber::{EnvFilter, fmt, registry, prelude::*};
    use tracing_appender::{non_blocking, non_blocking::WorkerGuard};
    use std::fs::OpenOptions;

    fn build_and_set_global_subscriber<P>(logfile: Option<P>, is_test : bool) -> anyhow::Result<Option<WorkerGuard>> where
        P : AsRef<Path>
    {
        let stderr_log = fmt::layer().with_writer(std::io::stderr);
        let env_filter = EnvFilter::from_default_env();
        let r = registry().with(stderr_log).with(env_filter);

        let flush_guard = match logfile {
            Some(p) => {
                let logfile = OpenOptions::new()
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(p)?;
                let (writer, _guard) = non_blocking::NonBlockingBuilder::default()
                    .lossy(false)
                    .finish(logfile);
                let json = fmt::layer()
                    .json()
                    .with_span_list(true)
                    .with_current_span(false)
                    .with_writer(writer);

                let r = r.with(json);
                if is_test { r.try_init().ok(); }
                else { r.try_init()?; }
                Some(_guard)
            },
            None => {
                if is_test { r.try_init().ok(); }
                else { r.try_init()?; }
                None
            }
        };
        return Ok(flush_guard)
    }

    /// Installs the global subscriber: human-readable output on stderr filtered by `RUST_LOG`,
    /// plus newline-delimited JSON in `logfile` if given. Keep the guard alive until exit.
    pub fn init_logging(logfile: Option<impl AsRef<Path>>) -> anyhow::Result<Option<WorkerGuard>> {
        return build_and_set_global_subscriber(logfile, false);
    }

    #[allow(dead_code)]
    pub(crate) fn init_test_logging(logfile: Option<impl AsRef<Path>>) -> Option<WorkerGuard> {
        return build_and_set_global_subscriber(logfile, true).ok().flatten();
    }
}
pub use logging_setup::*;


pub(crate) mod utils {
    use num;
    use std::ops::ShrAssign;

    /// Iterates over the positions of the set bits of an unsigned integer, lowest first.
    pub struct Biterator<B> {
        bits : B,
        ones : u32,
        next_index: u32,
    }

    impl<B : num::Unsigned + num::PrimInt> Biterator<B> {
        pub fn new(val : B) -> Self {
            Self{ bits: val, ones: 0, next_index: 0 }
        }
    }

    impl<B : num::Unsigned + num::Zero + num::PrimInt + ShrAssign + From<u32>> Iterator for Biterator<B> {
        type Item = u32;

        fn next(&mut self) -> Option<Self::Item> {
            if self.ones > 0 {
                let val = self.next_index;
                self.ones -= 1;
                self.next_index += 1;
                return Some(val);
            } else if self.bits.is_zero() {
                return None;
            } else {
                let nz = self.bits.trailing_zeros();
                self.bits >>= nz.into();
                self.next_index += nz;
                let no = (!self.bits).trailing_zeros();
                self.ones = no;
                // shifting by the full width overflows
                if no as usize >= std::mem::size_of::<B>() * 8 {
                    self.bits = B::zero();
                } else {
                    self.bits >>= no.into();
                }
                return self.next();
            }
        }
    }


}
