mod solomon;
pub use solomon::SolomonFmt;


mod nom_prelude {
  pub use nom::{
    IResult,
    error::{
      self,
      ParseError,
    },
    sequence::*,
    multi::*,
    combinator::*,
    character::complete::*,
    bytes::complete::tag,
    number::complete::double,
    Finish,
  };
}

mod common;

pub trait ParseInstance<Fmt>: Sized {
  fn parse(inputs: Fmt) -> crate::Result<Self>;
}
