use std::path::Path;
use crate::Result;
use crate::raw::solomon::*;
use super::{
  ParseInstance,
  nom_prelude::*
};

#[derive(Debug, Copy, Clone)]
pub struct SolomonFmt<P>(pub P);

impl<P: AsRef<Path>> ParseInstance<SolomonFmt<P>> for Solomon {
  fn parse(path: SolomonFmt<P>) -> Result<Solomon> {
    let path = path.0.as_ref();
    let data = std::fs::read_to_string(path)?;
    Solomon::parse_str(&data)
  }
}

impl Solomon {
  pub fn parse_str(data: &str) -> Result<Solomon> {
    match parsers::solomon(data).finish() {
      Ok((_, instance)) => Ok(instance),
      Err(e) => Err(
        anyhow::Error::msg(error::convert_error(data, e))
      ),
    }
  }
}


mod parsers {
  use super::*;
  use crate::parsers::common::*;

  type VerboseResult<'a, T> = IResult<&'a str, T, error::VerboseError<&'a str>>;

  //     1      45         68         10        912        967         90
  fn row(input: &str) -> VerboseResult<SolomonRow> {
    let dbl_space = |i| terminated(double, space1)(i);
    let (input, (id, x, y, demand, ready_time, due_date, service_time)) = tuple((
      terminated(usize_, space1),
      dbl_space,
      dbl_space,
      terminated(u32_, space1),
      dbl_space,
      dbl_space,
      double,
    ))(input)?;

    Ok((input, SolomonRow { id, coords: (x, y), demand, ready_time, due_date, service_time }))
  }

  pub fn solomon(input: &str) -> VerboseResult<Solomon> {
    let (input, name) = error::context("name", preceded(multispace0, not_line_ending))(input)?;

    let (input, _) = error::context("vehicle header", tuple((
      multispace1, tag("VEHICLE"),
      multispace1, tag("NUMBER"), space1, tag("CAPACITY"),
      multispace1,
    )))(input)?;
    let (input, (num_vehicles, vehicle_capacity)) = separated_pair(usize_, space1, u32_)(input)?;

    let (input, _) = error::context("customer header", tuple((
      multispace1, tag("CUSTOMER"), space0, line_ending,
      space0, tag("CUST"), skip_line,
    )))(input)?;

    let (input, rows) = error::context("customer rows", many1(preceded(multispace0, row)))(input)?;
    let (input, _) = tuple((multispace0, eof))(input)?;

    Ok((input, Solomon {
      name: name.trim().to_string(),
      num_vehicles,
      vehicle_capacity,
      rows,
    }))
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::dataset::solomon::tests::TOY;

  #[test]
  fn toy() -> Result<()> {
    let raw = Solomon::parse_str(TOY)?;
    assert_eq!(raw.name, "TOY4");
    assert_eq!(raw.num_vehicles, 2);
    assert_eq!(raw.vehicle_capacity, 50);
    assert_eq!(raw.rows.len(), 4);
    assert_eq!(raw.rows[3], SolomonRow {
      id: 3,
      coords: (3.0, 3.0),
      demand: 30,
      ready_time: 6.0,
      due_date: 11.0,
      service_time: 0.0,
    });
    Ok(())
  }

  #[test]
  fn trailing_whitespace() -> Result<()> {
    let data = TOY.replace("\n", "   \n") + "\n\n";
    let raw = Solomon::parse_str(&data)?;
    assert_eq!(raw.rows.len(), 4);
    Ok(())
  }

  #[test]
  fn missing_vehicle_section() {
    let data = TOY.replace("VEHICLE", "VEHICLES?");
    assert!(Solomon::parse_str(&data).is_err());
  }
}
