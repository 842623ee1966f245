use super::nom_prelude::*;
use std::num::ParseIntError;
use std::str::FromStr;

pub fn usize_<'a, E>(input: &'a str) -> IResult<&'a str, usize, E>
  where
    E: ParseError<&'a str> + error::FromExternalError<&'a str, ParseIntError>
{
  map_res(digit1, usize::from_str)(input)
}

pub fn u32_<'a, E>(input: &'a str) -> IResult<&'a str, u32, E>
  where
    E: ParseError<&'a str> + error::FromExternalError<&'a str, ParseIntError>
{
  map_res(digit1, u32::from_str)(input)
}

/// Consumes the remainder of the current line, including the line ending.
pub fn skip_line<'a, E>(input: &'a str) -> IResult<&'a str, (), E>
  where
    E: ParseError<&'a str>
{
  value((), terminated(not_line_ending, line_ending))(input)
}
