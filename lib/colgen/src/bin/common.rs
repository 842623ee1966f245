use std::fmt::Display;
use std::str::FromStr;
use std::path::PathBuf;
use std::io::{self, Write};
use anyhow::Result;
use structopt::StructOpt;

pub const OUTPUT_FORMAT_STRINGS: [&str; 2] = ["json", "json-summ"];

#[derive(Debug, Copy, Clone)]
pub enum OutputFormat {
    Json,
    JsonSummary,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        return match s {
            "json" => Ok(Self::Json),
            "json-summ" => Ok(Self::JsonSummary),
            _ => Err(format!("invalid string: {}", s))
        };
    }
}

/// Something the binary can print in either output format.
pub trait JsonReport {
  fn full(&self) -> json::JsonValue;
  fn summary(&self) -> json::JsonValue;
}

#[derive(Clone, Debug, StructOpt)]
pub struct OutputOptions {
  /// `json` lists every route, `json-summ` only the objective and bounds.
  #[structopt(long="format", short="f", parse(try_from_str), default_value="json-summ", possible_values=&OUTPUT_FORMAT_STRINGS)]
  pub fmt: OutputFormat,
  /// Write to this file instead of stdout.
  #[structopt(long="output", short="o")]
  pub file: Option<PathBuf>,
  /// Also write JSON logs to this file.
  #[structopt(long)]
  pub log: Option<PathBuf>,
}

impl OutputOptions {
  fn writer(&self) -> Result<Box<dyn Write>> {
    Ok(match self.file.as_ref() {
      Some(path) => Box::new(io::BufWriter::new(std::fs::File::create(path)?)),
      None => Box::new(io::stdout()),
    })
  }

  pub fn emit(&self, report: &impl JsonReport) -> Result<()> {
    let value = match self.fmt {
      OutputFormat::Json => report.full(),
      OutputFormat::JsonSummary => report.summary(),
    };
    let mut out = self.writer()?;
    value.write_pretty(&mut out, 2)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
  }
}

pub fn clap_range_validator<T>(minval: Option<T>, maxval: Option<T>) -> impl Fn(String) -> Result<(), String>
    where
        T: FromStr + PartialOrd + Display + Copy,
        T::Err: Display
{
    return move |val| {
        let x: T = val.parse().map_err(|e: T::Err| e.to_string())?;
        if let Some(y) = minval {
            if x < y { return Err(format!("must be at least {}", y)); }
        }
        if let Some(y) = maxval {
            if x > y { return Err(format!("must be at most {}", y)); }
        }
        return Ok(());
    };
}
