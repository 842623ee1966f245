use json;
use std::path::PathBuf;
use std::time::Duration;
use anyhow::Result;
use tracing::*;

use colgen::{init_logging, run, Config, InstanceSource, Outcome, Route};
use colgen::bb::SearchLimits;
use colgen::colgen::{ColGenSettings, Relaxation};
use colgen::data::Demand;

mod common;
use common::*;

use structopt::StructOpt;

fn parse_instance(s: &str) -> Result<InstanceSource, String> {
  match s.parse::<usize>() {
    Ok(idx) => Ok(InstanceSource::Solomon(idx)),
    Err(_) => Ok(InstanceSource::Path(PathBuf::from(s))),
  }
}

fn parse_seconds(s: &str) -> Result<Duration, String> {
  let secs: f64 = s.parse().map_err(|e: std::num::ParseFloatError| e.to_string())?;
  if !secs.is_finite() || secs < 0.0 {
    return Err(format!("{} is not a valid number of seconds", s));
  }
  Ok(Duration::from_secs_f64(secs))
}

#[derive(Debug, StructOpt)]
struct ClArgs {
    /// Solomon-format file, or an index into `$DATA_ROOT/solomon`.
    #[structopt(parse(try_from_str=parse_instance))]
    instance: InstanceSource,
    /// Keep only the first N customers.
    #[structopt(long, validator=clap_range_validator(Some(1), None))]
    customers: Option<usize>,
    #[structopt(long, short="k")]
    vehicles: Option<usize>,
    #[structopt(long, short="q")]
    capacity: Option<Demand>,
    #[structopt(long, short="r", parse(try_from_str), possible_values=&["exact", "ssr", "dssr"], default_value="dssr")]
    relaxation: Relaxation,
    /// Report the root LP instead of an integer solution.
    #[structopt(long="no-branch", parse(from_flag=std::ops::Not::not))]
    branch: bool,
    #[structopt(long)]
    max_nodes: Option<usize>,
    /// Wall-clock limit in seconds for each search phase.
    #[structopt(long, parse(try_from_str=parse_seconds))]
    time_limit: Option<Duration>,
    #[structopt(long, default_value="1000", validator=clap_range_validator(Some(1), None))]
    max_iterations: usize,
    #[structopt(long, default_value="50", validator=clap_range_validator(Some(1), None))]
    max_columns: usize,
    #[structopt(flatten)]
    output: OutputOptions,
}

impl ClArgs {
  fn config(&self) -> Config {
    Config {
      instance: self.instance.clone(),
      customers: self.customers,
      vehicles: self.vehicles,
      capacity: self.capacity,
      colgen: ColGenSettings {
        relaxation: self.relaxation,
        max_iterations: self.max_iterations,
        max_columns_per_iteration: self.max_columns,
        ..ColGenSettings::default()
      },
      branch_and_bound: self.branch,
      limits: SearchLimits { max_nodes: self.max_nodes, time_limit: self.time_limit },
    }
  }
}


fn route_record(r: &Route) -> json::JsonValue {
    return json::object! {
        path: json::JsonValue::from(r.path.clone()),
        cost: r.cost,
        reduced_cost: r.reduced_cost,
        weight: r.weight,
    }
}

struct Report(Outcome);

impl JsonReport for Report {
  fn summary(&self) -> json::JsonValue {
    match &self.0 {
      Outcome::Solved(s) => json::object! {
        status: "solved",
        instance: s.instance.clone(),
        objective: s.objective,
        lower_bound: s.lower_bound,
        integral: s.integral,
        num_routes: s.routes.len(),
        columns: s.columns,
        nodes: s.nodes_explored,
      },
      Outcome::Infeasible => json::object! { status: "infeasible" },
    }
  }

  fn full(&self) -> json::JsonValue {
    let mut root = self.summary();
    if let Outcome::Solved(s) = &self.0 {
      let routes: Vec<json::JsonValue> = s.routes.iter().map(route_record).collect();
      root["routes"] = routes.into();
    }
    root
  }
}


fn main() -> anyhow::Result<()> {
    let args : ClArgs = StructOpt::from_args();
    let _g = init_logging(args.output.log.clone())?;
    debug!(?args);
    let outcome = run(&args.config())?;
    if outcome == Outcome::Infeasible {
        info!("no feasible set of routes");
    }
    args.output.emit(&Report(outcome))?;
    Ok(())
}
