use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use tracing::info;

mod cache;
mod cli;
mod collect;
mod commit;
mod config;
mod extract;
mod gitio;
mod linestats;
mod logging;
mod model;
mod pipe;
mod refine;
mod render;
mod util;

#[cfg(test)]
mod testutil;

use crate::cli::{normalize, Cli};
use crate::pipe::ExecTimer;

fn timing_line(total: Duration, external: Duration) -> String {
  let total_s = total.as_secs_f64();
  let external_s = external.as_secs_f64();
  let share = if total_s > 0.0 { 100.0 * external_s / total_s } else { 0.0 };
  format!(
    "Execution time {:.5} secs, {:.5} secs ({:.2} %) in external commands",
    total_s, external_s, share
  )
}

fn run() -> Result<()> {
  let started = Instant::now();
  let cli = Cli::parse();

  if cli.gen_man {
    let page = util::render_man_page::<Cli>()?;
    print!("{}", page);
    return Ok(());
  }

  logging::init(&cli.log_level);

  // Phase 1: normalize CLI and layered config
  let run = normalize(cli)?;

  // Phase 2: output directory (holds the cache)
  let out_dir = util::prepare_out_dir(&run.out_dir)?;
  info!("Output path: {}", out_dir.display());

  // Phase 3: collect, save cache, refine
  let timer = ExecTimer::new();
  let stats = collect::collect_all(&run.config, &run.gitpaths, &out_dir, &timer)?;

  // Phase 4: hand off to renderers
  let report = render::write_report(&stats, &run.config, &out_dir)?;
  info!("Report written to {}", report.display());
  if let Some(format) = run.format {
    let extra = render::write_extra(&stats, &run.config, &out_dir, format)?;
    info!("Exported {}", extra.display());
  }

  println!("{}", timing_line(started.elapsed(), timer.total()));
  Ok(())
}

fn main() {
  if let Err(e) = run() {
    eprintln!("Error: {:#}", e);
    std::process::exit(1);
  }
}
