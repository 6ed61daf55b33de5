use anyhow::Result;
use clap::Parser;

mod aggregate;
mod cli;
mod ext;
mod model;
mod render;
mod report;
mod scan;
mod source;
mod util;
mod window;

use crate::cli::{Cli, normalize};
use crate::source::fixture::FIXTURE_ENV;

fn main() -> Result<()> {
  let cli = Cli::parse();

  if cli.gen_man {
    let page = util::render_man_page::<Cli>()?;
    print!("{}", page);
    return Ok(());
  }

  util::init_logging(cli.verbose);

  // Phase 1: normalize CLI + environment
  let fixture = std::env::var(FIXTURE_ENV).ok().filter(|s| !s.trim().is_empty());
  let cfg = normalize(cli, fixture)?;
  tracing::debug!(config = %serde_json::to_string(&cfg)?, "effective config");

  // Phase 2: scan, aggregate, render, write
  crate::report::run(&cfg)
}
