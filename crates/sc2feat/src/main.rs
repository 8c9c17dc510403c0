use anyhow::{bail, Result};
use clap::Parser;
use sc2feat::cli::{self, Cli, Command};

fn main() -> Result<()> {
    let args = Cli::parse();
    cli::init_logging();

    match args.command {
        Command::Finalise(finalise) => cli::run_finalise(&finalise),
        Command::Parse(parse) if parse.dry_run => cli::run_plan(&parse).map(|_| ()),
        Command::Parse(_) => bail!(
            "this build has no game engine binding; use --dry-run to plan, \
             or call sc2feat::cli::run_parse from a binary that links one"
        ),
    }
}
