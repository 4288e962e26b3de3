use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::error;

use patent_plots::{init_default_rules, run, utils, Args};

fn main() -> Result<()> {
    let args = Args::parse();
    utils::setup_logging(args.verbose);

    if args.init {
        for path in init_default_rules(Path::new("."))? {
            println!("Created {} with default rules", path.display());
        }
        return Ok(());
    }

    utils::validate_args(&args)?;

    match run(&args) {
        Ok(_) => Ok(()),
        Err(e) => {
            error!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
