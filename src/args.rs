use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "patent-plots",
    about = "Chart patent filing statistics for molded fiber packaging and dry-forming cellulose",
    version,
    long_about = None
)]
pub struct Args {
    /// CSV export of molded fiber packaging filings
    #[arg(long, default_value = "molded_fiber_packaging.csv")]
    pub molded_fiber: PathBuf,

    /// CSV export of dry-forming and cellulose filings
    #[arg(long, default_value = "dry-forming-cellulose.csv")]
    pub dry_forming: PathBuf,

    /// Directory for charts, tables and index.html
    #[arg(short, long, default_value = "plots")]
    pub out_dir: PathBuf,

    /// First year shown on the aggregate cumulative charts
    #[arg(long, default_value_t = 2000)]
    pub from_year: i32,

    /// Path to custom name rules for the molded fiber dataset
    #[arg(long)]
    pub molded_fiber_rules: Option<PathBuf>,

    /// Path to custom name rules for the dry-forming dataset
    #[arg(long)]
    pub dry_forming_rules: Option<PathBuf>,

    /// Disable applicant name normalization and exclusions
    #[arg(long)]
    pub no_rules: bool,

    /// Number of top applicants to list per dataset
    #[arg(short, long)]
    pub top: Option<usize>,

    /// Print the summary only, without writing charts
    #[arg(long)]
    pub no_charts: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Number of worker threads
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Initialize the default rule files in the working directory
    #[arg(long)]
    pub init: bool,
}
