pub mod args;
pub mod chart;
pub mod dashboard;
pub mod dataset;
pub mod normalize;
pub mod report;
pub mod rules;
pub mod stats;
pub mod utils;

pub use args::Args;
pub use dataset::{DatasetKind, DateFormat, FilingRecord};
pub use normalize::{NameNormalizer, NameRule};
pub use report::{analyze_dataset, run, DatasetReport};
pub use rules::{init_default_rules, load_rules};
pub use stats::{ApplicantCount, ApplicantYear, DatasetStats, YearTotal};
