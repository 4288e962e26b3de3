use anyhow::{Context, Result};
use rayon::prelude::*;
use rayon::ThreadPool;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use crate::dataset::{self, DatasetKind, FilingRecord};
use crate::normalize::NameNormalizer;
use crate::stats::DatasetStats;
use crate::utils::format_number;
use crate::{dashboard, rules, Args};

#[derive(Debug)]
pub struct DatasetReport {
    pub kind: DatasetKind,
    pub source: PathBuf,
    pub stats: DatasetStats,
}

pub fn normalize_records(records: &mut [FilingRecord], normalizer: &NameNormalizer, pool: &ThreadPool) {
    pool.install(|| {
        records.par_iter_mut().for_each(|record| {
            if let Some(applicant) = record.applicant.as_mut() {
                let canonical = normalizer.canonical_name(applicant);
                *applicant = canonical;
            }
        })
    });
}

pub fn exclude_records(records: &mut Vec<FilingRecord>, normalizer: &NameNormalizer) -> usize {
    let before = records.len();
    records.retain(|record| {
        record
            .applicant
            .as_deref()
            .map_or(true, |name| !normalizer.is_excluded(name))
    });
    before - records.len()
}

pub fn analyze_dataset(
    kind: DatasetKind,
    csv_path: &Path,
    normalizer: Option<&NameNormalizer>,
    pool: &ThreadPool,
) -> Result<DatasetReport> {
    let total_start_time = Instant::now();
    info!(action = "start", component = "dataset_analysis", dataset = kind.slug(), "Starting dataset analysis");

    let mut records = dataset::load_filings(csv_path, &kind.date_format())?;

    let excluded = match normalizer {
        Some(normalizer) => {
            let stage_start = Instant::now();
            normalize_records(&mut records, normalizer, pool);
            let excluded = exclude_records(&mut records, normalizer);
            info!(
                action = "normalize",
                component = "dataset_analysis",
                dataset = kind.slug(),
                excluded_records = excluded,
                duration_ms = stage_start.elapsed().as_millis(),
                "Applicant names normalized"
            );
            excluded
        }
        None => 0,
    };

    let stage_start = Instant::now();
    let stats = DatasetStats::from_records(&records, excluded, kind.series_min_count());
    info!(
        action = "aggregate",
        component = "dataset_analysis",
        dataset = kind.slug(),
        applicants = stats.applicant_counts.len(),
        qualifying_applicants = stats.qualifying_applicants(),
        years = stats.cumulative.len(),
        duration_ms = stage_start.elapsed().as_millis(),
        "Filing statistics computed"
    );

    info!(
        action = "complete",
        component = "dataset_analysis",
        dataset = kind.slug(),
        duration_ms = total_start_time.elapsed().as_millis(),
        "Dataset analysis completed"
    );

    Ok(DatasetReport {
        kind,
        source: csv_path.to_path_buf(),
        stats,
    })
}

fn dataset_inputs(args: &Args, kind: DatasetKind) -> (&Path, Option<&Path>) {
    match kind {
        DatasetKind::MoldedFiber => (
            args.molded_fiber.as_path(),
            args.molded_fiber_rules.as_deref(),
        ),
        DatasetKind::DryForming => (
            args.dry_forming.as_path(),
            args.dry_forming_rules.as_deref(),
        ),
    }
}

pub fn build_pool(workers: Option<usize>) -> Result<ThreadPool> {
    let workers = workers.unwrap_or_else(|| std::cmp::min(num_cpus::get(), 8));
    info!(action = "configure", component = "thread_pool", worker_count = workers, "Using workers for normalization");
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .context("Failed to build worker pool")
}

pub fn run(args: &Args) -> Result<Vec<DatasetReport>> {
    let total_start_time = Instant::now();
    let pool = build_pool(args.workers)?;

    let mut reports = Vec::with_capacity(DatasetKind::ALL.len());
    for kind in DatasetKind::ALL {
        let (csv_path, rules_path) = dataset_inputs(args, kind);
        let normalizer = if args.no_rules {
            None
        } else {
            Some(rules::load_rules(kind, rules_path)?)
        };
        reports.push(analyze_dataset(kind, csv_path, normalizer.as_ref(), &pool)?);
    }

    for report in &reports {
        print_dataset_report(report, args);
    }

    if !args.no_charts {
        let index = dashboard::write_dashboard(&args.out_dir, &reports, args.from_year)?;
        println!("\nDashboard written to {}", index.display());
    }

    info!(
        action = "complete",
        component = "run",
        duration_ms = total_start_time.elapsed().as_millis(),
        "Run completed successfully"
    );
    Ok(reports)
}

pub fn print_dataset_report(report: &DatasetReport, args: &Args) {
    let stats = &report.stats;
    let kind = report.kind;

    println!("\n--- {} ---", kind.header());
    println!("Source: {}", report.source.display());
    println!(
        "Filings: {} ({} excluded, {} undated)",
        format_number(stats.total_records as u32),
        format_number(stats.excluded_records as u32),
        format_number(stats.undated_records as u32)
    );

    if let Some((earliest, latest)) = stats.date_range {
        println!(
            "Filing dates: {} to {}",
            earliest.format("%B %-d, %Y"),
            latest.format("%B %-d, %Y")
        );
    } else {
        println!("Filing dates: No data available");
    }

    println!(
        "Distinct applicants: {}",
        format_number(stats.applicant_counts.len() as u32)
    );
    println!(
        "Applicants with at least {} filings: {}",
        kind.series_min_count(),
        format_number(stats.applicants_with_at_least(kind.series_min_count()) as u32)
    );
    println!(
        "Applicants charted by year: {}",
        format_number(stats.qualifying_applicants() as u32)
    );
    println!(
        "Cumulative filings: {}",
        format_number(stats.final_cumulative())
    );

    if let Some(top_count) = args.top {
        println!(
            "\nTop {} applicants:",
            std::cmp::min(top_count, stats.applicant_counts.len())
        );
        for count in stats.applicant_counts.iter().take(top_count) {
            println!("- {}: {} filings", count.applicant, format_number(count.count));
        }
    }
}
