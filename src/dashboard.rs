use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use crate::chart;
use crate::report::DatasetReport;

pub const PAGE_TITLE: &str = "Patent plots";

fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("Failed to create {:?}", path))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct DatasetFiles {
    pub applicant_share_svg: String,
    pub cumulative_svg: String,
    pub applicant_cumulative_svg: String,
    pub applicant_counts_csv: String,
    pub cumulative_csv: String,
    pub applicant_cumulative_csv: String,
}

impl DatasetFiles {
    pub fn for_slug(slug: &str) -> Self {
        Self {
            applicant_share_svg: format!("{slug}_applicant_share.svg"),
            cumulative_svg: format!("{slug}_cumulative.svg"),
            applicant_cumulative_svg: format!("{slug}_cumulative_by_applicant.svg"),
            applicant_counts_csv: format!("{slug}_applicant_counts.csv"),
            cumulative_csv: format!("{slug}_cumulative.csv"),
            applicant_cumulative_csv: format!("{slug}_cumulative_by_applicant.csv"),
        }
    }
}

fn write_dataset(out_dir: &Path, report: &DatasetReport, from_year: i32) -> Result<DatasetFiles> {
    let start_time = Instant::now();
    let kind = report.kind;
    let stats = &report.stats;
    let files = DatasetFiles::for_slug(kind.slug());

    let pie_counts: Vec<_> = stats
        .applicant_counts
        .iter()
        .filter(|c| c.count >= kind.pie_min_count())
        .cloned()
        .collect();
    let shown_cumulative: Vec<_> = stats
        .cumulative
        .iter()
        .filter(|t| t.year >= from_year)
        .copied()
        .collect();

    chart::render_applicant_share(
        &out_dir.join(&files.applicant_share_svg),
        kind.pie_title(),
        &pie_counts,
    )?;
    chart::render_cumulative(
        &out_dir.join(&files.cumulative_svg),
        kind.cumulative_title(),
        &shown_cumulative,
    )?;
    chart::render_cumulative_by_applicant(
        &out_dir.join(&files.applicant_cumulative_svg),
        kind.applicant_cumulative_title(),
        &stats.applicant_cumulative,
    )?;

    write_table(&out_dir.join(&files.applicant_counts_csv), &stats.applicant_counts)?;
    write_table(&out_dir.join(&files.cumulative_csv), &shown_cumulative)?;
    write_table(
        &out_dir.join(&files.applicant_cumulative_csv),
        &stats.applicant_cumulative,
    )?;

    info!(
        action = "complete",
        component = "dashboard_dataset",
        dataset = kind.slug(),
        pie_slices = pie_counts.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Dataset charts written"
    );
    Ok(files)
}

fn render_index(sections: &[(&DatasetReport, DatasetFiles)]) -> String {
    let mut html = String::new();
    let _ = writeln!(html, "<!DOCTYPE html>");
    let _ = writeln!(html, "<html lang=\"en\">");
    let _ = writeln!(
        html,
        "<head><meta charset=\"utf-8\"><title>{}</title></head>",
        PAGE_TITLE
    );
    let _ = writeln!(html, "<body>");
    let _ = writeln!(html, "<h1>{}</h1>", PAGE_TITLE);

    for (report, files) in sections {
        let _ = writeln!(html, "<h2>{}</h2>", report.kind.header());
        for (svg, alt) in [
            (&files.applicant_share_svg, report.kind.pie_title()),
            (&files.cumulative_svg, report.kind.cumulative_title()),
            (&files.applicant_cumulative_svg, report.kind.applicant_cumulative_title()),
        ] {
            let _ = writeln!(html, "<figure><img src=\"{svg}\" alt=\"{alt}\"></figure>");
        }
        let _ = writeln!(
            html,
            "<p>Data: <a href=\"{}\">applicant counts</a>, <a href=\"{}\">cumulative</a>, <a href=\"{}\">cumulative by applicant</a></p>",
            files.applicant_counts_csv, files.cumulative_csv, files.applicant_cumulative_csv
        );
    }

    let _ = writeln!(html, "</body>");
    let _ = writeln!(html, "</html>");
    html
}

pub fn write_dashboard(out_dir: &Path, reports: &[DatasetReport], from_year: i32) -> Result<PathBuf> {
    let start_time = Instant::now();
    info!(action = "start", component = "dashboard", out_dir = ?out_dir, "Writing dashboard");

    fs::create_dir_all(out_dir).with_context(|| format!("Failed to create {:?}", out_dir))?;

    let mut sections = Vec::with_capacity(reports.len());
    for report in reports {
        let files = write_dataset(out_dir, report, from_year)?;
        sections.push((report, files));
    }

    let index_path = out_dir.join("index.html");
    fs::write(&index_path, render_index(&sections))
        .with_context(|| format!("Failed to write {:?}", index_path))?;

    info!(
        action = "complete",
        component = "dashboard",
        index = ?index_path,
        duration_ms = start_time.elapsed().as_millis(),
        "Dashboard written"
    );
    Ok(index_path)
}
