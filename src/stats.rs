use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::dataset::FilingRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicantCount {
    #[serde(rename = "Applicant")]
    pub applicant: String,
    #[serde(rename = "Count")]
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearTotal {
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Cumulative Patents")]
    pub cumulative: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicantYear {
    #[serde(rename = "Applicant")]
    pub applicant: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Cumulative Patents")]
    pub cumulative: u32,
}

impl ApplicantYear {
    pub fn new(applicant: &str, year: i32, cumulative: u32) -> Self {
        Self {
            applicant: applicant.to_string(),
            year,
            cumulative,
        }
    }
}

#[derive(Debug)]
pub struct DatasetStats {
    pub total_records: usize,
    pub excluded_records: usize,
    pub undated_records: usize,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub applicant_counts: Vec<ApplicantCount>,
    pub cumulative: Vec<YearTotal>,
    pub applicant_cumulative: Vec<ApplicantYear>,
}

impl DatasetStats {
    pub fn from_records(records: &[FilingRecord], excluded_records: usize, min_filings: u32) -> Self {
        let dates = records.iter().filter_map(|r| r.filing_date);
        let date_range = dates.clone().min().zip(dates.max());

        Self {
            total_records: records.len(),
            excluded_records,
            undated_records: records.iter().filter(|r| r.filing_date.is_none()).count(),
            date_range,
            applicant_counts: count_by_applicant(records),
            cumulative: cumulative_by_year(records),
            applicant_cumulative: fill_year_gaps(cumulative_by_applicant(records, min_filings)),
        }
    }

    pub fn qualifying_applicants(&self) -> usize {
        self.applicant_cumulative
            .iter()
            .map(|row| row.applicant.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn applicants_with_at_least(&self, min_filings: u32) -> usize {
        self.applicant_counts
            .iter()
            .filter(|c| c.count >= min_filings)
            .count()
    }

    pub fn final_cumulative(&self) -> u32 {
        self.cumulative.last().map(|t| t.cumulative).unwrap_or(0)
    }
}

// Highest count first, ties by name.
pub fn count_by_applicant(records: &[FilingRecord]) -> Vec<ApplicantCount> {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for applicant in records.iter().filter_map(|r| r.applicant.as_deref()) {
        *counts.entry(applicant).or_insert(0) += 1;
    }

    let mut counts: Vec<ApplicantCount> = counts
        .into_iter()
        .map(|(applicant, count)| ApplicantCount {
            applicant: applicant.to_string(),
            count,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.applicant.cmp(&b.applicant)));
    counts
}

// Sparse: years without filings are absent.
pub fn cumulative_by_year(records: &[FilingRecord]) -> Vec<YearTotal> {
    let mut per_year: BTreeMap<i32, u32> = BTreeMap::new();
    for year in records.iter().filter_map(FilingRecord::year) {
        *per_year.entry(year).or_insert(0) += 1;
    }

    let mut running = 0;
    per_year
        .into_iter()
        .map(|(year, count)| {
            running += count;
            YearTotal {
                year,
                cumulative: running,
            }
        })
        .collect()
}

pub fn cumulative_by_applicant(records: &[FilingRecord], min_filings: u32) -> Vec<ApplicantYear> {
    let qualifying: HashSet<String> = count_by_applicant(records)
        .into_iter()
        .filter(|c| c.count >= min_filings)
        .map(|c| c.applicant)
        .collect();

    let mut per_year: BTreeMap<(&str, i32), u32> = BTreeMap::new();
    for record in records {
        if let (Some(applicant), Some(year)) = (record.applicant.as_deref(), record.year()) {
            if qualifying.contains(applicant) {
                *per_year.entry((applicant, year)).or_insert(0) += 1;
            }
        }
    }

    let mut rows = Vec::with_capacity(per_year.len());
    let mut current: Option<&str> = None;
    let mut running = 0;
    for ((applicant, year), count) in per_year {
        if current != Some(applicant) {
            current = Some(applicant);
            running = 0;
        }
        running += count;
        rows.push(ApplicantYear::new(applicant, year, running));
    }
    rows
}

// One row per applicant per year in the overall [min, max] range. Inserted
// zero rows take the running max, which carries totals forward.
pub fn fill_year_gaps(rows: Vec<ApplicantYear>) -> Vec<ApplicantYear> {
    let (Some(min_year), Some(max_year)) = (
        rows.iter().map(|r| r.year).min(),
        rows.iter().map(|r| r.year).max(),
    ) else {
        return rows;
    };

    let mut years_by_applicant: BTreeMap<String, BTreeSet<i32>> = BTreeMap::new();
    for row in &rows {
        years_by_applicant
            .entry(row.applicant.clone())
            .or_default()
            .insert(row.year);
    }

    let mut filled = rows;
    for (applicant, present) in &years_by_applicant {
        for year in (min_year..=max_year).filter(|y| !present.contains(y)) {
            filled.push(ApplicantYear::new(applicant, year, 0));
        }
    }

    filled.sort_by(|a, b| a.applicant.cmp(&b.applicant).then(a.year.cmp(&b.year)));

    let mut current: Option<String> = None;
    let mut running_max = 0;
    for row in &mut filled {
        if current.as_deref() != Some(row.applicant.as_str()) {
            current = Some(row.applicant.clone());
            running_max = 0;
        }
        running_max = running_max.max(row.cumulative);
        row.cumulative = running_max;
    }
    filled
}

pub fn series_by_applicant(rows: &[ApplicantYear]) -> Vec<(&str, Vec<(i32, u32)>)> {
    let mut series: Vec<(&str, Vec<(i32, u32)>)> = Vec::new();
    for row in rows {
        let point = (row.year, row.cumulative);
        match series.last_mut() {
            Some((applicant, points)) if *applicant == row.applicant.as_str() => points.push(point),
            _ => series.push((row.applicant.as_str(), vec![point])),
        }
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filing(applicant: &str, year: i32) -> FilingRecord {
        FilingRecord::new(Some(applicant), NaiveDate::from_ymd_opt(year, 6, 1))
    }

    fn filings(years_by_applicant: &[(&str, Vec<i32>)]) -> Vec<FilingRecord> {
        years_by_applicant.iter()
            .flat_map(|(applicant, years)| years.iter().map(move |y| filing(applicant, *y)))
            .collect()
    }

    #[test]
    fn test_counts_sorted_by_count_then_name() {
        let records = filings(&[("B", vec![2001, 2002]), ("A", vec![2001; 5]), ("C", vec![2003; 2])]);
        let counts = count_by_applicant(&records);
        let order: Vec<(&str, u32)> = counts.iter().map(|c| (c.applicant.as_str(), c.count)).collect();
        assert_eq!(order, vec![("A", 5), ("B", 2), ("C", 2)]);
    }

    #[test]
    fn test_counts_skip_missing_applicants() {
        let mut records = filings(&[("A", vec![2001])]);
        records.push(FilingRecord::new(None, NaiveDate::from_ymd_opt(2001, 1, 1)));
        let counts = count_by_applicant(&records);
        assert_eq!(counts.iter().map(|c| c.count).sum::<u32>(), 1);
    }

    #[test]
    fn test_threshold_selects_qualifying_applicants() {
        let records = filings(&[
            ("A", vec![2000, 2001, 2002, 2003, 2004]),
            ("B", vec![2000, 2001]),
            ("C", vec![2000, 2002, 2004]),
        ]);
        let rows = cumulative_by_applicant(&records, 3);
        let applicants: BTreeSet<&str> = rows.iter().map(|r| r.applicant.as_str()).collect();
        assert_eq!(applicants, BTreeSet::from(["A", "C"]));
    }

    #[test]
    fn test_cumulative_by_year_skips_empty_years() {
        let records = filings(&[("A", vec![2001, 2001, 2004]), ("B", vec![2003])]);
        let series = cumulative_by_year(&records);
        assert_eq!(
            series,
            vec![
                YearTotal { year: 2001, cumulative: 2 },
                YearTotal { year: 2003, cumulative: 3 },
                YearTotal { year: 2004, cumulative: 4 },
            ]
        );
    }

    #[test]
    fn test_cumulative_by_year_counts_records_without_applicant() {
        let mut records = filings(&[("A", vec![2001])]);
        records.push(FilingRecord::new(None, NaiveDate::from_ymd_opt(2002, 1, 1)));
        records.push(FilingRecord::new(Some("A"), None));
        let series = cumulative_by_year(&records);
        assert_eq!(series.last().map(|t| t.cumulative), Some(2));
    }

    #[test]
    fn test_gap_fill_carries_totals_forward() {
        let records = filings(&[("A", vec![2001, 2003]), ("Z", vec![2000, 2004])]);
        let rows = fill_year_gaps(cumulative_by_applicant(&records, 1));
        let a: Vec<(i32, u32)> = rows
            .iter()
            .filter(|r| r.applicant == "A")
            .map(|r| (r.year, r.cumulative))
            .collect();
        assert_eq!(a, vec![(2000, 0), (2001, 1), (2002, 1), (2003, 2), (2004, 2)]);
    }

    #[test]
    fn test_gap_fill_covers_every_year_once() {
        let records = filings(&[("A", vec![2001, 2001, 2005]), ("B", vec![2003])]);
        let rows = fill_year_gaps(cumulative_by_applicant(&records, 1));
        for (applicant, points) in series_by_applicant(&rows) {
            let years: Vec<i32> = points.iter().map(|(y, _)| *y).collect();
            assert_eq!(years, (2001..=2005).collect::<Vec<_>>(), "{}", applicant);
        }
        assert_eq!(rows.len(), 10);
    }

    #[test]
    fn test_gap_fill_of_empty_input() {
        assert!(fill_year_gaps(Vec::new()).is_empty());
    }

    #[test]
    fn test_dataset_stats_bookkeeping() {
        let mut records = filings(&[("A", vec![2001, 2002, 2003]), ("B", vec![2002])]);
        records.push(FilingRecord::new(Some("B"), None));
        let stats = DatasetStats::from_records(&records, 4, 2);
        assert_eq!(stats.total_records, 5);
        assert_eq!(stats.excluded_records, 4);
        assert_eq!(stats.undated_records, 1);
        assert_eq!(stats.final_cumulative(), 4);
        assert_eq!(stats.qualifying_applicants(), 2);
        assert_eq!(
            stats.date_range,
            Some((
                NaiveDate::from_ymd_opt(2001, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2003, 6, 1).unwrap()
            ))
        );
        // B qualifies on its undated filing but only its 2002 filing has a year.
        let b: Vec<u32> = stats
            .applicant_cumulative
            .iter()
            .filter(|r| r.applicant == "B")
            .map(|r| r.cumulative)
            .collect();
        assert_eq!(b, vec![0, 1, 1]);
    }

    #[test]
    fn test_applicant_threshold_counts_undated_filings() {
        let mut records = filings(&[("A", vec![2001, 2002])]);
        records.push(FilingRecord::new(Some("C"), None));
        records.push(FilingRecord::new(Some("C"), None));
        let stats = DatasetStats::from_records(&records, 0, 2);
        assert_eq!(stats.applicants_with_at_least(2), 2);
        // C has no year, so it gets no series.
        assert_eq!(stats.qualifying_applicants(), 1);
    }
}
