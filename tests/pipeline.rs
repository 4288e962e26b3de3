use clap::Parser;
use std::ffi::OsString;
use std::fs;
use std::path::Path;

use patent_plots::report::{analyze_dataset, build_pool};
use patent_plots::{dashboard, load_rules, run, Args, DatasetKind};

const MOLDED_FIBER_CSV: &str = "\
,Applicant,Filing Date,Title
0,Wing Fat Holdings Ltd,2001-03-04,Tray
1,WING FAT MOLDED FIBER,2003-05-06,Cup
2,Huhtamaki Oyj,1998-01-01,Lid
3,Huhtamaki Molded Fiber,2003-02-02,Lid
4,huhtamaki,2004-02-02,Lid
5,Wing fat,2004-07-07,Bowl
6,Solo Inventor,2002-01-01,Box
7,,2002-06-06,Unknown
";

const DRY_FORMING_CSV: &str = "\
,Applicant,Filing Date
0,Scan-Web I/S,24.12.1987
1,SCANWEB,01.02.1990
2,PulPac AB,15.06.2018
3,Pupac,15.06.2019
4,พูลแพค เอบี,01.01.2020
5,欧瑞康纺织有限及两合公司,01.01.2020
6,Vsesoyuznyj Nauchno,01.01.1985
7,Kimberly-Clark Worldwide,03.03.2001
";

const WING_FAT: &str = "WING FAT MOLDED FIBER PACKAGING TECHNOLOGY CO. LTD";
const HUHTAMAKI: &str = "HUHTAMAKI MOLDED FIBER TECH BV";

fn write_inputs(dir: &Path) {
    fs::write(dir.join("molded_fiber_packaging.csv"), MOLDED_FIBER_CSV).unwrap();
    fs::write(dir.join("dry-forming-cellulose.csv"), DRY_FORMING_CSV).unwrap();
}

fn series_for(report: &patent_plots::DatasetReport, applicant: &str) -> Vec<(i32, u32)> {
    report
        .stats
        .applicant_cumulative
        .iter()
        .filter(|row| row.applicant == applicant)
        .map(|row| (row.year, row.cumulative))
        .collect()
}

#[test]
fn molded_fiber_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let pool = build_pool(Some(2)).unwrap();
    let normalizer = load_rules(DatasetKind::MoldedFiber, None).unwrap();

    let report = analyze_dataset(
        DatasetKind::MoldedFiber,
        &dir.path().join("molded_fiber_packaging.csv"),
        Some(&normalizer),
        &pool,
    )
    .unwrap();
    let stats = &report.stats;

    let counts: Vec<(&str, u32)> = stats
        .applicant_counts
        .iter()
        .map(|c| (c.applicant.as_str(), c.count))
        .collect();
    assert_eq!(counts, vec![(HUHTAMAKI, 3), (WING_FAT, 3), ("Solo Inventor", 1)]);

    let cumulative: Vec<(i32, u32)> = stats.cumulative.iter().map(|t| (t.year, t.cumulative)).collect();
    assert_eq!(
        cumulative,
        vec![(1998, 1), (2001, 2), (2002, 4), (2003, 6), (2004, 8)]
    );
    assert_eq!(stats.final_cumulative() as usize, stats.total_records);

    assert_eq!(stats.qualifying_applicants(), 2);
    assert_eq!(
        series_for(&report, HUHTAMAKI),
        vec![(1998, 1), (1999, 1), (2000, 1), (2001, 1), (2002, 1), (2003, 2), (2004, 3)]
    );
    assert_eq!(
        series_for(&report, WING_FAT),
        vec![(1998, 0), (1999, 0), (2000, 0), (2001, 1), (2002, 1), (2003, 2), (2004, 3)]
    );
}

#[test]
fn dry_forming_pipeline_applies_exclusions() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let pool = build_pool(Some(1)).unwrap();
    let normalizer = load_rules(DatasetKind::DryForming, None).unwrap();

    let report = analyze_dataset(
        DatasetKind::DryForming,
        &dir.path().join("dry-forming-cellulose.csv"),
        Some(&normalizer),
        &pool,
    )
    .unwrap();
    let stats = &report.stats;

    assert_eq!(stats.excluded_records, 3);
    assert_eq!(stats.total_records, 5);
    assert_eq!(stats.final_cumulative(), 5);

    let counts: Vec<(&str, u32)> = stats
        .applicant_counts
        .iter()
        .map(|c| (c.applicant.as_str(), c.count))
        .collect();
    assert_eq!(
        counts,
        vec![("PULPAC", 2), ("SCAN-WEB I/S", 2), ("KIMBERLY CLARK CO", 1)]
    );

    let pulpac = series_for(&report, "PULPAC");
    assert_eq!(pulpac.len(), (1987..=2019).count());
    assert_eq!(pulpac.first(), Some(&(1987, 0)));
    assert_eq!(pulpac.last(), Some(&(2019, 2)));
    assert!(series_for(&report, "KIMBERLY CLARK CO").is_empty());
}

#[test]
fn without_rules_names_are_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let pool = build_pool(Some(1)).unwrap();

    let report = analyze_dataset(
        DatasetKind::DryForming,
        &dir.path().join("dry-forming-cellulose.csv"),
        None,
        &pool,
    )
    .unwrap();

    assert_eq!(report.stats.excluded_records, 0);
    assert_eq!(report.stats.total_records, 8);
    assert!(report.stats.applicant_cumulative.is_empty());
}

#[test]
fn dashboard_is_written() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let out_dir = dir.path().join("plots");

    let args = Args::parse_from([
        OsString::from("patent-plots"),
        OsString::from("--molded-fiber"),
        dir.path().join("molded_fiber_packaging.csv").into_os_string(),
        OsString::from("--dry-forming"),
        dir.path().join("dry-forming-cellulose.csv").into_os_string(),
        OsString::from("--out-dir"),
        out_dir.clone().into_os_string(),
        OsString::from("--workers"),
        OsString::from("2"),
    ]);

    let reports = run(&args).unwrap();
    assert_eq!(reports.len(), 2);

    let index = fs::read_to_string(out_dir.join("index.html")).unwrap();
    assert!(index.contains(dashboard::PAGE_TITLE));
    assert!(index.contains("Patent applications for Molded Fiber Packaging"));
    assert!(index.contains("Patent applications for dry-forming and cellulose"));

    for slug in ["molded_fiber", "dry_forming"] {
        for suffix in [
            "_applicant_share.svg",
            "_cumulative.svg",
            "_cumulative_by_applicant.svg",
            "_applicant_counts.csv",
            "_cumulative.csv",
            "_cumulative_by_applicant.csv",
        ] {
            let path = out_dir.join(format!("{slug}{suffix}"));
            assert!(path.exists(), "{:?} missing", path);
        }
    }

    // The aggregate table is cut at the display year; earlier years still count.
    let cumulative = fs::read_to_string(out_dir.join("dry_forming_cumulative.csv")).unwrap();
    assert_eq!(cumulative, "Year,Cumulative Patents\n2001,3\n2018,4\n2019,5\n");

    let counts = fs::read_to_string(out_dir.join("molded_fiber_applicant_counts.csv")).unwrap();
    assert!(counts.starts_with("Applicant,Count\n"));
}

#[test]
fn missing_dataset_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let args = Args::parse_from([
        OsString::from("patent-plots"),
        OsString::from("--molded-fiber"),
        dir.path().join("absent.csv").into_os_string(),
        OsString::from("--no-charts"),
    ]);
    assert!(run(&args).is_err());
}
