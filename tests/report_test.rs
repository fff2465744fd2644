use lab_kit::config::toml_config::ReportConfig;
use lab_kit::{JobRunner, LocalStorage, ReportJob};
use std::fs;
use tempfile::TempDir;

fn run_report(dir: &TempDir, content: &str, include_incomplete: bool) -> String {
    let input = dir.path().join("values.csv");
    fs::write(&input, content).unwrap();

    let config = ReportConfig {
        name: "weekly".to_string(),
        input: Some(input.to_str().unwrap().to_string()),
        column: Some("value".to_string()),
        include_incomplete,
    };
    let output = dir.path().join("out");
    let job = ReportJob::new(LocalStorage::default(), config, output.to_str().unwrap());
    let location = JobRunner::new(job).run().unwrap();
    assert!(location.ends_with("report.txt"));
    fs::read_to_string(location).unwrap()
}

#[test]
fn test_report_lists_both_analyses() {
    let temp_dir = TempDir::new().unwrap();
    let report = run_report(
        &temp_dir,
        "id,value\n1,1\n2,4\n3,1\n4,3\n5,5\n6,6\n7,7\n8,3\n",
        false,
    );

    let expected = "Report weekly\n\
Analysis counter (This counts number of occurences in a vector) \n\
{1: 2, 3: 2, 4: 1, 5: 1, 6: 1, 7: 1}\n\
-----\n\
Analysis summary \n\
count=8 mean=3.750 std=2.046 min=1 max=7\n\
-----\n";
    assert_eq!(report, expected);
}

#[test]
fn test_failed_analyses_only_shown_when_requested() {
    let temp_dir = TempDir::new().unwrap();

    let completed_only = run_report(&temp_dir, "id,value\n", false);
    assert_eq!(completed_only, "Report weekly\n");

    let everything = run_report(&temp_dir, "id,value\n", true);
    assert!(everything.starts_with("Report weekly\n"));
    assert!(everything.contains("Analysis counter"));
    assert!(everything.contains("Analysis summary \nNone\n-----"));
}
