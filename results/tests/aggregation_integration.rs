use results::{
    AggregateCounts, AggregatorError, Ignorelist, IgnorelistEntry, QualityGates, ResultsAggregator,
    TestState, Verdict,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

/// 10 passed, 2 failed, 1 skipped.
fn scenario_document() -> String {
    let mut cases = String::new();
    for i in 0..10 {
        cases.push_str(&format!(r#"<testcase name="passing-{i}" time="0.1"/>"#));
    }
    cases.push_str(r#"<testcase name="flaky-login"><failure message="timeout">login timed out</failure></testcase>"#);
    cases.push_str(r#"<testcase name="broken-import"><error message="ImportError"/></testcase>"#);
    cases.push_str(r#"<testcase name="not-yet"><skipped/></testcase>"#);
    format!(r#"<?xml version="1.0"?><testsuites><testsuite name="canary">{cases}</testsuite></testsuites>"#)
}

#[test]
fn test_scenario_without_ignorelist() {
    let dir = TempDir::new().unwrap();
    let file = write_fixture(dir.path(), "results.xml", &scenario_document());

    let aggregator = ResultsAggregator::new(&[file], &Ignorelist::empty()).unwrap();
    assert_eq!(
        aggregator.counts(),
        AggregateCounts {
            total: 13,
            passed: 10,
            failed: 2,
            skipped: 1,
            ignored: 0,
        }
    );
    assert_eq!(aggregator.status(), TestState::Failed);

    let verdict = aggregator.evaluate(&QualityGates::new(100, 100).unwrap());
    assert_eq!(verdict.executed.percentage, 92);
    assert_eq!(verdict.passing.percentage, 83);
    assert_eq!(verdict.executed.verdict, Verdict::Warn);
    assert_eq!(verdict.passing.verdict, Verdict::Warn);
}

#[test]
fn test_scenario_with_ignorelist() {
    let dir = TempDir::new().unwrap();
    let file = write_fixture(dir.path(), "results.xml", &scenario_document());
    let ignorelist = Ignorelist::new(vec![IgnorelistEntry::new(
        "flaky-login",
        "identity",
        "jdoe",
    )]);

    let aggregator = ResultsAggregator::new(&[file], &ignorelist).unwrap();
    let counts = aggregator.counts();
    assert_eq!(counts.total, 13);
    assert_eq!(counts.failed, 1);
    assert_eq!(counts.ignored, 1);

    let verdict = aggregator.evaluate(&QualityGates::default());
    assert_eq!(verdict.passing.percentage, 83);

    let ignored: Vec<_> = aggregator.results_with_state(TestState::Ignored).collect();
    assert_eq!(ignored.len(), 1);
    assert_eq!(ignored[0].name, "flaky-login");
    assert_eq!(ignored[0].metadata.squad.as_deref(), Some("identity"));
    assert_eq!(ignored[0].metadata.owner.as_deref(), Some("jdoe"));
    assert_eq!(ignored[0].metadata.message, "login timed out");
}

#[test]
fn test_ignorelist_never_changes_total() {
    let dir = TempDir::new().unwrap();
    let file = write_fixture(dir.path(), "results.xml", &scenario_document());
    let everything = Ignorelist::new(
        ["passing-0", "not-yet", "flaky-login", "broken-import"]
            .iter()
            .map(|name| IgnorelistEntry::new(*name, "", ""))
            .collect(),
    );

    let plain = ResultsAggregator::new(&[&file], &Ignorelist::empty()).unwrap();
    let ignored = ResultsAggregator::new(&[&file], &everything).unwrap();

    let (before, after) = (plain.counts(), ignored.counts());
    assert_eq!(before.total, after.total);
    assert_eq!(before.passed, after.passed);
    assert_eq!(before.skipped, after.skipped);
    assert_eq!(after.failed, 0);
    assert_eq!(after.ignored, before.failed);
    assert_eq!(ignored.status(), TestState::Ignored);
}

#[test]
fn test_malformed_ignorelist_file_is_treated_as_empty() {
    let dir = TempDir::new().unwrap();
    let file = write_fixture(dir.path(), "results.xml", &scenario_document());
    let ignorelist_path = write_fixture(dir.path(), "ignorelist.json", "{ \"ignored_tests\": [");

    let ignorelist = Ignorelist::load_or_empty(Some(ignorelist_path.as_path()));
    assert!(ignorelist.is_empty());

    let aggregator = ResultsAggregator::new(&[file], &ignorelist).unwrap();
    assert_eq!(aggregator.counts().failed, 2);
    assert_eq!(aggregator.counts().ignored, 0);
}

#[test]
fn test_bad_file_is_skipped_and_reported() {
    let dir = TempDir::new().unwrap();
    let good = write_fixture(dir.path(), "a.xml", &scenario_document());
    let bad = write_fixture(dir.path(), "b.xml", "<testsuite name=\"x\"><testcase name=\"y\">");

    let aggregator = ResultsAggregator::new(&[good.clone(), bad.clone()], &Ignorelist::empty()).unwrap();
    assert_eq!(aggregator.counts().total, 13);
    assert_eq!(aggregator.parsed_files(), &[good]);
    assert_eq!(aggregator.skipped_files().len(), 1);
    assert_eq!(aggregator.skipped_files()[0].path, bad);
    assert!(!aggregator.skipped_files()[0].reason.is_empty());
}

#[test]
fn test_only_bad_files_is_fatal() {
    let dir = TempDir::new().unwrap();
    let bad = write_fixture(dir.path(), "b.xml", "definitely not xml");

    let err = ResultsAggregator::new(&[bad], &Ignorelist::empty()).unwrap_err();
    assert!(matches!(err, AggregatorError::NoReadableInput { attempted: 1, .. }));
}

#[test]
fn test_results_keep_file_then_document_order() {
    let dir = TempDir::new().unwrap();
    let first = write_fixture(
        dir.path(),
        "z-first.xml",
        r#"<testsuite name="one"><testcase name="b"/><testcase name="a"/></testsuite>"#,
    );
    let second = write_fixture(
        dir.path(),
        "a-second.xml",
        r#"<testsuite name="two"><testcase name="c"><skipped/></testcase></testsuite>"#,
    );

    let aggregator = ResultsAggregator::new(&[first, second], &Ignorelist::empty()).unwrap();
    let names: Vec<(&str, &str)> = aggregator
        .results()
        .iter()
        .map(|r| (r.testsuite.as_str(), r.name.as_str()))
        .collect();
    assert_eq!(names, vec![("one", "b"), ("one", "a"), ("two", "c")]);
    assert_eq!(aggregator.status(), TestState::Skipped);
}

#[test]
fn test_zero_cases_evaluates_to_pass() {
    let dir = TempDir::new().unwrap();
    let empty = write_fixture(dir.path(), "empty.xml", "<testsuites/>");

    let aggregator = ResultsAggregator::new(&[empty], &Ignorelist::empty()).unwrap();
    assert_eq!(aggregator.counts(), AggregateCounts::default());
    assert_eq!(aggregator.status(), TestState::Passed);

    for gate in [0u8, 50, 100] {
        let verdict = aggregator.evaluate(&QualityGates::new(gate, gate).unwrap());
        assert_eq!(verdict.executed.percentage, 100);
        assert_eq!(verdict.passing.percentage, 100);
        assert_eq!(verdict.overall(), Verdict::Pass);
    }
}

#[test]
fn test_reparsing_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let file = write_fixture(dir.path(), "results.xml", &scenario_document());

    let first = results::parse_file(&file).unwrap();
    let second = results::parse_file(&file).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_prelude_covers_parsing() {
    use results::prelude::*;

    let parsed: ParseResult<Vec<TestCaseResult>> = parse_str(
        r#"<testsuite name="s"><testcase name="a"/></testsuite>"#,
        Path::new("inline.xml"),
    );
    let aggregator = ResultsAggregator::from_results(parsed.unwrap(), &Ignorelist::empty());
    assert_eq!(aggregator.counts().passed, 1);
}
