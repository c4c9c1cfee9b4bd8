// crates/fixture-harness-report/tests/junit_reports.rs
// ============================================================================
// Module: JUnit Report Tests
// Description: Capture crawling and JUnit rendering checks.
// Purpose: Validate report counts survive rendering for both report sources.
// ============================================================================

//! JUnit report integration tests.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use fixture_harness_core::FailureReason;
use fixture_harness_core::FixtureIdentity;
use fixture_harness_core::Summary;
use fixture_harness_core::Verdict;
use fixture_harness_report::CaptureGrammar;
use fixture_harness_report::CrawlOptions;
use fixture_harness_report::JunitSuite;
use fixture_harness_report::crawl_captures;
use fixture_harness_report::render_junit;
use regex::Regex;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Reads an integer attribute from the `<testsuite>` element.
fn suite_attr(xml: &str, name: &str) -> usize {
    let suite = xml.lines().find(|line| line.starts_with("<testsuite ")).unwrap();
    let needle = format!(" {name}=\"");
    let start = suite.find(&needle).unwrap() + needle.len();
    let end = suite[start ..].find('"').unwrap() + start;
    suite[start .. end].parse().unwrap()
}

/// Reads the timestamp attribute from the `<testsuite>` element.
fn suite_timestamp(xml: &str) -> String {
    let suite = xml.lines().find(|line| line.starts_with("<testsuite ")).unwrap();
    let start = suite.find(" timestamp=\"").unwrap() + " timestamp=\"".len();
    let end = suite[start ..].find('"').unwrap() + start;
    suite[start .. end].to_string()
}

/// One element of a parsed report document.
#[derive(Debug, Default)]
struct Element {
    /// Tag name.
    name: String,
    /// Unescaped attribute values.
    attrs: BTreeMap<String, String>,
    /// Child elements in document order.
    children: Vec<Element>,
    /// Concatenated CDATA content.
    text: String,
}

impl Element {
    /// Reads an integer attribute.
    fn count(&self, attr: &str) -> usize {
        self.attrs[attr].parse().unwrap()
    }
}

/// Reverses attribute escaping.
fn unescape(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Parses a report into an element tree, failing on any tag mismatch or
/// stray text outside CDATA sections.
fn parse_document(xml: &str) -> Element {
    let declaration = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";
    let mut rest = xml.strip_prefix(declaration).expect("missing XML declaration");
    let attr_re = Regex::new(r#"([A-Za-z_]+)="([^"<]*)""#).unwrap();
    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("<![CDATA[") {
            let end = after.find("]]>").expect("unterminated CDATA");
            stack.last_mut().expect("CDATA outside an element").text.push_str(&after[.. end]);
            rest = &after[end + 3 ..];
        } else if let Some(after) = rest.strip_prefix("</") {
            let end = after.find('>').expect("unterminated closing tag");
            let element = stack.pop().expect("closing tag without an open element");
            assert_eq!(element.name, &after[.. end], "mismatched closing tag");
            match stack.last_mut() {
                Some(parent) => parent.children.push(element),
                None => root = Some(element),
            }
            rest = &after[end + 1 ..];
        } else if let Some(after) = rest.strip_prefix('<') {
            let end = after.find('>').expect("unterminated tag");
            let body = &after[.. end];
            let (body, self_closing) =
                body.strip_suffix('/').map_or((body, false), |inner| (inner, true));
            let name_end = body.find(' ').unwrap_or(body.len());
            let element = Element {
                name: body[.. name_end].to_string(),
                attrs: attr_re
                    .captures_iter(&body[name_end ..])
                    .map(|caps| (caps[1].to_string(), unescape(&caps[2])))
                    .collect(),
                ..Element::default()
            };
            if self_closing {
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            } else {
                stack.push(element);
            }
            rest = &after[end + 1 ..];
        } else {
            let end = rest.find('<').unwrap_or(rest.len());
            assert!(rest[.. end].trim().is_empty(), "stray text {:?}", &rest[.. end]);
            rest = &rest[end ..];
        }
    }
    assert!(stack.is_empty(), "unclosed elements");
    root.expect("empty document")
}

/// Checks the suite counts against its cases and returns the suite.
fn assert_consistent_suite(xml: &str) -> Element {
    let suite = parse_document(xml);
    assert_eq!(suite.name, "testsuite");
    assert_eq!(suite.count("errors"), 0);
    assert!(suite.children.iter().all(|case| case.name == "testcase"));
    for case in &suite.children {
        assert!(case.children.len() <= 1, "case {} has several children", case.attrs["name"]);
        assert!(case.children.iter().all(|child| child.name == "failure" || child.name == "skipped"));
    }
    let with_child = |child: &str| {
        suite.children.iter().filter(|case| case.children.iter().any(|c| c.name == child)).count()
    };
    assert_eq!(suite.count("tests"), suite.children.len());
    assert_eq!(suite.count("failures"), with_child("failure"));
    assert_eq!(suite.count("skipped"), with_child("skipped"));
    suite
}

/// Writes one capture file.
fn write_capture(dir: &Path, name: &str, text: &str) {
    fs::write(dir.join(name), text).unwrap();
}

#[test]
fn crawled_captures_render_with_matching_counts() {
    let temp = tempfile::tempdir().unwrap();
    let options = CrawlOptions {
        root: temp.path().join("agent"),
        uname: "Linux".to_string(),
        ..CrawlOptions::default()
    };
    let dir = options.capture_dir();
    fs::create_dir_all(&dir).unwrap();
    write_capture(
        &dir,
        "test_rpm.out",
        "test_rpm:   312 of   314 tests passed,     0 failed and     2 acceptably failed  agent/Linux/gcc/x86_64/axiom/tests/test_rpm\n",
    );
    write_capture(
        &dir,
        "test_base64.out",
        "FAIL [axiom/tests/test_base64.c:56]: TRUE check: valid character\n\
         test_base64:  10 of  11 tests passed,     1 failed and     0 acceptably failed\n",
    );
    write_capture(&dir, "test_hash.out", "test_hash: all  2229 tests passed\n");
    write_capture(&dir, "notes.txt", "test_notes: all 1 tests passed\n");

    let reports = crawl_captures(&options, &CaptureGrammar::new().unwrap()).unwrap();
    let handles: Vec<_> = reports.iter().map(|r| r.handle.as_str()).collect();
    assert_eq!(handles, vec!["test_base64", "test_hash", "test_rpm"]);

    let suite = JunitSuite::from_captures(&reports, Duration::ZERO, OffsetDateTime::now_utc());
    let xml = render_junit(&suite).unwrap();
    assert_eq!(suite_attr(&xml, "tests"), 3);
    assert_eq!(suite_attr(&xml, "failures"), 1);
    assert_eq!(suite_attr(&xml, "skipped"), 1);
    assert_eq!(suite_attr(&xml, "errors"), 0);
    assert_eq!(xml.matches("<testcase ").count(), 3);
    assert_eq!(xml.matches("<skipped/>").count(), 1);
    assert!(xml.contains("<failure message=\"failed test_base64\" type=\"failed\">"));
    assert!(xml.contains("FAIL [axiom/tests/test_base64.c:56]: TRUE check: valid character"));
    assert!(OffsetDateTime::parse(&suite_timestamp(&xml), &Rfc3339).is_ok());
}

#[test]
fn missing_capture_directory_is_an_empty_report() {
    let temp = tempfile::tempdir().unwrap();
    let options = CrawlOptions {
        root: temp.path().join("absent"),
        ..CrawlOptions::default()
    };
    let reports = crawl_captures(&options, &CaptureGrammar::new().unwrap()).unwrap();
    assert!(reports.is_empty());

    let suite = JunitSuite::from_captures(&reports, Duration::ZERO, OffsetDateTime::UNIX_EPOCH);
    let xml = render_junit(&suite).unwrap();
    assert_eq!(suite_attr(&xml, "tests"), 0);
}

#[test]
fn capture_without_summary_uses_file_stem() {
    let temp = tempfile::tempdir().unwrap();
    let options = CrawlOptions {
        root: temp.path().to_path_buf(),
        ..CrawlOptions::default()
    };
    let dir = options.capture_dir();
    fs::create_dir_all(&dir).unwrap();
    write_capture(&dir, "test_segv.out", "Segmentation fault\n");

    let reports = crawl_captures(&options, &CaptureGrammar::new().unwrap()).unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].handle, "test_segv");
}

#[test]
fn summary_counts_survive_rendering() {
    let identity = |path: &str| FixtureIdentity::from_path(path);
    let mut summary = Summary::new();
    summary.record(Verdict::passed(identity("tests/integration/test_a.php"), Duration::from_millis(20)));
    summary.record(Verdict::skipped(
        identity("tests/integration/test_b.php"),
        "skip: requires pdo",
        Duration::ZERO,
    ));
    summary.record(Verdict::failed(
        identity("tests/integration/test_c.php"),
        FailureReason::ExecutionCrash,
        "terminated by signal <11>",
        Duration::from_millis(5),
    ));
    summary.record(Verdict::cancelled(identity("tests/integration/test_d.php")));

    let suite = JunitSuite::from_summary(&summary, OffsetDateTime::now_utc());
    let xml = render_junit(&suite).unwrap();
    assert_eq!(suite_attr(&xml, "tests"), summary.total());
    assert_eq!(suite_attr(&xml, "failures"), summary.failed);
    assert_eq!(suite_attr(&xml, "skipped"), summary.skipped);
    assert!(xml.contains("classname=\"tests.integration\" name=\"test_a.php\""));
    assert!(xml.contains("<![CDATA[reason: ExecutionCrash\nterminated by signal <11>]]>"));
}

#[test]
fn rendered_summary_parses_back_structurally() {
    let identity = |path: &str| FixtureIdentity::from_path(path);
    let mut summary = Summary::new();
    summary.record(Verdict::passed(identity("tests/odd/test_<&\"'>.php"), Duration::from_millis(3)));
    summary.record(Verdict::failed(
        identity("tests/odd/test_cdata.php"),
        FailureReason::ExecutionCrash,
        "output ended with ]]> and \u{1} control",
        Duration::ZERO,
    ));
    summary.record(
        Verdict::failed(identity("tests/odd/test_xfail.php"), FailureReason::Mismatch, "known", Duration::ZERO)
            .with_xfail(Some("xfail: tracked".to_string())),
    );
    summary.record(Verdict::skipped(identity("tests/odd/test_skip.php"), "skip: no pdo", Duration::ZERO));
    summary.record(Verdict::cancelled(identity("tests/odd/test_cancel.php")));

    let xml = render_junit(&JunitSuite::from_summary(&summary, OffsetDateTime::UNIX_EPOCH)).unwrap();
    let suite = assert_consistent_suite(&xml);
    assert_eq!(suite.count("tests"), summary.total());
    assert_eq!(suite.count("failures"), summary.failed);
    assert_eq!(suite.count("skipped"), summary.skipped);

    let names: Vec<_> = suite.children.iter().map(|case| case.attrs["name"].as_str()).collect();
    assert_eq!(
        names,
        vec!["test_<&\"'>.php", "test_cdata.php", "test_xfail.php", "test_skip.php", "test_cancel.php"]
    );
    let failure = &suite.children[1].children[0];
    assert_eq!(failure.attrs["message"], "failed test_cdata.php");
    assert_eq!(failure.text, "reason: ExecutionCrash\noutput ended with ]]> and  control");
    assert!(suite.children[2].children[0].text.starts_with("xfail: tracked\n"));
}

#[test]
fn crawled_report_parses_back_structurally() {
    let temp = tempfile::tempdir().unwrap();
    let options = CrawlOptions {
        root: temp.path().to_path_buf(),
        ..CrawlOptions::default()
    };
    let dir = options.capture_dir();
    fs::create_dir_all(&dir).unwrap();
    write_capture(
        &dir,
        "test_a.out",
        "FAIL [axiom/tests/test_a.c:1]: x < y && z\n\
         test_a:  1 of  2 tests passed,     1 failed and     0 acceptably failed\n",
    );
    write_capture(
        &dir,
        "test_b.out",
        "test_b:  3 of  4 tests passed,     0 failed and     1 acceptably failed\n",
    );
    write_capture(&dir, "test_c.out", "test_c: all 5 tests passed\n");

    let reports = crawl_captures(&options, &CaptureGrammar::new().unwrap()).unwrap();
    let xml = render_junit(&JunitSuite::from_captures(&reports, Duration::ZERO, OffsetDateTime::UNIX_EPOCH))
        .unwrap();
    let suite = assert_consistent_suite(&xml);
    assert_eq!((suite.count("tests"), suite.count("failures"), suite.count("skipped")), (3, 1, 1));
    assert_eq!(suite.children[0].children[0].text, "FAIL [axiom/tests/test_a.c:1]: x < y && z");
}
