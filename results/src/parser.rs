//! JUnit XML parsing
//!
//! Turns one JUnit-style document into normalized [`TestCaseResult`] records.
//! Both `<testsuites>`-wrapped and bare `<testsuite>` documents are accepted,
//! including nested suites; a case is attributed to its innermost suite.
//!
//! Classification per `<testcase>`:
//! - `failed` when it has a `<failure>` or `<error>` child
//! - `skipped` when it has a `<skipped>` child (and no failure)
//! - `passed` otherwise
//!
//! The failure message is the text content of the `<failure>`/`<error>`
//! element, verbatim, falling back to its `message` attribute when the body is
//! blank. Messages of several failure elements are joined with newlines.

use crate::types::{TestCaseResult, TestState};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors produced while parsing a single results file.
///
/// Every variant carries the path of the offending file so the aggregator can
/// report which input was excluded.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{} is not valid UTF-8", .path.display())]
    Encoding { path: PathBuf },

    #[error("Malformed XML in {} at byte {position}: {source}", .path.display())]
    Xml {
        path: PathBuf,
        position: usize,
        source: quick_xml::Error,
    },

    #[error("Unexpected end of document in {}", .path.display())]
    Truncated { path: PathBuf },

    #[error("{} contains no XML elements", .path.display())]
    Empty { path: PathBuf },

    #[error("{} is not a JUnit document (root element <{root}>)", .path.display())]
    NotJUnit { path: PathBuf, root: String },
}

impl ParseError {
    pub fn path(&self) -> &Path {
        match self {
            ParseError::Io { path, .. }
            | ParseError::Encoding { path }
            | ParseError::Xml { path, .. }
            | ParseError::Truncated { path }
            | ParseError::Empty { path }
            | ParseError::NotJUnit { path, .. } => path,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Read and parse one results file.
///
/// The file is read once per call; parsing the same path again yields the
/// same records in the same order.
pub fn parse_file(path: impl AsRef<Path>) -> ParseResult<Vec<TestCaseResult>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_bytes(&bytes, path)
}

/// Parse an in-memory document. `origin` is only used for error reporting.
pub fn parse_bytes(bytes: &[u8], origin: &Path) -> ParseResult<Vec<TestCaseResult>> {
    let xml = std::str::from_utf8(bytes).map_err(|_| ParseError::Encoding {
        path: origin.to_path_buf(),
    })?;
    parse_str(xml, origin)
}

pub fn parse_str(xml: &str, origin: &Path) -> ParseResult<Vec<TestCaseResult>> {
    // Failure bodies are kept verbatim.
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut walker = DocumentWalker::default();
    let mut depth = 0usize;
    let mut root: Option<String> = None;

    let xml_error = |reader: &Reader<&[u8]>, source: quick_xml::Error| ParseError::Xml {
        path: origin.to_path_buf(),
        position: reader.buffer_position(),
        source,
    };

    loop {
        let event = reader
            .read_event()
            .map_err(|source| xml_error(&reader, source))?;

        match event {
            Event::Start(ref element) | Event::Empty(ref element) => {
                let is_empty = matches!(event, Event::Empty(_));
                if root.is_none() {
                    let name = local_name(element);
                    if name != "testsuites" && name != "testsuite" {
                        return Err(ParseError::NotJUnit {
                            path: origin.to_path_buf(),
                            root: name,
                        });
                    }
                    root = Some(name);
                }
                if !is_empty {
                    depth += 1;
                }
                walker
                    .open(element, is_empty)
                    .map_err(|source| xml_error(&reader, source))?;
            }
            Event::End(ref element) => {
                depth = depth.saturating_sub(1);
                walker.close(element.local_name().as_ref());
            }
            Event::Text(ref text) => {
                let text = text.unescape().map_err(|source| xml_error(&reader, source))?;
                walker.text(&text);
            }
            Event::CData(ref data) => {
                walker.text(&String::from_utf8_lossy(data));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if root.is_none() {
        return Err(ParseError::Empty {
            path: origin.to_path_buf(),
        });
    }
    if depth != 0 {
        return Err(ParseError::Truncated {
            path: origin.to_path_buf(),
        });
    }

    debug!(
        "Parsed {} test cases from {}",
        walker.results.len(),
        origin.display()
    );
    Ok(walker.results)
}

fn local_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, quick_xml::Error> {
    match element.try_get_attribute(key)? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

/// A `<testcase>` whose end tag has not been seen yet.
#[derive(Debug)]
struct PendingCase {
    result: TestCaseResult,
    failure: Option<FailureCapture>,
}

/// Text collected from the `<failure>`/`<error>` element currently open.
#[derive(Debug, Default)]
struct FailureCapture {
    body: String,
    message_attr: Option<String>,
}

#[derive(Debug, Default)]
struct DocumentWalker {
    suites: Vec<String>,
    case: Option<PendingCase>,
    results: Vec<TestCaseResult>,
}

impl DocumentWalker {
    fn open(&mut self, element: &BytesStart<'_>, is_empty: bool) -> Result<(), quick_xml::Error> {
        match element.local_name().as_ref() {
            b"testsuite" => {
                if !is_empty {
                    self.suites.push(attribute(element, b"name")?.unwrap_or_default());
                }
            }
            b"testcase" => {
                let name = attribute(element, b"name")?.unwrap_or_default();
                let testsuite = match self.suites.last() {
                    Some(suite) => suite.clone(),
                    None => attribute(element, b"classname")?.unwrap_or_default(),
                };
                let mut result = TestCaseResult::passed(testsuite, name);
                result.metadata.duration = attribute(element, b"time")?
                    .and_then(|time| time.trim().parse::<f64>().ok());

                self.case = Some(PendingCase {
                    result,
                    failure: None,
                });
                if is_empty {
                    self.finish_case();
                }
            }
            b"failure" | b"error" => {
                if let Some(case) = self.case.as_mut() {
                    case.result.state = TestState::Failed;
                    let capture = FailureCapture {
                        body: String::new(),
                        message_attr: attribute(element, b"message")?,
                    };
                    if is_empty {
                        append_message(&mut case.result.metadata.message, capture.into_message());
                    } else {
                        case.failure = Some(capture);
                    }
                }
            }
            b"skipped" => {
                if let Some(case) = self.case.as_mut() {
                    if case.result.state != TestState::Failed {
                        case.result.state = TestState::Skipped;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        if let Some(capture) = self.case.as_mut().and_then(|case| case.failure.as_mut()) {
            capture.body.push_str(text);
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"testsuite" => {
                self.suites.pop();
            }
            b"testcase" => self.finish_case(),
            b"failure" | b"error" => {
                if let Some(case) = self.case.as_mut() {
                    if let Some(capture) = case.failure.take() {
                        append_message(&mut case.result.metadata.message, capture.into_message());
                    }
                }
            }
            _ => {}
        }
    }

    fn finish_case(&mut self) {
        if let Some(case) = self.case.take() {
            self.results.push(case.result);
        }
    }
}

impl FailureCapture {
    fn into_message(self) -> String {
        if self.body.trim().is_empty() {
            self.message_attr.unwrap_or_default()
        } else {
            self.body
        }
    }
}

/// Cases with several `<failure>`/`<error>` children keep every message.
fn append_message(message: &mut String, addition: String) {
    if addition.is_empty() {
        return;
    }
    if !message.is_empty() {
        message.push('\n');
    }
    message.push_str(&addition);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> ParseResult<Vec<TestCaseResult>> {
        parse_str(xml, Path::new("fixture.xml"))
    }

    #[test]
    fn test_classifies_cases() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuites>
  <testsuite name="login" tests="4">
    <testcase name="renders" classname="ui" time="0.25"/>
    <testcase name="submits">
      <failure message="expected 200">AssertionError: got 500</failure>
    </testcase>
    <testcase name="crashes"><error message="panic"/></testcase>
    <testcase name="later"><skipped/></testcase>
  </testsuite>
</testsuites>"#;

        let results = parse(xml).unwrap();
        assert_eq!(results.len(), 4);

        assert_eq!(results[0].testsuite, "login");
        assert_eq!(results[0].name, "renders");
        assert_eq!(results[0].state, TestState::Passed);
        assert_eq!(results[0].metadata.message, "");
        assert_eq!(results[0].metadata.duration, Some(0.25));

        assert_eq!(results[1].state, TestState::Failed);
        assert_eq!(results[1].metadata.message, "AssertionError: got 500");

        assert_eq!(results[2].state, TestState::Failed);
        assert_eq!(results[2].metadata.message, "panic");

        assert_eq!(results[3].state, TestState::Skipped);
        assert_eq!(results[3].metadata.message, "");
    }

    #[test]
    fn test_bare_testsuite_root_and_cdata() {
        let xml = r#"<testsuite name="api">
  <testcase name="timeout"><failure><![CDATA[waited <30s> for pod]]></failure></testcase>
</testsuite>"#;

        let results = parse(xml).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].testsuite, "api");
        assert_eq!(results[0].metadata.message, "waited <30s> for pod");
    }

    #[test]
    fn test_failure_body_is_kept_verbatim() {
        let xml = "<testsuite name=\"s\">\
<testcase name=\"mixed\"><failure>expected <![CDATA[<b>]]> but got <!-- note -->x</failure></testcase>\
<testcase name=\"trace\"><failure>\n    at foo()\n    at bar()\n</failure></testcase>\
<testcase name=\"blank\"><failure message=\"from attribute\">\n  </failure></testcase>\
<testcase name=\"twice\"><failure>first</failure><error>second</error></testcase>\
</testsuite>";

        let results = parse(xml).unwrap();
        assert_eq!(results[0].metadata.message, "expected <b> but got x");
        assert_eq!(results[1].metadata.message, "\n    at foo()\n    at bar()\n");
        assert_eq!(results[2].metadata.message, "from attribute");
        assert_eq!(results[3].metadata.message, "first\nsecond");
    }

    #[test]
    fn test_failure_wins_over_skipped() {
        let xml = r#"<testsuite name="s">
  <testcase name="both"><skipped/><failure message="late failure"/></testcase>
  <testcase name="reverse"><failure message="early failure"/><skipped/></testcase>
</testsuite>"#;

        let results = parse(xml).unwrap();
        assert!(results.iter().all(|r| r.state == TestState::Failed));
    }

    #[test]
    fn test_nested_suites_use_innermost_name() {
        let xml = r#"<testsuites>
  <testsuite name="outer">
    <testsuite name="inner"><testcase name="a"/></testsuite>
    <testcase name="b"/>
  </testsuite>
</testsuites>"#;

        let results = parse(xml).unwrap();
        assert_eq!(results[0].testsuite, "inner");
        assert_eq!(results[1].testsuite, "outer");
    }

    #[test]
    fn test_escaped_text_is_unescaped() {
        let xml = r#"<testsuite name="s &amp; t"><testcase name="x"><failure>a &lt; b</failure></testcase></testsuite>"#;

        let results = parse(xml).unwrap();
        assert_eq!(results[0].testsuite, "s & t");
        assert_eq!(results[0].metadata.message, "a < b");
    }

    #[test]
    fn test_empty_suites_produce_no_results() {
        let results = parse(r#"<testsuites><testsuite name="none"/></testsuites>"#).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_truncated_document_is_rejected() {
        let err = parse(r#"<testsuite name="s"><testcase name="a">"#).unwrap_err();
        assert_eq!(err.path(), Path::new("fixture.xml"));
    }

    #[test]
    fn test_mismatched_tags_are_rejected() {
        let err = parse(r#"<testsuite name="s"><testcase name="a"></testsuite>"#).unwrap_err();
        assert_eq!(err.path(), Path::new("fixture.xml"));
    }

    #[test]
    fn test_non_junit_root_is_rejected() {
        let err = parse(r#"<html><body/></html>"#).unwrap_err();
        assert!(matches!(err, ParseError::NotJUnit { ref root, .. } if root == "html"));
    }

    #[test]
    fn test_plain_text_is_rejected() {
        let err = parse("this is not xml").unwrap_err();
        assert!(matches!(err, ParseError::Empty { .. }));
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let err = parse_bytes(&[0x3c, 0xff, 0xfe], Path::new("bad.xml")).unwrap_err();
        assert!(matches!(err, ParseError::Encoding { .. }));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = parse_file("/definitely/not/here.xml").unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
        assert_eq!(err.path(), Path::new("/definitely/not/here.xml"));
        assert!(err.to_string().contains("/definitely/not/here.xml"));
    }
}
