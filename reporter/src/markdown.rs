//! GitHub issue rendering
//!
//! Builds the issue title and markdown body for a canary run: a status
//! header, run metadata and artifact links, the quality gate, per-state
//! totals and the message of every failed or ignored test.

use crate::config::{ArtifactLinks, ReportMetadata};
use crate::tracker::IssueDraft;
use results::{QualityGates, ResultsAggregator, TestCaseResult, TestState, Verdict};

/// Icon used in the issue header for the overall run status.
pub fn header_icon(state: TestState) -> &'static str {
    match state {
        TestState::Failed => ":red_circle:",
        TestState::Passed => ":white_check_mark:",
        TestState::Skipped => ":large_blue_circle:",
        TestState::Ignored => ":warning:",
    }
}

/// Icon used next to individual results and summary counts.
pub fn status_icon(state: TestState) -> &'static str {
    match state {
        TestState::Failed => ":x:",
        TestState::Passed => ":white_check_mark:",
        TestState::Skipped => ":large_blue_circle:",
        TestState::Ignored => ":large_orange_diamond:",
    }
}

pub fn verdict_icon(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Pass => ":white_check_mark:",
        Verdict::Warn => ":warning:",
        Verdict::Fail => ":red_circle:",
    }
}

pub struct GitHubIssueReport<'a> {
    aggregator: &'a ResultsAggregator,
    metadata: &'a ReportMetadata,
    links: &'a ArtifactLinks,
    gates: QualityGates,
}

impl<'a> GitHubIssueReport<'a> {
    pub fn new(
        aggregator: &'a ResultsAggregator,
        metadata: &'a ReportMetadata,
        links: &'a ArtifactLinks,
        gates: QualityGates,
    ) -> Self {
        Self {
            aggregator,
            metadata,
            links,
            gates,
        }
    }

    pub fn title(&self) -> String {
        let mut title = String::new();
        if let Some(branch) = &self.metadata.branch {
            title.push_str(&format!("[{}] ", capitalize(branch)));
        }
        title.push_str("CICD Canary Build Failure");
        if let Some(snapshot) = &self.metadata.snapshot {
            title.push_str(&format!(" for {}", snapshot));
        }
        if let Some(stage) = &self.metadata.stage {
            title.push_str(&format!(" During the {} Stage", capitalize(stage)));
        }
        title
    }

    pub fn header(&self) -> String {
        let status = self.aggregator.status();
        let mut header = format!("# {}", header_icon(status));
        if let Some(snapshot) = &self.metadata.snapshot {
            header.push_str(&format!(" {}", snapshot));
        }
        header.push_str(&format!(" {}", status.label()));
        if let Some(branch) = &self.metadata.branch {
            header.push_str(&format!(" on branch {}", branch));
        }
        if let Some(stage) = &self.metadata.stage {
            header.push_str(&format!(" during the {} Stage", capitalize(stage)));
        }
        header
    }

    pub fn metadata_section(&self) -> String {
        let mut section = String::new();
        if let Some(job_url) = &self.metadata.job_url {
            section.push_str(&format!("## Job URL: {}\n", job_url));
        }

        let cluster_lines: Vec<String> = [
            cluster_line(
                "Hub",
                self.metadata.hub_platform.as_deref(),
                self.metadata.hub_version.as_deref(),
            ),
            cluster_line(
                "Import",
                self.metadata.import_platform.as_deref(),
                self.metadata.import_version.as_deref(),
            ),
        ]
        .into_iter()
        .flatten()
        .collect();

        if self.links.is_empty() && cluster_lines.is_empty() {
            return section;
        }

        section.push_str("## Artifacts & Details\n");
        let links = [
            ("Must-Gather Bucket", &self.links.must_gather_url),
            ("Results Bucket", &self.links.results_url),
            ("Markdown Report", &self.links.markdown_url),
            ("Snapshot Diff", &self.links.snapshot_diff_url),
        ];
        for (label, url) in links {
            if let Some(url) = url {
                section.push_str(&format!("[**{}**]({})\n\n", label, url));
            }
        }
        for line in cluster_lines {
            section.push_str(&line);
        }
        section
    }

    pub fn summary(&self) -> String {
        let counts = self.aggregator.counts();
        let verdict = self.aggregator.evaluate(&self.gates);

        let mut summary = String::from("## Quality Gate\n\n");
        summary.push_str(&format!(
            "{} **Percentage Executed:** {}% ({}% Quality Gate)\n\n",
            verdict_icon(verdict.executed.verdict),
            verdict.executed.percentage,
            verdict.executed.gate
        ));
        summary.push_str(&format!(
            "{} **Percentage Passing:** {}% ({}% Quality Gate)\n\n",
            verdict_icon(verdict.passing.verdict),
            verdict.passing.percentage,
            verdict.passing.gate
        ));

        summary.push_str("## Summary\n\n");
        summary.push_str(&format!(
            "**{} {} {} Passed**\n\n",
            status_icon(TestState::Passed),
            counts.passed,
            plural(counts.passed, "Test", "Tests")
        ));
        summary.push_str(&format!(
            "**{} {} {} Failed**\n\n",
            status_icon(TestState::Failed),
            counts.failed,
            plural(counts.failed, "Test", "Tests")
        ));
        summary.push_str(&format!(
            "**{} {} {} Ignored**\n\n",
            status_icon(TestState::Ignored),
            counts.ignored,
            plural(counts.ignored, "Failure", "Failures")
        ));
        summary.push_str(&format!(
            "**{} {} Test {} Skipped**\n\n",
            status_icon(TestState::Skipped),
            counts.skipped,
            plural(counts.skipped, "Case", "Cases")
        ));

        let skipped_files = self.aggregator.skipped_files();
        if !skipped_files.is_empty() {
            summary.push_str("## Unreadable Result Files\n\n");
            for file in skipped_files {
                summary.push_str(&format!("* `{}`: {}\n", file.path.display(), file.reason));
            }
            summary.push('\n');
        }
        summary
    }

    pub fn failing_tests(&self) -> String {
        let mut body = String::from("## Failing Tests\n\n");
        for result in self.aggregator.failures() {
            body.push_str(&failure_entry(result));
        }
        body
    }

    pub fn body(&self) -> String {
        [
            self.header(),
            self.metadata_section(),
            self.summary(),
            self.failing_tests(),
        ]
        .iter()
        .map(|section| format!("{}\n", section))
        .collect()
    }

    pub fn to_draft(&self, labels: Vec<String>) -> IssueDraft {
        IssueDraft::new(self.title(), self.body()).with_labels(labels)
    }
}

fn failure_entry(result: &TestCaseResult) -> String {
    let mut entry = format!(
        "### {} {} -> {}\n\n",
        status_icon(result.state),
        result.testsuite,
        result.name
    );
    let ownership: Vec<String> = [
        ("Squad", &result.metadata.squad),
        ("Owner", &result.metadata.owner),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.as_ref().map(|v| format!("**{}:** {}", label, v)))
    .collect();
    if !ownership.is_empty() {
        entry.push_str(&format!("{}\n\n", ownership.join("    ")));
    }
    entry.push_str(&format!("```\n{}\n```\n", result.metadata.message));
    entry
}

fn cluster_line(cluster: &str, platform: Option<&str>, version: Option<&str>) -> Option<String> {
    match (platform, version) {
        (Some(platform), Some(version)) => Some(format!(
            "**{cluster} Cluster Platform:** {platform}    **{cluster} Cluster Version:** {version}\n\n"
        )),
        (None, Some(version)) => Some(format!("**{cluster} Cluster Version:** {version}\n\n")),
        (Some(platform), None) => Some(format!("**{cluster} Cluster Platform:** {platform}\n\n")),
        (None, None) => None,
    }
}

fn plural<'s>(count: usize, singular: &'s str, plural: &'s str) -> &'s str {
    if count == 1 {
        singular
    } else {
        plural
    }
}

/// Uppercase the first character and lowercase the rest.
fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
