use clap::{Args, Parser, Subcommand};
use reporter::{
    publish_issue_with, write_output, ArtifactLinks, DryRunTracker, GitHubConfig,
    GitHubIssueReport, GitHubTracker, IssueTracker, JsonReport, ReportMetadata, ReportRun,
    TrackerResult,
};
use results::QualityGates;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reporter")]
#[command(about = "Aggregate JUnit XML results into canary reports")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a GitHub issue for the run and file it
    Gh(GhArgs),
    /// Render a JSON report for the run
    Js(JsArgs),
}

#[derive(Args)]
struct CommonArgs {
    /// Directories containing JUnit XML result files
    #[arg(required = true)]
    results_directory: Vec<PathBuf>,
    /// Snapshot under test
    #[arg(long)]
    snapshot: Option<String>,
    /// Branch the snapshot was built from
    #[arg(long)]
    branch: Option<String>,
    /// Pipeline stage that produced the results
    #[arg(long)]
    stage: Option<String>,
    #[arg(long)]
    hub_version: Option<String>,
    #[arg(long)]
    hub_platform: Option<String>,
    #[arg(long)]
    import_version: Option<String>,
    #[arg(long)]
    import_platform: Option<String>,
    /// CI job URL
    #[arg(long)]
    job_url: Option<String>,
    #[arg(long)]
    build_id: Option<String>,
    /// JSON file listing known failures to ignore
    #[arg(long)]
    ignore_list: Option<PathBuf>,
    /// Minimum percentage of cases that must execute
    #[arg(long, default_value_t = 100)]
    executed_quality_gate: u8,
    /// Minimum percentage of executed cases that must pass
    #[arg(long, default_value_t = 100)]
    passing_quality_gate: u8,
}

impl CommonArgs {
    fn metadata(&self) -> ReportMetadata {
        let mut metadata = ReportMetadata::new()
            .with_hub(self.hub_version.clone(), self.hub_platform.clone())
            .with_import(self.import_version.clone(), self.import_platform.clone())
            .with_job(self.job_url.clone(), self.build_id.clone());
        metadata.snapshot = self.snapshot.clone();
        metadata.branch = self.branch.clone();
        metadata.stage = self.stage.clone();
        metadata
    }

    fn load(&self) -> Result<ReportRun, Box<dyn std::error::Error>> {
        let gates = QualityGates::new(self.executed_quality_gate, self.passing_quality_gate)?;
        Ok(ReportRun::load(
            &self.results_directory,
            self.ignore_list.as_deref(),
            gates,
        )?)
    }
}

#[derive(Args)]
struct GhArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Also write the issue body to this file
    #[arg(short, long)]
    output_file: Option<PathBuf>,
    /// Label to apply to the issue (repeatable)
    #[arg(short, long = "tag")]
    tags: Vec<String>,
    /// Repository to open the issue in
    #[arg(short, long)]
    repo: Option<String>,
    #[arg(long)]
    github_organization: Option<String>,
    /// Falls back to GITHUB_TOKEN
    #[arg(long)]
    github_token: Option<String>,
    #[arg(long)]
    github_api_url: Option<String>,
    /// TOML file with GitHub settings; flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    markdown_url: Option<String>,
    #[arg(long)]
    snapshot_diff_url: Option<String>,
    #[arg(long)]
    results_url: Option<String>,
    #[arg(long)]
    must_gather_url: Option<String>,
    /// Render and log the issue without filing it
    #[arg(long)]
    dry_run: bool,
}

impl GhArgs {
    fn github_config(&self) -> Result<GitHubConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => GitHubConfig::from_toml_file(path)?,
            None => GitHubConfig::default(),
        };
        if let Some(api_url) = &self.github_api_url {
            config = config.with_api_url(api_url);
        }
        if let Some(organization) = &self.github_organization {
            config = config.with_organization(organization);
        }
        if let Some(repo) = &self.repo {
            config = config.with_repository(repo);
        }
        if let Some(token) = &self.github_token {
            config = config.with_token(token);
        }
        if !self.tags.is_empty() {
            config = config.with_tags(self.tags.clone());
        }
        Ok(config.with_token_from_env())
    }

    fn links(&self) -> ArtifactLinks {
        ArtifactLinks {
            must_gather_url: self.must_gather_url.clone(),
            results_url: self.results_url.clone(),
            markdown_url: self.markdown_url.clone(),
            snapshot_diff_url: self.snapshot_diff_url.clone(),
        }
    }
}

#[derive(Args)]
struct JsArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// URL of the issue filed for this run
    #[arg(long)]
    issue_url: Option<String>,
    /// Write the report here instead of stdout
    #[arg(short, long)]
    output_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Gh(args) => github_issue(args).await?,
        Commands::Js(args) => json_report(args)?,
    }

    Ok(())
}

async fn github_issue(args: GhArgs) -> Result<(), Box<dyn std::error::Error>> {
    let run = args.common.load()?;
    let metadata = args.common.metadata();
    let links = args.links();
    let config = args.github_config()?;

    let report = GitHubIssueReport::new(&run.aggregator, &metadata, &links, run.gates);
    let draft = report.to_draft(config.tags.clone());

    let dry_run = args.dry_run;
    let build_tracker = move || -> TrackerResult<Box<dyn IssueTracker>> {
        if dry_run {
            Ok(Box::new(DryRunTracker::new(&config)))
        } else {
            Ok(Box::new(GitHubTracker::new(config)?))
        }
    };

    if let Some(reference) =
        publish_issue_with(&draft, args.output_file.as_deref(), build_tracker).await?
    {
        println!("{}", reference.url);
    }
    Ok(())
}

fn json_report(args: JsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let run = args.common.load()?;
    let metadata = args.common.metadata();

    let report = JsonReport::build(
        &run.aggregator,
        &metadata,
        run.ignorelist.entries(),
        run.gates,
        args.issue_url,
    );
    let json = report.to_json_string()?;

    match &args.output_file {
        Some(path) => write_output(path, &json)?,
        None => println!("{}", json),
    }
    info!("Overall quality gate verdict: {:?}", report.quality_gate.overall());
    Ok(())
}
