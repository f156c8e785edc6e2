#![deny(missing_docs)]
//! Docsynth command-line interface.
//!
//! Analyzes Python sources for docstring coverage and PEP 257 compliance and
//! prints them back with synthesized docstrings spliced in.

use clap::{Args, Parser, Subcommand, ValueEnum};
use docsynth_core::{
    AnalysisOptions, AnalysisStatus, AnnotateMode, DEFAULT_ISSUE_LIMIT, DocStyle, FileAnalysis,
    SourceInspector, StdFileSystem, compliance_headline, format_issue, render_analysis_markdown,
    render_json,
};
#[cfg(not(test))]
use env_logger::Env;
use std::collections::HashSet;
use std::fmt::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub(crate) type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

type Inspector = SourceInspector<StdFileSystem>;

#[derive(Parser)]
#[command(name = "docsynth", version, about = "Docstring synthesis and validation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct SourceArgs {
    /// Python files or directories to process.
    #[arg(required = true)]
    paths: Vec<PathBuf>,
    /// Docstring style: google, numpy or rest.
    #[arg(long, env = "DOCSYNTH_STYLE", default_value = "google")]
    style: DocStyle,
    /// Only synthesize docstrings for definitions that lack one.
    #[arg(long)]
    missing_only: bool,
}

impl SourceArgs {
    fn options(&self, validate: bool) -> AnalysisOptions {
        AnalysisOptions {
            style: self.style,
            validate,
            mode: if self.missing_only {
                AnnotateMode::MissingOnly
            } else {
                AnnotateMode::All
            },
        }
    }
}

#[derive(Args, Clone)]
struct OutputArgs {
    /// Output format for report data.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Write the report to a file instead of stdout.
    #[arg(long = "report-output")]
    report_output: Option<PathBuf>,
    /// Number of compliance issues listed per file.
    #[arg(long, default_value_t = DEFAULT_ISSUE_LIMIT)]
    issue_limit: usize,
}

#[derive(ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
}

#[derive(Subcommand)]
enum Commands {
    /// Report coverage and compliance, with annotated sources.
    Analyze {
        #[command(flatten)]
        source: SourceArgs,
        /// Skip the compliance issue listing.
        #[arg(long)]
        no_validation: bool,
        #[command(flatten)]
        report: OutputArgs,
        /// Maximum number of files analyzed concurrently.
        #[arg(short = 'j', long, default_value_t = 1)]
        concurrency: usize,
    },
    /// Print sources with synthesized docstrings.
    Annotate {
        #[command(flatten)]
        source: SourceArgs,
        /// Write annotated files into this directory instead of stdout.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// List supported docstring styles.
    Styles,
}

#[cfg(not(test))]
#[tokio::main]
async fn main() -> CliResult<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            source,
            no_validation,
            report,
            concurrency,
        } => {
            let options = source.options(!no_validation);
            run_analyze(source.paths, options, concurrency, report).await?
        }
        Commands::Annotate { source, output_dir } => {
            let options = source.options(false);
            run_annotate(source.paths, options, output_dir).await?
        }
        Commands::Styles => print!("{}", render_styles()),
    }

    Ok(())
}

#[cfg(test)]
fn main() {}

/// One unit of work: a discovered file, or a path that could not be expanded.
enum Target {
    /// `relative` is the file's path below the argument it was discovered from.
    File { path: PathBuf, relative: PathBuf },
    Invalid { label: String, error: String },
}

impl Target {
    fn file(path: PathBuf, root: &Path) -> Self {
        let relative = path
            .strip_prefix(root)
            .ok()
            .filter(|relative| !relative.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .or_else(|| path.file_name().map(PathBuf::from))
            .unwrap_or_else(|| path.clone());
        Self::File { path, relative }
    }

    fn relative(&self) -> Option<&Path> {
        match self {
            Self::File { relative, .. } => Some(relative),
            Self::Invalid { .. } => None,
        }
    }
}

fn discover_targets(inspector: &Inspector, paths: &[PathBuf]) -> Vec<Target> {
    let mut targets = Vec::new();
    for path in paths {
        match inspector.discover(path) {
            Ok(files) => targets.extend(files.into_iter().map(|file| Target::file(file, path))),
            Err(err) => {
                log::warn!("skipping {}: {err}", path.display());
                targets.push(Target::Invalid {
                    label: path.display().to_string(),
                    error: err.to_string(),
                });
            }
        }
    }
    targets
}

async fn analyze_targets(
    inspector: Arc<Inspector>,
    targets: Vec<Target>,
    options: AnalysisOptions,
    concurrency: usize,
) -> CliResult<Vec<FileAnalysis>> {
    let concurrency = if concurrency == 0 { 1 } else { concurrency };
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut tasks = JoinSet::new();
    let mut slots: Vec<Option<FileAnalysis>> = vec![None; targets.len()];
    let mut labels = Vec::with_capacity(targets.len());

    for (index, target) in targets.into_iter().enumerate() {
        match target {
            Target::File { path, .. } => {
                labels.push(path.display().to_string());
                let permit = semaphore.clone().acquire_owned().await?;
                let inspector = inspector.clone();
                tasks.spawn_blocking(move || {
                    let _permit = permit;
                    (index, inspector.analyze_path(&path, &options))
                });
            }
            Target::Invalid { label, error } => {
                slots[index] = Some(FileAnalysis::failed(label.clone(), &options, error));
                labels.push(label);
            }
        }
    }

    while let Some(result) = tasks.join_next().await {
        match result {
            Ok((index, analysis)) => slots[index] = Some(analysis),
            Err(err) => log::error!("analysis task failed: {err}"),
        }
    }

    Ok(slots
        .into_iter()
        .zip(labels)
        .map(|(slot, label)| {
            slot.unwrap_or_else(|| FileAnalysis::failed(label, &options, "analysis task failed"))
        })
        .collect())
}

async fn run_analyze(
    paths: Vec<PathBuf>,
    options: AnalysisOptions,
    concurrency: usize,
    report: OutputArgs,
) -> CliResult<()> {
    let inspector = Arc::new(SourceInspector::new(StdFileSystem::new()));
    let targets = discover_targets(&inspector, &paths);
    if targets.is_empty() {
        println!("No Python files found to analyze.");
        return Ok(());
    }

    let analyses = analyze_targets(inspector, targets, options, concurrency).await?;
    emit_analysis_reports(&analyses, &report).await
}

async fn run_annotate(
    paths: Vec<PathBuf>,
    options: AnalysisOptions,
    output_dir: Option<PathBuf>,
) -> CliResult<()> {
    let inspector = Arc::new(SourceInspector::new(StdFileSystem::new()));
    let targets = discover_targets(&inspector, &paths);
    if targets.is_empty() {
        println!("No Python files found to annotate.");
        return Ok(());
    }

    let relatives: Vec<Option<PathBuf>> = targets
        .iter()
        .map(|target| target.relative().map(Path::to_path_buf))
        .collect();
    let analyses = analyze_targets(inspector, targets, options, 1).await?;
    let mut written = HashSet::new();
    let mut failures = 0;
    for (analysis, relative) in analyses.iter().zip(relatives) {
        let source = match (&analysis.status, &analysis.annotated_source) {
            (AnalysisStatus::Analyzed, Some(source)) => source,
            _ => {
                failures += 1;
                let error = analysis.error.as_deref().unwrap_or("no annotated source");
                eprintln!("Failed to annotate {}: {error}", analysis.source);
                continue;
            }
        };
        let Some(dir) = &output_dir else {
            print!("{}", render_annotated(&analysis.source, source));
            continue;
        };

        let relative = relative.unwrap_or_else(|| PathBuf::from(&analysis.source));
        let path = annotated_output_path(dir, &relative);
        if !written.insert(path.clone()) {
            failures += 1;
            eprintln!(
                "Failed to annotate {}: {} was already written in this run",
                analysis.source,
                path.display()
            );
            continue;
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, source).await?;
        println!("Wrote {}", path.display());
    }

    if failures > 0 {
        return Err(format!("{failures} file(s) could not be annotated").into());
    }
    Ok(())
}

/// Output location mirroring `relative` below `dir`; parent and root components are dropped.
fn annotated_output_path(dir: &Path, relative: &Path) -> PathBuf {
    let mut path = dir.to_path_buf();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            path.push(part);
        }
    }
    path
}

fn render_annotated(label: &str, source: &str) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# {label}");
    let _ = write!(output, "{source}");
    if !source.ends_with('\n') {
        let _ = writeln!(output);
    }
    output
}

fn render_styles() -> String {
    let mut output = String::new();
    for style in DocStyle::ALL {
        let marker = if style == DocStyle::default() {
            " (default)"
        } else {
            ""
        };
        let _ = writeln!(output, "{}{marker}", style.label());
    }
    output
}

async fn emit_analysis_reports(analyses: &[FileAnalysis], output: &OutputArgs) -> CliResult<()> {
    let contents = match output.format {
        OutputFormat::Text => render_analysis_text(analyses, output.issue_limit),
        OutputFormat::Markdown => render_analysis_markdown(analyses, output.issue_limit),
        OutputFormat::Json => render_json(analyses)?,
    };
    emit_output(output, contents).await
}

async fn emit_output(output: &OutputArgs, contents: String) -> CliResult<()> {
    if let Some(path) = &output.report_output {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await?;
    } else {
        print!("{contents}");
    }
    Ok(())
}

fn render_analysis_text(analyses: &[FileAnalysis], issue_limit: usize) -> String {
    let mut output = String::new();
    for analysis in analyses {
        let _ = writeln!(output, "Source: {}", analysis.source);
        let _ = writeln!(output, "Style: {}", analysis.style);
        match analysis.status {
            AnalysisStatus::Analyzed => {
                let _ = writeln!(output, "Status: analyzed");
            }
            AnalysisStatus::Failed => {
                let error = analysis.error.as_deref().unwrap_or("unknown error");
                let _ = writeln!(output, "Status: failed ({error})");
                let _ = writeln!(output);
                continue;
            }
            AnalysisStatus::Pending => {
                let _ = writeln!(output, "Status: pending");
                let _ = writeln!(output);
                continue;
            }
        }

        match &analysis.coverage {
            Some(coverage) => {
                let _ = writeln!(
                    output,
                    "Coverage: {:.1}% ({} of {} symbols documented)",
                    coverage.coverage_percent, coverage.documented_symbols, coverage.total_symbols
                );
            }
            None => {
                let _ = writeln!(output, "Coverage: unavailable");
            }
        }

        if let Some(source) = &analysis.annotated_source {
            let _ = writeln!(output, "Annotated source:");
            for line in source.lines() {
                let _ = writeln!(output, "  | {line}");
            }
        }

        if analysis.validated {
            if let Some(compliance) = &analysis.compliance {
                let percent = analysis.compliance_percent.unwrap_or(0.0);
                let _ = writeln!(output, "Compliance: {}", compliance_headline(compliance, percent));
                for issue in compliance.issues.iter().take(issue_limit) {
                    let _ = writeln!(output, "- {}", format_issue(issue));
                }
                let hidden = compliance.issues.len().saturating_sub(issue_limit);
                if hidden > 0 {
                    let _ = writeln!(output, "- ... {hidden} more");
                }
            }
        }

        let _ = writeln!(output);
    }
    output
}
