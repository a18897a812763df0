//! `pr-radar`: the six-phase pull-request review pipeline's CLI front end.
//!
//! One subcommand per phase group, plus `analyze` (the full pipeline) and
//! `status` (read-only), per spec §6. The GitHub/Git data source and the
//! LLM backend are external collaborators out of this crate's scope (§1):
//! this binary reads a raw diff from `--diff-file` and, absent a configured
//! model backend, evaluates with `NoopLlmOracle` so the pipeline still runs
//! end to end.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tokio_util::sync::CancellationToken;

use pr_radar_diff::{parse_git_diff, GitDiff};
use pr_radar_eval::NoopLlmOracle;
use pr_radar_focus::NoSubdivideOracle;
use pr_radar_moves::LocalProcessRediffOracle;
use pr_radar_report::{build_comment_payload, AnalysisSummary};
use pr_radar_sequencer::{Phase, PhaseResult, PhaseRunStatus, PhaseStatus};

#[derive(Parser)]
#[command(
    name = "pr-radar",
    version,
    about = "AI-assisted pull-request review: a resumable, six-phase pipeline"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Phase 1: parse the diff, detect moves, build the effective diff.
    Diff(DiffArgs),
    /// Phases 2-4: focus areas, rule loading, task generation.
    Rules(RulesArgs),
    /// Phase 5: bounded-concurrency rule evaluation.
    Evaluate(EvaluateArgs),
    /// Phase 6: aggregate evaluations into a scored report.
    Report(ReportArgs),
    /// Compose PR comment payloads from the phase-6 report.
    Comment(CommentArgs),
    /// Runs the full pipeline, phases 1 through 6.
    Analyze(AnalyzeArgs),
    /// Prints the computed status of every phase. Always exits 0.
    Status(CommonArgs),
}

#[derive(Args, Clone)]
struct CommonArgs {
    /// Pull-request number; also the phase directory's leaf component.
    pr_number: u64,

    /// Root directory phase artifacts are written under.
    #[arg(long, default_value = "./pr-radar-output")]
    output_dir: PathBuf,

    /// Repository path, used to read old/new file contents for move
    /// re-diffing and to derive the default repo slug.
    #[arg(long)]
    repo_path: Option<PathBuf>,

    /// Repository slug (directory name under `output-dir`). Defaults to
    /// `repo-path`'s final component, or `local` if neither is given.
    #[arg(long)]
    repo_slug: Option<String>,

    /// Emit machine-readable JSON instead of a human-readable summary.
    #[arg(long)]
    json: bool,
}

impl CommonArgs {
    fn slug(&self) -> String {
        self.repo_slug.clone().unwrap_or_else(|| {
            self.repo_path
                .as_ref()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .unwrap_or("local")
                .to_string()
        })
    }
}

#[derive(Args)]
struct DiffArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Path to a file holding the raw unified diff text (the diff oracle's
    /// output, §6).
    #[arg(long)]
    diff_file: PathBuf,

    /// Commit hash this diff was computed against.
    #[arg(long, default_value = "HEAD")]
    commit_hash: String,
}

#[derive(Args)]
struct RulesArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Directory to load rule files from (markdown-with-frontmatter or
    /// `.json`), per §4.5.
    #[arg(long)]
    rules_dir: PathBuf,
}

#[derive(Args)]
struct EvaluateArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Bounded-concurrency worker count. Defaults to 1 (serial) per §9's
    /// stated default for cost predictability.
    #[arg(long, default_value_t = 1)]
    workers: usize,
}

#[derive(Args)]
struct ReportArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Minimum score a violation must reach to be surfaced, per §4.8.
    #[arg(long, default_value_t = 5)]
    min_score: u8,
}

#[derive(Args)]
struct CommentArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Commit SHA the inline comment payloads are anchored to.
    #[arg(long)]
    commit_id: String,
}

#[derive(Args)]
struct AnalyzeArgs {
    #[command(flatten)]
    common: CommonArgs,

    #[arg(long)]
    diff_file: PathBuf,

    #[arg(long, default_value = "HEAD")]
    commit_hash: String,

    #[arg(long)]
    rules_dir: PathBuf,

    #[arg(long, default_value_t = 1)]
    workers: usize,

    #[arg(long, default_value_t = 5)]
    min_score: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Diff(args) => run_diff(args).await,
        Commands::Rules(args) => run_rules(args).await,
        Commands::Evaluate(args) => run_evaluate(args).await,
        Commands::Report(args) => run_report(args),
        Commands::Comment(args) => run_comment(args),
        Commands::Analyze(args) => run_analyze(args).await,
        Commands::Status(args) => {
            print_status(&args);
            return ExitCode::SUCCESS;
        }
    };

    match outcome {
        Ok(success) => {
            if success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            eprintln!("{} {err}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

/// Reads a raw unified diff and, when `repo_path` is given, the old/new
/// file contents C3 needs for re-diffing move neighborhoods. Best-effort:
/// a file that can't be read at either side is simply absent from its map,
/// which causes the move candidates touching it to be skipped (§4.3).
fn load_move_contents(
    repo_path: Option<&Path>,
    diff: &GitDiff,
) -> (HashMap<String, String>, HashMap<String, String>) {
    let mut old_contents = HashMap::new();
    let mut new_contents = HashMap::new();

    let Some(repo_path) = repo_path else {
        return (old_contents, new_contents);
    };

    for file in diff.changed_files() {
        if let Ok(contents) = std::fs::read_to_string(repo_path.join(&file)) {
            new_contents.insert(file.clone(), contents);
        }

        if let Ok(output) = std::process::Command::new("git")
            .arg("-C")
            .arg(repo_path)
            .arg("show")
            .arg(format!("{}^:{file}", diff.commit_hash))
            .output()
        {
            if output.status.success() {
                old_contents.insert(file, String::from_utf8_lossy(&output.stdout).into_owned());
            }
        }
    }

    (old_contents, new_contents)
}

async fn run_diff(args: DiffArgs) -> anyhow::Result<bool> {
    let raw_diff = std::fs::read_to_string(&args.diff_file)?;
    let (old_contents, new_contents) = match parse_git_diff(&raw_diff, &args.commit_hash) {
        Ok(diff) => load_move_contents(args.common.repo_path.as_deref(), &diff),
        Err(_) => (HashMap::new(), HashMap::new()),
    };

    let result = pr_radar_sequencer::run_phase1_pull_request(
        &args.common.output_dir,
        &args.common.slug(),
        args.common.pr_number,
        &raw_diff,
        &args.commit_hash,
        &old_contents,
        &new_contents,
        &LocalProcessRediffOracle,
    )
    .await?;

    report_phase_result(&args.common, &result)
}

async fn run_rules(args: RulesArgs) -> anyhow::Result<bool> {
    let slug = args.common.slug();

    let p2 = pr_radar_sequencer::run_phase2_focus_areas(
        &args.common.output_dir,
        &slug,
        args.common.pr_number,
        &NoSubdivideOracle,
    )
    .await?;
    if !report_phase_result(&args.common, &p2)? {
        return Ok(false);
    }

    let p3 = pr_radar_sequencer::run_phase3_rules(
        &args.common.output_dir,
        &slug,
        args.common.pr_number,
        &args.rules_dir,
    )?;
    if !report_phase_result(&args.common, &p3)? {
        return Ok(false);
    }

    let p4 =
        pr_radar_sequencer::run_phase4_tasks(&args.common.output_dir, &slug, args.common.pr_number)?;
    report_phase_result(&args.common, &p4)
}

async fn run_evaluate(args: EvaluateArgs) -> anyhow::Result<bool> {
    let result = pr_radar_sequencer::run_phase5_evaluations(
        &args.common.output_dir,
        &args.common.slug(),
        args.common.pr_number,
        NoopLlmOracle,
        args.workers,
        CancellationToken::new(),
        Some(progress_callback(args.common.json)),
    )
    .await?;

    report_phase_result(&args.common, &result)
}

fn run_report(args: ReportArgs) -> anyhow::Result<bool> {
    let result = pr_radar_sequencer::run_phase6_report(
        &args.common.output_dir,
        &args.common.slug(),
        args.common.pr_number,
        args.min_score,
    )?;
    report_phase_result(&args.common, &result)
}

fn run_comment(args: CommentArgs) -> anyhow::Result<bool> {
    let slug = args.common.slug();
    let pr_root = args
        .common
        .output_dir
        .join(&slug)
        .join(args.common.pr_number.to_string());
    let report_dir = pr_root.join(Phase::Report.dir_name());
    let pr_dir = pr_root.join(Phase::PullRequest.dir_name());

    let summary: AnalysisSummary =
        serde_json::from_str(&std::fs::read_to_string(report_dir.join("summary.json"))?)?;
    let diff: GitDiff = serde_json::from_str(&std::fs::read_to_string(
        pr_dir.join("effective-diff-parsed.json"),
    )?)?;

    let payloads: Vec<_> = summary
        .violations
        .iter()
        .map(|v| build_comment_payload(&args.commit_id, v, &diff))
        .collect();

    println!("{}", to_sorted_pretty_json(&payloads)?);
    Ok(true)
}

async fn run_analyze(args: AnalyzeArgs) -> anyhow::Result<bool> {
    let slug = args.common.slug();
    let pr_dir = args
        .common
        .output_dir
        .join(&slug)
        .join(args.common.pr_number.to_string());
    let _lock = pr_radar_sequencer::RunLock::acquire(&pr_dir)?;

    let raw_diff = std::fs::read_to_string(&args.diff_file)?;
    let (old_contents, new_contents) = match parse_git_diff(&raw_diff, &args.commit_hash) {
        Ok(diff) => load_move_contents(args.common.repo_path.as_deref(), &diff),
        Err(_) => (HashMap::new(), HashMap::new()),
    };

    let p1 = pr_radar_sequencer::run_phase1_pull_request(
        &args.common.output_dir,
        &slug,
        args.common.pr_number,
        &raw_diff,
        &args.commit_hash,
        &old_contents,
        &new_contents,
        &LocalProcessRediffOracle,
    )
    .await?;
    if !report_phase_result(&args.common, &p1)? {
        return Ok(false);
    }

    let p2 = pr_radar_sequencer::run_phase2_focus_areas(
        &args.common.output_dir,
        &slug,
        args.common.pr_number,
        &NoSubdivideOracle,
    )
    .await?;
    if !report_phase_result(&args.common, &p2)? {
        return Ok(false);
    }

    let p3 = pr_radar_sequencer::run_phase3_rules(
        &args.common.output_dir,
        &slug,
        args.common.pr_number,
        &args.rules_dir,
    )?;
    if !report_phase_result(&args.common, &p3)? {
        return Ok(false);
    }

    let p4 =
        pr_radar_sequencer::run_phase4_tasks(&args.common.output_dir, &slug, args.common.pr_number)?;
    if !report_phase_result(&args.common, &p4)? {
        return Ok(false);
    }

    let p5 = pr_radar_sequencer::run_phase5_evaluations(
        &args.common.output_dir,
        &slug,
        args.common.pr_number,
        NoopLlmOracle,
        args.workers,
        CancellationToken::new(),
        Some(progress_callback(args.common.json)),
    )
    .await?;
    if !report_phase_result(&args.common, &p5)? {
        return Ok(false);
    }

    let p6 = pr_radar_sequencer::run_phase6_report(
        &args.common.output_dir,
        &slug,
        args.common.pr_number,
        args.min_score,
    )?;
    report_phase_result(&args.common, &p6)
}

/// Serializes `value` with canonicalized (sorted) object keys: round-tripping
/// through `serde_json::Value` sorts every nested object, since `Value`'s map
/// type is a `BTreeMap` with the `preserve_order` feature off (not enabled in
/// this workspace) — `to_string_pretty` alone preserves struct declaration
/// order, which does not satisfy §6's "keys sorted" on-disk format rule.
fn to_sorted_pretty_json<T: serde::Serialize>(value: &T) -> serde_json::Result<String> {
    let canonical: serde_json::Value = serde_json::to_value(value)?;
    serde_json::to_string_pretty(&canonical)
}

fn progress_callback(json: bool) -> pr_radar_eval::ProgressFn {
    std::sync::Arc::new(move |completed, total, result| {
        if json {
            return;
        }
        let label = match result {
            pr_radar_eval::RuleEvaluationResult::Success { task_id, .. } => task_id.clone(),
            pr_radar_eval::RuleEvaluationResult::Failure { task_id, .. } => {
                format!("{task_id} (failed)")
            }
        };
        eprintln!("  [{completed}/{total}] {label}");
    })
}

/// Prints `result` (JSON or human) and reports whether it succeeded.
fn report_phase_result(common: &CommonArgs, result: &PhaseResult) -> anyhow::Result<bool> {
    if common.json {
        println!("{}", to_sorted_pretty_json(result)?);
    } else {
        let colored_label = match result.status {
            PhaseRunStatus::Success => "ok".green().bold(),
            PhaseRunStatus::Failed => "failed".red().bold(),
        };
        println!("{} {}", result.phase.label().bold(), colored_label);
        if let Some(err) = &result.error_message {
            println!("  {}", err.red());
        }
        if let Some(n) = result.stats.artifacts_produced {
            println!("  artifacts: {n}");
        }
        if let Some(ms) = result.stats.duration_ms {
            println!("  duration: {ms}ms");
        }
    }
    Ok(matches!(result.status, PhaseRunStatus::Success))
}

fn print_status(args: &CommonArgs) {
    let slug = args.slug();
    let statuses: Vec<(Phase, PhaseStatus)> = Phase::ALL
        .into_iter()
        .map(|phase| {
            let dir =
                pr_radar_sequencer::layout::phase_dir(&args.output_dir, &slug, args.pr_number, phase);
            let status = if phase == Phase::Evaluations {
                let tasks_dir = pr_radar_sequencer::layout::phase_dir(
                    &args.output_dir,
                    &slug,
                    args.pr_number,
                    Phase::Tasks,
                );
                pr_radar_sequencer::status::reconcile_evaluations_status(&tasks_dir, &dir)
            } else {
                pr_radar_sequencer::status::compute_status(&dir, phase)
            };
            (phase, status)
        })
        .collect();

    if args.json {
        let as_map: std::collections::BTreeMap<String, &'static str> = statuses
            .iter()
            .map(|(phase, status)| (phase.label().to_string(), status.as_str()))
            .collect();
        println!("{}", serde_json::to_string_pretty(&as_map).unwrap());
        return;
    }

    for (phase, status) in statuses {
        let rendered = match status {
            PhaseStatus::Complete => "complete".green(),
            PhaseStatus::Partial => "partial".yellow(),
            PhaseStatus::Failed => "failed".red(),
            PhaseStatus::NotStarted => "not started".dimmed(),
        };
        println!("{:<14} {}", phase.label(), rendered);
    }
}
