// runner/src/main.rs

mod config;
mod errors;
mod workflows;

use crate::config::RunnerConfig;
use crate::errors::{Result as RunnerResult, RunnerError};
use cistern::ci::{detect, ProcessEnv};
use cistern::{prepare_all_lifecycle, run_stage, CiProvider, LifecycleStage, PipelineRun, StageRegistry, Workflow};
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cistern")]
#[command(version)]
#[command(about = "Run CI lifecycle stages for a Cargo package")]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run the before_install stage
  #[command(alias = "before_install")]
  BeforeInstall,
  /// Run the install stage
  Install,
  /// Run the after_install stage
  #[command(alias = "after_install")]
  AfterInstall,
  /// Run the before_script stage
  #[command(alias = "before_script")]
  BeforeScript,
  /// Run the script stage
  Script,
  /// Run the after_success stage
  #[command(alias = "after_success")]
  AfterSuccess,
  /// Run the after_failure stage (never run automatically)
  #[command(alias = "after_failure")]
  AfterFailure,
  /// Run the before_deploy stage
  #[command(alias = "before_deploy")]
  BeforeDeploy,
  /// Run the deploy stage
  Deploy,
  /// Run the after_deploy stage
  #[command(alias = "after_deploy")]
  AfterDeploy,
  /// Run the after_script stage
  #[command(alias = "after_script")]
  AfterScript,
  /// Prepare every stage, then run the whole lifecycle
  Run,
  /// Prepare every stage without running anything
  Prepare,
  /// List stages and their steps
  List,
  /// Show detected CI metadata
  Info,
}

impl Commands {
  fn lifecycle_stage(&self) -> Option<LifecycleStage> {
    match self {
      Commands::BeforeInstall => Some(LifecycleStage::BeforeInstall),
      Commands::Install => Some(LifecycleStage::Install),
      Commands::AfterInstall => Some(LifecycleStage::AfterInstall),
      Commands::BeforeScript => Some(LifecycleStage::BeforeScript),
      Commands::Script => Some(LifecycleStage::Script),
      Commands::AfterSuccess => Some(LifecycleStage::AfterSuccess),
      Commands::AfterFailure => Some(LifecycleStage::AfterFailure),
      Commands::BeforeDeploy => Some(LifecycleStage::BeforeDeploy),
      Commands::Deploy => Some(LifecycleStage::Deploy),
      Commands::AfterDeploy => Some(LifecycleStage::AfterDeploy),
      Commands::AfterScript => Some(LifecycleStage::AfterScript),
      Commands::Run | Commands::Prepare | Commands::List | Commands::Info => None,
    }
  }
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  // Load configuration before the subscriber so CISTERN_LOG can set its level.
  let config = match RunnerConfig::from_env() {
    Ok(cfg) => cfg,
    Err(e) => {
      eprintln!("cistern: {}", e);
      return ExitCode::FAILURE;
    }
  };

  // Initialize tracing subscriber for logging (RUST_LOG overrides CISTERN_LOG)
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE) // Log when spans close, showing duration
    .init();

  match dispatch(&cli.command, &config) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      tracing::event!(Level::ERROR, error = %e, "cistern failed.");
      ExitCode::FAILURE
    }
  }
}

fn dispatch(command: &Commands, config: &RunnerConfig) -> RunnerResult<()> {
  // One registry per process invocation, passed down explicitly.
  let ci: Arc<dyn CiProvider> = Arc::new(detect(Arc::new(ProcessEnv)));
  let workflow = workflows::cargo_package_checks(config, ci.clone())?;

  if let Some(stage) = command.lifecycle_stage() {
    return run_stage(stage.as_str(), &workflow);
  }

  match command {
    Commands::Run => {
      let mut run = PipelineRun::new();
      let result = run.execute(&workflow);
      tracing::info!(state = %run.state(), "Pipeline run finished.");
      result
    }
    Commands::Prepare => prepare_all_lifecycle(&workflow),
    Commands::List => {
      print_workflow(&workflow);
      Ok(())
    }
    Commands::Info => {
      print_ci_info(ci.as_ref());
      Ok(())
    }
    _ => Err(RunnerError::Internal("lifecycle stage command not dispatched".to_string())),
  }
}

fn print_workflow(workflow: &Workflow<RunnerError>) {
  for stage in workflow.stages() {
    println!("{}", stage.name());
    for step in stage.step_names() {
      println!("  - {}", step);
    }
  }
}

fn print_ci_info(ci: &dyn CiProvider) {
  let show = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());
  println!("ci:           {}", ci.kind());
  println!("branch:       {}", show(ci.branch()));
  println!("tag:          {}", show(ci.tag()));
  println!("commit:       {}", show(ci.commit()));
  println!("repository:   {}", show(ci.repo_slug()));
  println!("pull request: {}", ci.is_pull_request());
  println!("interactive:  {}", ci.is_interactive());
}
