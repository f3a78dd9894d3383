// runner/src/workflows.rs

//! The default workflow: the usual checks for a Cargo package, plus an
//! optional deploy gated on branch, pull-request status and interactivity.

use crate::config::RunnerConfig;
use crate::errors::{Result, RunnerError};
use cistern::checks::{both, non_interactive, not_pull_request, on_branch};
use cistern::steps::{RunCommand, WriteTextFile};
use cistern::{CiProvider, LifecycleStage, StepExt, TaskDef, Workflow};
use std::sync::Arc;
use tracing::{info, warn};

/// Builds the cargo package-check workflow for this process.
pub fn cargo_package_checks(config: &RunnerConfig, ci: Arc<dyn CiProvider>) -> Result<Workflow<RunnerError>> {
  let mut workflow = Workflow::<RunnerError>::lifecycle();

  let summary_ci = ci.clone();
  workflow
    .lifecycle_stage_mut(LifecycleStage::BeforeInstall)
    .add_run("ci summary", move || -> anyhow::Result<()> {
      let branch = summary_ci.branch().unwrap_or_else(|| "-".to_string());
      let tag = summary_ci.tag().unwrap_or_else(|| "-".to_string());
      let commit = summary_ci.commit().unwrap_or_else(|| "-".to_string());
      info!(
        ci = %summary_ci.kind(),
        %branch,
        %tag,
        %commit,
        pull_request = summary_ci.is_pull_request(),
        "Build environment."
      );
      Ok(())
    });

  workflow
    .lifecycle_stage_mut(LifecycleStage::Install)
    .add_step(RunCommand::new(&config.cargo).arg("fetch").named("cargo fetch"));

  workflow
    .lifecycle_stage_mut(LifecycleStage::BeforeScript)
    .add_step(RunCommand::new(&config.cargo).arg("--version").named("cargo version"));

  workflow
    .lifecycle_stage_mut(LifecycleStage::Script)
    .add_step(
      RunCommand::new(&config.cargo)
        .args(["build", "--all-targets", "--locked"])
        .named("cargo build"),
    )
    .add_step(
      RunCommand::new(&config.cargo)
        .arg("test")
        .args(config.test_args.iter())
        .named("cargo test"),
    );

  if let Some(deploy_command) = &config.deploy_command {
    let deploy_gate = || {
      both(
        both(on_branch(ci.clone(), config.deploy_branch.clone()), not_pull_request(ci.clone())),
        non_interactive(ci.clone()),
      )
    };

    workflow
      .lifecycle_stage_mut(LifecycleStage::BeforeDeploy)
      .add_step(
        WriteTextFile::new(&config.build_info_path, build_info(ci.as_ref()))
          .named("build info")
          .only_if(deploy_gate()),
      );

    let (program, args) = deploy_command.split_first().ok_or_else(|| {
      RunnerError::Config("CISTERN_DEPLOY_COMMAND must name a program".to_string())
    })?;
    workflow
      .lifecycle_stage_mut(LifecycleStage::Deploy)
      .add_step(
        RunCommand::new(program)
          .args(args.iter())
          .env("CISTERN_BUILD_INFO", &config.build_info_path)
          .named("deploy")
          .only_if(deploy_gate()),
      );
  }

  let failure_ci = ci;
  workflow
    .lifecycle_stage_mut(LifecycleStage::AfterFailure)
    .add_task(TaskDef::new().name("failure report").run(move || -> anyhow::Result<()> {
      let commit = failure_ci.commit().unwrap_or_else(|| "-".to_string());
      warn!(
        ci = %failure_ci.kind(),
        %commit,
        "Build failed. Re-run locally with `cistern run` and RUST_LOG=debug for step-level detail."
      );
      Ok(())
    }))?;

  Ok(workflow)
}

fn build_info(ci: &dyn CiProvider) -> String {
  format!(
    "ci={}\nbranch={}\ntag={}\ncommit={}\nrepository={}\n",
    ci.kind(),
    ci.branch().unwrap_or_default(),
    ci.tag().unwrap_or_default(),
    ci.commit().unwrap_or_default(),
    ci.repo_slug().unwrap_or_default(),
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use cistern::ci::{detect, Environment, MapEnv};
  use cistern::StageRegistry;

  fn github_push_on(branch: &str) -> Arc<dyn CiProvider> {
    let env: Arc<dyn Environment> = Arc::new(MapEnv::from_pairs([
      ("GITHUB_ACTIONS", "true"),
      ("GITHUB_REF", format!("refs/heads/{}", branch).as_str()),
      ("GITHUB_SHA", "deadbeef"),
      ("GITHUB_EVENT_NAME", "push"),
    ]));
    Arc::new(detect(env))
  }

  fn config_with_deploy() -> RunnerConfig {
    let env = MapEnv::from_pairs([("CISTERN_DEPLOY_COMMAND", "cargo publish --dry-run")]);
    RunnerConfig::from_vars(&env).unwrap()
  }

  #[test]
  fn test_default_workflow_layout() {
    let config = RunnerConfig::from_vars(&MapEnv::new()).unwrap();
    let workflow = cargo_package_checks(&config, github_push_on("main")).unwrap();

    assert_eq!(workflow.stage("install").unwrap().step_names(), vec!["cargo fetch"]);
    assert_eq!(
      workflow.stage("script").unwrap().step_names(),
      vec!["cargo build", "cargo test"]
    );
    assert!(workflow.stage("deploy").unwrap().is_empty());
    assert_eq!(
      workflow.stage("after_failure").unwrap().step_names(),
      vec!["failure report"]
    );
  }

  #[test]
  fn test_deploy_steps_registered_when_configured() {
    let workflow = cargo_package_checks(&config_with_deploy(), github_push_on("main")).unwrap();
    assert_eq!(workflow.stage("before_deploy").unwrap().step_names(), vec!["build info"]);
    assert_eq!(workflow.stage("deploy").unwrap().step_names(), vec!["deploy"]);
  }

  #[test]
  fn test_deploy_is_gated_off_other_branches() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_with_deploy();
    config.build_info_path = dir.path().join("nested").join("build-info.txt");

    let workflow = cargo_package_checks(&config, github_push_on("feature")).unwrap();
    let before_deploy = workflow.lookup("before_deploy").unwrap();
    before_deploy.prepare_all().unwrap();
    before_deploy.run_all().unwrap();

    assert!(!config.build_info_path.exists());
    assert!(!dir.path().join("nested").exists());
  }

  #[test]
  fn test_deploy_writes_build_info_on_deploy_branch() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_with_deploy();
    config.build_info_path = dir.path().join("nested").join("build-info.txt");

    let workflow = cargo_package_checks(&config, github_push_on("main")).unwrap();
    let before_deploy = workflow.lookup("before_deploy").unwrap();
    before_deploy.prepare_all().unwrap();
    before_deploy.run_all().unwrap();

    let written = std::fs::read_to_string(&config.build_info_path).unwrap();
    assert!(written.contains("branch=main\n"));
  }

  #[test]
  fn test_build_info_lists_ci_metadata() {
    let info = build_info(github_push_on("main").as_ref());
    assert!(info.contains("ci=GitHub Actions\n"));
    assert!(info.contains("branch=main\n"));
    assert!(info.contains("commit=deadbeef\n"));
  }
}
