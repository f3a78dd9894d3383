// tests/error_handling_tests.rs
mod common;
use cistern::{CisternError, Stage, Task, TaskDef};
use common::*;

#[test]
fn test_add_task_without_run_is_rejected() {
  setup_tracing();
  let mut stage = Stage::<TestError>::new("install");
  let result = stage
    .add_task(TaskDef::new().name("no_run").check(|| Ok::<bool, TestError>(true)))
    .map(|_| ());

  match result {
    Err(TestError::Cistern(s)) => {
      assert!(s.contains("RunMissing"));
      assert!(s.contains("no_run"));
    }
    other => panic!("Expected TestError::Cistern(RunMissing), got {:?}", other),
  }
  // The stage is left untouched.
  assert!(stage.is_empty());
}

#[test]
fn test_task_def_build_without_run_fails() {
  let result = TaskDef::<TestError>::new().build();
  match result {
    Err(CisternError::RunMissing { task_name }) => assert_eq!(task_name, "<unnamed task>"),
    other => panic!("Expected RunMissing, got {:?}", other),
  }
}

#[test]
fn test_run_all_stops_at_first_failing_step() {
  setup_tracing();
  let journal = Journal::new();
  let mut stage = Stage::<TestError>::new("script");
  stage
    .add_step(failing_task(&journal, "first", "first step exploded"))
    .add_step(recording_task(&journal, "second"));

  let result = stage.run_all();

  assert_eq!(result, Err(TestError::Step("first step exploded".to_string())));
  assert_eq!(journal.entries(), vec!["first"]);
  assert!(!journal.entries().contains(&"second".to_string()));
}

#[test]
fn test_raising_check_stops_the_batch_and_surfaces() {
  setup_tracing();
  let journal = Journal::new();
  let mut stage = Stage::<TestError>::new("script");
  stage
    .add_task(gated_task(&journal, "before", true))
    .unwrap()
    .add_task(
      TaskDef::new()
        .name("bad_check")
        .check(|| Err::<bool, TestError>(TestError::Check("cannot read branch".to_string())))
        .run(|| Ok::<(), TestError>(())),
    )
    .unwrap()
    .add_task(gated_task(&journal, "after", true))
    .unwrap();

  let prepare_result = stage.prepare_all();
  assert_eq!(prepare_result, Err(TestError::Check("cannot read branch".to_string())));
  assert_eq!(journal.entries(), vec!["prepare:before"]);

  let run_result = stage.run_all();
  assert_eq!(run_result, Err(TestError::Check("cannot read branch".to_string())));
  assert_eq!(journal.entries(), vec!["prepare:before", "run:before"]);
}

#[test]
fn test_check_returning_false_is_a_skip_not_an_error() {
  setup_tracing();
  let journal = Journal::new();
  let mut stage = Stage::<TestError>::new("deploy");
  stage.add_task(gated_task(&journal, "skipped", false)).unwrap();

  assert_eq!(stage.prepare_all(), Ok(()));
  assert_eq!(stage.run_all(), Ok(()));
  assert!(journal.entries().is_empty());
}

#[test]
fn test_prepare_failure_aborts_remaining_preparation() {
  setup_tracing();
  let journal = Journal::new();
  let mut stage = Stage::<TestError>::new("install");
  stage
    .add_task(
      TaskDef::new()
        .name("broken_prepare")
        .prepare(|| Err::<(), TestError>(TestError::Step("no network".to_string())))
        .run(|| Ok::<(), TestError>(())),
    )
    .unwrap()
    .add_task(gated_task(&journal, "later", true))
    .unwrap();

  assert_eq!(stage.prepare_all(), Err(TestError::Step("no network".to_string())));
  assert!(journal.entries().is_empty());
}

#[test]
fn test_anyhow_actions_work_with_cistern_error_stages() {
  setup_tracing();
  let mut stage = Stage::<CisternError>::new("script");
  stage.add_run("anyhow_fail", || -> anyhow::Result<()> { Err(anyhow::anyhow!("lint found 3 problems")) });

  match stage.run_all() {
    Err(CisternError::Step { source }) => assert_eq!(source.to_string(), "lint found 3 problems"),
    other => panic!("Expected CisternError::Step, got {:?}", other),
  }
}

#[test]
fn test_anyhow_wrapping_cistern_error_is_unwrapped() {
  let inner = CisternError::UnknownStage {
    name: "bogus".to_string(),
  };
  let converted = CisternError::from(anyhow::Error::new(inner));
  assert!(matches!(converted, CisternError::UnknownStage { name } if name == "bogus"));
}

#[test]
fn test_task_with_cistern_error_type() {
  setup_tracing();
  let mut stage = Stage::<CisternError>::new("script");
  stage.add_step(Task::new(|| Ok::<(), CisternError>(())).with_name("ok"));
  assert!(stage.run_all().is_ok());
}
