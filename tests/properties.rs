// tests/properties.rs

use proptest::prelude::*;

use jobrunner::config::{Job, Task};
use jobrunner::engine::{JobCoordinator, TaskFailure, run_task};
use jobrunner_test_utils::builders::script;
use jobrunner_test_utils::fake_executor::{FakeBehaviour, FakeExecutor};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("build tokio runtime")
}

/// A job of single-script tasks named `t{i}` exiting with the given codes.
fn job_with_codes(codes: &[i32]) -> (Job, FakeExecutor) {
    let mut backend = FakeExecutor::new();
    let mut tasks = Vec::new();
    for (i, code) in codes.iter().enumerate() {
        let name = format!("t{i}");
        backend = backend.on(&name, FakeBehaviour::exit(*code));
        tasks.push(Task::Script(script(&name, "")));
    }
    (Job::new_unchecked("prop", tasks), backend)
}

proptest! {
    #[test]
    fn one_outcome_per_task_in_order(codes in prop::collection::vec(0i32..3, 0..12)) {
        let (job, backend) = job_with_codes(&codes);
        let outcome = runtime().block_on(JobCoordinator::new(backend).run(job));

        prop_assert_eq!(outcome.tasks.len(), codes.len());
        for (i, task) in outcome.tasks.iter().enumerate() {
            prop_assert_eq!(task.index, i);
            prop_assert_eq!(&task.name, &format!("t{i}"));
            prop_assert_eq!(task.steps[0].exit_code(), Some(codes[i]));
        }
    }

    #[test]
    fn job_succeeds_iff_every_task_succeeds(codes in prop::collection::vec(0i32..3, 0..12)) {
        let (job, backend) = job_with_codes(&codes);
        let outcome = runtime().block_on(JobCoordinator::new(backend).run(job));

        prop_assert_eq!(outcome.success, codes.iter().all(|c| *c == 0));
        prop_assert_eq!(
            outcome.failed_tasks().count(),
            codes.iter().filter(|c| **c != 0).count()
        );
    }

    #[test]
    fn serial_chain_runs_exactly_the_prefix_up_to_the_first_failure(
        codes in prop::collection::vec(prop_oneof![3 => Just(0i32), 1 => 1i32..4], 0..10)
    ) {
        let mut backend = FakeExecutor::new();
        let mut steps = Vec::new();
        for (i, code) in codes.iter().enumerate() {
            let name = format!("s{i}");
            backend = backend.on(&name, FakeBehaviour::exit(*code));
            steps.push(script(&name, ""));
        }
        let task = Task::Serial(steps);

        let outcome = runtime().block_on(run_task(&backend, 0, &task));

        let first_failure = codes.iter().position(|c| *c != 0);
        let ran = first_failure.map_or(codes.len(), |i| i + 1);
        let expected: Vec<String> = (0..ran).map(|i| format!("s{i}")).collect();
        prop_assert_eq!(backend.executed(), expected);
        prop_assert_eq!(outcome.steps.len(), ran);

        match (first_failure, &outcome.failure) {
            (None, None) => {}
            (Some(i), Some(TaskFailure::ChainAbort { step, skipped })) => {
                prop_assert_eq!(step.index, i);
                prop_assert_eq!(skipped.len(), codes.len() - i - 1);
            }
            (expected, actual) => {
                prop_assert!(false, "first failure {:?} but task failure {:?}", expected, actual);
            }
        }
    }
}
