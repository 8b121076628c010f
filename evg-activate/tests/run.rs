use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use evg_activate::cli::{run, run_with_api, Cli};
use evg_activate_core::contract::{MockEvergreenApi, Task};
use evg_activate_core::expansions::EvgExpansions;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

fn expansions() -> EvgExpansions {
    EvgExpansions::from_yaml_str("build_id: b1\nversion_id: v1\ntask_name: fuzzer_gen\n")
        .expect("expansions")
}

#[tokio::test]
async fn run_with_api_returns_report_and_logs_activation() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = Registry::default().with(EventCollector {
        events: events.clone(),
    });
    let _guard = tracing::subscriber::set_default(subscriber);

    let mut evg_api = MockEvergreenApi::new();
    evg_api.expect_tasks_by_build().returning(|build_id| {
        Ok(vec![Task {
            task_id: "fuzzer_1".to_string(),
            display_name: "fuzzer".to_string(),
            activated: false,
            build_id: Some(build_id.to_string()),
            build_variant: None,
            status: None,
        }])
    });
    evg_api
        .expect_configure_task()
        .times(1)
        .returning(|_, _| Ok(()));

    let report = run_with_api(&expansions(), &evg_api)
        .await
        .expect("run should succeed");
    assert_eq!(report.activated.len(), 1);
    assert_eq!(report.activated[0].task_id, "fuzzer_1");

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("Activating task")),
        "Expected an 'Activating task' event, got: {:?}",
        event_msgs
    );
    assert!(
        event_msgs
            .iter()
            .any(|msg| msg.contains("Activation report") && msg.contains("ActivationReport")),
        "Expected the activation report to be logged, got: {:?}",
        event_msgs
    );
}

#[tokio::test]
async fn run_with_api_wraps_api_errors() {
    let mut evg_api = MockEvergreenApi::new();
    evg_api.expect_tasks_by_build().returning(|_| {
        Err(evg_activate_core::error::EvergreenError::Transport {
            url: "http://evg/rest/v2/builds/b1/tasks".to_string(),
            message: "connection refused".to_string(),
        })
    });

    let err = run_with_api(&expansions(), &evg_api).await.unwrap_err();
    assert_eq!(err.to_string(), "Task activation failed");
    assert!(format!("{err:#}").contains("connection refused"));
}

#[tokio::test]
async fn run_fails_for_missing_expansion_file() {
    let cli = Cli {
        expansion_file: PathBuf::from("does-not-exist.yml"),
        evergreen_config: PathBuf::from("does-not-exist-either.yml"),
        verbose: false,
    };

    let err = run(cli).await.unwrap_err();
    assert!(
        err.to_string().contains("does-not-exist.yml"),
        "Expected the expansion file path in the error, got: {err}"
    );
}
