use std::sync::Once;

use pretty_assertions::assert_eq;
use taskdeck_core::{
    update, AccountFingerprint, DownloadTarget, DownloadTask, Effect, Msg, Operation, RequestId,
    ServiceError, ServiceErrorKind, StoreErrorKind, TaskId, TaskState, TaskStoreState,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(taskdeck_logging::initialize_for_tests);
}

fn h(value: &str) -> AccountFingerprint {
    AccountFingerprint::new(value)
}

fn task(id: &str, owner: &str, state: TaskState, progress: u8) -> DownloadTask {
    DownloadTask::new(id, h(owner), DownloadTarget::new(format!("item.{id}"), id))
        .with_state(state)
        .with_progress(progress)
}

fn with_hashes(values: &[&str]) -> TaskStoreState {
    let (state, _) = update(
        TaskStoreState::new(),
        Msg::AccountHashesSet(values.iter().copied().map(h).collect()),
    );
    state
}

fn request_fetch(state: TaskStoreState) -> (TaskStoreState, RequestId) {
    let (state, effects) = update(state, Msg::FetchRequested);
    match effects.as_slice() {
        [Effect::FetchTasks { request, .. }] => (state, *request),
        other => panic!("expected one fetch effect, got {other:?}"),
    }
}

fn complete_fetch(
    state: TaskStoreState,
    request: RequestId,
    tasks: Vec<DownloadTask>,
) -> TaskStoreState {
    update(
        state,
        Msg::FetchCompleted {
            request,
            result: Ok(tasks),
        },
    )
    .0
}

#[test]
fn setting_hashes_has_no_effects() {
    init_logging();
    let (mut state, effects) = update(
        TaskStoreState::new(),
        Msg::AccountHashesSet(vec![h("b"), h("a"), h("b")]),
    );

    assert!(effects.is_empty());
    assert!(state.consume_dirty());
    assert_eq!(state.view().account_hashes, vec![h("b"), h("a")]);
}

#[test]
fn resubmitting_same_hashes_leaves_state_clean() {
    init_logging();
    let mut state = with_hashes(&["b", "a"]);
    state.consume_dirty();

    let (mut next, effects) = update(
        state.clone(),
        Msg::AccountHashesSet(vec![h("b"), h("a"), h("a")]),
    );

    assert!(effects.is_empty());
    assert_eq!(next, state);
    assert!(!next.consume_dirty());
}

#[test]
fn fetch_carries_current_hashes_and_sets_loading() {
    init_logging();
    let state = with_hashes(&["h1", "h2"]);
    let (state, effects) = update(state, Msg::FetchRequested);

    assert_eq!(
        effects,
        vec![Effect::FetchTasks {
            request: RequestId(1),
            account_hashes: vec![h("h1"), h("h2")],
        }]
    );
    assert!(state.view().loading);
}

#[test]
fn fetch_success_replaces_collection_and_clears_loading() {
    init_logging();
    let (state, request) = request_fetch(with_hashes(&["h1"]));
    let state = complete_fetch(
        state,
        request,
        vec![task("t1", "h1", TaskState::Downloading, 40)],
    );

    let view = state.view();
    assert!(!view.loading);
    assert_eq!(view.tasks, vec![task("t1", "h1", TaskState::Downloading, 40)]);
    assert_eq!(view.last_error, None);
}

#[test]
fn fetch_failure_keeps_previous_collection() {
    init_logging();
    let (state, first) = request_fetch(with_hashes(&["h1"]));
    let state = complete_fetch(state, first, vec![task("t1", "h1", TaskState::Queued, 0)]);

    let (state, second) = request_fetch(state);
    let error = ServiceError::new(ServiceErrorKind::Timeout, "backend slow");
    let (state, _) = update(
        state,
        Msg::FetchCompleted {
            request: second,
            result: Err(error.clone()),
        },
    );

    let view = state.view();
    assert!(!view.loading);
    assert_eq!(view.tasks, vec![task("t1", "h1", TaskState::Queued, 0)]);
    let last_error = view.last_error.expect("fetch error surfaced");
    assert_eq!(last_error.op, Operation::Fetch);
    assert_eq!(last_error.kind, StoreErrorKind::Service(error));
}

#[test]
fn older_fetch_response_never_overwrites_newer_one() {
    init_logging();
    let (state, first) = request_fetch(with_hashes(&["h1"]));
    let (state, second) = request_fetch(state);

    let state = complete_fetch(state, second, vec![task("t2", "h1", TaskState::Queued, 0)]);
    assert!(!state.view().loading);
    let state = complete_fetch(state, first, vec![task("t1", "h1", TaskState::Queued, 0)]);

    assert_eq!(
        state.view().tasks,
        vec![task("t2", "h1", TaskState::Queued, 0)]
    );
    assert_eq!(state.stale_discarded(), 1);
}

#[test]
fn loading_stays_on_until_latest_fetch_settles() {
    init_logging();
    let (state, first) = request_fetch(with_hashes(&["h1"]));
    let (state, second) = request_fetch(state);

    let state = complete_fetch(state, first, Vec::new());
    assert!(state.view().loading);
    let state = complete_fetch(state, second, Vec::new());
    assert!(!state.view().loading);
}

#[test]
fn progress_never_moves_backwards_while_active() {
    init_logging();
    let (state, first) = request_fetch(with_hashes(&["h1"]));
    let state = complete_fetch(
        state,
        first,
        vec![task("t1", "h1", TaskState::Downloading, 60)],
    );
    let (state, second) = request_fetch(state);
    let state = complete_fetch(
        state,
        second,
        vec![task("t1", "h1", TaskState::Downloading, 55)],
    );

    assert_eq!(state.task(&TaskId::from("t1")).unwrap().progress, 60);
}

#[test]
fn tasks_reported_deleted_are_dropped() {
    init_logging();
    let (state, request) = request_fetch(with_hashes(&["h1"]));
    let state = complete_fetch(
        state,
        request,
        vec![
            task("t1", "h1", TaskState::Deleted, 0),
            task("t2", "h1", TaskState::Completed, 100),
        ],
    );

    let ids: Vec<_> = state.view().tasks.into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![TaskId::from("t2")]);
}

#[test]
fn tasks_of_removed_accounts_stay_visible() {
    init_logging();
    let (state, request) = request_fetch(with_hashes(&["h1"]));
    let state = complete_fetch(
        state,
        request,
        vec![task("t1", "gone", TaskState::Completed, 100)],
    );

    assert_eq!(state.task_count(), 1);
}

#[test]
fn fetch_issued_before_a_pause_does_not_undo_it() {
    init_logging();
    let (state, request) = request_fetch(with_hashes(&["h1"]));
    let state = complete_fetch(
        state,
        request,
        vec![task("t1", "h1", TaskState::Downloading, 10)],
    );

    let (state, stale_fetch) = request_fetch(state);
    let (state, effects) = update(state, Msg::PauseRequested(TaskId::from("t1")));
    let pause = effects[0].request();
    let (state, _) = update(
        state,
        Msg::ActionCompleted {
            request: pause,
            task_id: TaskId::from("t1"),
            action: taskdeck_core::TaskAction::Pause,
            result: Ok(()),
        },
    );
    let state = complete_fetch(
        state,
        stale_fetch,
        vec![task("t1", "h1", TaskState::Downloading, 12)],
    );

    assert_eq!(
        state.task(&TaskId::from("t1")).unwrap().state,
        TaskState::Paused
    );
}
