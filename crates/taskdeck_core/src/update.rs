use crate::{
    Effect, Msg, Operation, RequestId, ServiceError, ServiceErrorKind, StoreErrorKind, TaskAction,
    TaskId, TaskState, TaskStoreState,
};

/// Pure update function: applies a message to state and returns any effects.
///
/// Every message is applied as one read-modify-write; the runner feeds
/// completions back through here, so interleaved commands never lose updates.
pub fn update(mut state: TaskStoreState, msg: Msg) -> (TaskStoreState, Vec<Effect>) {
    if state.is_shut_down() {
        return refuse_after_shutdown(state, msg);
    }

    let effects = match msg {
        Msg::AccountHashesSet(fingerprints) => {
            state.set_account_hashes(fingerprints);
            Vec::new()
        }
        Msg::FetchRequested => {
            let request = state.begin_fetch();
            vec![Effect::FetchTasks {
                request,
                account_hashes: state.account_hashes().as_slice().to_vec(),
            }]
        }
        Msg::FetchCompleted { request, result } => {
            if !state.settle_fetch(request) {
                state.discard_stale();
                return (state, Vec::new());
            }
            match result {
                Ok(tasks) => {
                    state.replace_tasks(request, tasks);
                    state.clear_error_for(Operation::Fetch);
                }
                Err(err) => {
                    state.record_error(Operation::Fetch, StoreErrorKind::Service(err));
                }
            }
            Vec::new()
        }
        Msg::StartRequested { owner, target } => {
            if !state.owns(&owner) {
                state.record_error(Operation::Start, StoreErrorKind::UnknownAccount(owner));
                return (state, Vec::new());
            }
            let request = state.next_request();
            vec![Effect::CreateTask {
                request,
                owner,
                target,
            }]
        }
        Msg::StartCompleted { request, result } => {
            match result {
                Ok(task) => {
                    state.merge_created(request, task);
                    state.clear_error_for(Operation::Start);
                }
                Err(err) => {
                    state.record_error(Operation::Start, StoreErrorKind::Service(err));
                }
            }
            Vec::new()
        }
        Msg::PauseRequested(task_id) => {
            request_transition(&mut state, task_id, TaskAction::Pause)
        }
        Msg::ResumeRequested(task_id) => {
            request_transition(&mut state, task_id, TaskAction::Resume)
        }
        Msg::DeleteRequested(task_id) => {
            // Deleting twice or deleting an unknown id is not an error.
            if state.is_deleted(&task_id) || state.task(&task_id).is_none() {
                return (state, Vec::new());
            }
            let request = state.next_request();
            state.remove_task(&task_id, request);
            vec![Effect::ApplyAction {
                request,
                task_id,
                action: TaskAction::Delete,
            }]
        }
        Msg::ActionCompleted {
            request,
            task_id,
            action,
            result,
        } => {
            apply_action_result(&mut state, request, task_id, action, result);
            Vec::new()
        }
        Msg::ShutdownRequested => {
            state.shut_down();
            Vec::new()
        }
    };

    (state, effects)
}

fn request_transition(
    state: &mut TaskStoreState,
    task_id: TaskId,
    action: TaskAction,
) -> Vec<Effect> {
    let op = action.operation();
    let (required, next) = match action {
        TaskAction::Pause => (TaskState::Downloading, TaskState::Paused),
        TaskAction::Resume => (TaskState::Paused, TaskState::Downloading),
        TaskAction::Delete => return Vec::new(),
    };
    let current = match state.task(&task_id) {
        Some(task) => task.state.clone(),
        None => {
            state.record_error(op, StoreErrorKind::UnknownTask(task_id));
            return Vec::new();
        }
    };
    if current != required || !current.can_transition_to(&next) {
        state.record_error(
            op,
            StoreErrorKind::InvalidTransition {
                task_id,
                from: current.label(),
            },
        );
        return Vec::new();
    }

    let request = state.next_request();
    state.touch(&task_id, request);
    vec![Effect::ApplyAction {
        request,
        task_id,
        action,
    }]
}

fn apply_action_result(
    state: &mut TaskStoreState,
    request: RequestId,
    task_id: TaskId,
    action: TaskAction,
    result: Result<(), ServiceError>,
) {
    let op = action.operation();
    if action == TaskAction::Delete {
        match result {
            Ok(()) => state.confirm_delete(&task_id, request),
            Err(err) if err.kind == ServiceErrorKind::NotFound => {
                state.confirm_delete(&task_id, request)
            }
            Err(err) => {
                state.restore_deleted(&task_id, request);
                state.record_error(op, StoreErrorKind::Service(err));
            }
        }
        return;
    }

    if !state.is_current_revision(&task_id, request) {
        // A newer command for the same task owns its state now.
        state.discard_stale();
        return;
    }
    match result {
        Ok(()) => {
            let next = match action {
                TaskAction::Pause => TaskState::Paused,
                _ => TaskState::Downloading,
            };
            // Refused when a fetch moved the task on (completed, failed) meanwhile.
            if state.set_task_state(&task_id, next) {
                state.clear_error_for(op);
            }
        }
        Err(err) => state.record_error(op, StoreErrorKind::Service(err)),
    }
}

fn refuse_after_shutdown(mut state: TaskStoreState, msg: Msg) -> (TaskStoreState, Vec<Effect>) {
    let op = match msg {
        Msg::FetchRequested => Some(Operation::Fetch),
        Msg::StartRequested { .. } => Some(Operation::Start),
        Msg::PauseRequested(_) => Some(Operation::Pause),
        Msg::ResumeRequested(_) => Some(Operation::Resume),
        Msg::DeleteRequested(_) => Some(Operation::Delete),
        Msg::FetchCompleted { .. } | Msg::StartCompleted { .. } | Msg::ActionCompleted { .. } => {
            state.discard_stale();
            None
        }
        Msg::AccountHashesSet(_) | Msg::ShutdownRequested => None,
    };
    if let Some(op) = op {
        state.record_error(op, StoreErrorKind::ShutDown);
    }
    (state, Vec::new())
}
