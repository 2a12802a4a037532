//! In-memory collaborators for engine tests.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use taskdeck_core::{AccountFingerprint, DownloadTarget, DownloadTask, TaskId, TaskState};
use taskdeck_engine::{
    fingerprint_account, Account, AccountHasher, BackendError, IdentityError, TaskBackend,
};
use tokio::sync::{oneshot, watch};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(taskdeck_logging::initialize_for_tests);
}

pub fn account(email: &str, dsid: &str) -> Account {
    Account::new(email, dsid)
        .with_password_token("token")
        .with_device_id("AB123456")
}

pub fn fp(account: &Account) -> AccountFingerprint {
    fingerprint_account(account).expect("complete account")
}

pub fn task(id: &str, owner: &AccountFingerprint, state: TaskState, progress: u8) -> DownloadTask {
    DownloadTask::new(id, owner.clone(), DownloadTarget::new(format!("item.{id}"), id))
        .with_state(state)
        .with_progress(progress)
}

struct ListScript {
    gate: Option<oneshot::Receiver<()>>,
    result: Result<Vec<DownloadTask>, BackendError>,
}

/// Backend keeping tasks in memory. List calls can be scripted and held
/// back until released, to force out-of-order completions.
pub struct ScriptedBackend {
    tasks: Mutex<Vec<DownloadTask>>,
    list_scripts: Mutex<VecDeque<ListScript>>,
    fail_next: Mutex<Option<BackendError>>,
    next_id: AtomicUsize,
    list_calls_tx: watch::Sender<usize>,
    command_calls: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new(tasks: Vec<DownloadTask>) -> Arc<Self> {
        let (list_calls_tx, _) = watch::channel(0);
        Arc::new(Self {
            tasks: Mutex::new(tasks),
            list_scripts: Mutex::new(VecDeque::new()),
            fail_next: Mutex::new(None),
            next_id: AtomicUsize::new(100),
            list_calls_tx,
            command_calls: Mutex::new(Vec::new()),
        })
    }

    /// Next list call returns `result` as soon as it is made.
    pub fn script_list(&self, result: Result<Vec<DownloadTask>, BackendError>) {
        self.list_scripts
            .lock()
            .unwrap()
            .push_back(ListScript { gate: None, result });
    }

    /// Next list call returns `result` once the returned sender fires.
    pub fn script_gated_list(&self, result: Vec<DownloadTask>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.list_scripts.lock().unwrap().push_back(ListScript {
            gate: Some(rx),
            result: Ok(result),
        });
        tx
    }

    pub fn fail_next_command(&self, error: BackendError) {
        *self.fail_next.lock().unwrap() = Some(error);
    }

    pub fn list_calls(&self) -> usize {
        *self.list_calls_tx.borrow()
    }

    pub async fn wait_for_list_calls(&self, count: usize) {
        let mut rx = self.list_calls_tx.subscribe();
        let _ = rx.wait_for(|calls| *calls >= count).await;
    }

    pub fn command_calls(&self) -> Vec<String> {
        self.command_calls.lock().unwrap().clone()
    }

    pub fn server_task(&self, id: &str) -> Option<DownloadTask> {
        self.tasks
            .lock()
            .unwrap()
            .iter()
            .find(|task| task.id.as_str() == id)
            .cloned()
    }

    fn command(&self, call: String) -> Result<(), BackendError> {
        self.command_calls.lock().unwrap().push(call);
        match self.fail_next.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn transition(&self, task_id: &TaskId, from: TaskState, to: TaskState) -> Result<(), BackendError> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .iter_mut()
            .find(|task| &task.id == task_id)
            .ok_or_else(|| BackendError::NotFound(task_id.to_string()))?;
        if task.state != from {
            return Err(BackendError::HttpStatus {
                status: 409,
                message: format!("task is {}", task.state),
            });
        }
        task.state = to;
        Ok(())
    }
}

#[async_trait::async_trait]
impl TaskBackend for ScriptedBackend {
    async fn list_tasks(
        &self,
        account_hashes: &[AccountFingerprint],
    ) -> Result<Vec<DownloadTask>, BackendError> {
        let script = self.list_scripts.lock().unwrap().pop_front();
        self.list_calls_tx.send_modify(|calls| *calls += 1);
        match script {
            Some(ListScript { gate, result }) => {
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                result
            }
            None => Ok(self
                .tasks
                .lock()
                .unwrap()
                .iter()
                .filter(|task| account_hashes.contains(&task.owner))
                .cloned()
                .collect()),
        }
    }

    async fn create_task(
        &self,
        owner: &AccountFingerprint,
        target: &DownloadTarget,
    ) -> Result<DownloadTask, BackendError> {
        self.command(format!("create {}", target.item_id))?;
        let id = format!("t{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let task = DownloadTask::new(id, owner.clone(), target.clone());
        self.tasks.lock().unwrap().push(task.clone());
        Ok(task)
    }

    async fn pause_task(&self, task_id: &TaskId) -> Result<(), BackendError> {
        self.command(format!("pause {task_id}"))?;
        self.transition(task_id, TaskState::Downloading, TaskState::Paused)
    }

    async fn resume_task(&self, task_id: &TaskId) -> Result<(), BackendError> {
        self.command(format!("resume {task_id}"))?;
        self.transition(task_id, TaskState::Paused, TaskState::Downloading)
    }

    async fn delete_task(&self, task_id: &TaskId) -> Result<(), BackendError> {
        self.command(format!("delete {task_id}"))?;
        let mut tasks = self.tasks.lock().unwrap();
        let before = tasks.len();
        tasks.retain(|task| &task.id != task_id);
        if tasks.len() == before {
            return Err(BackendError::NotFound(task_id.to_string()));
        }
        Ok(())
    }
}

/// Hasher that counts calls and can hold back chosen emails.
pub struct GatedHasher {
    calls: AtomicUsize,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    started_tx: watch::Sender<Vec<String>>,
}

impl GatedHasher {
    pub fn new() -> Arc<Self> {
        let (started_tx, _) = watch::channel(Vec::new());
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            gates: Mutex::new(HashMap::new()),
            started_tx,
        })
    }

    pub fn hold(&self, email: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(email.to_string(), rx);
        tx
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn wait_until_started(&self, email: &str) {
        let mut rx = self.started_tx.subscribe();
        let _ = rx
            .wait_for(|started| started.iter().any(|e| e == email))
            .await;
    }
}

#[async_trait::async_trait]
impl AccountHasher for GatedHasher {
    async fn fingerprint(&self, account: &Account) -> Result<AccountFingerprint, IdentityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().unwrap().remove(&account.email);
        self.started_tx
            .send_modify(|started| started.push(account.email.clone()));
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        fingerprint_account(account)
    }
}
