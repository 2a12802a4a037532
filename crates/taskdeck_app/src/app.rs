use std::sync::Arc;

use anyhow::Context;
use taskdeck_engine::{
    spawn_poller, AccountRegistry, HttpAuthClient, HttpTaskBackend, ReconciliationController,
    Sha256AccountHasher, TaskStore,
};
use taskdeck_logging::{ts_info, ts_warn};
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::report::spawn_reporter;

/// Wires registry, controller, store and backend, then runs until Ctrl-C.
pub(crate) async fn run(config: AppConfig) -> anyhow::Result<()> {
    let settings = config.backend_settings()?;
    ts_info!("download service at {}", settings.base_url);

    let backend = HttpTaskBackend::new(settings.clone()).context("building backend client")?;
    let store = TaskStore::new(Arc::new(backend));
    let controller = ReconciliationController::new(store.clone(), Arc::new(Sha256AccountHasher));

    let auth = HttpAuthClient::new(config.auth_endpoint()?, &settings)
        .context("building sign-in client")?;
    let registry = AccountRegistry::new(Arc::new(auth), config.accounts.clone());
    if registry.accounts().is_empty() {
        ts_warn!("no accounts configured; the task list stays empty");
    }

    let token = CancellationToken::new();
    let watcher = controller.watch(registry.subscribe());
    let poller = spawn_poller(store.clone(), config.poll_interval(), token.clone());
    let reporter = spawn_reporter(controller.clone(), token.clone());

    tokio::signal::ctrl_c()
        .await
        .context("waiting for ctrl-c")?;
    ts_info!("ctrl-c received, shutting down");

    token.cancel();
    store.shutdown();
    drop(registry);
    let (watcher, poller, reporter) = tokio::join!(watcher, poller, reporter);
    for (name, result) in [("watcher", watcher), ("poller", poller), ("reporter", reporter)] {
        if let Err(err) = result {
            ts_warn!("{} task ended abnormally: {}", name, err);
        }
    }
    Ok(())
}
