use chrono::Utc;
use taskdeck_core::TaskRowView;
use taskdeck_engine::ReconciliationController;
use taskdeck_logging::{ts_info, ts_warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub(crate) fn format_row(row: &TaskRowView) -> String {
    let mut line = format!(
        "{:<12} {:<28} {:<12} {:>3}%  {}",
        row.task_id.as_str(),
        row.account_label,
        row.state.label(),
        row.progress,
        row.title
    );
    if let Some(error) = &row.error {
        line.push_str(&format!("  ({error})"));
    }
    line
}

/// Logs the task table whenever the store view or the label map changes.
pub(crate) fn spawn_reporter(
    controller: ReconciliationController,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut views = controller.store().subscribe();
        let mut labels = controller.subscribe_labels();
        loop {
            let view = views.borrow_and_update().clone();
            labels.mark_unchanged();
            if view.loading {
                ts_info!("[{}] refreshing tasks", Utc::now().format("%H:%M:%S"));
            } else {
                let rows = controller.task_rows();
                ts_info!(
                    "[{}] {} tasks for {} accounts",
                    Utc::now().format("%H:%M:%S"),
                    rows.len(),
                    view.account_hashes.len()
                );
                for row in &rows {
                    ts_info!("  {}", format_row(row));
                }
            }
            if let Some(err) = &view.last_error {
                ts_warn!("last error: {}", err);
            }

            tokio::select! {
                _ = token.cancelled() => break,
                changed = views.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                changed = labels.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
    })
}
