//! Desktop notifications for finished action runs.

use gesture_commit_core::{ActionOutcome, ExecutionSummary};
use notify_rust::Notification;
use tracing::warn;

const APP_NAME: &str = "Gesture Commit";

/// Title and body describing `summary`.
pub(crate) fn summary_message(summary: &ExecutionSummary) -> (String, String) {
    if let Some(error) = summary.critical_failure() {
        return (
            format!("{} gesture: commit failed", summary.gesture),
            format!("{}\nDismiss to start over.", error.message),
        );
    }

    let mut lines = Vec::with_capacity(summary.results.len() + 1);
    lines.push(format!(
        "{} of {} actions succeeded",
        summary.success_count(),
        summary.total_count()
    ));

    for result in &summary.results {
        match &result.outcome {
            Ok(ActionOutcome::Committed(commit)) => {
                lines.push(format!("Committed {} to {}", commit.sha, commit.branch));
            }
            Ok(_) => {}
            Err(e) => lines.push(format!("{} failed: {}", result.action_type, e.kind())),
        }
    }

    (
        format!("{} gesture: actions finished", summary.gesture),
        lines.join("\n"),
    )
}

/// Shows desktop notifications without blocking the runtime.
#[derive(Debug, Clone, Default)]
pub struct Notifier;

impl Notifier {
    /// Show a notification; failures are logged.
    pub async fn notify(&self, title: String, body: String) {
        let shown = tokio::task::spawn_blocking(move || {
            Notification::new()
                .appname(APP_NAME)
                .summary(&title)
                .body(&body)
                .show()
                .map(|_| ())
        })
        .await;

        match shown {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Failed to show notification"),
            Err(e) => warn!(error = ?e, "Notification task failed"),
        }
    }

    /// Notify the outcome of an action run.
    pub async fn notify_summary(&self, summary: &ExecutionSummary) {
        let (title, body) = summary_message(summary);
        self.notify(title, body).await;
    }
}
