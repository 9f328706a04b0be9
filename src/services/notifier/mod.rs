pub mod mailtrap;

use std::sync::Arc;

use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub to_email: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: &Notice) -> anyhow::Result<()>;
}

pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn notify(&self, notice: &Notice) -> anyhow::Result<()> {
        tracing::debug!(to = %notice.to_email, subject = %notice.subject, "mail disabled, dropping notice");
        Ok(())
    }
}

// Sends `notices` on a detached task. Failures are logged and dropped;
// the caller never observes them.
pub fn dispatch(notifier: Arc<dyn Notifier>, notices: Vec<Notice>) {
    if notices.is_empty() {
        return;
    }

    tokio::spawn(async move {
        for notice in &notices {
            if let Err(e) = notifier.notify(notice).await {
                tracing::warn!(error = %e, to = %notice.to_email, "failed to send notification");
            }
        }
    });
}
