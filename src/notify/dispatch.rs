use std::collections::BTreeSet;

use anyhow::Result;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("message rejected with status {status} (code {code:?}): {message}")]
    Rejected {
        status: u16,
        code: Option<i64>,
        message: String,
    },
}

/// Delivers one message to one recipient.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, message: &str) -> Result<(), NotifyError>;
}

/// Area subscriptions with set semantics.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn members_of(&self, area: &str) -> Result<BTreeSet<String>>;

    async fn add(&self, area: &str, recipient: &str) -> Result<()>;

    /// Union of the subscribers of every area in `areas`.
    async fn members_of_any(&self, areas: &[String]) -> Result<BTreeSet<String>> {
        let mut members = BTreeSet::new();
        for area in areas {
            members.extend(self.members_of(area).await?);
        }
        Ok(members)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent: usize,
    pub failed: usize,
}

/// Sends `message` to every recipient. A failed delivery is logged and
/// does not stop the remaining ones.
pub async fn dispatch(
    notifier: &dyn Notifier,
    recipients: &BTreeSet<String>,
    message: &str,
) -> DispatchReport {
    let mut report = DispatchReport::default();

    for recipient in recipients {
        log::info!("sending message to {recipient}");
        match notifier.send(recipient, message).await {
            Ok(()) => report.sent += 1,
            Err(err) => {
                log::warn!("failed to send message to {recipient}: {err}");
                report.failed += 1;
            }
        }
    }

    report
}
