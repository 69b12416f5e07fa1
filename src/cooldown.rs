//! Per-(area, tier) notification cooldown.
//!
//! A key with no record, or whose last notification is at least
//! [`cooldown_window`] old, is eligible. Recording a notification puts the
//! key back into cooldown.

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use crate::tier::AlertTier;

pub const COOLDOWN_WINDOW_SECS: i64 = 60 * 60 * 24;

pub fn cooldown_window() -> TimeDelta {
    TimeDelta::seconds(COOLDOWN_WINDOW_SECS)
}

/// Persistent last-notified timestamps, keyed by [`state_key`].
#[async_trait]
pub trait NotificationStateStore: Send + Sync {
    async fn last_notified(&self, key: &str) -> Result<Option<DateTime<Utc>>>;

    async fn set_last_notified(&self, key: &str, at: DateTime<Utc>) -> Result<()>;
}

pub fn state_key(area: &str, tier: &AlertTier) -> String {
    format!("{area}:{}", tier.key)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Cooldown {
        last_notified: DateTime<Utc>,
        remaining: TimeDelta,
    },
}

impl Eligibility {
    pub fn evaluate(last_notified: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        let Some(last_notified) = last_notified else {
            return Eligibility::Eligible;
        };

        let elapsed = now - last_notified;
        if elapsed >= cooldown_window() {
            Eligibility::Eligible
        } else {
            Eligibility::Cooldown {
                last_notified,
                remaining: cooldown_window() - elapsed,
            }
        }
    }
}

pub async fn check(
    store: &dyn NotificationStateStore,
    area: &str,
    tier: &AlertTier,
    now: DateTime<Utc>,
) -> Result<Eligibility> {
    let key = state_key(area, tier);
    let last_notified = store
        .last_notified(&key)
        .await
        .with_context(|| format!("failed to read notification state: {key}"))?;

    Ok(Eligibility::evaluate(last_notified, now))
}

pub async fn record(
    store: &dyn NotificationStateStore,
    area: &str,
    tier: &AlertTier,
    now: DateTime<Utc>,
) -> Result<()> {
    let key = state_key(area, tier);
    store
        .set_last_notified(&key, now)
        .await
        .with_context(|| format!("failed to write notification state: {key}"))
}
