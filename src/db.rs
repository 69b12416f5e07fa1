use std::collections::BTreeSet;

use anyhow::{Context as _, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{cooldown::NotificationStateStore, notify::SubscriptionStore};

pub async fn new_pool(database_url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url)
        .await
        .context("failed to connect to database")
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("failed to run migrations")
}

pub async fn get_last_notified(pool: &PgPool, key: &str) -> Result<Option<DateTime<Utc>>> {
    let last_notified_at: Option<i64> =
        sqlx::query_scalar("SELECT last_notified_at FROM notification_state WHERE key = $1")
            .bind(key)
            .fetch_optional(pool)
            .await
            .context("failed to execute select query")?;

    last_notified_at
        .map(|secs| {
            DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| anyhow!("timestamp out of range: {secs}"))
        })
        .transpose()
}

pub async fn upsert_last_notified(pool: &PgPool, key: &str, at: DateTime<Utc>) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO notification_state (key, last_notified_at)
        VALUES ($1, $2)
        ON CONFLICT (key) DO UPDATE SET last_notified_at = EXCLUDED.last_notified_at
        "#,
    )
    .bind(key)
    .bind(at.timestamp())
    .execute(pool)
    .await
    .context("failed to execute upsert query")?;

    Ok(())
}

pub async fn get_subscribers(pool: &PgPool, areas: &[String]) -> Result<BTreeSet<String>> {
    if areas.is_empty() {
        return Ok(BTreeSet::new());
    }

    let recipients: Vec<String> =
        sqlx::query_scalar("SELECT DISTINCT recipient FROM subscriptions WHERE area = ANY($1)")
            .bind(areas)
            .fetch_all(pool)
            .await
            .context("failed to execute select query")?;

    Ok(recipients.into_iter().collect())
}

pub async fn insert_subscription(pool: &PgPool, area: &str, recipient: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO subscriptions (area, recipient)
        VALUES ($1, $2)
        ON CONFLICT (area, recipient) DO NOTHING
        "#,
    )
    .bind(area)
    .bind(recipient)
    .execute(pool)
    .await
    .context("failed to execute insert query")?;

    Ok(())
}

/// Postgres-backed notification state and subscriptions.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl NotificationStateStore for PgStore {
    async fn last_notified(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        get_last_notified(&self.pool, key).await
    }

    async fn set_last_notified(&self, key: &str, at: DateTime<Utc>) -> Result<()> {
        upsert_last_notified(&self.pool, key, at).await
    }
}

#[async_trait]
impl SubscriptionStore for PgStore {
    async fn members_of(&self, area: &str) -> Result<BTreeSet<String>> {
        get_subscribers(&self.pool, &[area.to_string()]).await
    }

    async fn add(&self, area: &str, recipient: &str) -> Result<()> {
        insert_subscription(&self.pool, area, recipient).await
    }

    async fn members_of_any(&self, areas: &[String]) -> Result<BTreeSet<String>> {
        get_subscribers(&self.pool, areas).await
    }
}
