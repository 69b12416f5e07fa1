use anyhow::{Context as _, Result, bail};

use crate::{
    config::Config,
    notify::{DispatchReport, Notifier, SubscriptionStore, compose_welcome, dispatch},
    tier::AlertTiers,
};

/// Subscribes `recipient` to each known area in `areas` and sends a
/// welcome message. Unknown areas are logged and skipped.
///
/// Returns the areas the recipient was registered for.
pub async fn signup(
    subscriptions: &dyn SubscriptionStore,
    notifier: &dyn Notifier,
    config: &Config,
    tiers: &AlertTiers,
    method: &str,
    recipient: &str,
    areas: &[String],
) -> Result<Vec<String>> {
    let mut registered: Vec<String> = Vec::with_capacity(areas.len());

    for area in areas {
        let area = area.trim();
        if config.area(area).is_none() {
            log::warn!("bad area: {area}");
            continue;
        }
        if registered.iter().any(|a| a == area) {
            continue;
        }

        subscriptions
            .add(area, recipient)
            .await
            .with_context(|| format!("failed to add {recipient} to area {area}"))?;
        log::info!("added {recipient} for area {area}");
        registered.push(area.to_string());
    }

    if registered.is_empty() {
        bail!("no known areas in {areas:?}");
    }

    let names: Vec<&str> = registered.iter().map(String::as_str).collect();
    let welcome = compose_welcome(tiers, method, &names);
    if let Err(err) = notifier.send(recipient, &welcome).await {
        log::warn!("failed to send welcome message to {recipient}: {err}");
    }

    Ok(registered)
}

/// Sends `message` once to every subscriber of any configured area.
pub async fn broadcast(
    subscriptions: &dyn SubscriptionStore,
    notifier: &dyn Notifier,
    config: &Config,
    message: &str,
) -> Result<DispatchReport> {
    let areas: Vec<String> = config.areas.keys().cloned().collect();
    let recipients = subscriptions
        .members_of_any(&areas)
        .await
        .context("failed to get subscribers")?;

    let report = dispatch(notifier, &recipients, message).await;
    log::info!(
        "broadcast sent {} messages ({} failed)",
        report.sent,
        report.failed
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryStore, RecordingNotifier, config, recipients};

    fn areas(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_signup() {
        let store = MemoryStore::default();
        let notifier = RecordingNotifier::default();
        let config = config(&[("SOMA", &["24223"]), ("Marina", &["6014"])]);
        let tiers = AlertTiers::defaults(50, 100).unwrap();

        let registered = signup(
            &store,
            &notifier,
            &config,
            &tiers,
            "AQandU",
            "+15550000001",
            &areas(&["Marina", "Atlantis", "Marina", " SOMA "]),
        )
        .await
        .unwrap();

        assert_eq!(registered, ["Marina", "SOMA"]);
        assert_eq!(
            store.members_of("SOMA").await.unwrap(),
            recipients(&["+15550000001"])
        );
        assert!(store.members_of("Atlantis").await.unwrap().is_empty());

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "+15550000001");
        assert!(sent[0].1.ends_with("areas:\nMarina\nSOMA"));
    }

    #[tokio::test]
    async fn test_signup_without_known_areas() {
        let store = MemoryStore::default();
        let notifier = RecordingNotifier::default();
        let config = config(&[("SOMA", &["24223"])]);
        let tiers = AlertTiers::defaults(50, 100).unwrap();

        let result = signup(
            &store,
            &notifier,
            &config,
            &tiers,
            "AQandU",
            "+15550000001",
            &areas(&["Atlantis"]),
        )
        .await;

        assert!(result.is_err());
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_signup_survives_failed_welcome() {
        let store = MemoryStore::default();
        let notifier = RecordingNotifier::failing_for(&["+15550000001"]);
        let config = config(&[("SOMA", &["24223"])]);
        let tiers = AlertTiers::defaults(50, 100).unwrap();

        let registered = signup(
            &store,
            &notifier,
            &config,
            &tiers,
            "AQandU",
            "+15550000001",
            &areas(&["SOMA"]),
        )
        .await
        .unwrap();

        assert_eq!(registered, ["SOMA"]);
    }

    #[tokio::test]
    async fn test_broadcast_sends_once_per_recipient() {
        let store = MemoryStore::default();
        store.add("SOMA", "+1").await.unwrap();
        store.add("Marina", "+1").await.unwrap();
        store.add("Marina", "+2").await.unwrap();
        store.add("Retired area", "+3").await.unwrap();
        let notifier = RecordingNotifier::default();
        let config = config(&[("SOMA", &["24223"]), ("Marina", &["6014"])]);

        let report = broadcast(&store, &notifier, &config, "maintenance tonight")
            .await
            .unwrap();

        assert_eq!(report, DispatchReport { sent: 2, failed: 0 });
        let to: Vec<String> = notifier.sent().into_iter().map(|(r, _)| r).collect();
        assert_eq!(to, ["+1", "+2"]);
    }
}
