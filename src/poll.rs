//! One poll cycle: read every area, match a tier, notify if eligible.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use tokio::sync::Mutex;

use crate::{
    aggregate::read_area,
    aqi::{AqiCategory, ConversionMethod},
    config::{Area, Config},
    cooldown::{self, Eligibility, NotificationStateStore},
    notify::{DispatchReport, Notifier, SubscriptionStore, compose_alert, dispatch},
    purpleair::SensorSource,
    tier::{AlertTiers, TierMatch},
};

/// External collaborators of the poller.
pub struct Collaborators {
    pub source: Arc<dyn SensorSource>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub state: Arc<dyn NotificationStateStore>,
    pub notifier: Arc<dyn Notifier>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AreaOutcome {
    /// No sensor in the area returned usable data.
    NoData,
    NoMatch {
        aqi: u32,
    },
    Cooldown {
        aqi: u32,
        tier: String,
        remaining: TimeDelta,
    },
    Notified {
        aqi: u32,
        tier: String,
        report: DispatchReport,
    },
    /// A store could not be read; retried on the next cycle.
    Skipped {
        aqi: u32,
        tier: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub areas: Vec<(String, AreaOutcome)>,
}

impl CycleReport {
    pub fn notified(&self) -> usize {
        self.areas
            .iter()
            .filter(|(_, o)| matches!(o, AreaOutcome::Notified { .. }))
            .count()
    }

    pub fn outcome(&self, area: &str) -> Option<&AreaOutcome> {
        self.areas.iter().find(|(a, _)| a == area).map(|(_, o)| o)
    }
}

pub struct Poller {
    config: Config,
    tiers: AlertTiers,
    method: ConversionMethod,
    timezone: Tz,
    collaborators: Collaborators,
    cycle: Mutex<()>,
}

impl Poller {
    pub fn new(
        config: Config,
        tiers: AlertTiers,
        method: ConversionMethod,
        timezone: Tz,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            config,
            tiers,
            method,
            timezone,
            collaborators,
            cycle: Mutex::new(()),
        }
    }

    /// Polls every configured area in order.
    ///
    /// Cycles never overlap: a cycle started while another is running
    /// waits for it, so a cooldown read and its write are never
    /// interleaved with another cycle's.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> CycleReport {
        let _guard = self.cycle.lock().await;

        let mut report = CycleReport::default();
        for area in self.config.areas.values() {
            let outcome = self.poll_area(area, now).await;
            report.areas.push((area.name.clone(), outcome));
        }

        report
    }

    async fn poll_area(&self, area: &Area, now: DateTime<Utc>) -> AreaOutcome {
        let strategy = self.method.strategy();

        let Some(reading) = read_area(self.collaborators.source.as_ref(), strategy, area).await
        else {
            log::warn!("{}: no sensor data, skipping", area.name);
            return AreaOutcome::NoData;
        };

        let aqi = reading.aqi;
        log::info!(
            "average AQI for {}: {aqi} ({}), 10-min avg: {}",
            area.name,
            AqiCategory::from_aqi(aqi).as_str(),
            reading.aqi_10m
        );

        let tier = match self.tiers.match_aqi(aqi) {
            TierMatch::Matched(tier) => tier,
            TierMatch::NoMatch => return AreaOutcome::NoMatch { aqi },
        };

        let state = self.collaborators.state.as_ref();
        match cooldown::check(state, &area.name, tier, now).await {
            Ok(Eligibility::Eligible) => {}
            Ok(Eligibility::Cooldown {
                last_notified,
                remaining,
            }) => {
                log::info!(
                    "not notifying for {} ({}) because we last notified at {}, {}m of cooldown left",
                    area.name,
                    tier.key,
                    last_notified.with_timezone(&self.timezone).format("%Y-%m-%d %H:%M:%S %Z"),
                    remaining.num_minutes()
                );
                return AreaOutcome::Cooldown {
                    aqi,
                    tier: tier.key.clone(),
                    remaining,
                };
            }
            Err(err) => {
                log::error!("{}: {err:#}", area.name);
                return AreaOutcome::Skipped {
                    aqi,
                    tier: tier.key.clone(),
                };
            }
        }

        let recipients = match self.collaborators.subscriptions.members_of(&area.name).await {
            Ok(recipients) => recipients,
            Err(err) => {
                log::error!("{}: failed to get subscribers: {err:#}", area.name);
                return AreaOutcome::Skipped {
                    aqi,
                    tier: tier.key.clone(),
                };
            }
        };

        let message = compose_alert(area, tier, &reading, strategy.name());
        log::info!("{}: notifying {} subscribers:\n{message}", area.name, recipients.len());

        let report = dispatch(self.collaborators.notifier.as_ref(), &recipients, &message).await;

        match cooldown::record(state, &area.name, tier, now).await {
            Ok(()) => log::info!(
                "{}: updated last notified ({}) to {}",
                area.name,
                tier.key,
                now.with_timezone(&self.timezone).format("%Y-%m-%d %H:%M:%S %Z")
            ),
            Err(err) => log::error!("{}: {err:#}", area.name),
        }

        AreaOutcome::Notified {
            aqi,
            tier: tier.key.clone(),
            report,
        }
    }
}
