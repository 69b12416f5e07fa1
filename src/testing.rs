//! In-memory collaborators for tests.

use std::{
    collections::{BTreeSet, HashMap, HashSet},
    sync::Mutex,
};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::Value;

use crate::{
    config::{Area, Config},
    cooldown::NotificationStateStore,
    notify::{Notifier, NotifyError, SubscriptionStore},
    purpleair::{FetchError, SensorSample, SensorSource},
};

pub fn sample(value: Value) -> SensorSample {
    SensorSample::from_json(value).expect("sample must be a JSON object")
}

pub fn area(name: &str, sensors: &[&str]) -> Area {
    Area {
        name: name.to_string(),
        sensors: sensors.iter().map(|s| s.to_string()).collect(),
        link: "https://map.example/?select={sensor}".to_string(),
    }
}

pub fn config(areas: &[(&str, &[&str])]) -> Config {
    Config {
        areas: areas
            .iter()
            .map(|(name, sensors)| (name.to_string(), area(name, sensors)))
            .collect::<IndexMap<_, _>>(),
        tiers: None,
    }
}

pub fn recipients(numbers: &[&str]) -> BTreeSet<String> {
    numbers.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<HashMap<String, DateTime<Utc>>>,
    subscriptions: Mutex<HashMap<String, BTreeSet<String>>>,
    writes: Mutex<usize>,
    broken: bool,
}

impl MemoryStore {
    /// A store whose every operation fails.
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub fn state_writes(&self) -> usize {
        *self.writes.lock().unwrap()
    }

    pub fn state(&self, key: &str) -> Option<DateTime<Utc>> {
        self.state.lock().unwrap().get(key).copied()
    }

    fn check(&self) -> Result<()> {
        if self.broken {
            return Err(anyhow!("store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationStateStore for MemoryStore {
    async fn last_notified(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        self.check()?;
        Ok(self.state(key))
    }

    async fn set_last_notified(&self, key: &str, at: DateTime<Utc>) -> Result<()> {
        self.check()?;
        self.state.lock().unwrap().insert(key.to_string(), at);
        *self.writes.lock().unwrap() += 1;
        Ok(())
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn members_of(&self, area: &str) -> Result<BTreeSet<String>> {
        self.check()?;
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .get(area)
            .cloned()
            .unwrap_or_default())
    }

    async fn add(&self, area: &str, recipient: &str) -> Result<()> {
        self.check()?;
        self.subscriptions
            .lock()
            .unwrap()
            .entry(area.to_string())
            .or_default()
            .insert(recipient.to_string());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    failing: HashSet<String>,
}

impl RecordingNotifier {
    pub fn failing_for(recipients: &[&str]) -> Self {
        Self {
            failing: recipients.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Successfully delivered `(recipient, message)` pairs.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, recipient: &str, message: &str) -> Result<(), NotifyError> {
        if self.failing.contains(recipient) {
            return Err(NotifyError::Rejected {
                status: 400,
                code: Some(21614),
                message: format!("{recipient} is not a mobile number"),
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), message.to_string()));
        Ok(())
    }
}

/// Serves canned samples per sensor; unknown sensors have no results.
#[derive(Debug, Default)]
pub struct FakeSource {
    samples: HashMap<String, Vec<SensorSample>>,
    errors: Mutex<HashMap<String, FetchError>>,
    fetches: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn with_samples(mut self, sensor_id: &str, samples: Vec<SensorSample>) -> Self {
        self.samples.insert(sensor_id.to_string(), samples);
        self
    }

    /// The next fetch of `sensor_id` fails with `err`.
    pub fn with_error(self, sensor_id: &str, err: FetchError) -> Self {
        self.errors
            .lock()
            .unwrap()
            .insert(sensor_id.to_string(), err);
        self
    }

    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl SensorSource for FakeSource {
    async fn fetch(&self, sensor_id: &str) -> Result<Vec<SensorSample>, FetchError> {
        self.fetches.lock().unwrap().push(sensor_id.to_string());

        if let Some(err) = self.errors.lock().unwrap().remove(sensor_id) {
            return Err(err);
        }

        match self.samples.get(sensor_id) {
            Some(samples) if !samples.is_empty() => Ok(samples.clone()),
            _ => Err(FetchError::NoResults),
        }
    }
}
