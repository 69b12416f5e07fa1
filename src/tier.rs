//! Alert tiers and the strict-to-loose matching of an area AQI.

use std::collections::HashSet;

use serde::Deserialize;

use crate::config::ConfigError;

pub const GOOD_TIER_KEY: &str = "last-notified-good";
pub const ACCEPTABLE_TIER_KEY: &str = "last-notified";

pub const GOOD_TEMPLATE: &str = "AQI at {area} is now {aqi} 💚 ({method}), 10-min avg: {aqi_10m}! Green means GOOOO 🟢\n{sensors}\n{link}";
pub const ACCEPTABLE_TEMPLATE: &str = "AQI at {area} is now {aqi} 💛 ({method}), 10-min avg: {aqi_10m}! Please still exercise caution!\n{sensors}\n{link}";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlertTier {
    /// The tier matches when the area AQI is strictly below this value.
    pub threshold: u32,

    /// Cooldown key, unique among tiers.
    pub key: String,

    #[serde(default)]
    pub badge: String,

    pub template: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierMatch<'a> {
    NoMatch,
    Matched(&'a AlertTier),
}

/// Tiers ordered strictest (lowest threshold) first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertTiers(Vec<AlertTier>);

impl AlertTiers {
    /// Sorts the tiers by threshold and rejects lists that could match
    /// ambiguously.
    pub fn new(mut tiers: Vec<AlertTier>) -> Result<Self, ConfigError> {
        if tiers.is_empty() {
            return Err(ConfigError::Invalid("no alert tiers".to_string()));
        }

        tiers.sort_by_key(|t| t.threshold);

        let mut keys = HashSet::new();
        for tier in &tiers {
            if tier.key.trim().is_empty() {
                return Err(ConfigError::Invalid("alert tier key is empty".to_string()));
            }
            if !keys.insert(tier.key.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate alert tier key: {}",
                    tier.key
                )));
            }
            if tier.template.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "alert tier {} has an empty template",
                    tier.key
                )));
            }
        }

        if let Some(pair) = tiers.windows(2).find(|w| w[0].threshold == w[1].threshold) {
            return Err(ConfigError::Invalid(format!(
                "alert tiers {} and {} share threshold {}",
                pair[0].key, pair[1].key, pair[0].threshold
            )));
        }

        Ok(Self(tiers))
    }

    pub fn defaults(good_aqi: u32, acceptable_aqi: u32) -> Result<Self, ConfigError> {
        Self::new(vec![
            AlertTier {
                threshold: good_aqi,
                key: GOOD_TIER_KEY.to_string(),
                badge: "💚".to_string(),
                template: GOOD_TEMPLATE.to_string(),
            },
            AlertTier {
                threshold: acceptable_aqi,
                key: ACCEPTABLE_TIER_KEY.to_string(),
                badge: "💛".to_string(),
                template: ACCEPTABLE_TEMPLATE.to_string(),
            },
        ])
    }

    /// Returns the first tier, strictest first, whose threshold is above
    /// `aqi`. Looser tiers are never considered once one matches.
    pub fn match_aqi(&self, aqi: u32) -> TierMatch<'_> {
        match self.0.iter().find(|t| aqi < t.threshold) {
            Some(tier) => TierMatch::Matched(tier),
            None => TierMatch::NoMatch,
        }
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &AlertTier> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(threshold: u32, key: &str) -> AlertTier {
        AlertTier {
            threshold,
            key: key.to_string(),
            badge: String::new(),
            template: "{area}: {aqi}".to_string(),
        }
    }

    fn matched_key(tiers: &AlertTiers, aqi: u32) -> Option<&str> {
        match tiers.match_aqi(aqi) {
            TierMatch::Matched(t) => Some(t.key.as_str()),
            TierMatch::NoMatch => None,
        }
    }

    #[test]
    fn test_match_aqi() {
        let tiers = AlertTiers::new(vec![tier(50, "good"), tier(100, "ok")]).unwrap();

        assert_eq!(matched_key(&tiers, 0), Some("good"));
        assert_eq!(matched_key(&tiers, 49), Some("good"));
        assert_eq!(matched_key(&tiers, 50), Some("ok"));
        assert_eq!(matched_key(&tiers, 99), Some("ok"));
        assert_eq!(matched_key(&tiers, 100), None);
        assert_eq!(matched_key(&tiers, 500), None);
    }

    #[test]
    fn test_tiers_are_sorted_strictest_first() {
        let tiers = AlertTiers::new(vec![tier(100, "ok"), tier(50, "good")]).unwrap();

        let keys: Vec<&str> = tiers.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, ["good", "ok"]);
        assert_eq!(matched_key(&tiers, 10), Some("good"));
    }

    #[test]
    fn test_at_most_one_tier_matches() {
        let tiers =
            AlertTiers::new(vec![tier(50, "good"), tier(100, "ok"), tier(150, "meh")]).unwrap();

        for aqi in 0..=500 {
            let expected = tiers.iter().find(|t| aqi < t.threshold);
            match tiers.match_aqi(aqi) {
                TierMatch::Matched(t) => assert_eq!(Some(t), expected),
                TierMatch::NoMatch => assert!(expected.is_none()),
            }
        }
    }

    #[test]
    fn test_rejects_ambiguous_tiers() {
        assert!(AlertTiers::new(vec![]).is_err());
        assert!(AlertTiers::new(vec![tier(50, "a"), tier(50, "b")]).is_err());
        assert!(AlertTiers::new(vec![tier(50, "a"), tier(100, "a")]).is_err());
        assert!(AlertTiers::new(vec![tier(50, " ")]).is_err());
        assert!(AlertTiers::defaults(100, 100).is_err());
    }

    #[test]
    fn test_defaults() {
        let tiers = AlertTiers::defaults(50, 100).unwrap();

        assert_eq!(tiers.len(), 2);
        assert_eq!(matched_key(&tiers, 30), Some(GOOD_TIER_KEY));
        assert_eq!(matched_key(&tiers, 75), Some(ACCEPTABLE_TIER_KEY));
    }
}
