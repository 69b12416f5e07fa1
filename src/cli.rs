//! Argument groups shared by the binaries.

use std::{path::PathBuf, time::Duration};

use anyhow::{Context as _, Result};
use clap::Args;

use crate::{
    aqi::ConversionMethod,
    config::Config,
    tier::AlertTiers,
    twilio::{DEFAULT_API_BASE_URL, DEFAULT_FROM_NUMBER, TwilioNotifier},
};

#[derive(Debug, Args)]
pub struct AlertArgs {
    #[arg(long, env = "RUNAIR_CONFIG", default_value = "config/areas.toml")]
    pub config: PathBuf,

    #[arg(long, env = "CONVERSION_METHOD", default_value = "aqandu")]
    pub conversion: ConversionMethod,

    #[arg(long, env = "GOOD_AQI", default_value_t = 50)]
    pub good_aqi: u32,

    #[arg(long, env = "ACCEPTABLE_AQI", default_value_t = 100)]
    pub acceptable_aqi: u32,
}

impl AlertArgs {
    pub fn load(&self) -> Result<(Config, AlertTiers)> {
        let config = Config::load(&self.config)
            .with_context(|| format!("failed to load config: {:?}", self.config))?;
        let tiers = config
            .resolve_tiers(self.good_aqi, self.acceptable_aqi)
            .context("failed to resolve alert tiers")?;

        Ok((config, tiers))
    }
}

#[derive(Debug, Args)]
pub struct TwilioArgs {
    #[arg(long, env = "TWILIO_ACCOUNT_SID")]
    pub twilio_account_sid: String,

    #[arg(long, env = "TWILIO_AUTH_TOKEN", hide_env_values = true)]
    pub twilio_auth_token: String,

    #[arg(long, env = "RUNAIR_NUMBER", default_value = DEFAULT_FROM_NUMBER)]
    pub from_number: String,

    #[arg(long, env = "TWILIO_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    pub twilio_base_url: String,
}

impl TwilioArgs {
    pub fn notifier(&self, timeout: Duration) -> Result<TwilioNotifier> {
        TwilioNotifier::new(
            self.twilio_base_url.as_str(),
            self.twilio_account_sid.as_str(),
            self.twilio_auth_token.as_str(),
            self.from_number.as_str(),
            timeout,
        )
        .context("failed to create Twilio client")
    }
}
