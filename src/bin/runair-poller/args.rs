use chrono_tz::Tz;
use clap::Parser;
use runair::{
    cli::{AlertArgs, TwilioArgs},
    purpleair::DEFAULT_BASE_URL,
};

#[derive(Debug, Parser)]
pub struct Args {
    #[arg(long, env = "TZ")]
    pub timezone: Tz,

    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    #[arg(long, env = "PURPLEAIR_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub purpleair_base_url: String,

    #[arg(long, env = "POLL_INTERVAL_MINUTES", default_value_t = 5)]
    pub interval_minutes: u64,

    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = 10)]
    pub http_timeout_secs: u64,

    /// Run a single poll cycle and exit.
    #[arg(long)]
    pub once: bool,

    #[command(flatten)]
    pub alert: AlertArgs,

    #[command(flatten)]
    pub twilio: TwilioArgs,
}
