use clap::Parser;
use runair::cli::{AlertArgs, TwilioArgs};

#[derive(Debug, Parser)]
pub struct Args {
    /// Message sent to every subscriber.
    #[arg(long)]
    pub message: String,

    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = 10)]
    pub http_timeout_secs: u64,

    #[command(flatten)]
    pub alert: AlertArgs,

    #[command(flatten)]
    pub twilio: TwilioArgs,
}
