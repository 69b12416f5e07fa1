mod args;

use std::{process::ExitCode, time::Duration};

use anyhow::{Result, bail};
use args::Args;
use clap::Parser as _;
use runair::{
    db::{PgStore, new_pool, run_migrations},
    notify::broadcast,
};

#[tokio::main]
async fn main() -> ExitCode {
    pretty_env_logger::init_custom_env("RUST_LOG");

    if let Err(e) = run().await {
        log::error!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::from(0)
}

async fn run() -> Result<()> {
    let args = Args::parse();

    if args.message.trim().is_empty() {
        bail!("message is empty");
    }

    let (config, _) = args.alert.load()?;

    let pool = new_pool(&args.database_url).await?;
    run_migrations(&pool).await?;
    let store = PgStore::new(pool);

    let notifier = args
        .twilio
        .notifier(Duration::from_secs(args.http_timeout_secs))?;

    let result = broadcast(&store, &notifier, &config, &args.message).await;
    store.close().await;

    let report = result?;
    println!(
        "Successfully sent {} messages ({} failed)!",
        report.sent, report.failed
    );

    Ok(())
}
