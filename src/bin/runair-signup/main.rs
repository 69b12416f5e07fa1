mod args;

use std::{process::ExitCode, time::Duration};

use anyhow::Result;
use args::Args;
use clap::Parser as _;
use runair::{
    db::{PgStore, new_pool, run_migrations},
    notify::signup,
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

    let (config, tiers) = args.alert.load()?;

    let pool = new_pool(&args.database_url).await?;
    run_migrations(&pool).await?;
    let store = PgStore::new(pool);

    let notifier = args
        .twilio
        .notifier(Duration::from_secs(args.http_timeout_secs))?;

    let result = signup(
        &store,
        &notifier,
        &config,
        &tiers,
        args.alert.conversion.strategy().name(),
        &args.number,
        &args.areas,
    )
    .await;
    store.close().await;

    let registered = result?;
    println!("Subscribed {} to {}", args.number, registered.join(", "));

    Ok(())
}
