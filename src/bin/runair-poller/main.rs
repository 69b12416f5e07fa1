mod args;

use std::{pin::pin, process::ExitCode, sync::Arc};

use anyhow::{Context as _, Result, bail};
use args::Args;
use chrono::Utc;
use clap::Parser as _;
use runair::{
    db::{PgStore, new_pool, run_migrations},
    poll::{Collaborators, CycleReport, Poller},
    purpleair::PurpleAirClient,
};
use tokio::time::{Duration, MissedTickBehavior, interval};

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

    if args.interval_minutes == 0 {
        bail!("poll interval must be at least one minute");
    }

    let (config, tiers) = args.alert.load()?;
    let timeout = Duration::from_secs(args.http_timeout_secs);

    let pool = new_pool(&args.database_url).await?;
    run_migrations(&pool).await?;
    let store = Arc::new(PgStore::new(pool));

    let source = PurpleAirClient::new(args.purpleair_base_url.as_str(), timeout)
        .context("failed to create PurpleAir client")?;
    let notifier = args.twilio.notifier(timeout)?;

    log::info!(
        "polling {} areas every {} minutes using {} conversion",
        config.areas.len(),
        args.interval_minutes,
        args.alert.conversion.strategy().name()
    );

    let poller = Poller::new(
        config,
        tiers,
        args.alert.conversion,
        args.timezone,
        Collaborators {
            source: Arc::new(source),
            subscriptions: store.clone(),
            state: store.clone(),
            notifier: Arc::new(notifier),
        },
    );

    if args.once {
        log_report(&poller.run_cycle(Utc::now()).await);
        store.close().await;
        return Ok(());
    }

    let mut ticker = interval(Duration::from_secs(args.interval_minutes * 60));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut shutdown = pin!(tokio::signal::ctrl_c());

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                log_report(&poller.run_cycle(Utc::now()).await);
            }
            result = &mut shutdown => {
                result.context("failed to listen for shutdown signal")?;
                log::info!("shutting down");
                break;
            }
        }
    }

    store.close().await;

    Ok(())
}

fn log_report(report: &CycleReport) {
    log::info!(
        "poll cycle finished: {} areas, {} notified",
        report.areas.len(),
        report.notified()
    );
}
