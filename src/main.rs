use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info, info_span, warn, Instrument};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use monster_catch_client::config::ClientConfig;
use monster_catch_client::events::{EventSink, GameEvent};
use monster_catch_client::game::{RoundController, RoundError, RoundStatus};
use monster_catch_client::metrics::ClientMetrics;
use monster_catch_client::net::{Backend, HttpBackend};
use monster_catch_client::profile::{ProfilePoller, SharedProfile};

#[cfg(feature = "tournament")]
use monster_catch_client::tournament::TournamentTracker;

/// Delay range between simulated catches
const CATCH_DELAY_MS: std::ops::RangeInclusive<u64> = 250..=900;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Monster Catch client v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = ClientConfig::load_or_default();
    config.validate().map_err(anyhow::Error::msg)?;
    if config.auth_token.is_none() {
        anyhow::bail!("AUTH_TOKEN is required to play");
    }
    info!(
        "Configuration loaded: {}, tick={:?}, timeout={:?}",
        config.api_base_url, config.tick_interval, config.request_timeout
    );

    let backend = Arc::new(HttpBackend::new(&config)?);
    let metrics = Arc::new(ClientMetrics::new());
    let profile = SharedProfile::default();

    match backend.fetch_profile().await {
        Ok(me) => {
            info!(
                "Signed in as {}: {} stars, {} coins, level {}",
                me.display_name.as_deref().unwrap_or("Player"),
                me.stars,
                me.coins,
                me.level
            );
            profile.replace(me);
        }
        Err(e) => warn!("Could not load profile: {}", e),
    }

    let (events, rx) = EventSink::channel();
    let event_logger = tokio::spawn(log_events(rx));

    let poller = ProfilePoller::spawn(
        backend.clone(),
        profile.clone(),
        metrics.clone(),
        config.profile_poll_interval,
    );

    #[cfg(feature = "tournament")]
    let tracker = {
        let tracker = Arc::new(TournamentTracker::new(
            backend.clone(),
            Arc::new(profile.clone()),
            events.clone(),
            metrics.clone(),
        ));
        match tracker.refresh().await {
            Ok(eligibility) => {
                if let Some(window) = tracker.window() {
                    info!(
                        "Tournament #{} {}: prize pool {}, entry fee {}, {} participants",
                        window.tournament_id,
                        window.status_label(),
                        window.prize_pool,
                        window.entry_fee,
                        window.participants.len()
                    );
                }
                info!("{}", eligibility.message());

                if config.auto_join_tournament && eligibility.can_join() {
                    match tracker.join().await {
                        Ok(outcome) => info!("{}", outcome.message()),
                        Err(e) => warn!("Tournament join failed: {}", e),
                    }
                }
            }
            Err(e) => warn!("Could not load tournament: {}", e),
        }
        tracker.start_polling(config.tournament_poll_interval);
        tracker
    };

    let controller = RoundController::new(
        backend.clone(),
        Arc::new(profile.clone()),
        events.clone(),
        metrics.clone(),
        &config,
    );

    let span = info_span!("session", id = %Uuid::new_v4());

    tokio::select! {
        result = play_round(&controller).instrument(span) => {
            if let Err(e) = result {
                error!("Round failed: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutting down...");
        }
    }

    // Cleanup
    controller.shutdown();
    #[cfg(feature = "tournament")]
    tracker.shutdown();
    poller.stop();

    match backend.leaderboard().await {
        Ok(entries) => {
            info!("Leaderboard:");
            for (rank, entry) in entries.iter().take(10).enumerate() {
                info!("  {:>2}. {:<20} {}", rank + 1, entry.display_name(), entry.score);
            }
        }
        Err(e) => warn!("Could not load leaderboard: {}", e),
    }

    let me = profile.snapshot();
    info!(
        "Final profile: {} stars, {} coins, level {} ({} xp)",
        me.stars, me.coins, me.level, me.xp
    );
    info!("Metrics:\n{}", metrics.to_prometheus());

    event_logger.abort();
    info!("Client stopped");

    Ok(())
}

/// Play one round with a simulated catcher until its result is settled
async fn play_round<B: Backend>(controller: &RoundController<B>) -> Result<(), RoundError> {
    let round = controller.start_round().await?;
    info!(
        "Round {} started, {} s on the clock",
        round.session_id,
        round.duration_ms / 1000
    );

    let mut rng = StdRng::from_entropy();
    while !controller.round_settled() {
        tokio::time::sleep(Duration::from_millis(rng.gen_range(CATCH_DELAY_MS))).await;
        if controller.status() == RoundStatus::Running {
            controller.catch_monster();
        }
    }

    let hud = controller.hud();
    info!(
        "Round over: score {}, best {}",
        hud.score,
        hud.best_score.map_or_else(|| "-".to_string(), |best| best.to_string())
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn log_events(mut rx: UnboundedReceiver<GameEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            GameEvent::Caught { points, score } => debug!("+{} (score {})", points, score),
            GameEvent::Reconciled(result) => info!(
                "Round reconciled: total stars {}, level {}",
                result
                    .total_stars
                    .map_or_else(|| "?".to_string(), |s| s.to_string()),
                result.level.map_or_else(|| "?".to_string(), |l| l.to_string())
            ),
            GameEvent::ReferralReward { stars } => info!("Referral bonus: +{} stars!", stars),
            GameEvent::Error { message } => warn!("{}", message),
            GameEvent::StatusChanged(status) => info!("Round status: {:?}", status),
            GameEvent::Tick { .. } | GameEvent::TargetSpawned(_) => {}
            other => debug!("{:?}", other),
        }
    }
}
