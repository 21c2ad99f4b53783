use clap::Parser;
use log::{error, info, warn};
use smart_mailbox::clock::SystemClock;
use smart_mailbox::config::{self, Config};
use smart_mailbox::error::MailboxError;
use smart_mailbox::sim;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "smart-mailbox")]
#[command(about = "Mailbox delivery monitor (simulated hardware bench)")]
struct Cli {
    /// Seed for the simulated sensor agitation
    #[arg(long, env = "SIM_SEED", default_value_t = 42)]
    seed: u64,

    /// Seconds of quiet before the simulated delivery
    #[arg(long, env = "SIM_DELIVER_AFTER", default_value_t = 10.0)]
    deliver_after: f64,

    /// Leave the simulated sensors idle (no agitator task)
    #[arg(long)]
    no_agitator: bool,
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

#[tokio::main]
async fn main() {
    init_logger();
    let cli = Cli::parse();

    config::load_dotenv();
    let mut config = Config::from_env();
    if !config.wifi.is_configured() {
        // The simulated link does not care about credentials; keep the bench
        // runnable out of the box. Real deployments set WIFI_SSID/PASSWORD.
        warn!("WiFi credentials not set; using simulated network credentials");
        config.wifi.ssid = "sim-network".to_string();
        config.wifi.password = "sim-password".to_string();
    }

    info!("Starting Smart Mailbox monitor");
    info!("Configuration loaded:");
    info!(
        "  Window size: {} samples, minimum {} to evaluate",
        config.detection.sliding_window_size, config.detection.min_samples_to_evaluate
    );
    info!(
        "  Sampling interval: {}s",
        config.detection.sampling_interval
    );
    info!(
        "  Trigger thresholds (tilt/lid/bottom): {}/{}/{}",
        config.detection.consecutive_tilt_sensor_active_needed_to_trigger,
        config.detection.consecutive_lid_open_needed_to_trigger,
        config.detection.consecutive_bottom_sensor_active_needed_to_trigger
    );
    info!(
        "  Home Assistant configured: {}",
        config.home_assistant.is_configured()
    );
    info!("  ntfy configured: {}", config.ntfy.is_configured());

    let clock = Arc::new(SystemClock);
    let sampling_interval = config.detection.sampling_interval();
    let (mut controller, bench) = sim::build_controller(config, clock);

    let agitator = (!cli.no_agitator).then(|| {
        sim::spawn_agitator(
            bench,
            cli.seed,
            Duration::from_secs_f64(cli.deliver_after),
            sampling_interval,
        )
    });

    let monitor = tokio::spawn(async move { controller.run().await });

    tokio::select! {
        result = monitor => {
            match result {
                Ok(Err(e)) => handle_fatal(e).await,
                Ok(Ok(())) => info!("Monitor loop ended"),
                Err(e) => {
                    error!("Monitor task panicked: {e}");
                    std::process::exit(1);
                }
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    if let Some(task) = agitator {
        task.abort();
    }
    info!("Smart Mailbox monitor stopped");
}

/// Fatal errors already signaled their burst pattern inside the controller.
/// A sensorless device idles instead of restarting; everything else exits
/// with the signal code so a supervisor can restart the process.
async fn handle_fatal(e: MailboxError) {
    error!("Fatal: {e}");
    if matches!(e, MailboxError::NoSensorsConfigured) {
        info!("No sensors wired; idling");
        loop {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
    }
    std::process::exit(e.signal_code() as i32);
}
