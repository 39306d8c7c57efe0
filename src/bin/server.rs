use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use sea_orm::{ConnectOptions, Database};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use ftth_telemetry::db::{self, services::SeaOrmTelemetryStore};
use ftth_telemetry::device::{DeviceConnector, PppoeSettings, ProfileKind, RouterOsConnector};
use ftth_telemetry::notifications::NotificationDispatcher;
use ftth_telemetry::polling::{PollingContext, Trigger, run_ping_check, run_traffic_sync};
use ftth_telemetry::server::config::ServerConfig;
use ftth_telemetry::server::logging::init_logging;
use ftth_telemetry::server::scheduler::spawn_periodic_jobs;
use ftth_telemetry::services::{DeviceService, EncryptionService};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the traffic sync and ping check jobs until interrupted (default)
    Serve,
    /// Run one traffic sync now and print its summary
    SyncTraffic,
    /// Run one ping check now and print its summary
    PingCheck,
    /// Print board, firmware and identity of a router as JSON
    DeviceInfo { router_id: Uuid },
    /// List the interfaces of a router as JSON
    Interfaces { router_id: Uuid },
    /// List the queue types of a router as JSON
    QueueTypes { router_id: Uuid },
    /// Create a PPPoE or hotspot bandwidth profile on a router
    ApplyProfile {
        router_id: Uuid,
        #[arg(long, value_enum)]
        kind: ProfileKindArg,
        #[arg(long)]
        name: String,
        /// RouterOS rate limit, e.g. `10M/10M`
        #[arg(long)]
        rate_limit: String,
        #[arg(long)]
        dns1: Option<String>,
        #[arg(long)]
        dns2: Option<String>,
        #[arg(long)]
        only_one: Option<String>,
        #[arg(long)]
        queue_type: Option<String>,
        /// Recorded as the executor in the operation log
        #[arg(long, default_value = "operator")]
        executor: String,
    },
    /// Print the stored form of a router password
    EncryptSecret { plaintext: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ProfileKindArg {
    Pppoe,
    Hotspot,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), BoxError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let args = Args::parse();

    let config = match ServerConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load server configuration: {e}");
            return Err(e.into());
        }
    };
    let mut encryption = EncryptionService::from_hex(&config.credential_encryption_key)?;
    if let Some(key) = &config.legacy_aes_key {
        encryption = encryption.with_legacy_key(key)?;
    }
    let encryption = Arc::new(encryption);

    let command = args.command.unwrap_or(Command::Serve);
    if let Command::EncryptSecret { plaintext } = &command {
        println!("{}", encryption.encrypt_to_string(plaintext)?);
        return Ok(());
    }

    init_logging(&config.log_dir);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting FTTH telemetry engine.");

    // --- Database Setup ---
    let mut opt = ConnectOptions::new(config.database_url.clone());
    opt.max_connections(10);
    let db_conn = Database::connect(opt).await?;
    db::ensure_schema(&db_conn).await?;

    // --- Polling Setup ---
    let connector: Arc<dyn DeviceConnector> =
        Arc::new(RouterOsConnector::new(config.device_connect_timeout()));
    let (notifier, notifier_handle) = NotificationDispatcher::from_config(config.telegram())?;
    let ctx = PollingContext {
        store: Arc::new(SeaOrmTelemetryStore::new(db_conn.clone())),
        connector: connector.clone(),
        credentials: encryption.clone(),
        notifier,
        ping_target: config.ping_target.clone(),
    };
    let device_service = DeviceService::new(db_conn, connector, encryption);

    let outcome = run_command(command, ctx, &device_service, &config).await;
    if let Err(e) = &outcome {
        error!(error = %e, "Command failed.");
    }

    // Give queued alerts a chance to go out before exiting.
    if let Some(handle) = notifier_handle {
        if tokio::time::timeout(Duration::from_secs(10), handle).await.is_err() {
            warn!("Timed out waiting for pending notifications.");
        }
    }
    outcome
}

async fn run_command(
    command: Command,
    ctx: PollingContext,
    device_service: &DeviceService,
    config: &ServerConfig,
) -> Result<(), BoxError> {
    match command {
        Command::Serve => {
            let handles = spawn_periodic_jobs(
                Arc::new(ctx),
                config.traffic_sync_interval(),
                config.ping_check_interval(),
            );
            tokio::signal::ctrl_c().await?;
            info!("Shutdown signal received. Stopping periodic jobs.");
            for handle in handles {
                handle.abort();
                let _ = handle.await;
            }
        }
        Command::SyncTraffic => {
            let summary = run_traffic_sync(&ctx, Trigger::Manual).await?;
            println!("{summary}");
        }
        Command::PingCheck => {
            let summary = run_ping_check(&ctx, Trigger::Manual).await?;
            println!("{summary}");
        }
        Command::DeviceInfo { router_id } => {
            print_json(&device_service.system_info(router_id).await?)?;
        }
        Command::Interfaces { router_id } => {
            print_json(&device_service.interfaces(router_id).await?)?;
        }
        Command::QueueTypes { router_id } => {
            print_json(&device_service.queue_types(router_id).await?)?;
        }
        Command::ApplyProfile {
            router_id,
            kind,
            name,
            rate_limit,
            dns1,
            dns2,
            only_one,
            queue_type,
            executor,
        } => {
            let kind = match kind {
                ProfileKindArg::Pppoe => ProfileKind::Pppoe(PppoeSettings {
                    dns_primary: dns1,
                    dns_secondary: dns2,
                    only_one,
                    queue_type,
                }),
                ProfileKindArg::Hotspot => ProfileKind::Hotspot,
            };
            device_service
                .apply_profile(router_id, &kind, &name, &rate_limit, &executor)
                .await?;
            println!("Profile '{name}' created.");
        }
        Command::EncryptSecret { .. } => {}
    }
    Ok(())
}
