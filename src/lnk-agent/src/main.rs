// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

mod config;
mod host;
mod sim;

use std::path::PathBuf;
use std::sync::{Arc, Weak};

use clap::Parser;
use tokio::runtime::Handle;
use tokio::signal;
use tracing::{info, warn};

use lnk_app::{init_logging, ConfigFile};
use lnk_core::{
    ConnectionState, ConnectionSupervisor, DynResult, Escalation, Indicator, StateLog,
    SupervisorConfig, Transport,
};

use config::{AgentConfig, ReconnectStrategy};
use host::{LogIndicator, ProcessRestart};
use sim::{SimLink, SimTransport};

const PKG_DESCRIPTION: &str = concat!(env!("CARGO_PKG_NAME"), " - link supervision agent");
const WIFI_LINK: &str = "WifiLink";
const BROKER_SESSION: &str = "BrokerSession";

type Supervisor = ConnectionSupervisor<Arc<SimTransport>>;

#[derive(Debug, Parser)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = PKG_DESCRIPTION,
)]
struct Cli {
    /// Path to configuration file
    #[arg(long = "config", short = 'C', value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print example configuration and exit
    #[arg(long = "print-config")]
    print_config: bool,
    /// Override [general].log_level
    #[arg(long = "log-level", value_name = "LEVEL")]
    log_level: Option<String>,
    /// Print the state log as JSON on shutdown
    #[arg(long = "dump-json")]
    dump_json: bool,
}

fn supervisor_config(cfg: &AgentConfig, escalation: &Escalation) -> SupervisorConfig {
    let base = match cfg.reconnect.strategy {
        ReconnectStrategy::Escalate => SupervisorConfig::escalating(escalation.clone()),
        ReconnectStrategy::Persist => SupervisorConfig::persistent(),
    };
    base.with_retry(cfg.reconnect.retry_policy())
        .with_health(cfg.health.policy())
}

/// Tear the broker session down whenever the network underneath goes away.
fn follow_network(
    broker: &Arc<Supervisor>,
) -> impl Fn(&str, &ConnectionState, &ConnectionState) + Send + Sync + 'static {
    let broker: Weak<Supervisor> = Arc::downgrade(broker);
    move |_id: &str, _old: &ConnectionState, new: &ConnectionState| {
        if *new != ConnectionState::Disconnected {
            return;
        }
        let Some(broker) = broker.upgrade() else {
            return;
        };
        if broker.is_connected() {
            if let Err(e) = broker.transport().disconnect() {
                warn!("Failed to drop broker session: {}", e);
            }
        }
    }
}

#[tokio::main]
async fn main() -> DynResult<()> {
    let cli = Cli::parse();

    if cli.print_config {
        println!("{}", AgentConfig::example_combined_toml());
        return Ok(());
    }

    let (cfg, config_path) = AgentConfig::load(cli.config.as_deref())?;
    cfg.validate()
        .map_err(|e| format!("Invalid agent configuration: {}", e))?;

    init_logging(cli.log_level.as_deref().or(cfg.general.log_level.as_deref()));

    if let Some(ref path) = config_path {
        info!("Loaded configuration from {}", path.display());
    }
    info!("Starting {} ({})", cfg.general.device, env!("CARGO_PKG_VERSION"));

    let log = Arc::new(StateLog::new(cfg.diagnostics.log_capacity));
    let indicator: Arc<dyn Indicator> = Arc::new(LogIndicator);
    let status = Arc::new(cfg.status.build_sink(indicator.clone()));
    let escalation = Escalation::new(Arc::new(ProcessRestart::new(
        log.clone(),
        cfg.diagnostics.dump_on_exit,
    )))
    .with_default_alert(indicator);

    let runtime = Handle::current();
    let wifi_transport = Arc::new(SimTransport::new(
        SimLink::Wifi(cfg.wifi.clone()),
        cfg.sim.wifi.clone(),
        runtime.clone(),
    ));
    let broker_transport = Arc::new(
        SimTransport::new(
            SimLink::Broker(cfg.broker.clone()),
            cfg.sim.broker.clone(),
            runtime,
        )
        .with_upstream(wifi_transport.clone()),
    );

    let wifi: Arc<Supervisor> = Arc::new(ConnectionSupervisor::with_log(
        WIFI_LINK,
        wifi_transport,
        supervisor_config(&cfg, &escalation),
        log.clone(),
    ));
    let broker: Arc<Supervisor> = Arc::new(ConnectionSupervisor::with_log(
        BROKER_SESSION,
        broker_transport,
        supervisor_config(&cfg, &escalation),
        log.clone(),
    ));

    wifi.cell().register_listener(&status);
    broker.cell().register_listener(&status);
    let follower = Arc::new(follow_network(&broker));
    wifi.cell().register_listener(&follower);

    wifi.init()?;
    broker.init()?;

    signal::ctrl_c().await?;
    info!("Ctrl+C received, shutting down");

    let stopping = [wifi.clone(), broker.clone()];
    tokio::task::spawn_blocking(move || {
        for supervisor in &stopping {
            supervisor.stop();
        }
    })
    .await?;

    for supervisor in [&wifi, &broker] {
        info!(
            "{}: {} after {} connect attempts",
            supervisor.id(),
            supervisor.state(),
            supervisor.transport().attempts()
        );
    }
    if cfg.diagnostics.dump_on_exit {
        log.dump();
    }
    if cli.dump_json {
        println!("{}", log.to_json()?);
    }
    Ok(())
}
