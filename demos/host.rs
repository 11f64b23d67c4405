//! Minimal Network MIDI 2.0 host that logs every UMP it receives.

use std::net::SocketAddr;

use clap::Parser;
use netmidi2::transport::{Host, HostConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
struct Args {
    /// Address to listen on
    #[clap(long, default_value = "0.0.0.0:5673")]
    bind: SocketAddr,

    /// Endpoint name announced to clients
    #[clap(long, default_value = "netmidi2 host")]
    name: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()
        .ok();
    let args = Args::parse();

    let mut host = Host::bind(HostConfig {
        name: args.name,
        bind_addr: args.bind,
        ..HostConfig::default()
    })?;
    info!(addr = %host.local_addr()?, "waiting for clients");

    host.run(|peer, ump| {
        info!(%peer, ?ump, "ump");
    })?;
    Ok(())
}
