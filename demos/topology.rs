//! Print the function block topology of a MIDI 2.0 endpoint.
//!
//! ```text
//! cargo run --example topology -- udp://192.168.1.20:5673
//! cargo run --example topology -- file:///dev/snd/umpC1D0
//! ```

use clap::Parser;
use netmidi2::Endpoint;
use netmidi2::transport::{ClientConfig, EndpointUrl};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
struct Args {
    /// Endpoint URL: udp://[user[:password]@]host:port or file:///dev/...
    url: EndpointUrl,

    /// Skip waiting for endpoint and block names
    #[clap(long, default_value_t = false)]
    no_names: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .ok();
    let args = Args::parse();

    let mut transport = args.url.open(ClientConfig::default())?;
    let endpoint = Endpoint::discover(&mut transport, !args.no_names)?;

    println!("Endpoint: {}", endpoint.name());
    if let Some(info) = endpoint.info() {
        println!(
            "UMP {} | MIDI 1.0: {} | MIDI 2.0: {} | static blocks: {}",
            info.version, info.midi1, info.midi2, info.static_blocks
        );
    }
    for block in endpoint.blocks().iter().flatten() {
        println!("  {block}");
    }
    Ok(())
}
