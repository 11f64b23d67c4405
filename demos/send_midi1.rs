//! Send raw MIDI 1.0 channel messages to an endpoint.
//!
//! ```text
//! cargo run --example send_midi1 -- udp://synth.local:5673#0 90 3C 64
//! ```

use clap::Parser;
use netmidi2::UmpTransport;
use netmidi2::transport::{ClientConfig, EndpointUrl};
use netmidi2::ump::Midi1ChannelVoice;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
struct Args {
    /// Endpoint URL; the `#group` suffix selects the UMP group
    url: EndpointUrl,

    /// MIDI 1.0 bytes in hex, one message
    #[clap(required = true)]
    bytes: Vec<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .ok();
    let args = Args::parse();

    let bytes = args
        .bytes
        .iter()
        .map(|b| u8::from_str_radix(b, 16))
        .collect::<Result<Vec<u8>, _>>()?;
    let group = args.url.group().unwrap_or(0);
    let message = Midi1ChannelVoice::from_midi1_bytes(group, &bytes)?;

    let mut transport = args.url.open(ClientConfig::default())?;
    transport.send(&message.into())?;
    println!("sent {:02X?} on group {group}", message.to_midi1_bytes());
    Ok(())
}
