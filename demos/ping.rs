//! Send ICMP echo requests built by `rawpack::Ping`.
//!
//! To run this example:
//!
//! ```sh
//! sudo cargo run --example ping -- --src 192.168.0.10 --dst 8.8.8.8 --count 4
//! ```
//!
//! Note: Root/sudo privileges are required to open a raw socket or TUN device.
//! Replies are not read; watch them with a capture tool.

use std::thread;
use std::time::Duration;

use clap::Parser;
use rawpack::Ping;
use tracing::{error, info};

mod utils;
use utils::{init_logging, open_sink, SinkKind};

#[derive(Parser, Debug)]
#[command(about = "Send raw ICMP echo requests")]
struct Args {
    /// Source IPv4 address written into the header
    #[arg(long)]
    src: String,

    /// Destination IPv4 address
    #[arg(long)]
    dst: String,

    /// Number of requests to send
    #[arg(short, long, default_value_t = 4)]
    count: u32,

    /// Milliseconds between requests
    #[arg(short, long, default_value_t = 1000)]
    interval: u64,

    /// Time to live for outgoing requests
    #[arg(short, long)]
    ttl: Option<u8>,

    #[arg(long, value_enum, default_value_t = SinkKind::Raw)]
    sink: SinkKind,

    #[arg(long, default_value = "tun0")]
    tun_name: String,

    #[arg(long, default_value = "10.0.0.254/24")]
    tun_cidr: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging();

    let mut ping = Ping::new();
    ping.set_src_ip(args.src.as_str())?;
    ping.set_dst_ip(args.dst.as_str())?;
    if let Some(ttl) = args.ttl {
        ping.ip_mut().set_ttl(ttl);
    }

    let mut sink = open_sink(args.sink, &args.tun_name, &args.tun_cidr)?;
    info!(dst = %args.dst, identifier = ping.identifier(), "PING");

    for _ in 0..args.count {
        match ping.send(&mut sink) {
            Ok(sequence) => info!(sequence, bytes = ping.payload().len(), "echo request sent"),
            Err(e) => error!("failed to send echo request: {e}"),
        }
        thread::sleep(Duration::from_millis(args.interval));
    }

    info!(sent = ping.sequence(), "done");
    Ok(())
}
