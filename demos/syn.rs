//! Send a single TCP SYN built by `rawpack::TcpHeader`.
//!
//! To run this example:
//!
//! ```sh
//! sudo cargo run --example syn -- --src 192.168.0.10 --dst 192.168.0.1 --dport 80
//! ```
//!
//! Note: Root/sudo privileges are required to open a raw socket or TUN device.

use std::net::Ipv4Addr;

use clap::Parser;
use rawpack::TcpHeader;
use tracing::info;

mod utils;
use utils::{init_logging, open_sink, SinkKind};

#[derive(Parser, Debug)]
#[command(about = "Send a raw TCP SYN segment")]
struct Args {
    #[arg(long)]
    src: String,

    #[arg(long)]
    dst: String,

    #[arg(long, default_value_t = 40000)]
    sport: u32,

    #[arg(long)]
    dport: u32,

    /// Optional payload carried with the SYN
    #[arg(long, default_value = "")]
    payload: String,

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

    let mut tcp = TcpHeader::new(args.payload.into_bytes());
    tcp.set_src_ip(args.src.as_str())?
        .set_dst_ip(args.dst.as_str())?
        .set_src_port(args.sport)?
        .set_dst_port(args.dport)?
        .set_syn(true);

    let datagram = tcp.pack_datagram()?;
    let dst: Ipv4Addr = args.dst.parse()?;

    let mut sink = open_sink(args.sink, &args.tun_name, &args.tun_cidr)?;
    let sent = sink.send_packet(&datagram, dst)?;

    info!(sent, seq = tcp.sequence(), "SYN sent");
    Ok(())
}
