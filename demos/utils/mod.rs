//! Shared setup for the demo programs.

use clap::ValueEnum;
use rawpack::{PacketSink, RawSocket, TunSink};
use tracing_subscriber::EnvFilter;

/// Where generated datagrams are written.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SinkKind {
    /// Raw IPv4 socket (sends onto the network)
    Raw,
    /// TUN device (delivers to the local host)
    Tun,
}

/// Install a `RUST_LOG`-driven subscriber, `info` by default.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Open the requested sink. `tun_cidr` is assigned to the TUN device.
pub fn open_sink(
    kind: SinkKind,
    tun_name: &str,
    tun_cidr: &str,
) -> anyhow::Result<Box<dyn PacketSink>> {
    Ok(match kind {
        SinkKind::Raw => Box::new(RawSocket::open()?),
        SinkKind::Tun => {
            let tun = TunSink::open(tun_name)?;
            tun.configure(tun_cidr)?;
            Box::new(tun)
        }
    })
}
