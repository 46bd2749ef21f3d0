use std::io;
use std::net::Ipv4Addr;
use std::process::Command;

use tracing::{debug, trace};
use tun_tap::{Iface, Mode};

use crate::iface::PacketSink;

/// TUN device sink.
///
/// Datagrams written here appear to the host as if they arrived on the
/// interface, which makes it a convenient target for inspecting generated
/// packets with a capture tool.
pub struct TunSink {
    iface: Iface,
}

impl TunSink {
    /// Create (or attach to) the TUN device `name` without packet info.
    ///
    /// Root/sudo privileges are required.
    pub fn open(name: &str) -> io::Result<Self> {
        let iface = Iface::without_packet_info(name, Mode::Tun)?;
        debug!(name = iface.name(), "TUN device created");
        Ok(TunSink { iface })
    }

    pub fn name(&self) -> &str {
        self.iface.name()
    }

    /// Assign `ip_cidr` to the device and bring it up with `ip(8)`.
    pub fn configure(&self, ip_cidr: &str) -> io::Result<()> {
        run_ip(&["addr", "add", ip_cidr, "dev", self.name()])?;
        run_ip(&["link", "set", "up", "dev", self.name()])?;
        debug!(name = self.name(), ip_cidr, "TUN device configured");
        Ok(())
    }
}

fn run_ip(args: &[&str]) -> io::Result<()> {
    let status = Command::new("ip").args(args).status()?;
    if !status.success() {
        return Err(io::Error::other(format!(
            "`ip {}` failed with {}",
            args.join(" "),
            status
        )));
    }
    Ok(())
}

impl PacketSink for TunSink {
    fn send_packet(&mut self, packet: &[u8], dst: Ipv4Addr) -> io::Result<usize> {
        let sent = self.iface.send(packet)?;
        trace!(%dst, sent, name = self.iface.name(), "wrote datagram to TUN device");
        Ok(sent)
    }
}
