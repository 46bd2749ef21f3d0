use std::io;
use std::net::{Ipv4Addr, SocketAddrV4};

use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tracing::{debug, trace};

use crate::iface::PacketSink;

/// Raw IPv4 socket that sends caller-built headers as-is.
///
/// Opened with `IPPROTO_RAW`, which implies the header is included, so the
/// kernel transmits the datagram without prepending its own IPv4 header.
/// Requires root or `CAP_NET_RAW`.
pub struct RawSocket {
    socket: Socket,
}

impl RawSocket {
    pub fn open() -> io::Result<Self> {
        let protocol = Protocol::from(libc::IPPROTO_RAW);
        let socket = Socket::new(Domain::IPV4, Type::RAW, Some(protocol))?;
        debug!("opened raw IPv4 socket");
        Ok(RawSocket { socket })
    }
}

impl PacketSink for RawSocket {
    fn send_packet(&mut self, packet: &[u8], dst: Ipv4Addr) -> io::Result<usize> {
        let addr = SockAddr::from(SocketAddrV4::new(dst, 0));
        let sent = self.socket.send_to(packet, &addr)?;
        trace!(%dst, sent, "sent datagram on raw socket");
        Ok(sent)
    }
}
