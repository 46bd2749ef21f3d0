/// Field defaults applied when an encoder is constructed.
///
/// These are conventional starting values, not protocol requirements; every
/// one of them can still be overridden on the encoder afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    /// IPv4 time to live.
    pub ttl: u8,
    /// IPv4 type of service (DSCP + ECN).
    pub tos: u8,
    /// IPv4 identification.
    pub identification: u16,
    /// IPv4 flags (top 3 bits) and fragment offset (low 13 bits).
    pub flags_frag_offset: u16,
    /// TCP receive window.
    pub window: u16,
    /// Echo payload used by [`crate::Ping`].
    pub ping_payload: Vec<u8>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            ttl: crate::network::ipv4::DEFAULT_TTL,
            tos: 0,
            identification: 0,
            flags_frag_offset: 0,
            window: crate::transport::tcp::DEFAULT_WINDOW,
            ping_payload: crate::network::ping::DEFAULT_PAYLOAD.to_vec(),
        }
    }
}
