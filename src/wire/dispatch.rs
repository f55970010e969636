//! Version identification and routing of raw IP buffers to their codec.

use std::net::IpAddr;

use super::Codec;
use super::bits::high_nibble;
use super::icmp::IcmpHeader;
use super::ipv4::Ipv4Header;
use super::ipv6::Ipv6Header;
use super::protocol::{IpVersion, Protocol};
use super::tcp::TcpHeader;
use super::udp::UdpHeader;
use crate::error::DecodeError;

/// A decoded network-layer header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpHeader<'a> {
    V4(Ipv4Header<'a>),
    V6(Ipv6Header<'a>),
}

/// A decoded transport or control header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportHeader<'a> {
    Tcp(TcpHeader<'a>),
    Udp(UdpHeader<'a>),
    Icmp(IcmpHeader<'a>),
}

/// Reads the IP version from the high nibble of the first byte.
///
/// An empty buffer or any nibble other than 4 or 6 is [`IpVersion::Unknown`].
pub fn identify_version(buf: &[u8]) -> IpVersion {
    buf.first()
        .map_or(IpVersion::Unknown, |first| IpVersion::from_nibble(high_nibble(*first)))
}

/// Decodes a raw IP buffer with the codec matching its version.
///
/// Returns `None` when the version is unknown; that is an expected outcome
/// for non-IP traffic, not a failure.
pub fn parse(buf: &[u8]) -> Option<Result<IpHeader<'_>, DecodeError>> {
    match identify_version(buf) {
        IpVersion::V4 => Some(Ipv4Header::decode(buf).map(IpHeader::V4)),
        IpVersion::V6 => Some(Ipv6Header::decode(buf).map(IpHeader::V6)),
        IpVersion::Unknown => None,
    }
}

impl<'a> IpHeader<'a> {
    pub const fn version(&self) -> IpVersion {
        match self {
            Self::V4(_) => IpVersion::V4,
            Self::V6(_) => IpVersion::V6,
        }
    }

    pub fn source(&self) -> IpAddr {
        match self {
            Self::V4(header) => header.source.into(),
            Self::V6(header) => header.source.into(),
        }
    }

    pub fn destination(&self) -> IpAddr {
        match self {
            Self::V4(header) => header.destination.into(),
            Self::V6(header) => header.destination.into(),
        }
    }

    /// Classification of the carried protocol (IPv4 protocol / IPv6 next header).
    pub const fn protocol(&self) -> Protocol {
        match self {
            Self::V4(header) => header.protocol(),
            Self::V6(header) => header.protocol(),
        }
    }

    pub const fn payload(&self) -> &'a [u8] {
        match self {
            Self::V4(header) => header.payload,
            Self::V6(header) => header.payload,
        }
    }

    /// Decodes the payload as TCP, UDP or ICMP according to the protocol tag.
    ///
    /// Returns `None` for any other protocol, including IPv6 extension headers.
    pub fn transport(&self) -> Option<Result<TransportHeader<'a>, DecodeError>> {
        let payload = self.payload();
        match self.protocol() {
            Protocol::Tcp => Some(TcpHeader::decode(payload).map(TransportHeader::Tcp)),
            Protocol::Udp => Some(UdpHeader::decode(payload).map(TransportHeader::Udp)),
            Protocol::Icmp => Some(IcmpHeader::decode(payload).map(TransportHeader::Icmp)),
            _ => None,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::V4(header) => header.encode(),
            Self::V6(header) => header.encode(),
        }
    }
}

impl TransportHeader<'_> {
    pub const fn protocol(&self) -> Protocol {
        match self {
            Self::Tcp(_) => Protocol::Tcp,
            Self::Udp(_) => Protocol::Udp,
            Self::Icmp(_) => Protocol::Icmp,
        }
    }

    /// `(source, destination)` ports for TCP and UDP.
    pub const fn ports(&self) -> Option<(u16, u16)> {
        match self {
            Self::Tcp(header) => Some((header.source_port, header.destination_port)),
            Self::Udp(header) => Some((header.source_port, header.destination_port)),
            Self::Icmp(_) => None,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Tcp(header) => header.encode(),
            Self::Udp(header) => header.encode(),
            Self::Icmp(header) => header.encode(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::fixtures::{IPV4_ICMP_ECHO, IPV4_OPTIONS_UDP, IPV4_TCP_SYN, IPV6_UDP};
    use std::net::Ipv4Addr;

    #[test]
    fn should_identify_version_from_high_nibble() {
        assert_eq!(identify_version(&[0x45]), IpVersion::V4);
        assert_eq!(identify_version(&[0x60, 0x00]), IpVersion::V6);
        assert_eq!(identify_version(&[0x50]), IpVersion::Unknown);
        assert_eq!(identify_version(&[0x08, 0x06]), IpVersion::Unknown);
        assert_eq!(identify_version(&[]), IpVersion::Unknown);
    }

    #[test]
    fn should_return_none_for_unknown_versions() {
        assert!(parse(&[]).is_none());
        assert!(parse(&[0xff; 40]).is_none());
    }

    #[test]
    fn should_parse_ipv4_tcp_syn() {
        let header = parse(&IPV4_TCP_SYN).unwrap().unwrap();

        assert_eq!(header.version(), IpVersion::V4);
        assert_eq!(header.protocol(), Protocol::Tcp);
        assert_eq!(header.payload().len(), 20);
        assert_eq!(header.source(), IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(header.destination(), IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)));

        let Some(Ok(TransportHeader::Tcp(tcp))) = header.transport() else {
            panic!("expected a TCP header");
        };
        assert_eq!(tcp.destination_port, 443);
        assert!(tcp.flags.syn);
        assert!(!tcp.flags.ack);
    }

    #[test]
    fn should_route_transport_by_protocol() {
        let udp = parse(&IPV4_OPTIONS_UDP).unwrap().unwrap().transport();
        assert!(matches!(udp, Some(Ok(TransportHeader::Udp(_)))));

        let icmp = parse(&IPV4_ICMP_ECHO).unwrap().unwrap().transport();
        assert!(matches!(icmp, Some(Ok(TransportHeader::Icmp(_)))));

        let v6 = parse(&IPV6_UDP).unwrap().unwrap();
        assert_eq!(v6.version(), IpVersion::V6);
        let transport = v6.transport().unwrap().unwrap();
        assert_eq!(transport.ports(), Some((53, 49153)));
    }

    #[test]
    fn should_skip_transport_for_other_protocols() {
        let mut packet = IPV4_TCP_SYN;
        packet[9] = 47;

        let header = parse(&packet).unwrap().unwrap();
        assert_eq!(header.protocol(), Protocol::Gre);
        assert!(header.transport().is_none());
    }

    #[test]
    fn should_surface_truncated_transport() {
        let mut packet = IPV4_TCP_SYN.to_vec();
        packet.truncate(30);
        packet[3] = 30;

        let header = parse(&packet).unwrap().unwrap();
        assert!(matches!(
            header.transport(),
            Some(Err(DecodeError::Truncated { header: "TCP", .. }))
        ));
    }

    #[test]
    fn should_surface_truncated_ip_header() {
        assert!(matches!(
            parse(&IPV4_TCP_SYN[..10]),
            Some(Err(DecodeError::Truncated { header: "IPv4", .. }))
        ));
    }

    #[test]
    fn should_round_trip_through_dispatch() {
        for packet in [&IPV4_TCP_SYN[..], &IPV4_OPTIONS_UDP[..], &IPV4_ICMP_ECHO[..], &IPV6_UDP[..]] {
            let header = parse(packet).unwrap().unwrap();
            assert_eq!(header.encode(), packet);

            let transport = header.transport().unwrap().unwrap();
            assert_eq!(transport.encode(), header.payload());
        }
    }
}
