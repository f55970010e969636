//! Classifications for version, protocol and ICMP type fields.
//!
//! Every classification has an explicit undefined variant so a header can be
//! decoded even when a field carries a value we don't know.

use std::fmt;

/// IP version as announced by the first nibble of a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpVersion {
    V4,
    V6,
    Unknown,
}

impl IpVersion {
    pub const fn from_nibble(nibble: u8) -> Self {
        match nibble {
            4 => Self::V4,
            6 => Self::V6,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4 => f.write_str("IPv4"),
            Self::V6 => f.write_str("IPv6"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// Upper-layer protocol carried by an IP packet (IANA protocol numbers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    HopByHop,
    Icmp,
    Igmp,
    IpInIp,
    Tcp,
    Egp,
    Udp,
    Ipv6,
    Ipv6Route,
    Ipv6Fragment,
    Gre,
    Esp,
    Ah,
    Icmpv6,
    Ipv6NoNext,
    Ipv6Options,
    Ospf,
    Sctp,
    Undefined,
}

impl Protocol {
    pub const fn from_number(number: u8) -> Self {
        match number {
            0 => Self::HopByHop,
            1 => Self::Icmp,
            2 => Self::Igmp,
            4 => Self::IpInIp,
            6 => Self::Tcp,
            8 => Self::Egp,
            17 => Self::Udp,
            41 => Self::Ipv6,
            43 => Self::Ipv6Route,
            44 => Self::Ipv6Fragment,
            47 => Self::Gre,
            50 => Self::Esp,
            51 => Self::Ah,
            58 => Self::Icmpv6,
            59 => Self::Ipv6NoNext,
            60 => Self::Ipv6Options,
            89 => Self::Ospf,
            132 => Self::Sctp,
            _ => Self::Undefined,
        }
    }

    /// The IANA number, or `None` for [`Protocol::Undefined`].
    pub const fn number(self) -> Option<u8> {
        Some(match self {
            Self::HopByHop => 0,
            Self::Icmp => 1,
            Self::Igmp => 2,
            Self::IpInIp => 4,
            Self::Tcp => 6,
            Self::Egp => 8,
            Self::Udp => 17,
            Self::Ipv6 => 41,
            Self::Ipv6Route => 43,
            Self::Ipv6Fragment => 44,
            Self::Gre => 47,
            Self::Esp => 50,
            Self::Ah => 51,
            Self::Icmpv6 => 58,
            Self::Ipv6NoNext => 59,
            Self::Ipv6Options => 60,
            Self::Ospf => 89,
            Self::Sctp => 132,
            Self::Undefined => return None,
        })
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::HopByHop => "HOPOPT",
            Self::Icmp => "ICMP",
            Self::Igmp => "IGMP",
            Self::IpInIp => "IPIP",
            Self::Tcp => "TCP",
            Self::Egp => "EGP",
            Self::Udp => "UDP",
            Self::Ipv6 => "IPv6",
            Self::Ipv6Route => "IPv6-Route",
            Self::Ipv6Fragment => "IPv6-Frag",
            Self::Gre => "GRE",
            Self::Esp => "ESP",
            Self::Ah => "AH",
            Self::Icmpv6 => "ICMPv6",
            Self::Ipv6NoNext => "IPv6-NoNxt",
            Self::Ipv6Options => "IPv6-Opts",
            Self::Ospf => "OSPF",
            Self::Sctp => "SCTP",
            Self::Undefined => "UNDEFINED",
        };
        f.write_str(name)
    }
}

/// ICMP message type (RFC 792 and successors).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IcmpType {
    EchoReply,
    DestinationUnreachable,
    SourceQuench,
    Redirect,
    AlternateHostAddress,
    EchoRequest,
    RouterAdvertisement,
    RouterSolicitation,
    TimeExceeded,
    ParameterProblem,
    Timestamp,
    TimestampReply,
    InformationRequest,
    InformationReply,
    AddressMaskRequest,
    AddressMaskReply,
    Traceroute,
    ExtendedEchoRequest,
    ExtendedEchoReply,
    Undefined,
}

impl IcmpType {
    pub const fn from_number(number: u8) -> Self {
        match number {
            0 => Self::EchoReply,
            3 => Self::DestinationUnreachable,
            4 => Self::SourceQuench,
            5 => Self::Redirect,
            6 => Self::AlternateHostAddress,
            8 => Self::EchoRequest,
            9 => Self::RouterAdvertisement,
            10 => Self::RouterSolicitation,
            11 => Self::TimeExceeded,
            12 => Self::ParameterProblem,
            13 => Self::Timestamp,
            14 => Self::TimestampReply,
            15 => Self::InformationRequest,
            16 => Self::InformationReply,
            17 => Self::AddressMaskRequest,
            18 => Self::AddressMaskReply,
            30 => Self::Traceroute,
            42 => Self::ExtendedEchoRequest,
            43 => Self::ExtendedEchoReply,
            _ => Self::Undefined,
        }
    }
}
