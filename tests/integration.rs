//! Integration tests for ipmon.
//!
//! These tests drive the public API end to end: packets built by an
//! independent encoder are decoded through the dispatcher, and capture
//! sessions run against a socket fed from the test.

use std::io::{self, Write};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use ipmon::Config;
use ipmon::capture::{
    CaptureEvent, CaptureSession, CaptureSessionPool, InterfaceFilter, InterfaceInfo,
    InterfaceSource, RawSocket, SessionConfig, SessionState, SocketProvider, TransportError,
};
use ipmon::error::{CaptureError, DecodeError};
use ipmon::wire::{
    self, Codec, IcmpType, IpHeader, IpVersion, Protocol, StandardIcmpTable, TcpHeader,
    TransportHeader,
};
use parking_lot::Mutex;
use pnet::packet::icmp::{IcmpTypes, MutableIcmpPacket};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::{self, MutableIpv4Packet};
use pnet::packet::tcp::{MutableTcpPacket, TcpFlags};
use tempfile::NamedTempFile;
use tokio::sync::mpsc;

const SOURCE: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);
const DESTINATION: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 2);
const LOCAL: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 20);

/// Builds a 40-byte IPv4/TCP SYN with pnet.
fn syn_packet() -> Vec<u8> {
    let mut buf = vec![0u8; 40];
    {
        let mut ip = MutableIpv4Packet::new(&mut buf).unwrap();
        ip.set_version(4);
        ip.set_header_length(5);
        ip.set_total_length(40);
        ip.set_identification(0x1c46);
        ip.set_flags(ipv4::Ipv4Flags::DontFragment);
        ip.set_ttl(64);
        ip.set_next_level_protocol(IpNextHeaderProtocols::Tcp);
        ip.set_source(SOURCE);
        ip.set_destination(DESTINATION);
        let checksum = ipv4::checksum(&ip.to_immutable());
        ip.set_checksum(checksum);
    }
    {
        let mut tcp = MutableTcpPacket::new(&mut buf[20..]).unwrap();
        tcp.set_source(54321);
        tcp.set_destination(443);
        tcp.set_sequence(0x6b8b_4567);
        tcp.set_data_offset(5);
        tcp.set_flags(TcpFlags::SYN);
        tcp.set_window(64240);
    }
    buf
}

/// Builds an IPv4 ICMP port-unreachable message with pnet.
fn port_unreachable() -> Vec<u8> {
    let mut buf = vec![0u8; 28];
    {
        let mut ip = MutableIpv4Packet::new(&mut buf).unwrap();
        ip.set_version(4);
        ip.set_header_length(5);
        ip.set_total_length(28);
        ip.set_ttl(255);
        ip.set_next_level_protocol(IpNextHeaderProtocols::Icmp);
        ip.set_source(DESTINATION);
        ip.set_destination(SOURCE);
    }
    {
        let mut icmp = MutableIcmpPacket::new(&mut buf[20..]).unwrap();
        icmp.set_icmp_type(IcmpTypes::DestinationUnreachable);
        icmp.set_icmp_code(pnet::packet::icmp::IcmpCode(3));
    }
    buf
}

#[test]
fn should_decode_ipv4_tcp_syn_through_dispatcher() {
    let packet = syn_packet();

    assert_eq!(wire::identify_version(&packet), IpVersion::V4);
    let header = wire::parse(&packet).unwrap().unwrap();

    let IpHeader::V4(ip) = header else {
        panic!("expected IPv4");
    };
    assert_eq!(ip.protocol(), Protocol::Tcp);
    assert_eq!(ip.payload.len(), 20);
    assert_eq!(ip.ttl, 64);
    assert!(ip.dont_fragment());
    assert!(!ip.more_fragments());
    assert_eq!(ip.source, SOURCE);
    assert_eq!(ip.destination, DESTINATION);

    let tcp = TcpHeader::decode(ip.payload).unwrap();
    assert_eq!(tcp.destination_port, 443);
    assert_eq!(tcp.source_port, 54321);
    assert!(tcp.flags.syn);
    assert!(!tcp.flags.ack);

    assert_eq!(header.encode(), packet);
}

#[test]
fn should_describe_icmp_through_injected_table() {
    let table = StandardIcmpTable::new();
    let packet = port_unreachable();

    let header = wire::parse(&packet).unwrap().unwrap();
    let Some(Ok(TransportHeader::Icmp(icmp))) = header.transport() else {
        panic!("expected ICMP");
    };

    assert_eq!(icmp.kind(), IcmpType::DestinationUnreachable);
    assert_eq!(icmp.describe(&table), Some("Destination port unreachable"));
    assert_eq!(header.source(), IpAddr::V4(DESTINATION));
}

#[test]
fn should_never_fail_on_short_or_foreign_buffers() {
    let packet = syn_packet();

    assert!(matches!(
        wire::parse(&packet[..10]),
        Some(Err(DecodeError::Truncated { header: "IPv4", .. }))
    ));
    for len in 0..packet.len() {
        let _ = wire::parse(&packet[..len]);
    }

    assert!(wire::parse(&[]).is_none());
    assert!(wire::parse(&[0x11; 64]).is_none());
}

#[test]
fn should_load_config_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        addresses = ["192.168.1.20"]
        channel_capacity = 64

        [metrics]
        enabled = false
        "#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.addresses, vec![LOCAL]);

    let session = SessionConfig::from(&config);
    assert_eq!(session.channel_capacity, 64);
    assert_eq!(session.close_timeout, Duration::from_millis(500));
}

#[test]
fn should_reject_invalid_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "receive_buffer_size = 8").unwrap();

    assert!(Config::load(file.path()).is_err());
}

/// Socket fed through a channel by the test.
struct ChannelSocket {
    rx: mpsc::UnboundedReceiver<io::Result<Vec<u8>>>,
    released: Arc<AtomicBool>,
}

impl RawSocket for ChannelSocket {
    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.rx.recv().await {
            Some(Ok(bytes)) => {
                buf[..bytes.len()].copy_from_slice(&bytes);
                Ok(bytes.len())
            }
            Some(Err(err)) => Err(err),
            None => std::future::pending().await,
        }
    }
}

impl Drop for ChannelSocket {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct ChannelProvider {
    feeds: Mutex<Vec<(Ipv4Addr, mpsc::UnboundedSender<io::Result<Vec<u8>>>)>>,
    released: Arc<AtomicBool>,
}

impl ChannelProvider {
    fn feed(&self, address: Ipv4Addr) -> mpsc::UnboundedSender<io::Result<Vec<u8>>> {
        self.feeds
            .lock()
            .iter()
            .find(|(a, _)| *a == address)
            .map(|(_, tx)| tx.clone())
            .unwrap()
    }
}

impl SocketProvider for ChannelProvider {
    type Socket = ChannelSocket;

    fn open(
        &self,
        address: Ipv4Addr,
        _port: u16,
        _receive_buffer_size: usize,
    ) -> Result<ChannelSocket, CaptureError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.feeds.lock().push((address, tx));
        Ok(ChannelSocket {
            rx,
            released: Arc::clone(&self.released),
        })
    }
}

async fn next(events: &mut tokio::sync::broadcast::Receiver<CaptureEvent>) -> CaptureEvent {
    tokio::time::timeout(Duration::from_secs(1), events.recv())
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn should_capture_and_decode_packets() {
    let provider = Arc::new(ChannelProvider::default());
    let session = CaptureSession::new(LOCAL, 0, Arc::clone(&provider), SessionConfig::default());
    let mut events = session.subscribe();

    session.start().unwrap();
    let feed = provider.feed(LOCAL);
    feed.send(Ok(syn_packet())).unwrap();
    feed.send(Ok(Vec::new())).unwrap();

    let CaptureEvent::PacketReceived(frame) = next(&mut events).await else {
        panic!("expected a packet");
    };
    assert_eq!(frame.address(), LOCAL);
    assert_eq!(frame.version(), IpVersion::V4);
    let header = frame.parse().unwrap().unwrap();
    assert_eq!(header.protocol(), Protocol::Tcp);

    let CaptureEvent::PacketError(frame) = next(&mut events).await else {
        panic!("expected a packet error");
    };
    assert_eq!(frame.transport_error(), Some(TransportError::NoData));
    assert_eq!(session.state(), SessionState::Running);

    session.stop().await;
    assert!(provider.released.load(Ordering::SeqCst));
}

#[tokio::test]
async fn should_release_socket_when_stopped_before_any_completion() {
    let provider = Arc::new(ChannelProvider::default());
    let session = CaptureSession::new(LOCAL, 0, Arc::clone(&provider), SessionConfig::default());
    let mut events = session.subscribe();

    session.start().unwrap();
    session.stop().await;
    session.stop().await;

    assert!(provider.released.load(Ordering::SeqCst));
    assert!(events.try_recv().is_err());
    assert!(matches!(session.start(), Err(CaptureError::Stopped)));
}

struct StaticInterfaces(Vec<InterfaceInfo>);

impl InterfaceSource for StaticInterfaces {
    fn interfaces(&self) -> Result<Vec<InterfaceInfo>, CaptureError> {
        Ok(self.0.clone())
    }
}

#[tokio::test]
async fn should_bind_pool_to_eligible_addresses() {
    let interfaces = StaticInterfaces(vec![
        InterfaceInfo {
            name: "lo".into(),
            index: 1,
            is_up: true,
            is_loopback: true,
            is_tunnel: false,
            ipv4: vec![Ipv4Addr::LOCALHOST],
        },
        InterfaceInfo {
            name: "eth0".into(),
            index: 2,
            is_up: true,
            is_loopback: false,
            is_tunnel: false,
            ipv4: vec![LOCAL],
        },
        InterfaceInfo {
            name: "veth1a2b".into(),
            index: 3,
            is_up: true,
            is_loopback: false,
            is_tunnel: false,
            ipv4: vec![Ipv4Addr::new(172, 18, 0, 1)],
        },
    ]);
    let provider = Arc::new(ChannelProvider::default());

    let pool = CaptureSessionPool::bind_all(
        &interfaces,
        &InterfaceFilter::default(),
        Arc::clone(&provider),
        SessionConfig::default(),
    )
    .unwrap();
    assert_eq!(pool.len(), 1);
    assert_eq!(pool.sessions()[0].address(), LOCAL);

    let mut events = pool.subscribe();
    assert!(pool.start_all().is_empty());
    provider.feed(LOCAL).send(Ok(port_unreachable())).unwrap();

    let event = next(&mut events).await;
    assert_eq!(event.address(), LOCAL);
    assert!(matches!(event, CaptureEvent::PacketReceived(_)));

    pool.stop_all().await;
    assert!(
        pool.sessions()
            .iter()
            .all(|s| s.state() == SessionState::Stopped)
    );
}
