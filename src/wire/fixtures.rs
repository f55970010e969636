//! Packets shared by the codec tests.

/// IPv4 (IHL 5, DF, TTL 64) carrying a 20-byte TCP SYN from 10.0.0.1:54321 to 10.0.0.2:443.
pub const IPV4_TCP_SYN: [u8; 40] = [
    0x45, 0x00, 0x00, 0x28, 0x1c, 0x46, 0x40, 0x00, 0x40, 0x06, 0x0a, 0x8c, 0x0a, 0x00, 0x00, 0x01,
    0x0a, 0x00, 0x00, 0x02, // IPv4
    0xd4, 0x31, 0x01, 0xbb, 0x6b, 0x8b, 0x45, 0x67, 0x00, 0x00, 0x00, 0x00, 0x50, 0x02, 0xfa, 0xf0,
    0x3c, 0x1e, 0x00, 0x00, // TCP
];

/// IPv4 with a router-alert option (IHL 6) carrying an 8-byte UDP datagram.
pub const IPV4_OPTIONS_UDP: [u8; 32] = [
    0x46, 0xc0, 0x00, 0x20, 0x00, 0x00, 0x20, 0x00, 0x01, 0x11, 0x44, 0x7c, 0xc0, 0xa8, 0x01, 0x0a,
    0xe0, 0x00, 0x00, 0x16, // IPv4
    0x94, 0x04, 0x00, 0x00, // options
    0x14, 0xe9, 0x14, 0xe9, 0x00, 0x08, 0x00, 0x00, // UDP
];

/// IPv4 carrying an ICMP echo request with a 4-byte identifier/sequence and two data bytes.
pub const IPV4_ICMP_ECHO: [u8; 30] = [
    0x45, 0x00, 0x00, 0x1e, 0xab, 0xcd, 0x00, 0x00, 0x80, 0x01, 0x00, 0x00, 0xc0, 0xa8, 0x00, 0x05,
    0x08, 0x08, 0x08, 0x08, // IPv4
    0x08, 0x00, 0xf5, 0x9a, 0x00, 0x01, 0x00, 0x07, 0x61, 0x62, // ICMP
];

/// IPv6 (traffic class 0xab, flow label 0x12345) carrying a UDP datagram with 4 data bytes.
pub const IPV6_UDP: [u8; 52] = [
    0x6a, 0xb1, 0x23, 0x45, 0x00, 0x0c, 0x11, 0x40, // version/class/flow, length, next, hops
    0xfe, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01,
    0xfe, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02,
    0x00, 0x35, 0xc0, 0x01, 0x00, 0x0c, 0x00, 0x00, 0xde, 0xad, 0xbe, 0xef, // UDP
];

/// TCP segment with ACK|PSH, 12 bytes of options (NOP, NOP, timestamps) and a 3-byte payload.
pub const TCP_OPTIONS_PAYLOAD: [u8; 35] = [
    0x01, 0xbb, 0xd4, 0x31, 0x00, 0x00, 0x10, 0x00, 0x6b, 0x8b, 0x45, 0x68, 0x80, 0x18, 0x01, 0xf5,
    0xfe, 0x30, 0x00, 0x00, // fixed
    0x01, 0x01, 0x08, 0x0a, 0x00, 0x0d, 0x5e, 0x1a, 0x00, 0x0c, 0xa9, 0x33, // options
    0x47, 0x45, 0x54, // payload
];

/// Payload lengths covered by the generated round-trip sweeps.
pub const SWEEP_PAYLOAD_LENS: [usize; 6] = [0, 1, 3, 8, 64, 1480];

/// Deterministic pseudo-random bytes, a different stream per `seed`.
pub fn noise(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed.wrapping_mul(0x9e37_79b9_7f4a_7c15) | 1;
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (state >> 56) as u8
        })
        .collect()
}
