//! ICMP type/code descriptions.
//!
//! The lookup is a read-only collaborator: build a table once at start-up and
//! hand a reference to whoever renders ICMP headers.

use std::collections::HashMap;

/// Resolves an ICMP type/code pair to a human-readable description.
pub trait IcmpDescriptions: Send + Sync {
    fn describe(&self, icmp_type: u8, code: u8) -> Option<&str>;
}

/// The IANA ICMP parameter registry.
#[derive(Debug, Clone)]
pub struct StandardIcmpTable {
    entries: HashMap<(u8, u8), &'static str>,
}

const ENTRIES: &[(u8, u8, &str)] = &[
    (0, 0, "Echo reply"),
    (3, 0, "Destination network unreachable"),
    (3, 1, "Destination host unreachable"),
    (3, 2, "Destination protocol unreachable"),
    (3, 3, "Destination port unreachable"),
    (3, 4, "Fragmentation required, and DF flag set"),
    (3, 5, "Source route failed"),
    (3, 6, "Destination network unknown"),
    (3, 7, "Destination host unknown"),
    (3, 8, "Source host isolated"),
    (3, 9, "Network administratively prohibited"),
    (3, 10, "Host administratively prohibited"),
    (3, 11, "Network unreachable for ToS"),
    (3, 12, "Host unreachable for ToS"),
    (3, 13, "Communication administratively prohibited"),
    (3, 14, "Host precedence violation"),
    (3, 15, "Precedence cutoff in effect"),
    (4, 0, "Source quench"),
    (5, 0, "Redirect datagram for the network"),
    (5, 1, "Redirect datagram for the host"),
    (5, 2, "Redirect datagram for the ToS and network"),
    (5, 3, "Redirect datagram for the ToS and host"),
    (6, 0, "Alternate host address"),
    (8, 0, "Echo request"),
    (9, 0, "Router advertisement"),
    (10, 0, "Router discovery/selection/solicitation"),
    (11, 0, "TTL expired in transit"),
    (11, 1, "Fragment reassembly time exceeded"),
    (12, 0, "Pointer indicates the error"),
    (12, 1, "Missing a required option"),
    (12, 2, "Bad length"),
    (13, 0, "Timestamp"),
    (14, 0, "Timestamp reply"),
    (15, 0, "Information request"),
    (16, 0, "Information reply"),
    (17, 0, "Address mask request"),
    (18, 0, "Address mask reply"),
    (19, 0, "Reserved for security"),
    (30, 0, "Information request (traceroute)"),
    (31, 0, "Datagram conversion error"),
    (32, 0, "Mobile host redirect"),
    (33, 0, "Where-are-you (IPv6)"),
    (34, 0, "Here-I-am (IPv6)"),
    (35, 0, "Mobile registration request"),
    (36, 0, "Mobile registration reply"),
    (37, 0, "Domain name request"),
    (38, 0, "Domain name reply"),
    (39, 0, "SKIP algorithm discovery protocol"),
    (40, 0, "Photuris, security failures"),
    (41, 0, "ICMP for experimental mobility protocols"),
    (42, 0, "Extended echo request"),
    (43, 0, "Extended echo reply: no error"),
    (43, 1, "Extended echo reply: malformed query"),
    (43, 2, "Extended echo reply: no such interface"),
    (43, 3, "Extended echo reply: no such table entry"),
    (43, 4, "Extended echo reply: multiple interfaces satisfy query"),
    (253, 0, "RFC3692-style experiment 1"),
    (254, 0, "RFC3692-style experiment 2"),
    (255, 0, "Reserved"),
];

const RESERVED_FOR_ROBUSTNESS: &str = "Reserved for robustness experiment";
const UNASSIGNED: &str = "Reserved";

impl StandardIcmpTable {
    pub fn new() -> Self {
        let mut entries: HashMap<(u8, u8), &'static str> = ENTRIES
            .iter()
            .map(|&(icmp_type, code, text)| ((icmp_type, code), text))
            .collect();

        for icmp_type in 20..=29 {
            entries.insert((icmp_type, 0), RESERVED_FOR_ROBUSTNESS);
        }
        for icmp_type in 44..=252 {
            entries.insert((icmp_type, 0), UNASSIGNED);
        }

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for StandardIcmpTable {
    fn default() -> Self {
        Self::new()
    }
}

impl IcmpDescriptions for StandardIcmpTable {
    fn describe(&self, icmp_type: u8, code: u8) -> Option<&str> {
        self.entries.get(&(icmp_type, code)).copied()
    }
}
